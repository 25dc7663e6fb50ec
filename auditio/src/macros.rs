// SPDX-License-Identifier: MIT

/// Automatically implements read helpers for primitive types on VolIO
#[macro_export]
macro_rules! volio_impl_primitive_reads {
    ($($ty:ty),+ $(,)?) => {
        $(
            paste::paste! {
                #[inline(always)]
                fn [<read_ $ty _at>](&mut self, offset: u64) -> VolIOResult<$ty> {
                    let mut buf = [0u8; core::mem::size_of::<$ty>()];
                    self.read_at(offset, &mut buf)?;
                    Ok(<$ty>::from_le_bytes(buf))
                }
            }
        )+
    };
}
