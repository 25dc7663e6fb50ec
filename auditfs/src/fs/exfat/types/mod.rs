// SPDX-License-Identifier: MIT

mod entries;
mod root;

pub use entries::*;
pub use root::*;
