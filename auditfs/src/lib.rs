// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
#[macro_use]
extern crate alloc;

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use core::checker::*;
pub use core::errors::*;

/// ExFAT on-disk structure audit.
///
/// See [`exfat::ExFatAuditor`], [`exfat::SetValidator`], and
/// [`exfat::audit_table`].
pub mod exfat {
    pub use super::fs::exfat::prelude::*;
}
