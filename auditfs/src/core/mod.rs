// === Sub-modules ===
pub mod checker;
pub mod errors;
pub mod macros;
pub mod utils;

// === Error types ===
pub use errors::*;
