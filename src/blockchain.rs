// Thin re-export module: the implementation lives under `blockchain/core`,
// split into chain management, derived state and validation.

pub mod core;
pub use core::*;
