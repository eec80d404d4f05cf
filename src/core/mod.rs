// src/core/mod.rs
pub mod envelope;
pub mod kdf;
pub mod store;
pub mod util;

pub use envelope::*;
pub use kdf::*;
pub use store::*;
pub use util::*;

/// Monotonically increasing identifier of one derived key/salt pair
pub type KeyVersion = u32;

pub type Result<T> = std::result::Result<T, crate::error::CoreError>;
