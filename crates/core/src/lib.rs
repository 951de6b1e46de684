//! Domain types shared by the ConvertX backend crates.
//!
//! Zero internal dependencies: generation request validation, the
//! per-user tool history log, and the key-value stores backing it.

pub mod error;
pub mod generation;
pub mod history;
pub mod store;
pub mod templates;
pub mod types;
