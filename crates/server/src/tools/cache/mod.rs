//! Cache inspection tools.
//!
//! Read-only views over the current generation and the stored generation list.

pub mod generations;
pub mod get;

pub use generations::generations_impl;
pub use get::{CacheGetParams, get_impl};
