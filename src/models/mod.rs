//! Data models for the documentation hub.
//!
//! These models serialize in camelCase for the presentation layer.

mod discussion;
mod document;
mod remote;

pub use discussion::*;
pub use document::*;
pub use remote::*;
