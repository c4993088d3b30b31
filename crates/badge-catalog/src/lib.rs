#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]

//! Badge catalog: a content-addressed store of immutable badge
//! definitions. A badge is created once, never mutated and never deleted;
//! its identifier is the canonical hash of its full content.

pub mod badge;
pub mod catalog;
pub mod store;
pub mod validation;

pub use badge::BadgeV1;
pub use catalog::{BadgeCatalog, CatalogError};
pub use store::{BadgeStore, StoreError};
