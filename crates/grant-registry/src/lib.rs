#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]

//! Grant registry: a manager-gated store of grant records.
//!
//! Identity is the canonical content hash computed **once at creation**;
//! later updates replace the content but never the id.

pub mod grant;
pub mod registry;
pub mod store;
pub mod validation;

pub use grant::{DisbursementV1, GrantStatus, GrantV1};
pub use registry::{GrantRegistry, RegistryError};
pub use store::{GrantStore, StoreError};
