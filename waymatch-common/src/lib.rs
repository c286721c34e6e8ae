//! Shared infrastructure for the waymatch workspace.
//!
//! Everything that crosses crate boundaries but belongs to no single
//! subsystem lives here: the closed error kind set surfaced across the API
//! boundary and the cooperative cancellation token polled by the decoders.

pub mod cancel;
pub mod error;

pub use cancel::CancelToken;
pub use error::{Error, Result};
