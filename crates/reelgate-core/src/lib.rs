//! reelgate-core: shared error taxonomy and upstream request descriptions.
//!
//! This crate has no I/O. It defines the caller-facing [`Error`] kinds the
//! gateway reports and the [`RequestSpec`] value that travels from the
//! catalog surface through the queue to the transport.

pub mod error;
pub mod request;

pub use error::{Error, Result};
pub use request::RequestSpec;
