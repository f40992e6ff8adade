//! Data model shared by the certificate engine and its HTTP surface.
//!
//! Everything in this crate is plain data plus the small amount of logic that
//! keeps it consistent (field positions, delivery status transitions). Rendering,
//! I/O and transport live in the `certsmith` backend crate.

pub mod jobs;
pub mod model;
pub mod requests;
