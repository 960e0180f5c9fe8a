//! Capability traits the cloud backend is built on.

pub mod document_store;
pub mod object_store;
