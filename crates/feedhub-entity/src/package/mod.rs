//! Package entities.

pub mod manifest;
pub mod record;
pub mod version;
