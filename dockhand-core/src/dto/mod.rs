//! Data Transfer Objects
//!
//! Request bodies accepted by the HTTP API. The field names match the JSON
//! sent by the bundled web front end.

pub mod container;
pub mod deploy;
