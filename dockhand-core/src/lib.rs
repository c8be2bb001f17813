//! Dockhand Core
//!
//! Core types shared by the Dockhand deployment server.
//!
//! This crate contains:
//! - Domain types: deployments, their identifiers and container records
//! - DTOs: request bodies accepted by the HTTP API
//! - Validation errors raised while decoding those requests

pub mod domain;
pub mod dto;
pub mod error;

pub use error::ValidationError;
