//! Core domain types
//!
//! Deployments produced by the pipeline and the container records relayed
//! from the container runtime.

pub mod container;
pub mod deployment;

pub use container::{ContainerListing, ContainerRecord};
pub use deployment::{Deployment, DeploymentId, Stage};
