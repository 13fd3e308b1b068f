//! HTTPDNS Application Layer
//!
//! Ports for every collaborator of the resolution engine and the resolve-task
//! use case that drives them.
pub mod ports;
pub mod use_cases;
