//! Core types for the user lookup service.

pub mod id;

pub use id::*;
