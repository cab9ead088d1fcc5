//! Domain models for the user lookup service.

pub mod user;

pub use user::{NewUser, User};
