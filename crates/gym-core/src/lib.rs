//! # GymGate Core
//!
//! The domain layer of GymGate: staff identity records, the access policy,
//! the ports infrastructure must implement, and the login and per-request
//! authentication services built on them.
//! This crate has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError};
