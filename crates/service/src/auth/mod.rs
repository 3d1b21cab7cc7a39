//! Auth module: three-layer architecture (domain, repository, service).
//!
//! This module centralizes the login decision pipeline, the token service,
//! and the password verifier under the service crate.

pub mod domain;
pub mod errors;
pub mod password;
pub mod repo;
pub mod repository;
pub mod service;
pub mod token;

pub use service::LoginPipeline;
pub use token::TokenService;
