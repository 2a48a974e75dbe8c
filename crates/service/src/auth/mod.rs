//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration and login against the flat credentials document.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::AuthService;
