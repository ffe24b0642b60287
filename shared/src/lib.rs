//! Shared types and models for the Pour Choices platform
//!
//! This crate contains the whisky catalog models and the blind tasting core,
//! shared between the backend, the browser client (via WASM), and tests.

pub mod models;
pub mod tasting;
pub mod types;
pub mod validation;

pub use models::*;
pub use tasting::*;
pub use types::*;
pub use validation::*;
