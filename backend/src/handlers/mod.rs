//! HTTP handlers

mod auth;
mod bottle;
mod collection;
mod health;
mod tasting;

pub use auth::*;
pub use bottle::*;
pub use collection::*;
pub use health::*;
pub use tasting::*;
