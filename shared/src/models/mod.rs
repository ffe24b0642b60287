//! Domain models for the Pour Choices platform

mod bottle;
mod collection;
mod user;

pub use bottle::*;
pub use collection::*;
pub use user::*;
