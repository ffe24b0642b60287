//! Business logic services for the Pour Choices server

pub mod auth;
pub mod bottle;
pub mod collection;
pub mod rating;
pub mod tasting;

pub use auth::AuthService;
pub use bottle::BottleService;
pub use collection::CollectionService;
pub use rating::RatingService;
pub use tasting::{ActiveTastings, TastingService};
