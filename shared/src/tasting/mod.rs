//! Blind tasting core
//!
//! A user selects 2-5 bottles, has them poured into anonymous slots (A-E),
//! records flavor notes and a full ranking without knowing which bottle is
//! which, and finally reveals the mapping alongside personal and community
//! percentiles.
//!
//! Everything here is synchronous and in-memory. Persistence and rating
//! lookups belong to the caller.

mod assigner;
mod error;
mod notes;
mod reveal;
mod scoring;
mod session;
mod slot;

pub use assigner::*;
pub use error::*;
pub use notes::*;
pub use reveal::*;
pub use scoring::*;
pub use session::*;
pub use slot::*;
