//! Envelope-returning data-access operations for the tank game.
//!
//! Every function takes the [`Database`] explicitly, runs its named
//! statement(s) and folds the outcome into an [`Envelope`]. Callers branch
//! on `status` only.
//!
//! [`Envelope`]: tankgame_types::Envelope

pub mod auth;
pub mod error;
pub mod points;
pub mod shop;
pub mod stats;
pub mod tanks;
pub mod xp;

pub use error::ServiceError;
pub use tankgame_db::Database;
