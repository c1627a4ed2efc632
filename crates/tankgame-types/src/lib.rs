pub mod api;
pub mod envelope;
pub mod models;

pub use envelope::{Envelope, Status};
