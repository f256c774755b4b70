//! Feedback collection service: SQLite storage behind a small HTTP API.

pub mod error;
pub mod models;
pub mod server;
pub mod store;

pub use server::serve;
pub use store::FeedbackStore;
