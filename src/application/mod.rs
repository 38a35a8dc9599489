//! Application layer: transformation services and the permalink codec

pub mod error;
pub mod permalink;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
