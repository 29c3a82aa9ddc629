//! Configuration validation
//!
//! Rejects analysis configs that would fail part-way through a run.

mod error;
mod validator;

#[cfg(test)]
mod tests;

pub use error::ValidationError;
pub use validator::validate_config;
