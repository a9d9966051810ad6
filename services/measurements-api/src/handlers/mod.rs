//! HTTP request handlers for the measurements API.

pub mod health;
pub mod landing;
pub mod measurement;
pub mod measurements;
