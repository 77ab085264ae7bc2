//! Data Transfer Objects for REST request/response serialization.
//!
//! Character and log read models are served directly from
//! [`crate::domain`]; this module holds the request shapes and the small
//! acknowledgement bodies.

pub mod common_dto;
pub mod log_dto;

pub use common_dto::*;
pub use log_dto::*;
