//! Request handlers.

pub mod message;
pub mod status;
