//! HTTP layer for the tutor bot.
//!
//! The chat transport posts each inbound message to `/api/v1/messages` and
//! relays the returned chunks to the student's channel.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
