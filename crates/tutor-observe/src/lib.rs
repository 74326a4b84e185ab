//! Observability setup for the tutor bot.

pub mod tracing_setup;
