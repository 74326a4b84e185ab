//! Log lifecycle services.
//!
//! Archival flushes, crash checkpoints, the periodic tasks that drive them
//! and the shutdown sequence. They depend on store traits (ports) -- never
//! on concrete infrastructure implementations.

pub mod archivist;
pub mod checkpoint;
pub mod maintenance;
pub mod shutdown;
