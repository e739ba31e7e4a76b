//! Testing utilities
//!
//! Mock collaborators used by the engine unit tests and the integration
//! tests under `tests/`. Every mock records its invocations into a shared
//! [`mocks::Recorder`] so tests can assert call ordering across phases.

pub mod mocks;
