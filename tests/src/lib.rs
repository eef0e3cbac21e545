//! Shared harness for the gateway integration tests.

pub mod containers;
pub mod fixtures;
pub mod mocks;
pub mod setup;
