//! Shared test utilities for rummo

pub mod fixtures;
