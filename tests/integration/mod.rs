//! Integration tests for rummo
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod run_cycle;
pub mod script_notebook;
