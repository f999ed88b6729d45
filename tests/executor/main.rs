//! Executor Layer Tests
//!
//! Tests for the genesis-executor crate through the root facade:
//! - Command enum - the instruction set, as a transport would send it
//! - Executor - stateless command dispatch
//! - Genesis - high-level typed wrapper API over a disk database

mod common;

mod command_dispatch;
mod persistence;
