//! Test utilities and helpers for the symdex crates.
//!
//! This crate provides:
//! - Generation of synthetic symbol fragments
//! - Location of the sample documentation search files under `test/samples`

pub mod data_gen;
pub mod dirs;
