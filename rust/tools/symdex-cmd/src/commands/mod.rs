//! Command implementations for symdex-cmd

pub mod convert;
pub mod inspect;
pub mod query;
