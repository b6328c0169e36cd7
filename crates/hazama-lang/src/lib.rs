#![forbid(unsafe_code)]

//! Command-line inspector for Hazama translation catalogs.
//!
//! The binary resolves a catalog the same way the application does (from
//! `config.ini` and the language directory) or takes an explicit `.ts`
//! file, then answers lookups or prints coverage tables. The modules are
//! exposed so integration tests can drive commands without spawning a
//! process.

pub mod cli;
pub mod commands;
pub mod logging;
