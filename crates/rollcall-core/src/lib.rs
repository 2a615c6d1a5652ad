//! Core domain + application logic for the rollcall group bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the
//! `MessagingPort` trait, implemented in the adapter crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod membership;
pub mod mention;
pub mod messaging;
pub mod reactor;
pub mod roster;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
