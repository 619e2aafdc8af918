//! Domain types, validation and pure helpers shared by every SFMCP crate.
//!
//! Nothing in this crate performs I/O.

pub mod channels;
pub mod community;
pub mod diff;
pub mod domain;
pub mod error;
pub mod execution;
pub mod fingerprint;
pub mod hashing;
pub mod monitoring;
pub mod network;
pub mod prompts;
pub mod requests;
pub mod temporal;
pub mod types;
pub mod visualization;
