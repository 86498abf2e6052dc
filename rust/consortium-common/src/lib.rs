#![warn(missing_docs)]

//! This crate constitutes a library of light weight helpers that are shared
//! across the membership crates: a copy-on-write snapshot cell, content
//! fingerprints and time conversions.

mod sync;
pub use sync::*;

mod fingerprint;
pub use fingerprint::*;

pub mod time;
