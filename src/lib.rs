#![warn(rust_2018_idioms)]

//! Validation of OpenType Layout tables and decoding of TrueType character maps.
//!
//! Tables are validated in place over the font data at one of four strictness levels. A table
//! that passes validation can then be queried without further bounds errors.

pub mod base;
/// Reading of binary data.
pub mod binary;
pub mod error;
pub mod font;
pub mod gdef;
pub mod gpos;
pub mod gsub;
pub mod jstf;
pub mod layout;
pub mod size;
pub mod tables;
pub mod tag;
/// Shared test code.
#[cfg(test)]
pub mod tests;
pub mod validate;
