//! Parser for the libconfig configuration dialect.
//!
//! Parsed trees live in an [`Arena`] and are read through borrowed
//! [`Value`] views. A [`Parser`] owns its arena and can be reused across
//! parses; [`ParserPool`] shares parsers between threads. The free functions
//! in this module parse and navigate in one call:
//!
//! ```
//! let data = b"misc = { bitmask = 0x1FC3; };";
//! assert_eq!(libconfig::get_int(data, &["misc", "bitmask"]), 8131);
//! assert_eq!(libconfig::get_hex(data, &["misc", "bitmask"]), "0x1FC3");
//! ```

pub mod arena;
pub mod decode;
pub mod error;
pub mod num;
pub mod options;
pub mod pool;
pub mod text;
pub mod types;

use num_bigint::BigInt;

pub use crate::arena::{Arena, ValueId};
pub use crate::decode::include::{list_matching, match_file};
pub use crate::decode::{Parser, Scanner};
pub use crate::error::{Error, ErrorKind, Location};
pub use crate::num::{LiteralKind, Number};
pub use crate::options::{IncludePolicy, ParseOptions};
pub use crate::pool::{ArenaPool, ParserPool, Pool, Recycle};
pub use crate::types::value::{Array, Object, Type, Value, ValueRef};

pub type Result<T> = std::result::Result<T, Error>;

/// Returns the string at `path`, or an empty string when the path is absent,
/// not a string, or `data` does not parse.
pub fn get_string(data: &[u8], path: &[&str]) -> String {
    decode::pool::with_parsed(data, |root| root.get_string(path).into_owned()).unwrap_or_default()
}

pub fn get_int(data: &[u8], path: &[&str]) -> i64 {
    decode::pool::with_parsed(data, |root| root.get_int(path)).unwrap_or_default()
}

pub fn get_uint(data: &[u8], path: &[&str]) -> u64 {
    decode::pool::with_parsed(data, |root| root.get_uint(path)).unwrap_or_default()
}

pub fn get_float64(data: &[u8], path: &[&str]) -> f64 {
    decode::pool::with_parsed(data, |root| root.get_float64(path)).unwrap_or_default()
}

pub fn get_bool(data: &[u8], path: &[&str]) -> bool {
    decode::pool::with_parsed(data, |root| root.get_bool(path)).unwrap_or_default()
}

pub fn get_bigint(data: &[u8], path: &[&str]) -> BigInt {
    decode::pool::with_parsed(data, |root| root.get_bigint(path)).unwrap_or_default()
}

/// Returns the `0x`-prefixed uppercase hex rendering of the integer at
/// `path`, or an empty string.
pub fn get_hex(data: &[u8], path: &[&str]) -> String {
    decode::pool::with_parsed(data, |root| root.get_hex(path)).unwrap_or_default()
}

/// True when `data` parses and `path` leads to a value.
pub fn exists(data: &[u8], path: &[&str]) -> bool {
    decode::pool::with_parsed(data, |root| root.exists(path)).unwrap_or(false)
}

/// Checks that `data` is a well-formed document.
pub fn validate(data: &[u8]) -> Result<()> {
    Parser::new().parse_bytes(data).map(|_| ())
}
