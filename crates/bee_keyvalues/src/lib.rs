//! Nested key/value property text, as used by Source engine configuration
//! and soundscript files.
//!
//! ```text
//! "Config"
//!     {
//!     "game_id" "620"
//!     "MusicScript"
//!         {
//!         "base" "music/base.wav"
//!         }
//!     }
//! ```
//!
//! Keys may repeat, lookups are case-insensitive and return the first match.

mod error;
mod lexer;
mod property;

pub use error::{ParseError, ParseErrorKind};
pub use property::{conv_bool, Property, Value};
