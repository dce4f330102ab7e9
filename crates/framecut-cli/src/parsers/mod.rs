//! Parsing functions for CLI arguments.

mod extract;

pub use extract::{parse_margin, parse_output_format, parse_prefix, parse_threads};
