//! Parsers for extraction options.

use framecut_core::OutputFormat;

/// Parse an output format name ("jpeg", "jpg", "png", "tif", "tiff").
pub fn parse_output_format(format_str: &str) -> Result<OutputFormat, String> {
    format_str.trim().parse::<OutputFormat>()
}

/// Parse a crop name prefix.
///
/// The prefix becomes part of a file name, so it may not contain path
/// separators or be only whitespace.
pub fn parse_prefix(prefix_str: &str) -> Result<String, String> {
    let prefix = prefix_str.trim();
    if prefix.is_empty() {
        return Err("Prefix cannot be empty".to_string());
    }
    if prefix.contains('/') || prefix.contains('\\') || prefix.contains('\0') {
        return Err(format!("Prefix cannot contain path separators: {}", prefix_str));
    }
    if prefix == "." || prefix == ".." {
        return Err(format!("Invalid prefix: {}", prefix_str));
    }
    Ok(prefix.to_string())
}

/// Parse the margin added around each box, in pixels (0-1000).
pub fn parse_margin(margin_str: &str) -> Result<u32, String> {
    let margin = margin_str
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid margin: {}", margin_str))?;
    if margin > 1000 {
        return Err(format!("Margin {} must be at most 1000 pixels", margin));
    }
    Ok(margin)
}

/// Parse a worker thread count (at least 1).
pub fn parse_threads(threads_str: &str) -> Result<usize, String> {
    match threads_str.trim().parse::<usize>() {
        Ok(0) => Err("Thread count must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid thread count: {}", threads_str)),
    }
}
