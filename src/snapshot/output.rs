//! Normalization of raw captured cell output

/// Split raw captured text into `(line_count, lines)`.
///
/// Empty or absent output yields `(0, [])`. Lines break on `\n` and `\r\n`;
/// a single trailing newline does not produce an extra empty line. Escaped
/// newline sequences inside the text are not distinguished from real ones.
pub fn normalize_output(raw: Option<&str>) -> (usize, Vec<String>) {
    match raw {
        Some(text) if !text.is_empty() => {
            let lines: Vec<String> = text.lines().map(str::to_owned).collect();
            (lines.len(), lines)
        }
        _ => (0, Vec::new()),
    }
}
