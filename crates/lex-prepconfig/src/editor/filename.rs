use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static FILENAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]{0,127}$").expect("Invalid regex: output filename")
});

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("Invalid regex: unsafe chars"));

const MAX_STEM_LEN: usize = 80;

/// Accepts a user-chosen output name, appending `.csv` when missing and
/// lowercasing an upper-case `.CSV`.
///
/// Returns `None` when the name has characters outside `[A-Za-z0-9._-]`,
/// starts with a dot or is longer than 128 characters.
pub fn normalize_output_filename(name: &str) -> Option<String> {
    let trimmed = name.trim();
    let stem = match trimmed.len().checked_sub(4) {
        Some(split)
            if trimmed.is_char_boundary(split) && trimmed[split..].eq_ignore_ascii_case(".csv") =>
        {
            &trimmed[..split]
        }
        _ => trimmed,
    };
    let with_ext = format!("{stem}.csv");
    FILENAME_PATTERN.is_match(&with_ext).then_some(with_ext)
}

/// `{stem}_preprocessed_{YYYYmmdd_HHMMSS}.csv` for a source file.
pub fn suggested_output_filename(source: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let mut stem = UNSAFE_CHARS
        .replace_all(stem, "_")
        .trim_matches(['_', '.'])
        .to_string();
    if stem.is_empty() {
        stem = "dataset".to_string();
    }
    stem.truncate(MAX_STEM_LEN);

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("{stem}_preprocessed_{timestamp}.csv")
}
