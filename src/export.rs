//! Download naming for generated packages

pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const FALLBACK_STEM: &str = "ieee_paper";

/// Filename derived from the title: unsafe characters become `_`, the stem
/// is capped at `max_len` characters.
pub fn suggested_filename(title: &str, max_len: usize) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' };
        if c == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(c);
    }

    let stem: String = stem.trim_matches('_').chars().take(max_len).collect();
    let stem = stem.trim_end_matches('_');
    if stem.is_empty() {
        format!("{}.docx", FALLBACK_STEM)
    } else {
        format!("{}.docx", stem)
    }
}
