//! Upload key derivation

/// Object key for an uploaded file: the last `/`-separated element of its name.
///
/// Trailing slashes are dropped first. An empty name yields `.` and a name made
/// only of slashes yields `/`. No other sanitization is applied.
pub fn upload_key(filename: &str) -> &str {
    if filename.is_empty() {
        return ".";
    }

    let trimmed = filename.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }

    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}
