//! Temporary files for config loading tests.

use std::io::Write;

use tempfile::NamedTempFile;

/// Write `contents` to a fresh temporary file with the given suffix
/// (e.g. `".yaml"`). The file is removed when the returned handle drops.
pub fn temp_file_with(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}
