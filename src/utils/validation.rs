use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Generated media names: a lowercase hyphenated UUID with an optional extension.
static MEDIA_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}(\.[A-Za-z0-9_]+)?$")
        .expect("media filename pattern is valid")
});

/// Checks that a media reference names a file this server generated.
///
/// Only such names are ever deleted, so anything smuggled into a story's
/// url fields (`../../etc/passwd`, absolute paths, client names) is refused.
pub fn is_valid_media_filename(name: Option<&str>) -> bool {
    match name {
        Some(name) if !name.is_empty() => MEDIA_FILENAME.is_match(name),
        _ => false,
    }
}

/// Extension (with leading dot) to keep when renaming an upload.
///
/// Returns an empty string when the original name has no extension or the
/// extension contains anything other than word characters, so generated
/// names always pass [`is_valid_media_filename`].
pub fn upload_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}
