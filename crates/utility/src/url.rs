/// Photos are stored either as absolute URLs or as bare Google Drive file ids.
pub const DRIVE_THUMBNAIL_URL: &str = "https://drive.google.com/thumbnail";

fn has_scheme(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Resolves a stored photo reference to a displayable URL.
/// Returns `None` for empty references.
pub fn photo_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else if has_scheme(value) {
        Some(value.to_owned())
    } else {
        Some(format!("{}?id={}&sz=w400", DRIVE_THUMBNAIL_URL, value))
    }
}

/// Prepends `https://` to website values entered without a scheme.
pub fn website_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else if has_scheme(value) {
        Some(value.to_owned())
    } else {
        Some(format!("https://{}", value))
    }
}
