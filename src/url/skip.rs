use url::Url;

/// Path suffixes of resources that never carry extractable page text
const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", // images
    "mp4", "webm", "avi", "mov", "wmv", "mkv", // video
    "mp3", "wav", "ogg", "flac", // audio
    "pdf", "docx", "pptx", "xlsx", // documents
];

/// Returns true if the URL points at an image, audio, video or office/PDF file
///
/// Only the path is inspected, so query strings and fragments do not hide the
/// extension. Unparseable input falls back to a plain suffix check.
///
/// # Examples
///
/// ```
/// use sitesift::url::is_media_resource;
///
/// assert!(is_media_resource("https://example.com/logo.PNG"));
/// assert!(is_media_resource("https://example.com/cv.pdf?download=1"));
/// assert!(!is_media_resource("https://example.com/about"));
/// ```
pub fn is_media_resource(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            MEDIA_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}
