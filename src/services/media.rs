//! Media classification and local-vs-remote resolution

use log::warn;

use crate::constants::VIDEO_EXTENSIONS;
use crate::services::cloudinary::{CloudinaryClient, UploadError};

/// Media type hint required by the publish protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "IMAGE",
            MediaKind::Video => "VIDEO",
        }
    }
}

/// A media attachment ready for the publish call.
#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub url: String,
    pub kind: MediaKind,
}

/// True when the path or URL carries a known video extension.
pub fn is_video_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Classify a path by extension; anything that is not a known video
/// counts as an image.
pub fn classify(path: &str) -> MediaKind {
    if is_video_path(path) {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// True when the cell holds something other than whitespace.
pub fn has_media(path: Option<&str>) -> bool {
    path.map(str::trim).is_some_and(|p| !p.is_empty())
}

fn is_remote_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Turns a sheet media cell into a publishable URL.
///
/// Remote URLs pass through untouched; local paths upload through
/// Cloudinary when an uploader is configured. A missing file or absent
/// uploader resolves to no media so the post degrades to text-only.
pub struct MediaResolver {
    cloudinary: Option<CloudinaryClient>,
}

impl MediaResolver {
    pub fn new(cloudinary: Option<CloudinaryClient>) -> Self {
        Self { cloudinary }
    }

    pub async fn resolve(&self, path: &str) -> Result<Option<ResolvedMedia>, UploadError> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(None);
        }

        if is_remote_url(path) {
            return Ok(Some(ResolvedMedia {
                url: path.to_string(),
                kind: classify(path),
            }));
        }

        let Some(cloudinary) = &self.cloudinary else {
            warn!("no upload credentials configured, skipping media {}", path);
            return Ok(None);
        };

        if tokio::fs::metadata(path).await.is_err() {
            warn!("media file not found: {}", path);
            return Ok(None);
        }

        let kind = classify(path);
        let url = cloudinary.upload(path, kind).await?;
        Ok(Some(ResolvedMedia { url, kind }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_video_extensions_classify_as_video() {
        for path in [
            "clip.mp4",
            "clip.MOV",
            "a/b/clip.avi",
            "clip.mkv",
            "clip.flv",
            "clip.wmv",
        ] {
            assert_eq!(classify(path), MediaKind::Video, "{path}");
        }
    }

    #[test]
    fn everything_else_classifies_as_image() {
        for path in ["photo.jpg", "photo.png", "photo.webp", "no-extension"] {
            assert_eq!(classify(path), MediaKind::Image, "{path}");
        }
    }

    #[test]
    fn remote_urls_are_detected_by_scheme() {
        assert!(is_remote_url("https://cdn.example.com/a.jpg"));
        assert!(is_remote_url("http://cdn.example.com/a.mp4"));
        assert!(!is_remote_url("photos/a.jpg"));
        assert!(!is_remote_url("/tmp/a.jpg"));
    }

    #[test]
    fn has_media_requires_non_blank_content() {
        assert!(has_media(Some("a.jpg")));
        assert!(!has_media(Some("   ")));
        assert!(!has_media(Some("")));
        assert!(!has_media(None));
    }

    #[tokio::test]
    async fn remote_url_passes_through_without_upload() {
        // No uploader configured: a remote URL must still resolve.
        let resolver = MediaResolver::new(None);
        let resolved = resolver
            .resolve("https://cdn.example.com/clip.mp4")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.url, "https://cdn.example.com/clip.mp4");
        assert_eq!(resolved.kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn missing_local_file_resolves_to_no_media() {
        let resolver = MediaResolver::new(None);
        let resolved = resolver.resolve("/definitely/not/here.png").await.unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn media_kind_renders_protocol_values() {
        assert_eq!(MediaKind::Image.as_str(), "IMAGE");
        assert_eq!(MediaKind::Video.as_str(), "VIDEO");
    }
}
