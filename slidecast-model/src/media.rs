use std::fmt::{self, Display, Formatter};

/// Kind of media a post carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaKind {
    /// Still image (jpeg, png, webp, ...)
    Image,
    /// Video stream (mp4, webm, ...)
    Video,
    /// Animated gif
    Gif,
}

impl MediaKind {
    /// Guess the media kind from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "bmp" | "avif" => {
                Some(MediaKind::Image)
            }
            "gif" => Some(MediaKind::Gif),
            "mp4" | "webm" | "mov" | "m4v" | "mkv" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// Whether items of this kind are decoded like still images.
    ///
    /// Gifs are preloaded through the image lane.
    pub const fn is_image_like(self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Gif)
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Gif => write!(f, "gif"),
        }
    }
}

/// Opaque identifier assigned to a post by the remote content API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PostId(pub String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PostId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single slideshow item as returned by the content API.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Post {
    pub id: PostId,
    /// Full resolution media URL.
    pub file_url: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub preview_url: Option<String>,
    pub kind: MediaKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub width: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height: Option<u32>,
}

impl Post {
    /// Minimal post with no preview, tags or dimensions.
    pub fn new(
        id: impl Into<PostId>,
        file_url: impl Into<String>,
        kind: MediaKind,
    ) -> Self {
        Self {
            id: id.into(),
            file_url: file_url.into(),
            preview_url: None,
            kind,
            tags: Vec::new(),
            width: None,
            height: None,
        }
    }
}

impl From<String> for PostId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(MediaKind::from_extension("JPG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("webm"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("Gif"), Some(MediaKind::Gif));
        assert_eq!(MediaKind::from_extension("txt"), None);
    }

    #[test]
    fn gifs_ride_the_image_lane() {
        assert!(MediaKind::Gif.is_image_like());
        assert!(MediaKind::Image.is_image_like());
        assert!(!MediaKind::Video.is_image_like());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn post_deserializes_with_optional_fields_missing() {
        let post: Post = serde_json::from_str(
            r#"{"id":"42","file_url":"https://cdn.example/a.mp4","kind":"video"}"#,
        )
        .unwrap();
        assert_eq!(post.id, PostId::new("42"));
        assert_eq!(post.kind, MediaKind::Video);
        assert!(post.tags.is_empty());
        assert!(post.preview_url.is_none());
    }
}
