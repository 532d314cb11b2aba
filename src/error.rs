//! Error types for the family tree viewer
//!
//! Every failure is logged where it is detected and surfaced as a value;
//! nothing in the viewer unwinds through calling code.

use thiserror::Error;

/// Top-level viewer error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    /// Operation attempted before a graphic finished loading
    #[error("SVG element not found. Make sure the SVG is loaded.")]
    NotLoaded,

    /// Identifier is absent from the loaded graphic
    #[error("Member with ID \"{0}\" not found in SVG")]
    ElementNotFound(String),

    /// Identifier exists but lacks the selectable member marker
    #[error("Element with ID \"{0}\" is not a member element")]
    NotAMember(String),

    /// Empty or otherwise unusable member identifier
    #[error("Invalid member ID provided")]
    InvalidMemberId,

    /// Network failure or non-2xx response
    #[error("fetch of {url} failed: {reason}")]
    FetchFailed { url: String, reason: String },

    /// A single image could not be inlined during export (non-fatal)
    #[error("failed to embed image {href}: {reason}")]
    ImageEmbedFailed { href: String, reason: String },

    /// Markup is not a usable SVG document
    #[error("invalid SVG graphic: {0}")]
    InvalidGraphic(String),

    /// Serialization of the exported document failed
    #[error("SVG serialization failed: {0}")]
    Serialize(String),

    /// Member data could not be read
    #[error("member data error: {0}")]
    Data(String),

    /// Client-side download could not be triggered
    #[error("download failed: {0}")]
    Download(String),

    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

impl ViewerError {
    pub fn fetch(url: &str, reason: impl Into<String>) -> Self {
        ViewerError::FetchFailed {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<quick_xml::Error> for ViewerError {
    fn from(e: quick_xml::Error) -> Self {
        ViewerError::Serialize(e.to_string())
    }
}

impl From<serde_yaml::Error> for ViewerError {
    fn from(e: serde_yaml::Error) -> Self {
        ViewerError::Data(e.to_string())
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(e: serde_json::Error) -> Self {
        ViewerError::Data(e.to_string())
    }
}
