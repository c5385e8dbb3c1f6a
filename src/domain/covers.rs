use url::Url;

/// An uploaded cover file as received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedCover {
    pub content: Vec<u8>,
    pub content_type: String,
    pub original_name: String,
}

/// Where the cover image for a create/update request comes from.
///
/// Exactly one variant is active per request. Use [`CoverSource::from_parts`]
/// to construct: it collapses unusable inputs to `None` and applies the
/// uploaded-wins precedence, so callers never have to order null checks.
#[derive(Debug, Clone)]
pub enum CoverSource {
    None,
    UploadedBytes(UploadedCover),
    RemoteUrl(String),
}

impl CoverSource {
    /// Build a `CoverSource` from an optional uploaded file and an optional
    /// remote URL.
    ///
    /// A non-empty uploaded file always wins; the remote URL is considered
    /// only when no usable file is present. An empty payload or a blank or
    /// unparseable URL collapses to `CoverSource::None`.
    pub fn from_parts(file: Option<UploadedCover>, remote_url: Option<String>) -> Self {
        if let Some(file) = file
            && !file.content.is_empty()
        {
            return CoverSource::UploadedBytes(file);
        }

        if let Some(url) = remote_url {
            let trimmed = url.trim();
            if !trimmed.is_empty() && Url::parse(trimmed).is_ok() {
                return CoverSource::RemoteUrl(trimmed.to_string());
            }
        }

        CoverSource::None
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CoverSource::None)
    }
}

/// The result of cover resolution: the canonical public URL of the durable
/// object, or nothing when no cover source was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCover {
    url: Option<String>,
}

impl StoredCover {
    pub fn new(url: String) -> Self {
        Self { url: Some(url) }
    }

    pub fn empty() -> Self {
        Self { url: None }
    }

    pub fn into_url(self) -> Option<String> {
        self.url
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
