//! Input validation for the `image_url` query parameter.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use crate::pipeline::PipelineError;

/// Query parameter carrying the source URL.
pub const IMAGE_URL_PARAM: &str = "image_url";

/// Optional scheme; host as domain labels with a 2+ letter TLD or an IPv4
/// literal; then optional port, path, query and fragment. Case folding is
/// ASCII only, so letters like `ſ` or the Kelvin sign never pass as `s`/`k`.
const URL_PATTERN: &str = concat!(
    r"(?i-u)^(https?://)?",
    r"((([a-z0-9]([a-z0-9-]*[a-z0-9])*)\.)+[a-z]{2,}|",
    r"(([0-9]{1,3}\.){3}[0-9]{1,3}))",
    r"(:[0-9]+)?(/[-a-z0-9%_.~+()]*)*",
    r"(\?[;&a-z0-9%_.~+=-]*)?",
    r"(#[-a-z0-9_]*)?$",
);

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(URL_PATTERN).unwrap_or_else(|err| panic!("invalid image URL regex: {err}"))
    })
}

/// True if `value` has the accepted URL shape.
pub fn is_valid_url(value: &str) -> bool {
    url_pattern().is_match(value)
}

/// A validated image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    image_url: String,
}

impl ImageRequest {
    /// Decode the raw query string and validate its `image_url`.
    ///
    /// The first `image_url` pair wins.
    pub fn from_query(raw_query: Option<&str>) -> Result<Self, PipelineError> {
        let value = raw_query.and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == IMAGE_URL_PARAM)
                .map(|(_, value)| value.into_owned())
        });
        Self::validate(value)
    }

    /// Validate an already-decoded parameter value.
    pub fn validate(value: Option<String>) -> Result<Self, PipelineError> {
        let image_url = match value {
            Some(v) if !v.is_empty() => v,
            _ => return Err(PipelineError::MissingImageUrl),
        };

        if !is_valid_url(&image_url) {
            return Err(PipelineError::InvalidUrl(image_url));
        }

        Ok(Self { image_url })
    }

    /// The value exactly as the caller sent it.
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// URL to hand to the transport. Scheme-less values are fetched over plain http.
    pub fn fetch_url(&self) -> Cow<'_, str> {
        let lower = self.image_url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Cow::Borrowed(&self.image_url)
        } else {
            Cow::Owned(format!("http://{}", self.image_url))
        }
    }
}
