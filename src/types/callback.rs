//! Callback Types
//!
//! Query parameters delivered to the authorization-code redirect URI.

use url::{form_urlencoded, Url};

/// Callback parameters from authorization redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code (if success).
    pub code: Option<String>,
    /// State parameter.
    pub state: Option<String>,
    /// Error code (if authorization failed).
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse callback parameters from URL.
    pub fn from_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or_default())
    }

    /// Parse callback parameters from a raw query string. Unknown keys are
    /// ignored; a repeated key keeps its first value.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            slot.get_or_insert_with(|| value.into_owned());
        }

        params
    }

    /// Check if callback contains an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_success() {
        let url = Url::parse("http://localhost:9009/auth/callback?code=abc&state=xyz&extra=1")
            .unwrap();
        let params = CallbackParams::from_url(&url);
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(!params.is_error());
    }

    #[test]
    fn test_from_query_repeated_key() {
        let params = CallbackParams::from_query("state=a&state=b&code=c");
        assert_eq!(params.state.as_deref(), Some("a"));
        assert_eq!(params.code.as_deref(), Some("c"));
        assert_eq!(CallbackParams::from_query(""), CallbackParams::default());
    }

    #[test]
    fn test_from_url_error() {
        let url = Url::parse(
            "http://localhost:9009/auth/callback?error=access_denied&error_description=User%20said%20no&state=xyz",
        )
        .unwrap();
        let params = CallbackParams::from_url(&url);
        assert!(params.is_error());
        assert_eq!(params.error_description.as_deref(), Some("User said no"));
        assert!(params.code.is_none());
    }
}
