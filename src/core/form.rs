//! Form Requests
//!
//! Form encoding and client authentication for token-style endpoints.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::form_urlencoded;

use crate::core::transport::HttpRequest;
use crate::types::{ClientAuthMethod, ClientCredentials};

/// Encode key/value pairs as `application/x-www-form-urlencoded`.
pub fn encode_form<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// HTTP Basic credentials for a client, with both halves form-encoded
/// (RFC 6749 section 2.3.1).
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let id: String = form_urlencoded::byte_serialize(client_id.as_bytes()).collect();
    let secret: String = form_urlencoded::byte_serialize(client_secret.as_bytes()).collect();
    format!("Basic {}", STANDARD.encode(format!("{}:{}", id, secret)))
}

/// Build an authenticated form POST to a token-style endpoint.
///
/// Confidential clients authenticate with a Basic header; public clients send
/// `client_id` in the body.
pub fn client_form_request(
    url: &str,
    credentials: &ClientCredentials,
    params: &[(&str, &str)],
) -> HttpRequest {
    let mut pairs: Vec<(&str, &str)> = params.to_vec();

    match (credentials.auth_method(), credentials.secret()) {
        (ClientAuthMethod::ClientSecretBasic, Some(secret)) => {
            let body = encode_form(pairs);
            HttpRequest::post_form(url, body).header(
                "Authorization",
                basic_auth_header(&credentials.client_id, secret),
            )
        }
        _ => {
            pairs.push(("client_id", credentials.client_id.as_str()));
            HttpRequest::post_form(url, encode_form(pairs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_encode_form() {
        let body = encode_form([("grant_type", "authorization_code"), ("code", "a b&c")]);
        assert_eq!(body, "grant_type=authorization_code&code=a+b%26c");
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(
            basic_auth_header("client", "secret"),
            format!("Basic {}", STANDARD.encode("client:secret"))
        );
        assert_eq!(
            basic_auth_header("a:b", "c"),
            format!("Basic {}", STANDARD.encode("a%3Ab:c"))
        );
    }

    #[test]
    fn test_confidential_client_uses_basic() {
        let creds = ClientCredentials::new("client", Some(SecretString::new("secret".into())));
        let request = client_form_request(
            "https://idp.example.com/token",
            &creds,
            &[("grant_type", "refresh_token")],
        );
        assert!(request.headers.contains_key("Authorization"));
        assert_eq!(request.body.as_deref(), Some("grant_type=refresh_token"));
    }

    #[test]
    fn test_public_client_sends_client_id() {
        let creds = ClientCredentials::new("client", None);
        let request = client_form_request(
            "https://idp.example.com/token",
            &creds,
            &[("grant_type", "refresh_token")],
        );
        assert!(!request.headers.contains_key("Authorization"));
        assert_eq!(
            request.body.as_deref(),
            Some("grant_type=refresh_token&client_id=client")
        );
    }
}
