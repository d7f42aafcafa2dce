//! Implicit Flow
//!
//! The implicit flow runs entirely in the browser. The server renders a page
//! carrying the client parameters; token acquisition and ID token checks are
//! done by the page script. Both page and script are compiled into the binary.

use async_trait::async_trait;
use serde::Serialize;
use std::convert::Infallible;

use crate::error::OidcError;
use crate::flows::FlowDriver;
use crate::types::ClientConfig;

const PAGE_TEMPLATE: &str = include_str!("../../static/implicit/index.html");
const CONTEXT_PLACEHOLDER: &str = "{{context}}";
const SCRIPT_PLACEHOLDER: &str = "{{script}}";

/// Browser side of the implicit flow.
pub const PAGE_SCRIPT: &str = include_str!("../../static/implicit/implicit.js");

/// Parameters embedded into the implicit page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImplicitContext {
    #[serde(rename = "ClientID")]
    pub client_id: String,
    /// Provider URL with one trailing slash removed; the page appends the
    /// well-known path itself.
    #[serde(rename = "DiscoveryURL")]
    pub discovery_url: String,
    #[serde(rename = "RootURL")]
    pub root_url: String,
    /// Space separated.
    #[serde(rename = "Scopes")]
    pub scopes: String,
}

impl ImplicitContext {
    pub fn from_config(config: &ClientConfig) -> Self {
        let provider = config.provider_url.as_str();
        Self {
            client_id: config.credentials.client_id.clone(),
            discovery_url: provider.strip_suffix('/').unwrap_or(provider).to_string(),
            root_url: config.root_url_str(),
            scopes: config.scope_param(),
        }
    }

    /// Render the implicit page with this context embedded as JSON and the
    /// page script loaded from `script_src`.
    pub fn render(&self, script_src: &str) -> Result<String, OidcError> {
        let json = serde_json::to_string(self).map_err(|e| {
            OidcError::Protocol(crate::error::ProtocolError::InvalidJson {
                message: e.to_string(),
            })
        })?;
        Ok(PAGE_TEMPLATE
            .replace(SCRIPT_PLACEHOLDER, &escape_attribute(script_src))
            .replace(CONTEXT_PLACEHOLDER, &escape_script_json(&json)))
    }
}

/// Make JSON safe to embed inside a `<script>` element.
fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Stateless implicit-flow driver.
pub struct ImplicitDriver {
    context: ImplicitContext,
    script_src: String,
}

impl ImplicitDriver {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            context: ImplicitContext::from_config(config),
            script_src: format!("{}/implicit.js", config.root_path()),
        }
    }

    pub fn context(&self) -> &ImplicitContext {
        &self.context
    }

    /// Absolute path the page loads [`PAGE_SCRIPT`] from.
    pub fn script_src(&self) -> &str {
        &self.script_src
    }
}

#[async_trait]
impl FlowDriver for ImplicitDriver {
    type Start = ();
    type Initiation = ImplicitContext;
    type Callback = Infallible;
    type Completion = ();
    type Error = Infallible;

    async fn initiate(&self, _start: ()) -> Result<ImplicitContext, OidcError> {
        Ok(self.context.clone())
    }

    /// Completion happens in the browser; nothing ever calls back.
    async fn finalize(&self, callback: Infallible) -> Result<(), Infallible> {
        match callback {}
    }
}
