//! Command Line
//!
//! Arguments and environment for the `oidc-test-client` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::builders::{client_config, DEFAULT_ROOT_URL};
use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::OidcError;
use crate::telemetry::{LogFormat, LogLevel, LoggingConfig};
use crate::types::ClientConfig;

#[derive(Parser, Debug)]
#[command(
    name = "oidc-test-client",
    version,
    about = "Exercise OAuth2/OIDC flows against an identity provider"
)]
pub struct Cli {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Log level (RUST_LOG overrides)
    #[arg(long, env = "OIDC_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Log format: pretty, json or compact
    #[arg(long, env = "OIDC_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig::new()
            .with_level(self.log_level)
            .with_format(self.log_format)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP front (default)
    Serve,
    /// Run the device authorization flow from the terminal
    Device(DeviceArgs),
    /// Check the health endpoint of a running server
    Healthcheck,
}

/// Settings for the HTTP front.
#[derive(Args, Debug)]
pub struct ServerArgs {
    /// OAuth2 client id
    #[arg(long, env = "OIDC_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth2 client secret (empty for a public client)
    #[arg(long, env = "OIDC_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Issuer URL used for discovery
    #[arg(long = "provider", env = "OIDC_PROVIDER")]
    pub provider_url: Option<String>,

    /// Externally visible root URL; its path is the route prefix
    #[arg(long, env = "OIDC_ROOT_URL", default_value = DEFAULT_ROOT_URL)]
    pub root_url: String,

    /// Listen address
    #[arg(long, env = "OIDC_BIND", default_value = "localhost:9009")]
    pub bind: String,

    /// Refresh the tokens after the exchange
    #[arg(long, env = "OIDC_DO_REFRESH", default_value = "true", action = ArgAction::Set, value_parser = parse_toggle)]
    pub do_refresh: bool,

    /// Introspect the access token
    #[arg(long, env = "OIDC_DO_INTROSPECTION", default_value = "true", action = ArgAction::Set, value_parser = parse_toggle)]
    pub do_introspection: bool,

    /// Fetch user info with the access token
    #[arg(long, env = "OIDC_DO_USER_INFO", default_value = "true", action = ArgAction::Set, value_parser = parse_toggle)]
    pub do_user_info: bool,

    /// Verify provider TLS certificates
    #[arg(long, env = "OIDC_TLS_VERIFY", default_value = "true", action = ArgAction::Set, value_parser = parse_tls_verify)]
    pub tls_verify: bool,

    /// Comma-separated scopes to request instead of the defaults
    #[arg(long, env = "OIDC_SCOPES", value_delimiter = ',')]
    pub scopes: Vec<String>,

    /// Directory served under /static
    #[arg(long, env = "OIDC_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Outbound request timeout in seconds
    #[arg(long, env = "OIDC_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ServerArgs {
    /// Validate into a client configuration.
    pub fn client_config(&self) -> Result<ClientConfig, OidcError> {
        let mut builder = client_config()
            .root_url(self.root_url.clone())
            .scopes(clean_scopes(&self.scopes))
            .user_info_check(self.do_user_info)
            .introspection_check(self.do_introspection)
            .refresh_check(self.do_refresh)
            .tls_verify(self.tls_verify)
            .timeout(Duration::from_secs(self.timeout_secs));

        if let Some(client_id) = &self.client_id {
            builder = builder.client_id(client_id.clone());
        }
        if let Some(secret) = &self.client_secret {
            builder = builder.client_secret(secret.clone());
        }
        if let Some(provider_url) = &self.provider_url {
            builder = builder.provider_url(provider_url.clone());
        }

        builder.build()
    }

    /// URL checked by the `healthcheck` command.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.root_url.trim_end_matches('/'))
    }
}

/// Settings for the terminal device flow.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// OAuth2 client id
    #[arg(short = 'c', long, env = "OIDC_CLIENT_ID")]
    pub client_id: String,

    /// Device authorization endpoint
    #[arg(short = 'd', long)]
    pub device_url: String,

    /// Token endpoint
    #[arg(short = 'u', long = "code-url")]
    pub token_url: String,

    /// Scopes to request
    #[arg(short = 's', long, num_args = 1.., value_delimiter = ',')]
    pub scopes: Vec<String>,
}

/// Stage toggles are on only for a case-insensitive "true".
fn parse_toggle(value: &str) -> Result<bool, String> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

/// Certificate checks stay on unless explicitly "false".
fn parse_tls_verify(value: &str) -> Result<bool, String> {
    Ok(!value.trim().eq_ignore_ascii_case("false"))
}

fn clean_scopes(scopes: &[String]) -> Vec<String> {
    scopes
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// HEAD the health endpoint. Healthy means any status below 400.
pub async fn healthcheck(transport: &dyn HttpTransport, url: &str) -> bool {
    let mut request = HttpRequest::get(url);
    request.method = HttpMethod::Head;

    match transport.send(request).await {
        Ok(response) if response.status < 400 => true,
        Ok(response) => {
            tracing::warn!(status = response.status, url, "health check failed");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, url, "health check request failed");
            false
        }
    }
}
