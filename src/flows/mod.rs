//! Flow Drivers
//!
//! The three ways this client obtains tokens from the provider:
//!
//! - **Authorization Code** (RFC 6749 Section 4.1): server-mediated, stateful,
//!   produces a [`crate::report::FlowReport`]
//! - **Implicit**: browser-side; the server only renders the page context
//! - **Device Authorization** (RFC 8628): polling, for terminal use
//!
//! Every driver implements [`FlowDriver`]; the HTTP front and the CLI pick a
//! driver by route or command, never by inspecting a driver at runtime.

pub mod authorization_code;
pub mod device;
pub mod implicit;

use async_trait::async_trait;

use crate::error::OidcError;

pub use authorization_code::{AuthCallback, AuthorizationCodeDriver, AuthorizationRedirect};
pub use device::{DeviceCodeRequest, DeviceDriver, DEVICE_SLOW_DOWN_STEP};
pub use implicit::{ImplicitContext, ImplicitDriver, PAGE_SCRIPT};

/// Common initiate/finalize contract.
#[async_trait]
pub trait FlowDriver: Send + Sync {
    /// Input that starts a flow.
    type Start: Send;
    /// What the caller needs to hand the flow to the user.
    type Initiation: Send;
    /// Input that completes a flow.
    type Callback: Send;
    /// Terminal result of a successful flow.
    type Completion: Send;
    /// Failure of the completing step.
    type Error: std::error::Error + Send;

    /// Begin a flow.
    async fn initiate(&self, start: Self::Start) -> Result<Self::Initiation, OidcError>;

    /// Complete a flow.
    async fn finalize(&self, callback: Self::Callback) -> Result<Self::Completion, Self::Error>;
}
