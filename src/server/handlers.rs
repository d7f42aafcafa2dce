//! Route handlers.

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::error::FinalizeError;
use crate::flows::{AuthCallback, FlowDriver, PAGE_SCRIPT};
use crate::server::AppState;
use crate::types::CallbackParams;

/// Fixed liveness body.
pub const HEALTH_BODY: &str = "hello :)";

/// `302 Found` to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn internal_error(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}

/// Start the authorization-code flow.
pub async fn initiate(State(state): State<AppState>, jar: PrivateCookieJar) -> Response {
    let previous = state.sessions.load(&jar);

    let redirect = match state.auth_code.initiate(previous).await {
        Ok(redirect) => redirect,
        Err(e) => {
            tracing::error!(error = %e, "failed to build authorization request");
            return internal_error(e.to_string());
        }
    };

    match state.sessions.save(jar, &redirect.session) {
        Ok(jar) => (jar, found(&redirect.url)).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to save session");
            internal_error(e.to_string())
        }
    }
}

/// Finalize the authorization-code flow and write the report.
///
/// The session cookie is cleared unless the callback was turned away for a
/// missing or mismatched `state`.
pub async fn callback(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    uri: Uri,
) -> Response {
    let session = state.sessions.load(&jar);
    let params = CallbackParams::from_query(uri.query().unwrap_or_default());

    let result = state.auth_code.finalize(AuthCallback { session, params }).await;
    let jar = match &result {
        Err(e) if !e.spends_session() => jar,
        _ => state.sessions.clear(jar),
    };

    match result {
        Ok(report) => match report.to_pretty_json() {
            Ok(body) => {
                (jar, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to marshal response");
                (jar, internal_error(e.to_string())).into_response()
            }
        },
        Err(FinalizeError::Rejected(_)) => (jar, found(&state.start_path())).into_response(),
        Err(FinalizeError::Internal(e)) => (jar, internal_error(e.to_string())).into_response(),
    }
}

/// Render the implicit-flow page.
pub async fn implicit(State(state): State<AppState>) -> Response {
    let context = match state.implicit.initiate(()).await {
        Ok(context) => context,
        Err(e) => return internal_error(e.to_string()),
    };

    match context.render(state.implicit.script_src()) {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render implicit template");
            internal_error(e.to_string())
        }
    }
}

pub async fn implicit_script() -> Response {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        PAGE_SCRIPT,
    )
        .into_response()
}

pub async fn implicit_redirect(State(state): State<AppState>) -> Response {
    found(&format!("{}/implicit/", state.root_path))
}

pub async fn health() -> &'static str {
    HEALTH_BODY
}

/// Anything else under the root path starts a new flow.
pub async fn fallback(state: State<AppState>, jar: PrivateCookieJar, uri: Uri) -> Response {
    if state.is_under_root(uri.path()) {
        initiate(state, jar).await
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
