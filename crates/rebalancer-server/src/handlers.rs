//! HTTP handlers: decode the request, run one workflow call, and map its
//! outcome onto a status code and JSON body.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::{COOKIE, HOST, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use rebalancer_auth::outcome::{
    EmailAvailability, LoginOutcome, PasswordOutcome, RegisterOutcome, SendPasswordResetOutcome,
    SendVerificationEmailOutcome, VerifyOutcome,
};
use rebalancer_auth::{IssuedSession, Mailer, RequestOrigin};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ServerState;

pub const SESSION_COOKIE_NAME: &str = "session";
const FORWARDED_PROTO: &str = "x-forwarded-proto";

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    pub email: String,
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct Reply {
    pub response: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Reply {
    fn code(response: &'static str) -> Self {
        Self {
            response,
            email: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Status mapping
// ---------------------------------------------------------------------------

fn login_status(outcome: &LoginOutcome) -> StatusCode {
    match outcome {
        LoginOutcome::NotFound | LoginOutcome::Failure => StatusCode::UNAUTHORIZED,
        LoginOutcome::EmailNotVerified(_) | LoginOutcome::Success(_) => StatusCode::OK,
    }
}

fn register_status(outcome: &RegisterOutcome) -> StatusCode {
    match outcome {
        RegisterOutcome::Conflict | RegisterOutcome::Failure | RegisterOutcome::LoginFailure => {
            StatusCode::CONFLICT
        }
        RegisterOutcome::LoginSuccess(_) => StatusCode::OK,
    }
}

fn verify_status(outcome: &VerifyOutcome) -> StatusCode {
    match outcome {
        VerifyOutcome::InvalidVerificationToken | VerifyOutcome::Failure => {
            StatusCode::UNAUTHORIZED
        }
        VerifyOutcome::Success(_) => StatusCode::OK,
    }
}

fn send_verification_status(outcome: SendVerificationEmailOutcome) -> StatusCode {
    match outcome {
        SendVerificationEmailOutcome::NotFound | SendVerificationEmailOutcome::Failure => {
            StatusCode::UNAUTHORIZED
        }
        SendVerificationEmailOutcome::Success => StatusCode::OK,
    }
}

fn send_reset_status(outcome: SendPasswordResetOutcome) -> StatusCode {
    match outcome {
        SendPasswordResetOutcome::NotFound => StatusCode::BAD_REQUEST,
        SendPasswordResetOutcome::Failure => StatusCode::CONFLICT,
        SendPasswordResetOutcome::Success => StatusCode::OK,
    }
}

fn password_status(outcome: PasswordOutcome) -> StatusCode {
    match outcome {
        PasswordOutcome::UserNotFound
        | PasswordOutcome::InvalidToken
        | PasswordOutcome::InvalidPassword
        | PasswordOutcome::Failure => StatusCode::UNAUTHORIZED,
        PasswordOutcome::Success => StatusCode::OK,
    }
}

fn availability_status(availability: EmailAvailability) -> StatusCode {
    match availability {
        EmailAvailability::Available => StatusCode::OK,
        EmailAvailability::Taken => StatusCode::CONFLICT,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Scheme and host that emailed links should point back to.
pub fn request_origin(headers: &HeaderMap, default_scheme: &str) -> RequestOrigin {
    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default_scheme);
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    RequestOrigin::new(scheme, host)
}

/// Value of the session cookie, if the request carries one.
pub fn session_secret(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(COOKIE)?.to_str().ok()?;
    value.split(';').find_map(|pair| {
        let (key, val) = pair.trim().split_once('=')?;
        (key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty())
            .then(|| val.trim().to_string())
    })
}

fn session_cookie(session: &IssuedSession, max_age: i64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        session.secret
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

fn clear_session_cookie(secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// JSON reply that also sets the session cookie when a session was
/// established.
fn reply_with_session<M: Mailer>(
    state: &ServerState<M>,
    status: StatusCode,
    code: &'static str,
    session: Option<&IssuedSession>,
) -> Response {
    let mut headers = HeaderMap::new();
    let body = match session {
        Some(session) => {
            match session_cookie(session, state.session_max_age, state.secure_cookie) {
                Some(cookie) => {
                    headers.insert(SET_COOKIE, cookie);
                }
                None => warn!("Session secret is not a valid header value"),
            }
            Reply {
                response: code,
                email: Some(session.email.clone()),
            }
        }
        None => Reply::code(code),
    };
    (status, headers, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn login<M: Mailer + 'static>(
    State(state): State<Arc<ServerState<M>>>,
    Json(body): Json<CredentialsBody>,
) -> Response {
    let outcome = state.auth.login(&body.email, &body.password).await;
    reply_with_session(&state, login_status(&outcome), outcome.code(), outcome.session())
}

pub async fn logout<M: Mailer + 'static>(
    State(state): State<Arc<ServerState<M>>>,
    headers: HeaderMap,
) -> Response {
    let code = match session_secret(&headers) {
        Some(secret) => state.auth.logout(&secret).await.code(),
        None => rebalancer_auth::outcome::LogoutOutcome::Success.code(),
    };
    let mut response_headers = HeaderMap::new();
    if let Some(cookie) = clear_session_cookie(state.secure_cookie) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::OK, response_headers, Json(Reply::code(code))).into_response()
}

pub async fn register<M: Mailer + 'static>(
    State(state): State<Arc<ServerState<M>>>,
    Json(body): Json<CredentialsBody>,
) -> Response {
    let outcome = state.auth.register(&body.email, &body.password).await;
    reply_with_session(
        &state,
        register_status(&outcome),
        outcome.code(),
        outcome.session(),
    )
}

pub async fn email_available<M: Mailer + 'static>(
    State(state): State<Arc<ServerState<M>>>,
    Path(email): Path<String>,
) -> Response {
    let availability = state.auth.is_email_available(&email).await;
    (availability_status(availability), Json(serde_json::json!({}))).into_response()
}

pub async fn verify<M: Mailer + 'static>(
    State(state): State<Arc<ServerState<M>>>,
    Json(body): Json<TokenBody>,
) -> Response {
    let outcome = state.auth.verify(&body.token).await;
    reply_with_session(&state, verify_status(&outcome), outcome.code(), outcome.session())
}

pub async fn send_verification_email<M: Mailer + 'static>(
    State(state): State<Arc<ServerState<M>>>,
    headers: HeaderMap,
    Json(body): Json<EmailBody>,
) -> Response {
    let origin = request_origin(&headers, &state.default_scheme);
    let outcome = state.auth.send_verification_email(&origin, &body.email).await;
    (
        send_verification_status(outcome),
        Json(Reply::code(outcome.code())),
    )
        .into_response()
}

pub async fn send_password_reset<M: Mailer + 'static>(
    State(state): State<Arc<ServerState<M>>>,
    headers: HeaderMap,
    Json(body): Json<EmailBody>,
) -> Response {
    let origin = request_origin(&headers, &state.default_scheme);
    let outcome = state.auth.send_password_reset(&origin, &body.email).await;
    (send_reset_status(outcome), Json(Reply::code(outcome.code()))).into_response()
}

pub async fn change_password<M: Mailer + 'static>(
    State(state): State<Arc<ServerState<M>>>,
    Json(body): Json<ChangePasswordBody>,
) -> Response {
    let outcome = state
        .auth
        .change_password(&body.email, &body.current_password, &body.new_password)
        .await;
    (password_status(outcome), Json(Reply::code(outcome.code()))).into_response()
}

pub async fn reset_password<M: Mailer + 'static>(
    State(state): State<Arc<ServerState<M>>>,
    Json(body): Json<ResetPasswordBody>,
) -> Response {
    let outcome = state
        .auth
        .reset_password(&body.token, &body.new_password)
        .await;
    (password_status(outcome), Json(Reply::code(outcome.code()))).into_response()
}
