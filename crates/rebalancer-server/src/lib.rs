//! Portfolio Rebalancer server: wires the SurrealDB-backed account
//! workflow to an axum router.

pub mod config;
pub mod handlers;
pub mod mailer;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use rebalancer_auth::{AuthConfig, AuthService, Mailer};
use rebalancer_db::repository::{
    SurrealSessionRepository, SurrealTokenRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tower_http::trace::TraceLayer;

pub use mailer::AppMailer;

/// The account workflow over the SurrealDB stores.
pub type Accounts<M> = AuthService<
    SurrealUserRepository<Any>,
    SurrealTokenRepository<Any>,
    SurrealSessionRepository<Any>,
    M,
>;

/// Shared state handed to every handler.
pub struct ServerState<M: Mailer> {
    pub auth: Accounts<M>,
    pub default_scheme: String,
    pub session_max_age: i64,
    pub secure_cookie: bool,
}

impl<M: Mailer> ServerState<M> {
    pub fn new(
        db: Surreal<Any>,
        pepper: Option<String>,
        mailer: M,
        config: AuthConfig,
        default_scheme: impl Into<String>,
        secure_cookie: bool,
    ) -> Self {
        let users = match pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper),
            None => SurrealUserRepository::new(db.clone()),
        };
        let session_max_age = config.session_lifetime().num_seconds();
        let auth = AuthService::new(
            users,
            SurrealTokenRepository::new(db.clone()),
            SurrealSessionRepository::new(db),
            mailer,
            config,
        );
        Self {
            auth,
            default_scheme: default_scheme.into(),
            session_max_age,
            secure_cookie,
        }
    }
}

pub fn router<M: Mailer + 'static>(state: Arc<ServerState<M>>) -> Router {
    let api = Router::new()
        .route("/login", post(handlers::login::<M>))
        .route("/logout", post(handlers::logout::<M>))
        .route("/register", post(handlers::register::<M>))
        .route(
            "/email-available/{email}",
            get(handlers::email_available::<M>),
        )
        .route("/verify", post(handlers::verify::<M>))
        .route(
            "/send-verification-email",
            post(handlers::send_verification_email::<M>),
        )
        .route(
            "/send-password-reset",
            post(handlers::send_password_reset::<M>),
        )
        .route("/change-password", post(handlers::change_password::<M>))
        .route("/reset-password", post(handlers::reset_password::<M>));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
