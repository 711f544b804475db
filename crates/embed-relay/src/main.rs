//! Tableau embed relay: exchanges Tableau credentials for an embed token.
//!
//! The relay is configured with one deployment profile. On each request it:
//!
//! 1. Validates the credential pair the profile expects.
//! 2. Signs in to Tableau with it, on the profile's site.
//! 3. Signs a short-lived connected-app token for the embedding SDK.
//!
//! When `OKTA_ISSUER` is set it also serves the Okta authorization-code
//! routes, `GET /login` and `GET /authorization-code/callback`.

mod claims;
mod config;
mod error;
mod oidc;
mod profile;
mod secret;
mod tableau;

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use axum::extract::{Json, Query, State};
use axum::http::{Method, header};
use axum::response::Redirect;
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};
use tableau_embed_models::{SignInRequest, TokenResponse};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::claims::ClaimsSigner;
use crate::config::AppConfig;
use crate::error::{OidcError, RelayError};
use crate::oidc::OktaClient;
use crate::profile::DeploymentProfile;
use crate::tableau::TableauClient;

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// State shared across all Axum handlers. Read-only once built.
struct AppState {
    /// Deployment constants.
    profile: DeploymentProfile,
    /// Outbound Tableau sign-in client.
    tableau: TableauClient,
    /// Embed token signer.
    signer: ClaimsSigner,
    /// Inbound body limit in bytes.
    max_body_bytes: usize,
}

impl AppState {
    fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            profile: config.profile.clone(),
            tableau: TableauClient::new(config.signin_url.clone(), config.upstream_timeout)?,
            signer: ClaimsSigner::new(config.connected_app.clone(), config.profile.clone()),
            max_body_bytes: config.max_body_bytes,
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: liveness probe.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "status": "ok", "profile": state.profile.name() }))
}

/// `POST /tableau-signin`: relay credentials to Tableau and issue an embed token.
///
/// The body is parsed by hand rather than with the `Json` extractor so that
/// malformed input maps to this service's own 400 response.
async fn tableau_signin(
    State(state): State<Arc<AppState>>,
    body: Body,
) -> Result<Json<TokenResponse>, RelayError> {
    // 1. Read the body, bounded
    let bytes = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| RelayError::ReadBody(e.to_string()))?;
    info!(bytes = bytes.len(), "sign-in request received");

    // 2. Parse and validate the credential pair
    let request: SignInRequest =
        serde_json::from_slice(&bytes).map_err(RelayError::InvalidRequestBody)?;
    let kind = state.profile.credential_kind;
    let identity = request.credentials.identity(kind).unwrap_or_default().to_string();
    let payload = request
        .credentials
        .into_sign_in(kind, state.profile.site.clone())?;

    info!(
        identity = %identity,
        site = %state.profile.site,
        credential_kind = %kind,
        "authenticating with Tableau"
    );

    // 3. Sign in upstream
    state.tableau.sign_in(&payload).await?;

    // 4. Sign the embed token
    let jwt_token = state.signer.generate()?;
    info!(identity = %identity, "authentication successful, embed token issued");

    Ok(Json(TokenResponse { jwt_token }))
}

/// `GET /login`: send the browser to Okta.
async fn okta_login(State(okta): State<Arc<OktaClient>>) -> Redirect {
    let oauth_state = uuid::Uuid::new_v4().simple().to_string();
    info!("redirecting to Okta");
    Redirect::to(okta.authorize_url(&oauth_state).as_str())
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
}

/// `GET /authorization-code/callback`: swap Okta's code for an access token
/// and forward the browser to the dashboard with it.
async fn okta_callback(
    State(okta): State<Arc<OktaClient>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, OidcError> {
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(OidcError::MissingCode)?;

    let access_token = okta.exchange_code(&code).await?;
    info!("Okta sign-in complete, redirecting to dashboard");

    Ok(Redirect::to(okta.dashboard_redirect(&access_token).as_str()))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn cors_layer(config: &AppConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

fn okta_routes(okta: Arc<OktaClient>) -> Router {
    Router::new()
        .route("/login", get(okta_login))
        .route("/authorization-code/callback", get(okta_callback))
        .with_state(okta)
}

/// Build the full application from configuration.
fn build_app(config: &AppConfig) -> Result<Router, reqwest::Error> {
    let state = Arc::new(AppState::from_config(config)?);
    info!(signin_url = %state.tableau.signin_url(), "Tableau client ready");

    let mut app = Router::new()
        .route("/tableau-signin", post(tableau_signin))
        .route("/health", get(health))
        .with_state(state);

    if let Some(okta) = &config.okta {
        let client = OktaClient::new(okta.clone(), config.upstream_timeout)?;
        info!(authorize_url = %okta.authorize_url, "Okta authorization-code routes enabled");
        app = app.merge(okta_routes(Arc::new(client)));
    }

    Ok(app.layer(cors_layer(config)))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Configuration
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "refusing to start");
            return Err(e.into());
        }
    };

    info!(
        profile = %config.profile.name(),
        site = %config.profile.site,
        client_id = %config.connected_app.client_id,
        "relay configured"
    );
    if config.connected_app.secret_key.is_empty() {
        info!("CONNECTED_APP_SECRET_KEY is not set; sign-ins will fail at token signing");
    }

    let app = build_app(&config)?;

    let addr = format!("0.0.0.0:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(address = %addr, "relay listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
