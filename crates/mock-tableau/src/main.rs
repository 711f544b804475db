//! Stand-in for the Tableau REST sign-in endpoint.
//!
//! Accepts either credential pair on `POST /api/{version}/auth/signin` and
//! answers the way Tableau does, so the relay can be exercised end to end
//! without a Tableau Cloud site. A secret or password of `wrong` is refused.
//!
//! It also stands in for an Okta authorization server under
//! `/oauth2/default`, so the relay's code flow runs with
//! `OKTA_ISSUER=http://localhost:4100/oauth2/default`. Every authorize request
//! is approved; the code `wrong` is refused at the token endpoint.

use axum::{
    Form, Router,
    extract::{Json, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use clap::Parser;
use serde::Deserialize;
use serde_json::{Value, json};
use tableau_embed_models::{CredentialKind, CredentialPair, RawCredentials, SignInRequest};
use tracing::{info, warn};

/// Secret that the mock always rejects.
const REJECTED_SECRET: &str = "wrong";

/// Session lifetime reported in `estimatedTimeToExpiration`.
const SESSION_TTL_HOURS: i64 = 240;

/// Code issued by every approved authorize request.
const ISSUED_CODE: &str = "mock-code";

/// Okta access-token lifetime, in seconds.
const ACCESS_TOKEN_TTL_SECS: u64 = 3600;

/// Mock Tableau sign-in server.
#[derive(Parser, Debug)]
#[command(name = "mock-tableau", about = "Mock Tableau REST sign-in endpoint")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 4100)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "MOCK-TABLEAU: listening on http://localhost:{}/api/3.22/auth/signin",
        args.port
    );
    info!(
        "MOCK-TABLEAU: Okta issuer at http://localhost:{}/oauth2/default",
        args.port
    );
    axum::serve(listener, app()).await?;
    Ok(())
}

fn app() -> Router {
    Router::new()
        .route("/api/{version}/auth/signin", post(signin))
        .route("/oauth2/default/v1/authorize", get(authorize))
        .route("/oauth2/default/v1/token", post(token))
}

// --- Endpoints ---

async fn signin(Path(version): Path<String>, Json(req): Json<SignInRequest>) -> Response {
    let site = req
        .credentials
        .site
        .as_ref()
        .map(|s| s.content_url.clone())
        .unwrap_or_default();
    let kind = detect_kind(&req.credentials);

    let signin = match req.credentials.into_sign_in(kind, site.clone()) {
        Ok(signin) => signin,
        Err(e) => {
            warn!(api = %version, error = %e, "MOCK-TABLEAU: incomplete credentials");
            return tableau_error(StatusCode::BAD_REQUEST, "400000", "Bad Request", &e.to_string());
        }
    };

    let (user, secret) = match &signin.credentials.pair {
        CredentialPair::PersonalAccessToken {
            token_name,
            token_secret,
        } => (token_name, token_secret),
        CredentialPair::Password { name, password } => (name, password),
    };

    if secret == REJECTED_SECRET {
        warn!(api = %version, user = %user, "MOCK-TABLEAU: sign-in refused");
        return tableau_error(
            StatusCode::UNAUTHORIZED,
            "401001",
            "Signin Error",
            "Error signing in to Tableau Server",
        );
    }

    info!(api = %version, user = %user, site = %site, %kind, "MOCK-TABLEAU: sign-in accepted");
    (StatusCode::OK, Json(session_body(site.as_str()))).into_response()
}

#[derive(Deserialize)]
struct AuthorizeParams {
    client_id: Option<String>,
    redirect_uri: String,
    state: Option<String>,
}

async fn authorize(Query(params): Query<AuthorizeParams>) -> Redirect {
    info!(client_id = ?params.client_id, "MOCK-OKTA: authorize request approved");

    let separator = if params.redirect_uri.contains('?') { '&' } else { '?' };
    let state = params.state.unwrap_or_default();
    Redirect::to(&format!(
        "{}{separator}code={ISSUED_CODE}&state={state}",
        params.redirect_uri
    ))
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    code: String,
}

async fn token(Form(form): Form<TokenForm>) -> Response {
    if form.grant_type != "authorization_code" || form.code == REJECTED_SECRET {
        warn!(grant_type = %form.grant_type, "MOCK-OKTA: code refused");
        let body = json!({
            "error": "invalid_grant",
            "error_description": "The authorization code is invalid or has expired."
        });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    info!("MOCK-OKTA: code exchanged");
    Json(json!({
        "token_type": "Bearer",
        "expires_in": ACCESS_TOKEN_TTL_SECS,
        "access_token": format!("okta_{}", uuid::Uuid::new_v4().simple()),
        "scope": "tableau:views:embed",
    }))
    .into_response()
}

// --- Helpers ---

/// The pair a client sent; token fields win if both are present.
fn detect_kind(creds: &RawCredentials) -> CredentialKind {
    if creds.personal_access_token_name.is_some() || creds.personal_access_token_secret.is_some() {
        CredentialKind::PersonalAccessToken
    } else {
        CredentialKind::Password
    }
}

fn session_body(content_url: &str) -> Value {
    let ttl = Duration::hours(SESSION_TTL_HOURS);
    let expires_at = Utc::now() + ttl;

    json!({
        "credentials": {
            "site": { "id": uuid::Uuid::new_v4(), "contentUrl": content_url },
            "user": { "id": uuid::Uuid::new_v4() },
            "token": uuid::Uuid::new_v4().simple().to_string(),
            "estimatedTimeToExpiration": format_ttl(ttl),
            "expiresAt": expires_at.to_rfc3339(),
        }
    })
}

/// Tableau's `H:MM:SS` lifetime notation.
fn format_ttl(ttl: Duration) -> String {
    let secs = ttl.num_seconds();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn tableau_error(status: StatusCode, code: &str, summary: &str, detail: &str) -> Response {
    let body = json!({
        "error": { "code": code, "summary": summary, "detail": detail }
    });
    (status, Json(body)).into_response()
}
