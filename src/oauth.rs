//! OAuth 2.0 handling: application credentials, the browser authorization
//! flow, token refresh, and the on-disk token cache.
//!
//! The rest of the tool treats this module as a black box whose only output
//! is an authenticated [`YouTubeClient`]; see [`authenticated_client`].

use crate::youtube_api::client::{RefreshableToken, YouTubeClient};
use eyre::Context;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use oauth2::basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    Scope, TokenUrl, reqwest,
};
use serde::Deserialize;
use std::path::Path;
use tokio::net::TcpListener;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth2 token endpoint, used for both the initial exchange and
/// refreshes.
const TOKEN_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/token";

/// Full read/write access to the user's YouTube account; playlist creation
/// needs write.
const SCOPE: &str = "https://www.googleapis.com/auth/youtube";

/// Shown in the browser tab once the redirect has delivered the code.
const AUTHORIZED_PAGE: &str = include_str!("../oauth_success.html");

/// OAuth client credentials in Google's "installed application" download
/// format (the `credentials.json` file from the developer console).
///
/// For installed applications using PKCE the client secret is shipped to
/// the user alongside the client id and is not actually secret.
#[derive(Debug, Clone, Deserialize)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: AppCredentials,
}

impl AppCredentials {
    pub async fn load(path: &Path) -> eyre::Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.with_context(|| {
            format!(
                "read OAuth client credentials from {}; download them for an \
                 installed application from the Google developer console",
                path.display()
            )
        })?;
        let parsed: CredentialsFile =
            serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
        Ok(parsed.installed)
    }
}

/// Runs OAuth flows against Google's endpoints for one application.
#[derive(Debug)]
pub struct OAuthBroker {
    app: AppCredentials,
}

impl OAuthBroker {
    pub fn new(app: AppCredentials) -> Self {
        Self { app }
    }

    /// Performs the full interactive authorization flow: opens the user's
    /// browser, receives the redirect on a localhost listener, and
    /// exchanges the authorization code (with PKCE) for a token.
    pub async fn authenticate(&self) -> eyre::Result<BasicTokenResponse> {
        let socket = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind OAuth redirect listener")?;
        let addr = socket.local_addr().context("resolve redirect address")?;
        let redirect = RedirectUrl::new(format!("http://{}:{}", addr.ip(), addr.port()))
            .context("construct redirect url")?;

        let csrf = CsrfToken::new_random();
        let pending = tokio::spawn(receive_authorization_code(socket, csrf.clone()));

        let client = BasicClient::new(ClientId::new(self.app.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.app.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(AUTH_ENDPOINT.to_string())
                    .expect("static authorization endpoint is well-formed"),
            )
            .set_token_uri(
                TokenUrl::new(TOKEN_ENDPOINT.to_string())
                    .expect("static token endpoint is well-formed"),
            )
            .set_redirect_uri(redirect);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _state) = client
            // the flow runs exactly once, so the CSRF token is never re-used
            .authorize_url(move || csrf.clone())
            .add_scope(Scope::new(SCOPE.to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "waiting for the user to authorize YouTube access");
        if webbrowser::open(auth_url.as_ref()).is_err() {
            eprintln!("Open this URL to authorize YouTube access:\n{auth_url}");
        }

        let code = pending
            .await
            .context("join redirect listener")?
            .context("receive authorization code")?;

        let token = client
            .exchange_code(code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&no_redirect_http())
            .await
            .context("exchange authorization code for an access token")?;
        Ok(token)
    }

    /// Attempts to refresh `token` without user interaction.
    ///
    /// Returns `Ok(None)` when there is no refresh token or the platform
    /// reports it as an invalid grant; the caller should fall back to
    /// [`Self::authenticate`].
    pub(crate) async fn refresh(
        &self,
        token: &BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        use oauth2::TokenResponse;

        let Some(refresh_token) = token.refresh_token() else {
            tracing::warn!("stored token carries no refresh token");
            return Ok(None);
        };

        // Refresh needs only the token endpoint, no redirect.
        let client = BasicClient::new(ClientId::new(self.app.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.app.client_secret.clone()))
            .set_token_uri(
                TokenUrl::new(TOKEN_ENDPOINT.to_string())
                    .expect("static token endpoint is well-formed"),
            );

        match client
            .exchange_refresh_token(refresh_token)
            .request_async(&no_redirect_http())
            .await
        {
            Ok(new_token) => Ok(Some(new_token)),
            Err(ref e @ oauth2::RequestTokenError::ServerResponse(ref response))
                if matches!(response.error(), BasicErrorResponseType::InvalidGrant) =>
            {
                tracing::warn!("refresh token rejected as invalid grant: {e}");
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }
}

/// Produces an authenticated [`YouTubeClient`], reusing the locally cached
/// token when possible and falling back to the browser flow.
///
/// The (possibly refreshed) token is written back to `token_file` so the
/// next invocation skips the browser. Any failure here is fatal to the run;
/// nothing proceeds without a working client.
pub async fn authenticated_client(
    credentials_file: &Path,
    token_file: &Path,
) -> eyre::Result<YouTubeClient> {
    let app = AppCredentials::load(credentials_file).await?;
    let broker = OAuthBroker::new(app);

    let token = match load_cached_token(token_file).await? {
        Some(cached) => {
            // A cached token is almost certainly past its one-hour lifetime
            // by the next cron invocation, so refresh up front.
            let mut token = RefreshableToken::stale(cached);
            if token
                .refresh(&broker)
                .await
                .context("refresh cached YouTube token")?
            {
                token
            } else {
                tracing::warn!("cached token no longer refreshable, starting browser authorization");
                RefreshableToken::fresh(
                    broker
                        .authenticate()
                        .await
                        .context("authorize YouTube access")?,
                )
            }
        }
        None => RefreshableToken::fresh(
            broker
                .authenticate()
                .await
                .context("authorize YouTube access")?,
        ),
    };

    let client = YouTubeClient::new(token, broker);
    client
        .validate_token()
        .await
        .context("validate YouTube token")?;
    store_token(token_file, &client.token().await).await?;
    Ok(client)
}

async fn load_cached_token(path: &Path) -> eyre::Result<Option<BasicTokenResponse>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).context(format!("read token file {}", path.display())),
    };
    let token = serde_json::from_str(&raw)
        .with_context(|| format!("parse token file {}", path.display()))?;
    Ok(Some(token))
}

async fn store_token(path: &Path, token: &BasicTokenResponse) -> eyre::Result<()> {
    let json = serde_json::to_string_pretty(token).context("serialize OAuth token")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("write token file {}", path.display()))?;
    Ok(())
}

/// Accepts one connection on the redirect listener, validates the CSRF
/// state, and hands back the authorization code from the query string.
async fn receive_authorization_code(
    socket: TcpListener,
    csrf: CsrfToken,
) -> eyre::Result<AuthorizationCode> {
    let (conn, _) = socket
        .accept()
        .await
        .context("accept OAuth redirect connection")?;
    let conn = hyper_util::rt::TokioIo::new(conn);

    let (delivered, mut delivery) = tokio::sync::mpsc::channel(1);
    let service = service_fn(move |req: Request<body::Incoming>| {
        let csrf = csrf.clone();
        let delivered = delivered.clone();
        async move {
            let mut state = None;
            let mut code = None;
            for (key, value) in form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes()) {
                match &*key {
                    "state" => state = Some(value),
                    "code" => code = Some(value),
                    _ => {}
                }
            }
            if state.as_deref() != Some(csrf.secret().as_str()) {
                return Err("authorization state mismatch");
            }
            let Some(code) = code else {
                return Err("authorization response carried no code");
            };
            let _ = delivered
                .send(AuthorizationCode::new(code.into_owned()))
                .await;
            Ok(Response::new(Full::<Bytes>::from(AUTHORIZED_PAGE)))
        }
    });

    let mut serving = std::pin::pin!(
        hyper::server::conn::http1::Builder::new().serve_connection(conn, service)
    );
    tokio::select! {
        served = &mut serving => {
            match served {
                Ok(()) => eyre::bail!("redirect listener closed before delivering a code"),
                Err(e) => Err(e).context("serve OAuth redirect"),
            }
        }
        code = delivery.recv() => {
            serving.graceful_shutdown();
            Ok(code.expect("sender is alive until the service is dropped"))
        }
    }
}

/// Plain HTTP client for the token endpoints. The endpoints never redirect
/// legitimately, so redirects stay off.
fn no_redirect_http() -> reqwest::Client {
    reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("building reqwest client should not fail")
}
