// Hive API session
//
// Holds the credentials and the session token issued at login, decorates
// every outgoing request with the vendor media type, client header and
// token, and turns non-success responses into `Error`s parsed from the
// `{errors: [...]}` envelope. `request_with_retry` survives a token that
// expired mid-session by logging in again and replaying the request once.

use std::sync::{PoisonError, RwLock};

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, ErrorCode};
use crate::models::{ErrorEnvelope, LoginCredentials, LoginRequest, LoginResponse, SessionInfo};
use crate::transport::TransportConfig;

/// Live URL of the v6 Hive API.
pub const DEFAULT_URL: &str = "https://api-prod.bgchprod.info";

/// Versioned media type used for both `Accept` and `Content-Type`.
pub const MEDIA_TYPE: &str = "application/vnd.alertme.zoo-6.1+json";

pub const CLIENT_HEADER: &str = "X-Omnia-Client";
pub const CLIENT_NAME: &str = "Hive Web Dashboard";
pub const TOKEN_HEADER: &str = "X-Omnia-Access-Token";

pub const LOGIN_PATH: &str = "/omnia/auth/sessions";
const CALLER: &str = "WEB";

/// An authenticated connection to the Hive API.
///
/// The token is empty until [`login`](Self::login) succeeds, and is cleared
/// again when a login fails. Requests other than the login itself are
/// refused locally while no token is held.
#[derive(Debug)]
pub struct Session {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    token: RwLock<Option<SecretString>>,
}

impl Session {
    /// Create a session with a client built from `transport`. Does not log in.
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, username, password))
    }

    /// Create a session around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username: username.into(),
            password,
            token: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether a session token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn set_token(&self, token: Option<SecretString>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.expose_secret().to_owned())
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Authenticate with username/password and store the session token.
    ///
    /// Succeeds only if the API returns exactly one session object.
    pub async fn login(&self) -> Result<SessionInfo, Error> {
        self.set_token(None);

        let body = encode(&LoginRequest {
            sessions: [LoginCredentials {
                username: &self.username,
                password: self.password.expose_secret(),
                caller: CALLER,
            }],
        })?;

        debug!(username = %self.username, "logging in");

        let resp = self
            .execute(Method::POST, LOGIN_PATH, Some(body), false)
            .await
            .map_err(|e| e.with_op("login: request"))?;

        let response: LoginResponse = decode(resp)
            .await
            .map_err(|e| e.with_op("login: decode"))?;

        let [session] = <[SessionInfo; 1]>::try_from(response.sessions).map_err(|sessions| {
            Error::InvalidLoginResponse {
                sessions: sessions.len(),
            }
            .with_op("login")
        })?;

        self.set_token(Some(SecretString::from(session.session_id.clone())));
        debug!(user_id = %session.user_id, "login successful");
        Ok(session)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Send one request with the session token attached.
    ///
    /// Non-success responses are decoded from the error envelope: the first
    /// entry's code and title become the error.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Response, Error> {
        self.execute(method, path, body, true).await
    }

    /// Like [`request`](Self::request), but on `NOT_AUTHORIZED` logs in
    /// again and replays the same request exactly once.
    ///
    /// Bodies are `Bytes`, so the replay always sends the complete body.
    /// A second authorization failure is returned unmodified.
    pub async fn request_with_retry(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Response, Error> {
        match self.request(method.clone(), path, body.clone()).await {
            Err(err) if err.is_not_authorized() => {
                info!(%method, path, "session not authorized, logging in again");
                self.login().await?;
                self.request(method, path, body).await
            }
            other => other,
        }
    }

    /// GET `path` through the retry path and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.request_with_retry(Method::GET, path, None).await?;
        decode(resp).await
    }

    /// Send `body` as JSON through the retry path and decode the response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let bytes = encode(body)?;
        let resp = self.request_with_retry(method, path, Some(bytes)).await?;
        decode(resp).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
        require_session: bool,
    ) -> Result<Response, Error> {
        let token = self.current_token();
        if require_session && token.is_none() {
            return Err(Error::NoSession);
        }

        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::from(e).with_op("session: request"))?;

        debug!("{} {}", method, url);

        let sends_body = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(&method);

        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT, MEDIA_TYPE)
            .header(CLIENT_HEADER, CLIENT_NAME);

        if sends_body {
            builder = builder.header(CONTENT_TYPE, MEDIA_TYPE);
        }
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| Error::from(e).with_op("session: response"))?;

        check_response(resp).await
    }
}

/// Pass success responses through; decode everything else from the error
/// envelope.
async fn check_response(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    let envelope: ErrorEnvelope =
        serde_json::from_str(&body).map_err(|e| Error::InvalidJson {
            message: format!("error response (HTTP {status}): {e}"),
            body: body.clone(),
        })?;

    match envelope.errors.into_iter().next() {
        Some(entry) => Err(Error::Api {
            code: ErrorCode::from_wire(&entry.code),
            message: entry.title,
            status: status.as_u16(),
        }),
        None => Err(Error::UnknownErrorResponse {
            status: status.as_u16(),
        }),
    }
}

/// Read a response body and decode it as JSON.
pub(crate) async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    let body = resp.text().await.map_err(Error::Transport)?;

    serde_json::from_str(&body).map_err(|e| {
        let preview = body.chars().take(200).collect::<String>();
        Error::InvalidJson {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

pub(crate) fn encode(body: &impl Serialize) -> Result<Bytes, Error> {
    serde_json::to_vec(body).map(Bytes::from).map_err(Error::Encode)
}
