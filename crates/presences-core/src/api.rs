//! Blocking client for the member management API.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::model::{Event, EventMember, Member};

const USER_AGENT: &str = concat!("presences/", env!("CARGO_PKG_VERSION"));

/// Read-only view of the remote API used by the report pipeline.
pub trait AttendanceApi {
    fn events_page(&self, page: i32, limit: u32) -> Result<Vec<Event>>;
    fn members(&self) -> Result<Vec<Member>>;
    fn event_members(&self, event_uuid: &str) -> Result<Vec<EventMember>>;
}

pub fn build_client() -> Result<Client> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

/// Authenticated context: base URL plus the bearer token obtained at login.
#[derive(Clone)]
pub struct Session {
    base_url: String,
    token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Exchange credentials for an access token. Any failure here is fatal for the run.
    pub fn login(client: &Client, credentials: &Credentials) -> Result<Self> {
        let url = format!("{}login", credentials.base_url);
        info!(username = %credentials.username, "Logging in");

        let response = client
            .post(&url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .map_err(|err| Error::Auth(format!("login request failed: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| Error::Auth(format!("failed to read login response: {err}")))?;
        if !status.is_success() {
            return Err(Error::Auth(format!("login responded with {status}")));
        }

        let token = parse_login_body(&body)?;
        Ok(Self::new(credentials.base_url.clone(), token))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Value of the `Authorization` header expected by the upstream API.
    pub fn authorization(&self) -> String {
        format!("Bearer: {}", self.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn parse_login_body(body: &str) -> Result<String> {
    let parsed: LoginResponse = serde_json::from_str(body)
        .map_err(|err| Error::Auth(format!("unparseable login response: {err}")))?;
    parsed
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::Auth("login response has no access_token".to_string()))
}

pub fn events_path(page: i32, limit: u32) -> String {
    format!("events?page={page}&limit={limit}")
}

pub fn event_members_path(event_uuid: &str) -> String {
    format!("events/{}/members", urlencoding::encode(event_uuid))
}

/// `AttendanceApi` over HTTP, one attempt per call.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    session: Session,
}

impl HttpApi {
    pub fn new(client: Client, session: Session) -> Self {
        Self { client, session }
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.session.url(path);
        debug!(url = %url, "GET");
        let request = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.session.authorization());
        decode(send(request, &url)?, &url)
    }
}

fn send(request: RequestBuilder, url: &str) -> Result<Response> {
    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::remote(format!("GET {url} responded with {status}")));
    }
    Ok(response)
}

fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let body = response.text()?;
    serde_json::from_str(&body)
        .map_err(|err| Error::remote(format!("malformed JSON from {url}: {err}")))
}

impl AttendanceApi for HttpApi {
    fn events_page(&self, page: i32, limit: u32) -> Result<Vec<Event>> {
        self.get(&events_path(page, limit))
    }

    fn members(&self) -> Result<Vec<Member>> {
        self.get("members")
    }

    fn event_members(&self, event_uuid: &str) -> Result<Vec<EventMember>> {
        self.get(&event_members_path(event_uuid))
    }
}
