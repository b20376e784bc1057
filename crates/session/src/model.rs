use bon::Builder;
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Access/refresh credentials handed out by the auth issuer.
///
/// The pair is always replaced as a whole, never field by field.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body returned by `/auth/login` and `/auth/register`.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct AuthSession {
    pub user: Profile,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Serialize, Debug)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Debug)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Everything needed to (re-)issue a call against the API.
#[derive(Builder, Clone, Debug)]
pub struct ApiRequest {
    #[builder(default = Method::GET)]
    pub method: Method,
    #[builder(into)]
    pub path: String,
    pub body: Option<Value>,
    #[builder(default)]
    pub headers: Vec<(String, String)>,
    #[builder(default = true)]
    pub auth: bool,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest::builder().path(path).build()
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        ApiRequest::builder()
            .method(Method::POST)
            .path(path)
            .body(body)
            .build()
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        ApiRequest::builder()
            .method(Method::PUT)
            .path(path)
            .body(body)
            .build()
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        ApiRequest::builder()
            .method(Method::PATCH)
            .path(path)
            .body(body)
            .build()
    }

    pub fn delete(path: impl Into<String>) -> Self {
        ApiRequest::builder()
            .method(Method::DELETE)
            .path(path)
            .build()
    }

    /// Marks the request as public: no bearer token, no refresh on 401.
    pub fn anonymous(mut self) -> Self {
        self.auth = false;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Error message advertised by the server, `message` first then `error`.
    pub fn error_message(&self) -> String {
        serde_json::from_slice::<Value>(&self.body)
            .ok()
            .and_then(|body| {
                ["message", "error"]
                    .iter()
                    .find_map(|key| body.get(key).and_then(Value::as_str).map(str::to_string))
            })
            .unwrap_or_else(|| "Request failed".to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Established,
    Refreshed,
    /// The refresh exchange failed; the UI should route to sign-in.
    Expired,
    SignedOut,
}
