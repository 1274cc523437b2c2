//! HTTP basic authentication for the private document

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};
use core_config::docs::PrivateDocsCredentials;

/// Challenge sent with every 401
pub const BASIC_CHALLENGE: &str = r#"Basic realm="401""#;

/// Expected login/password pair
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    login: String,
    password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

impl BasicCredentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// `true` when `headers` carry a well-formed basic `Authorization` header
    /// whose login and password both match.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        headers
            .typed_get::<Authorization<Basic>>()
            .is_some_and(|auth| {
                auth.0.username() == self.login && auth.0.password() == self.password
            })
    }
}

impl From<&PrivateDocsCredentials> for BasicCredentials {
    fn from(credentials: &PrivateDocsCredentials) -> Self {
        Self::new(credentials.login.clone(), credentials.password.clone())
    }
}

/// 401 with a basic challenge and a plain-text body
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE))],
        "Authentication required",
    )
        .into_response()
}
