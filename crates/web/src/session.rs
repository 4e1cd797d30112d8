use std::{error, fmt, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, OriginalUri, State},
    http::{header, request::Parts, Method, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use directory::{database::Database, Admin};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tower_cookies::{
    cookie::{time, SameSite},
    Cookie, Cookies,
};

use crate::{
    common::{RouteErrorResponse, RouteResult, Success},
    config::SessionConfig,
    WebState,
};

pub const SESSION_COOKIE: &str = "labmap_session";
const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug)]
pub enum SessionError {
    NotConfigured,
    InvalidCredentials,
    Token(jsonwebtoken::errors::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "no administrator is configured"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Token(why) => write!(f, "could not sign session token: {}", why),
        }
    }
}

impl error::Error for SessionError {}

/// Issues and verifies the signed tokens that identify the administrator.
pub struct Sessions {
    config: SessionConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Sessions {
    pub fn new(config: SessionConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding,
            decoding,
        }
    }

    /// Returns a token if the credentials match the configured administrator.
    /// Without configured credentials every login fails.
    pub fn login(&self, username: &str, password: &str) -> Result<String, SessionError> {
        let (Some(admin_username), Some(admin_password)) =
            (&self.config.admin_username, &self.config.admin_password)
        else {
            log::error!("ADMIN_USERNAME or ADMIN_PASSWORD is not set, rejecting login");
            return Err(SessionError::NotConfigured);
        };

        let username_matches = constant_time_eq(username, admin_username);
        let password_matches = constant_time_eq(password, admin_password);
        if !(username_matches && password_matches) {
            log::warn!("failed login attempt for user {}", username);
            return Err(SessionError::InvalidCredentials);
        }

        let expires = Utc::now() + self.config.ttl;
        let claims = Claims {
            sub: username.to_owned(),
            role: ADMIN_ROLE.to_owned(),
            exp: expires.timestamp().max(0) as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(SessionError::Token)
    }

    /// The administrator a token was issued to, if it is intact, unexpired
    /// and carries the admin role.
    pub fn verify(&self, token: &str) -> Option<Admin> {
        let claims = decode::<Claims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|why| log::debug!("rejected session token: {}", why))
        .ok()?
        .claims;

        (claims.role == ADMIN_ROLE).then(|| Admin::verified(claims.sub))
    }

    fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.config.ttl.num_seconds()))
            .build()
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

impl<D> FromRef<WebState<D>> for Arc<Sessions>
where
    D: Database + 'static,
{
    fn from_ref(state: &WebState<D>) -> Self {
        state.sessions.clone()
    }
}

/// Extracts the verified administrator of a request, from an
/// `Authorization: Bearer` header or the session cookie. Rejects with 401.
pub struct AdminSession(pub Admin);

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_owned())
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    Arc<Sessions>: FromRef<S>,
{
    type Rejection = RouteErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = Arc::<Sessions>::from_ref(state);

        let token = match bearer_token(parts) {
            Some(token) => Some(token),
            None => Cookies::from_request_parts(parts, state)
                .await
                .ok()
                .and_then(|cookies| {
                    cookies
                        .get(SESSION_COOKIE)
                        .map(|cookie| cookie.value().to_owned())
                }),
        };

        token
            .and_then(|token| sessions.verify(&token))
            .map(AdminSession)
            .ok_or_else(|| {
                let path = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|uri| uri.0.path().to_owned())
                    .unwrap_or_else(|| parts.uri.path().to_owned());
                RouteErrorResponse::unauthorized(&parts.method, path)
            })
    }
}

// routes

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub name: String,
    pub role: String,
    pub token: Option<String>,
}

pub(crate) fn routes<D>(state: WebState<D>) -> Router
where
    D: Database + 'static,
{
    Router::new()
        .route("/", get(current_session).post(login).delete(logout))
        .with_state(state)
}

async fn login(
    OriginalUri(original_uri): OriginalUri,
    State(sessions): State<Arc<Sessions>>,
    cookies: Cookies,
    Json(credentials): Json<Credentials>,
) -> RouteResult<Json<SessionDto>> {
    let token = sessions
        .login(credentials.username.trim(), &credentials.password)
        .map_err(|why| match why {
            SessionError::Token(_) => {
                log::error!("{}", why);
                RouteErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_default_message()
                    .with_method(&Method::POST)
                    .with_uri(original_uri.path())
            }
            _ => RouteErrorResponse::unauthorized(&Method::POST, original_uri.path())
                .with_message("Wrong username or password."),
        })?;

    cookies.add(sessions.cookie(token.clone()));
    log::info!("{} logged in", credentials.username.trim());

    Ok(Json(SessionDto {
        name: credentials.username.trim().to_owned(),
        role: ADMIN_ROLE.to_owned(),
        token: Some(token),
    }))
}

async fn current_session(AdminSession(admin): AdminSession) -> Json<SessionDto> {
    Json(SessionDto {
        name: admin.name().to_owned(),
        role: ADMIN_ROLE.to_owned(),
        token: None,
    })
}

async fn logout(cookies: Cookies) -> Json<Success> {
    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Success::json()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn sessions(username: Option<&str>, password: Option<&str>) -> Sessions {
        Sessions::new(SessionConfig {
            admin_username: username.map(str::to_owned),
            admin_password: password.map(str::to_owned),
            secret: "test secret".to_owned(),
            ttl: Duration::hours(1),
        })
    }

    #[test]
    fn login_issues_verifiable_token() {
        let sessions = sessions(Some("admin"), Some("hunter2"));
        let token = sessions.login("admin", "hunter2").unwrap();
        let admin = sessions.verify(&token).unwrap();
        assert_eq!(admin.name(), "admin");
    }

    #[test]
    fn wrong_credentials_are_rejected() {
        let sessions = sessions(Some("admin"), Some("hunter2"));
        assert!(matches!(
            sessions.login("admin", "hunter3"),
            Err(SessionError::InvalidCredentials)
        ));
        assert!(matches!(
            sessions.login("root", "hunter2"),
            Err(SessionError::InvalidCredentials)
        ));
    }

    #[test]
    fn credentials_compare_whole_strings() {
        assert!(constant_time_eq("hunter2", "hunter2"));
        assert!(!constant_time_eq("hunter2", "hunter3"));
        assert!(!constant_time_eq("hunter2", "hunter22"));
        assert!(!constant_time_eq("", "hunter2"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn unconfigured_admin_can_not_log_in() {
        let sessions = sessions(None, None);
        assert!(matches!(
            sessions.login("", ""),
            Err(SessionError::NotConfigured)
        ));
    }

    #[test]
    fn foreign_tokens_are_rejected() {
        let ours = sessions(Some("admin"), Some("hunter2"));
        let theirs = Sessions::new(SessionConfig {
            secret: "another secret".to_owned(),
            ..ours.config.clone()
        });

        let token = theirs.login("admin", "hunter2").unwrap();
        assert!(ours.verify(&token).is_none());
        assert!(ours.verify("not a token").is_none());
    }

    #[test]
    fn tokens_without_admin_role_are_rejected() {
        let sessions = sessions(Some("admin"), Some("hunter2"));
        let claims = Claims {
            sub: "visitor".to_owned(),
            role: "viewer".to_owned(),
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &sessions.encoding).unwrap();
        assert!(sessions.verify(&token).is_none());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let sessions = sessions(Some("admin"), Some("hunter2"));
        let claims = Claims {
            sub: "admin".to_owned(),
            role: ADMIN_ROLE.to_owned(),
            exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &sessions.encoding).unwrap();
        assert!(sessions.verify(&token).is_none());
    }
}
