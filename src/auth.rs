use crate::{
    config::{Config, UserConfig},
    error::AppError,
};
use arc_swap::ArcSwap;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::{convert::Infallible, fmt, sync::Arc};
use subtle::ConstantTimeEq;

pub type UserId = u64;

/// Who is making the request
///
/// Anonymous callers have no id and are never staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: Option<UserId>,
    username: String,
    is_staff: bool,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            username: String::new(),
            is_staff: false,
        }
    }

    pub fn user(id: UserId, username: impl Into<String>, is_staff: bool) -> Self {
        Self {
            id: Some(id),
            username: username.into(),
            is_staff,
        }
    }

    pub fn id(&self) -> Option<UserId> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_staff(&self) -> bool {
        self.is_authenticated() && self.is_staff
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_authenticated() {
            write!(f, "{}", self.username)
        } else {
            write!(f, "AnonymousUser")
        }
    }
}

impl From<&UserConfig> for Identity {
    fn from(user: &UserConfig) -> Self {
        Identity::user(user.id, user.username.clone(), user.is_staff)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Identity>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Identity resolution middleware
///
/// Resolves `Authorization: Bearer <token>` against the configured users.
/// Requests without the header continue as anonymous; the permission layer
/// decides what they may do. The identity is also copied onto the response
/// so outer layers can see who was served.
pub async fn identity_middleware(
    State(config): State<Arc<ArcSwap<Config>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = match req.headers().get(AUTHORIZATION) {
        None => Identity::anonymous(),
        Some(value) => {
            let header = value.to_str().map_err(|_| {
                AppError::Unauthorized("Authorization header is not valid ASCII".to_string())
            })?;
            let token = extract_bearer_token(header)?;

            let config = config.load();
            resolve_token(&config.users, token)
                .ok_or_else(|| AppError::Unauthorized("Invalid or disabled token".to_string()))?
        }
    };

    req.extensions_mut().insert(identity.clone());

    let mut response = next.run(req).await;
    response.extensions_mut().insert(identity);
    Ok(response)
}

/// Find the enabled user owning `token`
pub fn resolve_token(users: &[UserConfig], token: &str) -> Option<Identity> {
    users
        .iter()
        .filter(|u| u.enabled)
        .find(|u| bool::from(u.token.as_bytes().ct_eq(token.as_bytes())))
        .map(Identity::from)
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Result<&str, AppError> {
    const BEARER_PREFIX: &str = "Bearer ";

    let token = auth_header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        AppError::Unauthorized("Authorization header must use Bearer scheme".to_string())
    })?;

    if token.is_empty() {
        return Err(AppError::Unauthorized("Bearer token is empty".to_string()));
    }

    Ok(token)
}
