//! Access tokens
//!
//! Users receive a signed JWT in the `Authorization` header when they register or log in, and must send it back as
//! `Authorization: Bearer <token>` on every `/api/user` request that needs an identity. Handlers get hold of the
//! caller by taking an [`AuthenticatedUser`] argument.
use std::time::Duration;

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::Utc;
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: i64,
    pub login: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validity: config.token_validity,
        }
    }

    /// Issue a new access token for the given user. The caller must have checked the user's credentials already.
    pub fn issue_token(&self, user_id: i64, login: &str) -> Result<String, ServerError> {
        let now = Utc::now().timestamp();
        let validity = i64::try_from(self.validity.as_secs()).unwrap_or(i64::MAX);
        let claims = JwtClaims { sub: user_id, login: login.to_string(), iat: now, exp: now.saturating_add(validity) };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(data.claims)
    }

    /// The header value to hand back to a user who has just logged in.
    pub fn bearer_header(&self, user_id: i64, login: &str) -> Result<(header::HeaderName, String), ServerError> {
        let token = self.issue_token(user_id, login)?;
        Ok((header::AUTHORIZATION, format!("{BEARER_PREFIX}{token}")))
    }
}

/// The caller of an authenticated endpoint, taken from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub login: String,
}

impl From<JwtClaims> for AuthenticatedUser {
    fn from(claims: JwtClaims) -> Self {
        Self { user_id: claims.sub, login: claims.login }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, ServerError> {
    let issuer = req.app_data::<web::Data<TokenIssuer>>().ok_or_else(|| {
        error!("💻️ No token issuer has been configured for this route");
        ServerError::ConfigurationError("No token issuer has been configured".into())
    })?;
    let value = req.headers().get(header::AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".into()))?;
    let claims = issuer.validate_token(token.trim()).map_err(|e| {
        debug!("💻️ Rejected access token. {e}");
        e
    })?;
    trace!("💻️ Request authenticated for user #{} ({})", claims.sub, claims.login);
    Ok(claims.into())
}
