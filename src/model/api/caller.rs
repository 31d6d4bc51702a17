use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use log::debug;
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::logging::RequestId;
use crate::model::common::voter::VoterId;

pub const CALLER_TOKEN_COOKIE: &str = "caller_token";

/// A signed assertion of who the caller is, minted by the identity provider.
///
/// The token is an HS256 JWT whose `sub` claim is the caller's principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerToken {
    #[serde(rename = "sub")]
    pub voter: VoterId,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expire_at: DateTime<Utc>,
}

impl CallerToken {
    pub fn new(voter: VoterId, expire_at: DateTime<Utc>) -> Self {
        Self { voter, expire_at }
    }

    /// Sign this token.
    pub fn encode(&self, config: &Config) -> Result<String, Error> {
        let token = jsonwebtoken::encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;
        Ok(token)
    }

    /// Sign this token and wrap it in a cookie.
    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>, Error> {
        let token = self.encode(config)?;
        Ok(Cookie::build(CALLER_TOKEN_COOKIE, token)
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish())
    }

    /// Verify and decode a signed token.
    pub fn decode(token: &str, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|data: TokenData<Self>| data.claims)?;
        if token.voter.is_empty() {
            return Err(Error::Status(
                Status::Unauthorized,
                "Caller token has an empty subject".to_string(),
            ));
        }
        Ok(token)
    }
}

/// The verified identity of whoever made the request.
///
/// Read from an `Authorization: Bearer` header if present, otherwise from the
/// caller token cookie. Requests without a valid token fail with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(VoterId);

impl Caller {
    pub fn voter(&self) -> &VoterId {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => {
                let err = Error::Status(
                    Status::InternalServerError,
                    "Config is not managed".to_string(),
                );
                return Outcome::Failure((Status::InternalServerError, err));
            }
        };

        let bearer = req
            .headers()
            .get_one("Authorization")
            .and_then(|value| value.strip_prefix("Bearer "));
        let token = match bearer {
            Some(token) => token,
            None => match req.cookies().get(CALLER_TOKEN_COOKIE) {
                Some(cookie) => cookie.value(),
                None => {
                    let err = Error::Status(Status::Unauthorized, "No caller token".to_string());
                    return Outcome::Failure((Status::Unauthorized, err));
                }
            },
        };

        match CallerToken::decode(token, config) {
            Ok(token) => Outcome::Success(Caller(token.voter)),
            Err(err) => {
                debug!("req{}: rejected caller token: {err}", RequestId::of(req));
                Outcome::Failure((Status::Unauthorized, err))
            }
        }
    }
}
