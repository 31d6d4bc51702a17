use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{debug, error};
use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder, Request};
use thiserror::Error;

use crate::logging::RequestId;

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a registry operation can be refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VotingError {
    #[error("Voting item {0} not found")]
    NotFound(String),
    #[error("Voting item {0} is not in a valid voting period")]
    InvalidPeriod(String),
    #[error("Voting item {item_id} has no option {option:?}")]
    InvalidOption { item_id: String, option: String },
    #[error("Voting item {0} already exists")]
    AlreadyExists(String),
    #[error("Voting item {item_id} is invalid: {reason}")]
    InvalidItem { item_id: String, reason: String },
}

impl VotingError {
    pub fn not_found(item_id: &str) -> Self {
        Self::NotFound(item_id.to_string())
    }

    /// The HTTP status this refusal is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_) => Status::NotFound,
            Self::InvalidPeriod(_) => Status::Forbidden,
            Self::InvalidOption { .. } | Self::InvalidItem { .. } => Status::UnprocessableEntity,
            Self::AlreadyExists(_) => Status::Conflict,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Voting(#[from] VotingError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    /// The registry-level refusal behind this error, if that's what it is.
    pub fn voting(&self) -> Option<&VotingError> {
        match self {
            Self::Voting(err) => Some(err),
            _ => None,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Voting(err) => err.status(),
            Self::Db(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Status(status, _) => *status,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let id = RequestId::of(req);
        if status.code >= 500 {
            error!("req{id}: {self}");
        } else {
            debug!("req{id}: {self}");
        }
        Err(status)
    }
}
