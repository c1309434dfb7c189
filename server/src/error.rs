use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy exposed to the HTTP layer. Every variant maps to a
/// status code; storage errors are collapsed into a generic 500 so partial
/// or inconsistent data is never surfaced.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("upstream source failure: {0}")]
    Upstream(String),
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    fn status(&self) -> Status {
        match self {
            Error::NotFound(_) => Status::NotFound,
            Error::InvalidFilter(_) => Status::BadRequest,
            Error::Conflict(_) => Status::Conflict,
            Error::Forbidden(_) => Status::Forbidden,
            Error::Upstream(_) => Status::BadGateway,
            Error::Database(_) => Status::InternalServerError,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let message = if status == Status::InternalServerError {
            tracing::error!("request failed: {self}");
            "internal error".to_string()
        } else {
            self.to_string()
        };
        let mut response = Json(ErrorBody {
            status: "fail",
            message,
        })
        .respond_to(request)?;
        response.set_status(status);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_client_and_server_codes() {
        assert_eq!(
            Error::NotFound("pull request 1".into()).status(),
            Status::NotFound
        );
        assert_eq!(
            Error::InvalidFilter("bad".into()).status(),
            Status::BadRequest
        );
        assert_eq!(Error::Conflict("done".into()).status(), Status::Conflict);
        assert_eq!(Error::Forbidden("role".into()).status(), Status::Forbidden);
        assert_eq!(Error::Upstream("down".into()).status(), Status::BadGateway);
        assert_eq!(
            Error::Database(sqlx::Error::RowNotFound).status(),
            Status::InternalServerError
        );
    }
}
