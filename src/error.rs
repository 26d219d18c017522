use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which piece of user input was blank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
    Body,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Username => "username",
            Field::Password => "password",
            Field::Body => "post body",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} cannot be blank")]
    EmptyInput(Field),

    #[error("post body is longer than {max} characters")]
    TooLong { max: usize },

    #[error("a user named {0} already exists")]
    DuplicateUsername(String),

    #[error("not found")]
    NotFound,

    #[error("incorrect password")]
    InvalidCredential,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::EmptyInput(_) | Error::TooLong { .. } => StatusCode::BAD_REQUEST,
            Error::DuplicateUsername(_) => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidCredential => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What to tell the client. Database details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            Error::Database(err) => {
                error!("Database error while handling request: {}", err);
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.public_message() });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(
            Error::EmptyInput(Field::Body).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::DuplicateUsername("alice".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(Error::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::InvalidCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Forbidden("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::Database(rusqlite::Error::InvalidQuery).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_name_the_blank_field() {
        assert_eq!(
            Error::EmptyInput(Field::Username).to_string(),
            "username cannot be blank"
        );
        assert_eq!(
            Error::EmptyInput(Field::Body).to_string(),
            "post body cannot be blank"
        );
    }

    #[test]
    fn database_details_are_not_shown() {
        let err = Error::Database(rusqlite::Error::InvalidQuery);
        assert_eq!(err.public_message(), "internal server error");
        assert_eq!(Error::NotFound.public_message(), "not found");
    }
}
