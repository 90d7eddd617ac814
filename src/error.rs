//! Failures of the exploration core.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request never produced an HTTP response: DNS, refused connection, timeout or a broken body.
    #[error("Cannot reach SPARQL endpoint: {0}")]
    Transport(String),
    /// The endpoint answered with a non-2xx status.
    #[error("SPARQL endpoint returned HTTP {status}: {body}")]
    Endpoint { status: u16, body: String },
    /// The body is not a SPARQL JSON results document.
    #[error("Unexpected response from SPARQL endpoint: {0}")]
    MalformedResponse(String),
    /// Rejected before any network call.
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Invalid IRI <{0}>")]
    InvalidIri(String),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidIri(_) => StatusCode::BAD_REQUEST,
            Error::Transport(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Endpoint { .. } | Error::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // the parser message is of no use to the user, the endpoint is most likely misconfigured
            Error::MalformedResponse(_) => "Unexpected response from SPARQL endpoint".to_owned(),
            e => e.to_string(),
        };
        HttpResponse::build(self.status_code()).content_type("text/plain; charset=utf-8").body(message)
    }
}
