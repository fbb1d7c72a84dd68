use crate::registry::{AuthError, RegistrationError};
use actix_web::{
    error::{BlockingError, JsonPayloadError},
    http::StatusCode,
    HttpRequest, HttpResponse, ResponseError,
};
use failure::Fail;
use log::error;
use serde::Serialize;

/// Body of every error response.
#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Fail)]
pub enum ApiError {
    #[fail(display = "{}", _0)]
    Registration(#[cause] RegistrationError),
    #[fail(display = "{}", _0)]
    Auth(#[cause] AuthError),
    #[fail(display = "{}", _0)]
    BadRequest(String),
    #[fail(display = "Service unavailable")]
    Unavailable,
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        ApiError::Registration(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl From<BlockingError> for ApiError {
    fn from(e: BlockingError) -> Self {
        error!("blocking pool refused work: {}", e);
        ApiError::Unavailable
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Registration(RegistrationError::Hashing(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Registration(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorBody { message })
    }
}

/// Turns body extraction failures (bad JSON, missing fields, oversized
/// payloads) into a 400 with the usual `{ message }` body.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}
