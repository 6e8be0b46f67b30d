use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use contact_relay_core::ValidationErrors;
use contact_relay_util::Environment;

const SUBMISSION_FAILED: &str = "Failed to process contact form submission";
const STATS_FAILED: &str = "Failed to fetch statistics";
const GENERIC_RETRY: &str = "Please try again later";

/// Error bodies returned by the contact API.
#[derive(Debug)]
pub enum ApiProblem {
    /// The body could not be read as a JSON object. `status` is 400 for
    /// malformed or non-object JSON, 413 over the size limit and 415 without
    /// a JSON content type.
    InvalidBody { status: StatusCode, reason: String },
    /// One or more field rules failed.
    Validation(ValidationErrors),
    /// The submission could not be stored. `message` is already redacted for the environment.
    Storage { message: String },
    /// The statistics query failed.
    Stats,
}

impl ApiProblem {
    /// Builds a storage failure, exposing `detail` only in development.
    pub fn storage(detail: impl std::fmt::Display, environment: Environment) -> Self {
        let message = if environment.is_development() {
            detail.to_string()
        } else {
            GENERIC_RETRY.to_string()
        };
        Self::Storage { message }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody { status, .. } => *status,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Storage { .. } | Self::Stats => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct DetailsBody {
    error: &'static str,
    details: Vec<String>,
}

#[derive(Serialize)]
struct MessageBody {
    error: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::InvalidBody { reason, .. } => Json(DetailsBody {
                error: "Invalid request body",
                details: vec![reason],
            })
            .into_response(),
            Self::Validation(errors) => Json(DetailsBody {
                error: "Validation failed",
                details: errors.messages(),
            })
            .into_response(),
            Self::Storage { message } => Json(MessageBody {
                error: SUBMISSION_FAILED,
                message,
            })
            .into_response(),
            Self::Stats => Json(ErrorBody {
                error: STATS_FAILED,
            })
            .into_response(),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_detail_is_hidden_outside_development() {
        let problem = ApiProblem::storage("database error: disk full", Environment::Production);
        assert!(matches!(problem, ApiProblem::Storage { ref message } if message == GENERIC_RETRY));
        assert_eq!(problem.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let problem = ApiProblem::storage("database error: disk full", Environment::Test);
        assert!(matches!(problem, ApiProblem::Storage { ref message } if message == GENERIC_RETRY));
    }

    #[test]
    fn storage_detail_is_shown_in_development() {
        let problem = ApiProblem::storage("database error: disk full", Environment::Development);
        assert!(
            matches!(problem, ApiProblem::Storage { ref message } if message == "database error: disk full")
        );
    }

    #[test]
    fn status_follows_the_problem() {
        let too_large = ApiProblem::InvalidBody {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            reason: "length limit exceeded".to_string(),
        };
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ApiProblem::Stats.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
