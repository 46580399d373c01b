use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.gatekeeper.local/{}", code))
        .with_code(code)
        .with_instance(instance);

    // Add the trace id from the current tracing span if available
    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::NotAuthorized { .. } => from_parts(
            StatusCode::FORBIDDEN,
            "ACCESS_FORBIDDEN",
            "Forbidden",
            "Only the administrator may perform this operation",
            instance,
        ),
        DomainError::NotFound { user_id } => from_parts(
            StatusCode::NOT_FOUND,
            "ACCESS_NOT_FOUND",
            "Request not found",
            format!("No access request for user {}", user_id),
            instance,
        ),
        DomainError::NotApproved { user_id } => from_parts(
            StatusCode::FORBIDDEN,
            "ACCESS_NOT_APPROVED",
            "Access not granted",
            format!("User {} has not been granted access", user_id),
            instance,
        ),
        DomainError::InvalidInput { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "ACCESS_VALIDATION",
            "Validation error",
            format!("{}", e),
            instance,
        ),
        DomainError::Storage { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Storage error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal error",
                "An internal storage error occurred",
                instance,
            )
        }
        DomainError::Launch { .. } => {
            tracing::error!(error = ?e, "Download launch failed");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DOWNLOAD_LAUNCH_FAILED",
                "Internal error",
                "The download could not be started",
                instance,
            )
        }
    }
}
