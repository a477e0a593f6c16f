use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use stringline::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportPolicy {
    Ignore,
    Report,
}

/// Attached to 5xx responses so the reporting middleware can persist them.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub id: String,
    pub status_code: u16,
    pub public_code: String,
    pub summary: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    public_code: String,
    public_message: Option<String>,
    report_policy: ReportPolicy,
    report_summary: Option<String>,
    report_details: Option<String>,
}

impl ApiError {
    const fn bare(status: StatusCode) -> Self {
        Self {
            status,
            public_code: String::new(),
            public_message: None,
            report_policy: ReportPolicy::Ignore,
            report_summary: None,
            report_details: None,
        }
    }

    pub const NOT_FOUND: ApiError = ApiError::bare(StatusCode::NOT_FOUND);
    pub const FORBIDDEN: ApiError = ApiError::bare(StatusCode::FORBIDDEN);
    pub const UNAUTHORIZED: ApiError = ApiError::bare(StatusCode::UNAUTHORIZED);

    /// 4xx with the message shown to the caller. Never persisted.
    fn client(status: StatusCode, code: &str, msg: String) -> Self {
        tracing::warn!(status = status.as_u16(), code, "{}", msg);
        Self {
            public_code: code.to_string(),
            public_message: Some(msg),
            ..Self::bare(status)
        }
    }

    /// 5xx with a generic public message; `summary` and `details` only reach
    /// the error report.
    fn server(
        status: StatusCode,
        code: &str,
        public_message: Option<String>,
        summary: String,
        details: Option<String>,
    ) -> Self {
        tracing::error!(status = status.as_u16(), code, "{}", summary);
        Self {
            public_code: code.to_string(),
            public_message,
            report_policy: ReportPolicy::Report,
            report_summary: Some(summary),
            report_details: details,
            ..Self::bare(status)
        }
    }

    fn reported<E: std::fmt::Debug + std::fmt::Display>(code: &str, err: E) -> Self {
        Self::server(
            StatusCode::INTERNAL_SERVER_ERROR,
            code,
            None,
            format!("{:?}", err),
            Some(err.to_string()),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::server(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            None,
            msg.into(),
            None,
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::server(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            Some("Service unavailable".to_string()),
            msg.into(),
            None,
        )
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::client(StatusCode::NOT_FOUND, "NOT_FOUND", msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::client(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::client(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::client(StatusCode::CONFLICT, "CONFLICT", msg.into())
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::client(
            StatusCode::UNPROCESSABLE_ENTITY,
            "UNPROCESSABLE_ENTITY",
            msg.into(),
        )
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::client(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.into())
    }
}

#[derive(Serialize)]
struct FailureEnvelope<'a> {
    success: bool,
    error: FailureBody<'a>,
}

#[derive(Serialize)]
struct FailureBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
}

impl ApiError {
    fn code(&self) -> &str {
        if !self.public_code.is_empty() {
            return &self.public_code;
        }
        match self.status {
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::FORBIDDEN => "FORBIDDEN",
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::BAD_REQUEST => "BAD_REQUEST",
            _ => "ERROR",
        }
    }

    fn message(&self) -> &str {
        self.public_message
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("Error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = (self.report_policy == ReportPolicy::Report)
            .then(stringline_types::create_id);

        let envelope = FailureEnvelope {
            success: false,
            error: FailureBody {
                code: self.code(),
                message: self.message(),
                id: error_id.as_deref(),
            },
        };
        let mut response = (self.status, Json(envelope)).into_response();

        let Some(id) = error_id else {
            return response;
        };
        if let Ok(value) = HeaderValue::from_str(&id) {
            response.headers_mut().insert("x-error-id", value);
        }
        let report = ErrorReport {
            status_code: self.status.as_u16(),
            public_code: self.code().to_string(),
            summary: self
                .report_summary
                .clone()
                .unwrap_or_else(|| self.message().to_string()),
            details: self.report_details.clone(),
            id,
        };
        response.extensions_mut().insert(report);
        response
    }
}

impl From<stringline_types::Error> for ApiError {
    fn from(err: stringline_types::Error) -> Self {
        Self::reported("INTERNAL_ERROR", err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        if err.is_conflict() {
            Self::conflict(err.to_string())
        } else {
            Self::bad_request(err.to_string())
        }
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::reported("DATABASE_ERROR", err)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::reported("IO_ERROR", err)
    }
}

impl From<object_store::Error> for ApiError {
    fn from(err: object_store::Error) -> Self {
        Self::reported("STORAGE_ERROR", err)
    }
}

/// Malformed bodies are the caller's fault and are not persisted.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::unauthorized(format!("Invalid session token: {}", err))
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::payload_too_large(err.body_text());
        }
        Self::bad_request(format!("Invalid multipart body: {}", err))
    }
}

impl std::error::Error for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let response = ApiError::conflict("payment already verified").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(response.headers().get("x-error-id").is_none());
        assert!(response.extensions().get::<ErrorReport>().is_none());

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["error"]["message"], "payment already verified");
    }

    #[tokio::test]
    async fn internal_errors_hide_details_and_carry_a_report() {
        let response = ApiError::internal("connection reset by peer").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get("x-error-id").is_some());
        let report = response.extensions().get::<ErrorReport>().cloned().unwrap();
        assert_eq!(report.summary, "connection reset by peer");

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "Internal Server Error");
        assert_eq!(body["error"]["id"], report.id.as_str());
    }

    #[tokio::test]
    async fn constants_fall_back_to_status_codes() {
        let body = body_json(ApiError::NOT_FOUND.into_response()).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Not Found");
    }

    #[tokio::test]
    async fn database_errors_are_reported_without_leaking() {
        let err: ApiError = sea_orm::DbErr::Custom("relation \"order\" does not exist".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response.extensions().get::<ErrorReport>().cloned().unwrap();
        assert_eq!(report.public_code, "DATABASE_ERROR");
        assert!(report.details.unwrap().contains("does not exist"));

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Internal Server Error");
    }

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let conflict: ApiError = DomainError::NotCancellable("confirmed".into()).into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        let invalid: ApiError = DomainError::FirstOrderOnly.into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
