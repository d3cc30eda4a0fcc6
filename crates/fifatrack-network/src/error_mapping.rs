use fifatrack_core::error::CoreError;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// 응답 본문을 에러 메시지에 포함할 최대 길이
const MAX_BODY_IN_MESSAGE: usize = 200;

pub fn map_status_error(
    operation: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> CoreError {
    let message = truncate(body.trim());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CoreError::Auth(format!("{operation}: {message} ({status})"))
        }
        StatusCode::BAD_REQUEST
        | StatusCode::NOT_FOUND
        | StatusCode::METHOD_NOT_ALLOWED
        | StatusCode::NOT_ACCEPTABLE
        | StatusCode::CONFLICT
        | StatusCode::UNPROCESSABLE_ENTITY => CoreError::Validation {
            field: "backend_request".to_string(),
            message: format!("{operation}: {message} ({status})"),
        },
        StatusCode::TOO_MANY_REQUESTS => CoreError::RateLimit {
            retry_after_secs: retry_after_secs(headers),
        },
        s if s.is_server_error() => {
            CoreError::ServiceUnavailable(format!("{operation}: {message} ({status})"))
        }
        _ => CoreError::Network(format!("{operation}: {message} ({status})")),
    }
}

pub fn map_transport_error(operation: &str, err: &reqwest::Error, timeout: Duration) -> CoreError {
    if err.is_timeout() {
        CoreError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else if err.is_connect() {
        CoreError::Unreachable(format!("{operation}: {err}"))
    } else {
        CoreError::Network(format!("{operation}: {err}"))
    }
}

fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_IN_MESSAGE {
        return body.to_string();
    }
    let cut: String = body.chars().take(MAX_BODY_IN_MESSAGE).collect();
    format!("{cut}...")
}
