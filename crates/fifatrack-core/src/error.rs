//! fifatrack 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 에러를 그대로 사용하거나 `#[from] CoreError`로 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 백엔드 호출, 연결 모니터 상태 등 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패 (잘못된 요청 포함)
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 인증 실패 (토큰 만료, 권한 없음 등)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 네트워크 에러 (분류되지 않은 전송 실패)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 백엔드 엔드포인트에 도달할 수 없음 (DNS, 연결 거부, 방화벽 차단)
    #[error("백엔드 연결 불가: {0}")]
    Unreachable(String),

    /// 요청 타임아웃
    #[error("요청 타임아웃: {timeout_ms}ms 초과")]
    Timeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 서비스 일시 불가 (5xx)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// Rate Limit 초과 (429)
    #[error("요청 한도 초과, {retry_after_secs}초 후 재시도")]
    RateLimit {
        /// 재시도 대기 시간 (초)
        retry_after_secs: u64,
    },

    /// 연결 모니터가 일시 중지 상태
    #[error("연결 모니터 일시 중지됨")]
    MonitorPaused,

    /// 연결 모니터 태스크가 종료됨
    #[error("연결 모니터가 종료됨")]
    MonitorStopped,

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}
