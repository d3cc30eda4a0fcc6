//! 백엔드 연결 상태 모델.
//!
//! 연결 모니터가 단독으로 소유하고 갱신하는 `ConnectionState`와
//! 연결 실패 분류 체계(`ErrorKind`)를 정의한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 활성 백엔드 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// 기본 엔드포인트로 연결됨
    Real,
    /// 대체(fallback) 엔드포인트로 연결됨
    Fallback,
    /// 네트워크 자체가 끊김
    Offline,
    /// 아직 확인되지 않음
    #[default]
    Unknown,
}

/// 연결 상태 머신 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// 연결됨
    Connected,
    /// 연결 끊김
    #[default]
    Disconnected,
    /// 재연결 시도 중
    Reconnecting,
    /// 상태 확인 일시 중지
    Paused,
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionPhase::Connected => write!(f, "Connected"),
            ConnectionPhase::Disconnected => write!(f, "Disconnected"),
            ConnectionPhase::Reconnecting => write!(f, "Reconnecting"),
            ConnectionPhase::Paused => write!(f, "Paused"),
        }
    }
}

/// 앱 가시성 (상태 확인 주기 결정)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// 전면 실행 중
    #[default]
    Foreground,
    /// 백그라운드 (숨김)
    Background,
}

/// 연결 실패 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 호스트 네트워크 없음
    Offline,
    /// 프로브 타임아웃
    Timeout,
    /// 자격증명 만료/무효, 권한 없음
    Unauthorized,
    /// 백엔드 엔드포인트 도달 불가 (CDN/방화벽 차단 등)
    BackendBlocked,
    /// 잘못된 요청 (재시도해도 해결되지 않음)
    InvalidRequest,
    /// 그 외 백엔드 에러
    UnknownBackendError,
}

impl ErrorKind {
    /// `CoreError`를 분류 체계로 매핑
    ///
    /// `Offline`은 에러 자체로는 판단할 수 없으므로 여기서 반환하지 않는다.
    /// 네트워크 프로브 결과를 가진 호출자가 `BackendBlocked`/`Timeout`을 `Offline`으로 격상한다.
    pub fn classify(error: &CoreError) -> Self {
        match error {
            CoreError::Auth(_) => ErrorKind::Unauthorized,
            CoreError::Validation { .. } => ErrorKind::InvalidRequest,
            CoreError::Timeout { .. } => ErrorKind::Timeout,
            CoreError::Unreachable(_) => ErrorKind::BackendBlocked,
            _ => ErrorKind::UnknownBackendError,
        }
    }

    /// 자동 재시도로 해결될 수 있는 종류인지
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::Unauthorized | ErrorKind::InvalidRequest)
    }

    /// 사용자 조치(재로그인 등)가 필요한 종류인지
    pub fn requires_user_action(&self) -> bool {
        !self.is_retryable()
    }

    /// 네트워크 상태를 확인해 볼 가치가 있는 전송 계층 실패인지
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            ErrorKind::BackendBlocked | ErrorKind::Timeout | ErrorKind::UnknownBackendError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Offline => "offline",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::BackendBlocked => "backend-blocked",
            ErrorKind::InvalidRequest => "invalid-request",
            ErrorKind::UnknownBackendError => "unknown-backend-error",
        };
        f.write_str(name)
    }
}

/// 분류된 연결 실패
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionError {
    /// 실패 분류
    pub kind: ErrorKind,
    /// 원본 에러 메시지
    pub message: String,
    /// 발생 시각
    pub occurred_at: DateTime<Utc>,
}

impl ConnectionError {
    /// 분류와 메시지로 생성
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }

    /// `CoreError`를 분류하여 생성
    pub fn from_core(error: &CoreError) -> Self {
        Self::new(ErrorKind::classify(error), error.to_string())
    }

    /// 네트워크 끊김으로 생성
    pub fn offline() -> Self {
        Self::new(ErrorKind::Offline, "네트워크 연결 없음")
    }
}

/// 단일 연결 확인 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// 백엔드 응답 성공
    Connected {
        /// 응답 시간 (밀리초)
        response_time_ms: u64,
    },
    /// 실패 (분류 포함)
    Failed(ConnectionError),
}

impl CheckOutcome {
    /// 성공 여부
    pub fn is_connected(&self) -> bool {
        matches!(self, CheckOutcome::Connected { .. })
    }

    /// 실패 시 에러 참조
    pub fn error(&self) -> Option<&ConnectionError> {
        match self {
            CheckOutcome::Failed(err) => Some(err),
            CheckOutcome::Connected { .. } => None,
        }
    }
}

/// 연결 상태
///
/// 연결 모니터 태스크만 갱신하며, 외부에서는 스냅샷으로만 읽는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionState {
    /// 마지막으로 확인된 백엔드 도달 가능 여부
    pub is_connected: bool,
    /// 활성 백엔드 모드
    pub connection_type: ConnectionType,
    /// 마지막 성공 이후 재연결 시도 횟수
    pub reconnect_attempts: u32,
    /// 마지막 실패
    pub last_error: Option<ConnectionError>,
    /// 상태 확인 일시 중지 여부
    pub is_paused: bool,
    /// 마지막 성공 연결 시각
    pub last_successful_connection: Option<DateTime<Utc>>,
    /// 상태 머신 단계
    pub phase: ConnectionPhase,
    /// 호스트 네트워크 연결 여부
    pub network_online: bool,
    /// 앱 가시성
    pub visibility: Visibility,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            is_connected: false,
            connection_type: ConnectionType::Unknown,
            reconnect_attempts: 0,
            last_error: None,
            is_paused: false,
            last_successful_connection: None,
            phase: ConnectionPhase::Disconnected,
            network_online: true,
            visibility: Visibility::Foreground,
        }
    }
}
