//! 연결 지표, 상태 스냅샷, 진단 정보.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::connection::{ConnectionPhase, ConnectionState, ConnectionType, ErrorKind};
use super::locale::Locale;

/// 이 응답 시간 미만이면 `Fast`
pub const FAST_RESPONSE_MS: u64 = 500;
/// 이 응답 시간 미만이면 `Moderate`
pub const MODERATE_RESPONSE_MS: u64 = 1_500;

/// 성공률이 이 값 미만이면 불안정으로 판단
const UNSTABLE_SUCCESS_RATE: u32 = 80;
/// 불안정 판단에 필요한 최소 확인 횟수
const UNSTABLE_MIN_SAMPLES: u64 = 5;

/// 연결 속도 구간
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionSpeed {
    Fast,
    Moderate,
    Slow,
    /// 측정값 없음
    #[default]
    Unknown,
}

impl ConnectionSpeed {
    /// 평균 응답 시간으로 구간 결정
    pub fn from_response_time(average_ms: Option<u64>) -> Self {
        match average_ms {
            None => ConnectionSpeed::Unknown,
            Some(ms) if ms < FAST_RESPONSE_MS => ConnectionSpeed::Fast,
            Some(ms) if ms < MODERATE_RESPONSE_MS => ConnectionSpeed::Moderate,
            Some(_) => ConnectionSpeed::Slow,
        }
    }
}

/// 연결 지표
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    /// 전체 연결 확인 횟수
    pub total_connections: u64,
    /// 성공 횟수
    pub successful_connections: u64,
    /// 실패 횟수
    pub failed_connections: u64,
    /// 성공률 (%, 반올림, 확인 0회면 0)
    pub success_rate: u32,
    /// 최근 응답 시간 평균 (밀리초)
    pub average_response_time_ms: Option<u64>,
    /// 마지막 응답 시간 (밀리초)
    pub last_response_time_ms: Option<u64>,
    /// 속도 구간
    pub connection_speed: ConnectionSpeed,
}

/// 성공률 계산 (반올림 백분율)
pub fn success_rate(successful: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((successful as f64 / total as f64) * 100.0).round() as u32
}

/// UI가 읽는 연결 상태 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// 연결 상태
    pub state: ConnectionState,
    /// 파생 지표
    pub metrics: ConnectionMetrics,
    /// 연결 확인 진행 중 여부
    pub check_in_progress: bool,
    /// 다음 재시도까지 남은 시간 (밀리초)
    pub next_retry_in_ms: Option<u64>,
    /// 스냅샷 생성 시각
    pub updated_at: DateTime<Utc>,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::default(),
            metrics: ConnectionMetrics::default(),
            check_in_progress: false,
            next_retry_in_ms: None,
            updated_at: Utc::now(),
        }
    }
}

/// 사용자 권장 조치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// 네트워크 연결 확인
    CheckNetwork,
    /// 다시 로그인
    Reauthenticate,
    /// 잘못된 요청 (앱 업데이트 필요 가능성)
    UpdateApp,
    /// 방화벽/VPN/차단 확장 확인
    CheckFirewall,
    /// 느린 연결
    SlowConnection,
    /// 불안정한 연결
    UnstableConnection,
    /// 서버 무응답 (재시도 한도 도달)
    ServiceUnresponsive,
    /// 대체 엔드포인트 사용 중
    UsingFallback,
    /// 상태 확인 일시 중지됨
    MonitoringPaused,
}

impl Recommendation {
    /// 로컬라이즈된 안내 문구
    pub fn message(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Recommendation::CheckNetwork, Locale::Ko) => "네트워크 연결을 확인하세요.",
            (Recommendation::CheckNetwork, Locale::En) => "Check your network connection.",
            (Recommendation::Reauthenticate, Locale::Ko) => "세션이 만료되었습니다. 다시 로그인하세요.",
            (Recommendation::Reauthenticate, Locale::En) => {
                "Your session has expired. Please sign in again."
            }
            (Recommendation::UpdateApp, Locale::Ko) => {
                "요청이 거부되었습니다. 앱을 최신 버전으로 업데이트하세요."
            }
            (Recommendation::UpdateApp, Locale::En) => {
                "The request was rejected. Update the app to the latest version."
            }
            (Recommendation::CheckFirewall, Locale::Ko) => {
                "서버에 접근할 수 없습니다. 방화벽, VPN, 광고 차단 설정을 확인하세요."
            }
            (Recommendation::CheckFirewall, Locale::En) => {
                "The server is unreachable. Check firewall, VPN or ad-blocker settings."
            }
            (Recommendation::SlowConnection, Locale::Ko) => "연결 속도가 느립니다.",
            (Recommendation::SlowConnection, Locale::En) => "The connection is slow.",
            (Recommendation::UnstableConnection, Locale::Ko) => "연결이 불안정합니다.",
            (Recommendation::UnstableConnection, Locale::En) => "The connection is unstable.",
            (Recommendation::ServiceUnresponsive, Locale::Ko) => {
                "서버가 응답하지 않습니다. 잠시 후 자동으로 다시 시도합니다."
            }
            (Recommendation::ServiceUnresponsive, Locale::En) => {
                "The server is not responding. Retrying automatically shortly."
            }
            (Recommendation::UsingFallback, Locale::Ko) => "대체 서버로 연결되어 있습니다.",
            (Recommendation::UsingFallback, Locale::En) => "Connected through the fallback server.",
            (Recommendation::MonitoringPaused, Locale::Ko) => "연결 상태 확인이 일시 중지되었습니다.",
            (Recommendation::MonitoringPaused, Locale::En) => "Connection checks are paused.",
        }
    }
}

/// 진단 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// 상태 스냅샷
    pub status: ConnectionStatus,
    /// 마지막 성공 이후 경과 시간 (초)
    pub time_since_last_success_secs: Option<i64>,
    /// 현재 적용 중인 상태 확인 주기 (밀리초)
    pub health_check_interval_ms: u64,
    /// 재연결 시도 한도
    pub max_reconnect_attempts: u32,
    /// 권장 조치
    pub recommendations: Vec<Recommendation>,
}

impl Diagnostics {
    /// 스냅샷에서 진단 정보 생성 (순수 함수)
    pub fn build(
        status: ConnectionStatus,
        health_check_interval_ms: u64,
        max_reconnect_attempts: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let time_since_last_success_secs = status
            .state
            .last_successful_connection
            .map(|at| (now - at).num_seconds().max(0));
        let recommendations = recommendations_for(&status, max_reconnect_attempts);

        Self {
            status,
            time_since_last_success_secs,
            health_check_interval_ms,
            max_reconnect_attempts,
            recommendations,
        }
    }
}

/// 현재 상태에서 권장 조치 목록 도출
pub fn recommendations_for(status: &ConnectionStatus, max_attempts: u32) -> Vec<Recommendation> {
    let state = &status.state;
    let mut out = Vec::new();

    if state.is_paused || state.phase == ConnectionPhase::Paused {
        out.push(Recommendation::MonitoringPaused);
    }

    let last_kind = state.last_error.as_ref().map(|e| e.kind);
    if !state.network_online || (!state.is_connected && last_kind == Some(ErrorKind::Offline)) {
        out.push(Recommendation::CheckNetwork);
    }

    if !state.is_connected {
        match last_kind {
            Some(ErrorKind::Unauthorized) => out.push(Recommendation::Reauthenticate),
            Some(ErrorKind::InvalidRequest) => out.push(Recommendation::UpdateApp),
            Some(ErrorKind::BackendBlocked) if state.network_online => {
                out.push(Recommendation::CheckFirewall)
            }
            Some(ErrorKind::Timeout) => out.push(Recommendation::SlowConnection),
            _ => {}
        }
        if max_attempts > 0 && state.reconnect_attempts >= max_attempts {
            out.push(Recommendation::ServiceUnresponsive);
        }
    }

    if status.metrics.connection_speed == ConnectionSpeed::Slow
        && !out.contains(&Recommendation::SlowConnection)
    {
        out.push(Recommendation::SlowConnection);
    }

    if status.metrics.total_connections >= UNSTABLE_MIN_SAMPLES
        && status.metrics.success_rate < UNSTABLE_SUCCESS_RATE
    {
        out.push(Recommendation::UnstableConnection);
    }

    if state.is_connected && state.connection_type == ConnectionType::Fallback {
        out.push(Recommendation::UsingFallback);
    }

    out
}
