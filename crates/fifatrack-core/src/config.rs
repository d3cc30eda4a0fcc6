//! 애플리케이션 설정 구조체.
//!
//! 백엔드 주소, 연결 모니터 주기/백오프, 알림 설정 등
//! 런타임 설정을 정의한다. `config` crate를 통해 파일/환경변수에서 로드.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;
use crate::models::connection::Visibility;
use crate::models::locale::Locale;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 백엔드(Supabase) 설정
    pub backend: BackendConfig,
    /// 연결 모니터 설정
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// 알림 설정
    #[serde(default)]
    pub notification: NotificationConfig,
}

// ============================================================
// 백엔드 설정
// ============================================================

/// 호스팅 백엔드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// 프로젝트 URL (예: "https://xyz.supabase.co")
    pub url: String,
    /// 공개(anon) API 키
    #[serde(default)]
    pub anon_key: String,
    /// 로그인 세션 액세스 토큰 (있으면 신원 확인 프로브 사용)
    #[serde(default)]
    pub access_token: Option<String>,
    /// 기본 엔드포인트 차단 시 사용할 대체 URL (프록시 등)
    #[serde(default)]
    pub fallback_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            anon_key: String::new(),
            access_token: None,
            fallback_url: None,
        }
    }
}

// ============================================================
// 연결 모니터 설정
// ============================================================

/// 연결 모니터 설정: 프로브 타임아웃, 백오프, 상태 확인 주기
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// 연결 확인 프로브 타임아웃 (ms)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// 백오프 기본 지연 (ms)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// 백오프 최대 지연 (ms)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// 확장 대기 전 최대 재연결 시도 횟수
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// 시도 한도 도달 후 확장 대기 (ms)
    #[serde(default = "default_extended_backoff_ms")]
    pub extended_backoff_ms: u64,
    /// 오프라인 시 네트워크 폴링 주기 (ms)
    #[serde(default = "default_offline_poll_ms")]
    pub offline_poll_ms: u64,
    /// 전면 실행 시 상태 확인 주기 (ms)
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
    /// 백그라운드 상태 확인 주기 (ms)
    #[serde(default = "default_background_health_check_interval_ms")]
    pub background_health_check_interval_ms: u64,
    /// 세션 유지 하트비트 주기 (ms)
    #[serde(default = "default_keep_alive_interval_ms")]
    pub keep_alive_interval_ms: u64,
    /// 지터 비율 (기본 지연 대비 0.0 ~ 1.0)
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
    /// 평균 응답 시간 계산에 사용할 최근 표본 수
    #[serde(default = "default_response_time_window")]
    pub response_time_window: usize,
    /// 백그라운드 전환 시 주기 완화 대신 일시 중지
    #[serde(default)]
    pub pause_in_background: bool,
    /// 네트워크 도달성 확인 대상 (host:port)
    #[serde(default = "default_network_probe_targets")]
    pub network_probe_targets: Vec<String>,
    /// 네트워크 도달성 확인 타임아웃 (ms)
    #[serde(default = "default_network_probe_timeout_ms")]
    pub network_probe_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            extended_backoff_ms: default_extended_backoff_ms(),
            offline_poll_ms: default_offline_poll_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
            background_health_check_interval_ms: default_background_health_check_interval_ms(),
            keep_alive_interval_ms: default_keep_alive_interval_ms(),
            jitter_ratio: default_jitter_ratio(),
            response_time_window: default_response_time_window(),
            pause_in_background: false,
            network_probe_targets: default_network_probe_targets(),
            network_probe_timeout_ms: default_network_probe_timeout_ms(),
        }
    }
}

impl ConnectionConfig {
    /// 프로브 타임아웃
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// 백오프 기본 지연
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// 백오프 최대 지연
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// 확장 대기 시간
    pub fn extended_backoff(&self) -> Duration {
        Duration::from_millis(self.extended_backoff_ms)
    }

    /// 오프라인 폴링 주기
    pub fn offline_poll_interval(&self) -> Duration {
        Duration::from_millis(self.offline_poll_ms)
    }

    /// 가시성에 따른 상태 확인 주기
    pub fn health_check_interval(&self, visibility: Visibility) -> Duration {
        match visibility {
            Visibility::Foreground => Duration::from_millis(self.health_check_interval_ms),
            Visibility::Background => {
                Duration::from_millis(self.background_health_check_interval_ms)
            }
        }
    }

    /// 하트비트 주기
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_millis(self.keep_alive_interval_ms)
    }

    /// 네트워크 프로브 타임아웃
    pub fn network_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.network_probe_timeout_ms)
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        let positive = [
            ("probe_timeout_ms", self.probe_timeout_ms),
            ("base_delay_ms", self.base_delay_ms),
            ("offline_poll_ms", self.offline_poll_ms),
            ("health_check_interval_ms", self.health_check_interval_ms),
            (
                "background_health_check_interval_ms",
                self.background_health_check_interval_ms,
            ),
            ("keep_alive_interval_ms", self.keep_alive_interval_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(invalid(field, "0보다 커야 합니다"));
            }
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err(invalid(
                "max_delay_ms",
                format!("base_delay_ms({})보다 작을 수 없습니다", self.base_delay_ms),
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(invalid("jitter_ratio", "0.0 ~ 1.0 범위여야 합니다"));
        }
        if self.response_time_window == 0 {
            return Err(invalid("response_time_window", "1 이상이어야 합니다"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> CoreError {
    CoreError::Validation {
        field: format!("connection.{field}"),
        message: message.into(),
    }
}

// ============================================================
// 알림 설정
// ============================================================

/// 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// 알림 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 알림 언어
    #[serde(default)]
    pub locale: Locale,
    /// 같은 종류 알림 재발송 쿨다운 (초)
    #[serde(default = "default_notification_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: Locale::default(),
            cooldown_secs: default_notification_cooldown_secs(),
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            backend: BackendConfig::default(),
            connection: ConnectionConfig::default(),
            notification: NotificationConfig::default(),
        }
    }

    /// 전체 설정 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.backend.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::Validation {
                field: "backend.url".to_string(),
                message: format!("http(s) URL이어야 합니다: {url}"),
            });
        }
        if let Some(fallback) = &self.backend.fallback_url {
            if !(fallback.starts_with("http://") || fallback.starts_with("https://")) {
                return Err(CoreError::Validation {
                    field: "backend.fallback_url".to_string(),
                    message: format!("http(s) URL이어야 합니다: {fallback}"),
                });
            }
        }
        self.connection.validate()
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}
fn default_probe_timeout_ms() -> u64 {
    10_000
}
fn default_base_delay_ms() -> u64 {
    1_000
}
fn default_max_delay_ms() -> u64 {
    30_000
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_extended_backoff_ms() -> u64 {
    30_000
}
fn default_offline_poll_ms() -> u64 {
    5_000
}
fn default_health_check_interval_ms() -> u64 {
    30_000
}
fn default_background_health_check_interval_ms() -> u64 {
    60_000
}
fn default_keep_alive_interval_ms() -> u64 {
    240_000 // 4분
}
fn default_jitter_ratio() -> f64 {
    0.3
}
fn default_response_time_window() -> usize {
    10
}
fn default_network_probe_targets() -> Vec<String> {
    vec!["1.1.1.1:53".to_string(), "8.8.8.8:53".to_string()]
}
fn default_network_probe_timeout_ms() -> u64 {
    3_000
}
fn default_notification_cooldown_secs() -> u64 {
    60
}
