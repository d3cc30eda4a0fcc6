//! 재연결 지수 백오프.
//!
//! 지연 = min(이전 지연 × 2, 최대 지연) + 지터(기본 지연의 0 ~ jitter_ratio).

use fifatrack_core::config::ConnectionConfig;
use std::time::Duration;

/// 계산된 재시도 지연
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffDelay {
    /// 지터를 제외한 기본 지연
    pub base: Duration,
    /// 추가된 지터
    pub jitter: Duration,
}

impl BackoffDelay {
    /// 실제 대기 시간
    pub fn total(&self) -> Duration {
        self.base + self.jitter
    }
}

/// 지수 백오프 상태
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
    jitter_ratio: f64,
}

impl Backoff {
    /// 새 백오프 생성
    pub fn new(initial: Duration, max: Duration, jitter_ratio: f64) -> Self {
        Self {
            initial,
            max: max.max(initial),
            current: initial,
            jitter_ratio: jitter_ratio.clamp(0.0, 1.0),
        }
    }

    /// 연결 설정으로 생성
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(config.base_delay(), config.max_delay(), config.jitter_ratio)
    }

    /// 다음 지연 계산 (난수 지터)
    pub fn next_delay(&mut self) -> BackoffDelay {
        self.next_delay_with(rand::random::<f64>())
    }

    /// 다음 지연 계산 (`jitter_fraction`은 0.0 ~ 1.0, 지터 비율 내 위치)
    pub fn next_delay_with(&mut self, jitter_fraction: f64) -> BackoffDelay {
        self.current = self.current.saturating_mul(2).min(self.max);
        let fraction = jitter_fraction.clamp(0.0, 1.0);
        let jitter = self.current.mul_f64(self.jitter_ratio * fraction);
        BackoffDelay {
            base: self.current,
            jitter,
        }
    }

    /// 마지막으로 계산된 기본 지연 (리셋 직후에는 초기값)
    pub fn current(&self) -> Duration {
        self.current
    }

    /// 초기 상태로 되돌림
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
