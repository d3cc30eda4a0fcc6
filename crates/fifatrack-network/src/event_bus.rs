//! 연결 이벤트 버스.
//!
//! `tokio::broadcast` 기반. 알림 관리자, 콘솔 등 UI 측 관찰자에게
//! 연결 모니터의 상태 전환을 전달한다.

use fifatrack_core::models::connection::{ConnectionError, ConnectionType};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// 연결 모니터 이벤트
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConnectionEvent {
    /// 연결 확인 성공 (`restored`: 끊겼다가 복구됨)
    Connected {
        connection_type: ConnectionType,
        response_time_ms: u64,
        restored: bool,
    },
    /// 연결 확인 실패
    CheckFailed {
        error: ConnectionError,
        reconnect_attempts: u32,
    },
    /// 재연결 예약
    RetryScheduled {
        attempt: u32,
        base_delay_ms: u64,
        delay_ms: u64,
    },
    /// 시도 한도 도달: 확장 대기
    ExtendedBackoff { delay_ms: u64 },
    /// 네트워크 복구 대기 (재시도 횟수 소모 없음)
    WaitingForNetwork { poll_interval_ms: u64 },
    /// 상태 확인 일시 중지
    Paused,
    /// 상태 확인 재개
    Resumed,
}

/// 연결 이벤트 버스
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ConnectionEvent>,
}

impl EventBus {
    /// 새 이벤트 버스 생성
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행 (구독자가 없어도 무시)
    pub fn publish(&self, event: ConnectionEvent) {
        debug!("연결 이벤트 발행: {:?}", event);
        let _ = self.tx.send(event);
    }

    /// 구독자 생성
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}
