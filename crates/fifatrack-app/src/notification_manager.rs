//! 알림 관리자.
//!
//! 연결 이벤트를 구독해 설정에 따라 사용자 알림을 발송한다.
//! 같은 종류의 알림은 쿨다운 동안 한 번만 나간다.

use chrono::{DateTime, Utc};
use fifatrack_core::config::NotificationConfig;
use fifatrack_core::models::connection::{ConnectionType, ErrorKind};
use fifatrack_core::ports::notifier::DesktopNotifier;
use fifatrack_network::event_bus::ConnectionEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, RwLock};
use tracing::{debug, info, warn};

use crate::i18n::{fill, Strings};

/// 알림 종류 (쿨다운 키)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NotificationKind {
    Restored,
    Lost(ErrorKind),
    ActionRequired(ErrorKind),
    ExtendedBackoff,
    WaitingForNetwork,
}

/// 알림 상태 (중복 방지용)
#[derive(Debug, Default)]
struct NotificationState {
    /// 종류별 마지막 발송 시각
    last_sent: HashMap<NotificationKind, DateTime<Utc>>,
}

/// 알림 관리자
pub struct NotificationManager {
    config: NotificationConfig,
    notifier: Arc<dyn DesktopNotifier>,
    state: RwLock<NotificationState>,
}

impl NotificationManager {
    /// 새 알림 관리자 생성
    pub fn new(config: NotificationConfig, notifier: Arc<dyn DesktopNotifier>) -> Self {
        Self {
            config,
            notifier,
            state: RwLock::new(NotificationState::default()),
        }
    }

    /// 이벤트 루프 (종료 신호 또는 이벤트 버스 종료까지)
    pub async fn run(
        self: Arc<Self>,
        mut events: broadcast::Receiver<ConnectionEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("알림 관리자 시작");
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => self.handle_event(&event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("알림 관리자 이벤트 {skipped}개 누락");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        info!("알림 관리자 종료");
    }

    /// 연결 이벤트 처리
    pub async fn handle_event(&self, event: &ConnectionEvent) {
        if !self.config.enabled {
            return;
        }
        let strings = Strings::for_locale(self.config.locale);
        let cooldown_secs = self.config.cooldown_secs;

        match event {
            ConnectionEvent::Connected {
                restored: true,
                connection_type,
                response_time_ms,
            } => {
                let template = if *connection_type == ConnectionType::Fallback {
                    strings.restored_fallback_body
                } else {
                    strings.restored_body
                };
                let body = fill(template, &[("ms", &response_time_ms.to_string())]);
                let sent = self
                    .send(
                        NotificationKind::Restored,
                        cooldown_secs,
                        strings.restored_title,
                        &body,
                        false,
                    )
                    .await;
                if sent {
                    // 복구 후 다음 끊김은 바로 알린다
                    self.state
                        .write()
                        .await
                        .last_sent
                        .retain(|kind, _| !matches!(kind, NotificationKind::Lost(_)));
                }
            }
            ConnectionEvent::CheckFailed { error, .. } => {
                let kind = error.kind;
                if kind.requires_user_action() {
                    self.send(
                        NotificationKind::ActionRequired(kind),
                        cooldown_secs,
                        strings.lost_title,
                        strings.lost_body(kind),
                        true,
                    )
                    .await;
                } else if kind != ErrorKind::Offline {
                    // 오프라인은 WaitingForNetwork에서 알린다
                    self.send(
                        NotificationKind::Lost(kind),
                        cooldown_secs,
                        strings.lost_title,
                        strings.lost_body(kind),
                        false,
                    )
                    .await;
                }
            }
            ConnectionEvent::ExtendedBackoff { delay_ms } => {
                let body = fill(
                    strings.extended_backoff_body,
                    &[("secs", &(delay_ms / 1000).to_string())],
                );
                self.send(
                    NotificationKind::ExtendedBackoff,
                    cooldown_secs,
                    strings.extended_backoff_title,
                    &body,
                    false,
                )
                .await;
            }
            ConnectionEvent::WaitingForNetwork { .. } => {
                self.send(
                    NotificationKind::WaitingForNetwork,
                    cooldown_secs,
                    strings.offline_title,
                    strings.waiting_for_network_body,
                    false,
                )
                .await;
            }
            other => debug!("알림 대상 아님: {:?}", other),
        }
    }

    /// 쿨다운 확인 후 발송. 실제로 발송했으면 `true`.
    async fn send(
        &self,
        kind: NotificationKind,
        cooldown_secs: u64,
        title: &str,
        body: &str,
        is_error: bool,
    ) -> bool {
        let mut state = self.state.write().await;
        let now = Utc::now();
        if let Some(last) = state.last_sent.get(&kind) {
            if (now - *last).num_seconds() < cooldown_secs as i64 {
                debug!("알림 쿨다운 중: {:?}", kind);
                return false;
            }
        }

        let result = if is_error {
            self.notifier.show_error(body).await
        } else {
            self.notifier.show_notification(title, body).await
        };

        match result {
            Ok(()) => {
                state.last_sent.insert(kind, now);
                info!("연결 알림 발송: {:?}", kind);
                true
            }
            Err(e) => {
                debug!("알림 발송 실패: {e}");
                false
            }
        }
    }
}
