//! 백엔드 연결 모니터.
//!
//! 단일 tokio 태스크(액터)가 `ConnectionState`를 단독 소유한다.
//! 나머지 앱은 `MonitorHandle`로 명령(mpsc)을 보내고
//! 상태 스냅샷(watch)과 이벤트(broadcast)를 구독한다.
//!
//! 상태 머신: Connected → Disconnected → Reconnecting → Connected.
//! 어느 단계에서든 Paused로 전환되며, 재개 시 직전 단계로 돌아간다.
//! 모든 타이머는 액터가 소유한 마감 시각이며 하나의 `select!` 루프에서 대기한다.

use chrono::Utc;
use fifatrack_core::config::ConnectionConfig;
use fifatrack_core::error::CoreError;
use fifatrack_core::models::connection::{
    CheckOutcome, ConnectionError, ConnectionPhase, ConnectionState, ConnectionType, ErrorKind,
    Visibility,
};
use fifatrack_core::models::diagnostics::{ConnectionStatus, Diagnostics};
use fifatrack_core::ports::backend::BackendProbe;
use fifatrack_core::ports::network::NetworkProbe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::event_bus::{ConnectionEvent, EventBus};
use crate::metrics::MetricsTracker;

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// 모니터 명령
#[derive(Debug)]
pub enum MonitorCommand {
    /// 즉시 연결 확인
    ///
    /// `in_flight`: 요청 시점에 진행 중이던 확인 ID (없으면 0).
    /// 해당 확인이 끝났다면 그 결과를 공유한다.
    CheckNow {
        in_flight: u64,
        reply: oneshot::Sender<Result<CheckOutcome, CoreError>>,
    },
    /// 주기적 상태 확인 시작
    StartHealthCheck,
    /// 세션 유지 하트비트 시작
    StartKeepAlive,
    /// 모든 타이머 중지
    Pause,
    /// 타이머 재개 + 즉시 확인
    Resume,
    /// 앱 가시성 변경
    SetVisibility(Visibility),
    /// 호스트 네트워크 온라인/오프라인 신호
    NetworkChanged(bool),
    /// 일반 백엔드 호출 결과 보고
    ReportOutcome(Result<Duration, CoreError>),
    /// 모니터 종료
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryKind {
    /// 지수 백오프 재시도
    Backoff,
    /// 시도 한도 도달 후 확장 대기
    Extended,
    /// 네트워크 복구 폴링
    NetworkPoll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Retry(RetryKind),
    HealthCheck,
    KeepAlive,
}

/// 액터가 소유한 타이머 마감 시각
#[derive(Debug, Default)]
struct Deadlines {
    retry: Option<(Instant, RetryKind)>,
    health_check: Option<Instant>,
    keep_alive: Option<Instant>,
}

impl Deadlines {
    /// 가장 이른 마감
    fn next(&self) -> Option<(Instant, TimerKind)> {
        [
            self.retry.map(|(at, kind)| (at, TimerKind::Retry(kind))),
            self.health_check.map(|at| (at, TimerKind::HealthCheck)),
            self.keep_alive.map(|at| (at, TimerKind::KeepAlive)),
        ]
        .into_iter()
        .flatten()
        .min_by_key(|(at, _)| *at)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

async fn wait_for(next: Option<(Instant, TimerKind)>) -> TimerKind {
    match next {
        Some((at, kind)) => {
            tokio::time::sleep_until(at).await;
            kind
        }
        None => std::future::pending().await,
    }
}

enum Wake {
    Shutdown,
    Command(Option<MonitorCommand>),
    Timer(TimerKind),
}

/// 마지막으로 끝난 연결 확인
struct CompletedCheck {
    id: u64,
    outcome: CheckOutcome,
}

/// 연결 모니터 (액터)
///
/// `new`로 생성 후 `run`을 별도 태스크로 실행한다.
pub struct ConnectionMonitor {
    config: ConnectionConfig,
    backend: Arc<dyn BackendProbe>,
    network: Arc<dyn NetworkProbe>,
    state: ConnectionState,
    metrics: MetricsTracker,
    backoff: Backoff,
    deadlines: Deadlines,
    health_check_enabled: bool,
    keep_alive_enabled: bool,
    /// 일시 중지 직전 단계 (재개 시 복원)
    phase_before_pause: ConnectionPhase,
    /// 백그라운드 전환으로 인한 일시 중지인지
    paused_by_background: bool,
    check_in_progress: bool,
    /// 네트워크 복구 대기 중 (대기 진입 이벤트는 한 번만)
    waiting_for_network: bool,
    /// 대기 진입 후 연속 오프라인 폴링 횟수
    offline_polls: u32,
    /// 서버가 요구한 최소 재시도 간격 (Retry-After)
    retry_after: Option<Duration>,
    next_check_id: u64,
    in_flight: Arc<AtomicU64>,
    last_check: Option<CompletedCheck>,
    command_rx: mpsc::Receiver<MonitorCommand>,
    status_tx: watch::Sender<ConnectionStatus>,
    events: EventBus,
}

impl ConnectionMonitor {
    /// 새 모니터와 핸들 생성
    pub fn new(
        config: ConnectionConfig,
        backend: Arc<dyn BackendProbe>,
        network: Arc<dyn NetworkProbe>,
    ) -> (Self, MonitorHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let events = EventBus::default();
        let in_flight = Arc::new(AtomicU64::new(0));

        let handle = MonitorHandle {
            command_tx,
            status_rx,
            events: events.clone(),
            in_flight: in_flight.clone(),
            config: config.clone(),
        };

        let monitor = Self {
            metrics: MetricsTracker::new(config.response_time_window),
            backoff: Backoff::from_config(&config),
            config,
            backend,
            network,
            state: ConnectionState::default(),
            deadlines: Deadlines::default(),
            health_check_enabled: false,
            keep_alive_enabled: false,
            phase_before_pause: ConnectionPhase::Disconnected,
            paused_by_background: false,
            check_in_progress: false,
            waiting_for_network: false,
            offline_polls: 0,
            retry_after: None,
            next_check_id: 0,
            in_flight,
            last_check: None,
            command_rx,
            status_tx,
            events,
        };

        (monitor, handle)
    }

    /// 모니터 루프 실행
    ///
    /// `shutdown_rx` 변경, `Shutdown` 명령, 또는 모든 핸들 drop 시 종료.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("연결 모니터 시작");
        self.publish_status();

        loop {
            let next = self.deadlines.next();
            let wake = tokio::select! {
                _ = shutdown_rx.changed() => Wake::Shutdown,
                cmd = self.command_rx.recv() => Wake::Command(cmd),
                kind = wait_for(next) => Wake::Timer(kind),
            };

            match wake {
                Wake::Shutdown
                | Wake::Command(None)
                | Wake::Command(Some(MonitorCommand::Shutdown)) => break,
                Wake::Command(Some(cmd)) => self.handle_command(cmd).await,
                Wake::Timer(kind) => self.handle_timer(kind).await,
            }
            self.publish_status();
        }

        self.deadlines.clear();
        self.publish_status();
        info!("연결 모니터 종료");
    }

    async fn handle_command(&mut self, cmd: MonitorCommand) {
        match cmd {
            MonitorCommand::CheckNow { in_flight, reply } => {
                let result = self.check_now(in_flight).await;
                self.publish_status();
                let _ = reply.send(result);
            }
            MonitorCommand::StartHealthCheck => self.start_health_check().await,
            MonitorCommand::StartKeepAlive => self.start_keep_alive(),
            MonitorCommand::Pause => self.pause(),
            MonitorCommand::Resume => self.resume().await,
            MonitorCommand::SetVisibility(visibility) => self.set_visibility(visibility).await,
            MonitorCommand::NetworkChanged(online) => self.network_changed(online).await,
            MonitorCommand::ReportOutcome(result) => self.report_outcome(result).await,
            MonitorCommand::Shutdown => {}
        }
    }

    async fn handle_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Retry(retry) => {
                self.deadlines.retry = None;
                match retry {
                    RetryKind::Backoff => {
                        self.check_connection().await;
                    }
                    RetryKind::Extended => {
                        info!("확장 대기 종료 — 재연결 주기 초기화");
                        self.state.reconnect_attempts = 0;
                        self.backoff.reset();
                        self.check_connection().await;
                    }
                    RetryKind::NetworkPoll => self.poll_network().await,
                }
            }
            TimerKind::HealthCheck => {
                self.deadlines.health_check = None;
                if self.state.phase == ConnectionPhase::Connected {
                    debug!("주기적 상태 확인");
                    self.check_connection().await;
                }
            }
            TimerKind::KeepAlive => self.keep_alive().await,
        }
    }

    // ============================================================
    // 연결 확인
    // ============================================================

    async fn check_now(&mut self, in_flight: u64) -> Result<CheckOutcome, CoreError> {
        if self.state.is_paused {
            return Err(CoreError::MonitorPaused);
        }
        if in_flight != 0 {
            if let Some(last) = self.last_check.as_ref().filter(|c| c.id == in_flight) {
                debug!("진행 중이던 연결 확인 결과 공유 (#{in_flight})");
                return Ok(last.outcome.clone());
            }
        }
        Ok(self.check_connection().await)
    }

    /// 세션 프로브 1회 실행 후 결과에 따라 상태 갱신
    async fn check_connection(&mut self) -> CheckOutcome {
        self.next_check_id += 1;
        let id = self.next_check_id;
        self.in_flight.store(id, Ordering::Release);
        self.check_in_progress = true;
        self.publish_status();

        let timeout = self.config.probe_timeout();
        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, self.backend.probe_session()).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(()) => {
                self.metrics.record_success(elapsed_ms);
                self.on_success(elapsed_ms);
                CheckOutcome::Connected {
                    response_time_ms: elapsed_ms,
                }
            }
            Err(e) => {
                let error = self.classify_failure(&e).await;
                self.metrics.record_failure();
                self.retry_after = retry_after_hint(&e);
                self.on_failure(error.clone());
                CheckOutcome::Failed(error)
            }
        };

        self.check_in_progress = false;
        self.in_flight.store(0, Ordering::Release);
        self.last_check = Some(CompletedCheck {
            id,
            outcome: outcome.clone(),
        });
        outcome
    }

    /// 에러 분류 (전송 실패면 네트워크 자체 단절 여부 확인)
    async fn classify_failure(&self, error: &CoreError) -> ConnectionError {
        let failure = ConnectionError::from_core(error);
        if failure.kind.is_transport_failure() && !self.network.is_online().await {
            return ConnectionError::new(ErrorKind::Offline, error.to_string());
        }
        failure
    }

    fn on_success(&mut self, response_time_ms: u64) {
        let restored = !self.state.is_connected && self.state.last_error.is_some();

        self.state.is_connected = true;
        self.state.connection_type = self.backend.mode();
        self.state.reconnect_attempts = 0;
        self.state.last_error = None;
        self.state.last_successful_connection = Some(Utc::now());
        self.state.network_online = true;
        self.waiting_for_network = false;
        self.retry_after = None;
        self.backoff.reset();
        self.deadlines.retry = None;

        if self.state.is_paused {
            self.phase_before_pause = ConnectionPhase::Connected;
        } else {
            self.set_phase(ConnectionPhase::Connected);
            self.arm_health_check();
        }

        if restored {
            info!(
                "백엔드 연결 복구 ({:?}, {}ms)",
                self.state.connection_type, response_time_ms
            );
        } else {
            debug!("연결 확인 성공 ({}ms)", response_time_ms);
        }

        self.events.publish(ConnectionEvent::Connected {
            connection_type: self.state.connection_type,
            response_time_ms,
            restored,
        });
    }

    fn on_failure(&mut self, error: ConnectionError) {
        if error.kind.requires_user_action() {
            warn!("연결 확인 실패 [{}] — 사용자 조치 필요: {}", error.kind, error.message);
        } else {
            warn!("연결 확인 실패 [{}]: {}", error.kind, error.message);
        }

        self.state.is_connected = false;
        if error.kind == ErrorKind::Offline {
            self.state.network_online = false;
            self.state.connection_type = ConnectionType::Offline;
        } else if !self.state.network_online {
            debug!("백엔드 응답 수신, 네트워크 온라인으로 간주");
            self.state.network_online = true;
        }
        self.state.last_error = Some(error.clone());
        self.deadlines.health_check = None;

        self.events.publish(ConnectionEvent::CheckFailed {
            error,
            reconnect_attempts: self.state.reconnect_attempts,
        });

        if self.state.is_paused {
            if self.phase_before_pause == ConnectionPhase::Connected {
                self.phase_before_pause = ConnectionPhase::Disconnected;
            }
            return;
        }

        if self.state.phase == ConnectionPhase::Connected {
            self.set_phase(ConnectionPhase::Disconnected);
        }
        self.attempt_reconnection();
    }

    /// 다음 재연결 예약
    ///
    /// 네트워크 단절 시 시도 횟수를 소모하지 않고 폴링만 한다.
    /// 이미 예약된 같은 종류의 재시도는 앞당기거나 미루지 않는다.
    fn attempt_reconnection(&mut self) {
        let retry_after = self.retry_after.take();
        if self.state.is_paused {
            return;
        }
        let now = Instant::now();
        let armed = self.deadlines.retry.map(|(_, kind)| kind);

        if !self.state.network_online {
            if armed == Some(RetryKind::NetworkPoll) {
                debug!("네트워크 폴링 이미 예약됨");
                return;
            }
            let poll = self.config.offline_poll_interval();
            self.deadlines.retry = Some((now + poll, RetryKind::NetworkPoll));
            self.set_phase(ConnectionPhase::Disconnected);
            if !self.waiting_for_network {
                self.waiting_for_network = true;
                self.offline_polls = 0;
                info!("네트워크 끊김 — {}ms 주기로 복구 대기", poll.as_millis());
                self.events.publish(ConnectionEvent::WaitingForNetwork {
                    poll_interval_ms: poll.as_millis() as u64,
                });
            }
            return;
        }
        self.waiting_for_network = false;

        if matches!(armed, Some(RetryKind::Backoff | RetryKind::Extended)) {
            debug!("재연결 이미 예약됨, 기존 일정 유지");
            return;
        }

        if self.state.reconnect_attempts >= self.config.max_reconnect_attempts {
            let wait = self.config.extended_backoff();
            warn!(
                "재연결 {}회 실패 — {}초 확장 대기",
                self.state.reconnect_attempts,
                wait.as_secs()
            );
            self.deadlines.retry = Some((now + wait, RetryKind::Extended));
            self.set_phase(ConnectionPhase::Reconnecting);
            self.events.publish(ConnectionEvent::ExtendedBackoff {
                delay_ms: wait.as_millis() as u64,
            });
            return;
        }

        self.state.reconnect_attempts += 1;
        let delay = self.backoff.next_delay();
        let mut total = delay.total();
        if let Some(floor) = retry_after.filter(|floor| *floor > total) {
            info!("서버 요청에 따라 재시도 지연: {}초", floor.as_secs());
            total = floor;
        }
        self.deadlines.retry = Some((now + total, RetryKind::Backoff));
        self.set_phase(ConnectionPhase::Reconnecting);
        info!(
            "재연결 예약 #{}/{}: {}ms 후",
            self.state.reconnect_attempts,
            self.config.max_reconnect_attempts,
            total.as_millis()
        );
        self.events.publish(ConnectionEvent::RetryScheduled {
            attempt: self.state.reconnect_attempts,
            base_delay_ms: delay.base.as_millis() as u64,
            delay_ms: total.as_millis() as u64,
        });
    }

    /// 네트워크 복구 폴링
    ///
    /// 감지 대상이 막힌 네트워크에서도 복구되도록
    /// `max_delay` 주기마다 백엔드를 직접 확인한다 (시도 횟수 미소모).
    async fn poll_network(&mut self) {
        if self.network.is_online().await {
            info!("네트워크 복구 감지 — 연결 확인");
            self.state.network_online = true;
            self.check_connection().await;
            return;
        }

        self.offline_polls += 1;
        if self.offline_polls >= self.polls_per_backend_probe() {
            self.offline_polls = 0;
            debug!("네트워크 감지 실패 지속, 백엔드 직접 확인");
            self.check_connection().await;
        } else {
            debug!("네트워크 여전히 끊김");
            self.deadlines.retry = Some((
                Instant::now() + self.config.offline_poll_interval(),
                RetryKind::NetworkPoll,
            ));
        }
    }

    fn polls_per_backend_probe(&self) -> u32 {
        let poll_ms = self.config.offline_poll_ms.max(1);
        (self.config.max_delay_ms / poll_ms).max(1) as u32
    }

    // ============================================================
    // 주기 작업
    // ============================================================

    async fn start_health_check(&mut self) {
        if self.health_check_enabled {
            debug!("상태 확인 이미 실행 중");
            return;
        }
        self.health_check_enabled = true;
        info!(
            "상태 확인 시작 (주기 {}초)",
            self.config
                .health_check_interval(self.state.visibility)
                .as_secs()
        );

        if self.state.is_paused {
            return;
        }
        if self.state.phase == ConnectionPhase::Connected {
            self.arm_health_check();
        } else if self.deadlines.retry.is_none() {
            self.check_connection().await;
        }
    }

    fn start_keep_alive(&mut self) {
        if self.keep_alive_enabled {
            debug!("하트비트 이미 실행 중");
            return;
        }
        self.keep_alive_enabled = true;
        info!(
            "하트비트 시작 (주기 {}초)",
            self.config.keep_alive_interval().as_secs()
        );
        self.arm_keep_alive();
    }

    /// 하트비트 1회 (실패는 로그만, 상태 불변)
    async fn keep_alive(&mut self) {
        self.deadlines.keep_alive = None;
        if self.state.is_paused || !self.keep_alive_enabled {
            return;
        }

        if self.state.network_online {
            match tokio::time::timeout(self.config.probe_timeout(), self.backend.keep_alive())
                .await
            {
                Ok(Ok(())) => debug!("하트비트 성공"),
                Ok(Err(e)) => warn!("하트비트 실패 (상태 유지): {e}"),
                Err(_) => warn!("하트비트 타임아웃 (상태 유지)"),
            }
        } else {
            debug!("네트워크 끊김 — 하트비트 생략");
        }
        self.arm_keep_alive();
    }

    fn arm_health_check(&mut self) {
        if self.health_check_enabled
            && !self.state.is_paused
            && self.state.phase == ConnectionPhase::Connected
        {
            let interval = self.config.health_check_interval(self.state.visibility);
            self.deadlines.health_check = Some(Instant::now() + interval);
        }
    }

    fn arm_keep_alive(&mut self) {
        if self.keep_alive_enabled && !self.state.is_paused {
            self.deadlines.keep_alive = Some(Instant::now() + self.config.keep_alive_interval());
        }
    }

    // ============================================================
    // 일시 중지 / 환경 신호
    // ============================================================

    fn pause(&mut self) {
        if self.state.is_paused {
            return;
        }
        self.phase_before_pause = self.state.phase;
        self.state.is_paused = true;
        self.deadlines.clear();
        self.set_phase(ConnectionPhase::Paused);
        info!("상태 확인 일시 중지");
        self.events.publish(ConnectionEvent::Paused);
    }

    async fn resume(&mut self) {
        if !self.state.is_paused {
            return;
        }
        self.state.is_paused = false;
        self.paused_by_background = false;
        self.set_phase(self.phase_before_pause);
        info!("상태 확인 재개");
        self.events.publish(ConnectionEvent::Resumed);

        self.arm_keep_alive();
        if self.state.network_online {
            self.check_connection().await;
        } else {
            self.attempt_reconnection();
        }
    }

    async fn set_visibility(&mut self, visibility: Visibility) {
        if self.state.visibility == visibility {
            return;
        }
        self.state.visibility = visibility;
        info!("앱 가시성 변경: {:?}", visibility);

        match visibility {
            Visibility::Background => {
                if self.config.pause_in_background && !self.state.is_paused {
                    self.pause();
                    self.paused_by_background = true;
                } else if self.deadlines.health_check.is_some() {
                    self.arm_health_check();
                }
            }
            Visibility::Foreground => {
                if self.paused_by_background {
                    self.resume().await;
                } else if !self.state.is_paused && self.state.phase == ConnectionPhase::Connected
                {
                    self.check_connection().await;
                }
            }
        }
    }

    async fn network_changed(&mut self, online: bool) {
        if online {
            let was_offline = !self.state.network_online;
            self.state.network_online = true;
            if was_offline && !self.state.is_paused {
                info!("네트워크 온라인 신호 — 즉시 확인");
                self.deadlines.retry = None;
                self.check_connection().await;
            }
        } else {
            if !self.state.network_online {
                return;
            }
            warn!("네트워크 오프라인 신호");
            self.state.network_online = false;
            self.on_failure(ConnectionError::offline());
        }
    }

    /// 일반 백엔드 호출 결과 반영
    ///
    /// 연결 중 실패는 재연결 루프를 시작하고, 끊긴 상태의 성공은 연결을 복구한다.
    /// 잘못된 요청은 연결 상태와 무관하므로 무시한다.
    async fn report_outcome(&mut self, result: Result<Duration, CoreError>) {
        match result {
            Ok(elapsed) => {
                if self.state.is_connected {
                    self.state.last_successful_connection = Some(Utc::now());
                } else {
                    let ms = elapsed.as_millis() as u64;
                    self.metrics.record_success(ms);
                    self.on_success(ms);
                }
            }
            Err(e) => {
                if ErrorKind::classify(&e) == ErrorKind::InvalidRequest {
                    debug!("잘못된 요청 보고 — 연결 상태와 무관: {e}");
                    return;
                }
                if !self.state.is_connected {
                    debug!("재연결 진행 중 — 호출 실패 보고 무시: {e}");
                    return;
                }
                let error = self.classify_failure(&e).await;
                self.metrics.record_failure();
                self.retry_after = retry_after_hint(&e);
                self.on_failure(error);
            }
        }
    }

    // ============================================================
    // 상태 게시
    // ============================================================

    fn set_phase(&mut self, phase: ConnectionPhase) {
        if self.state.phase != phase {
            info!("연결 상태 전환: {} → {}", self.state.phase, phase);
            self.state.phase = phase;
        }
    }

    fn publish_status(&self) {
        let now = Instant::now();
        let next_retry_in_ms = self
            .deadlines
            .retry
            .map(|(at, _)| at.saturating_duration_since(now).as_millis() as u64);

        self.status_tx.send_replace(ConnectionStatus {
            state: self.state.clone(),
            metrics: self.metrics.snapshot(),
            check_in_progress: self.check_in_progress,
            next_retry_in_ms,
            updated_at: Utc::now(),
        });
    }
}

/// 서버가 지정한 재시도 대기 (429 Retry-After)
fn retry_after_hint(error: &CoreError) -> Option<Duration> {
    match error {
        CoreError::RateLimit { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
        _ => None,
    }
}

/// 연결 모니터 핸들 (복제 가능)
///
/// 모든 조작은 명령 채널을 거치며, 모니터가 종료되면 `MonitorStopped`를 반환한다.
#[derive(Clone)]
pub struct MonitorHandle {
    command_tx: mpsc::Sender<MonitorCommand>,
    status_rx: watch::Receiver<ConnectionStatus>,
    events: EventBus,
    in_flight: Arc<AtomicU64>,
    config: ConnectionConfig,
}

impl MonitorHandle {
    async fn send(&self, cmd: MonitorCommand) -> Result<(), CoreError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| CoreError::MonitorStopped)
    }

    /// 즉시 연결 확인
    ///
    /// 진행 중인 확인이 있으면 새 호출 없이 그 결과를 받는다.
    /// 일시 중지 상태면 `MonitorPaused`.
    pub async fn check_connection(&self) -> Result<CheckOutcome, CoreError> {
        let (reply, rx) = oneshot::channel();
        let in_flight = self.in_flight.load(Ordering::Acquire);
        self.send(MonitorCommand::CheckNow { in_flight, reply }).await?;
        rx.await.map_err(|_| CoreError::MonitorStopped)?
    }

    /// 주기적 상태 확인 시작
    pub async fn start_health_check(&self) -> Result<(), CoreError> {
        self.send(MonitorCommand::StartHealthCheck).await
    }

    /// 세션 유지 하트비트 시작
    pub async fn start_keep_alive(&self) -> Result<(), CoreError> {
        self.send(MonitorCommand::StartKeepAlive).await
    }

    /// 상태 확인/하트비트/재연결 일시 중지
    pub async fn pause_health_checks(&self) -> Result<(), CoreError> {
        self.send(MonitorCommand::Pause).await
    }

    /// 일시 중지 해제 (즉시 확인 포함)
    pub async fn resume_health_checks(&self) -> Result<(), CoreError> {
        self.send(MonitorCommand::Resume).await
    }

    /// 앱 가시성 변경 알림
    pub async fn set_visibility(&self, visibility: Visibility) -> Result<(), CoreError> {
        self.send(MonitorCommand::SetVisibility(visibility)).await
    }

    /// 호스트 네트워크 상태 변경 알림
    pub async fn network_changed(&self, online: bool) -> Result<(), CoreError> {
        self.send(MonitorCommand::NetworkChanged(online)).await
    }

    /// 일반 백엔드 호출 결과 보고 (`Ok`: 소요 시간)
    pub async fn report_call_result(
        &self,
        result: Result<Duration, CoreError>,
    ) -> Result<(), CoreError> {
        self.send(MonitorCommand::ReportOutcome(result)).await
    }

    /// 현재 상태 스냅샷
    pub fn status(&self) -> ConnectionStatus {
        self.status_rx.borrow().clone()
    }

    /// 상태 스냅샷 구독
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// 연결 이벤트 구독
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// 진단 정보 (현재 스냅샷 기반)
    pub fn diagnostics(&self) -> Diagnostics {
        let status = self.status();
        let interval = self.config.health_check_interval(status.state.visibility);
        Diagnostics::build(
            status,
            interval.as_millis() as u64,
            self.config.max_reconnect_attempts,
            Utc::now(),
        )
    }

    /// 모니터 태스크 실행 여부
    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// 모니터 종료 요청 (이미 종료됐으면 무시)
    pub async fn dispose(&self) -> Result<(), CoreError> {
        if !self.is_running() {
            return Ok(());
        }
        match self.send(MonitorCommand::Shutdown).await {
            Ok(()) | Err(CoreError::MonitorStopped) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fifatrack_core::models::diagnostics::Recommendation;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use tokio::task::JoinHandle;

    // ── 테스트용 포트 구현 ──

    struct MockBackend {
        healthy: AtomicBool,
        scripted: Mutex<VecDeque<Result<(), CoreError>>>,
        latency: Duration,
        probe_calls: Mutex<Vec<Instant>>,
        keep_alive_ok: AtomicBool,
        keep_alive_calls: AtomicUsize,
    }

    impl MockBackend {
        fn new(healthy: bool) -> Arc<Self> {
            Self::with_latency(healthy, Duration::ZERO)
        }

        fn with_latency(healthy: bool, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                healthy: AtomicBool::new(healthy),
                scripted: Mutex::new(VecDeque::new()),
                latency,
                probe_calls: Mutex::new(Vec::new()),
                keep_alive_ok: AtomicBool::new(true),
                keep_alive_calls: AtomicUsize::new(0),
            })
        }

        fn set_healthy(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::SeqCst);
        }

        fn push_result(&self, result: Result<(), CoreError>) {
            self.scripted.lock().push_back(result);
        }

        fn probe_count(&self) -> usize {
            self.probe_calls.lock().len()
        }

        /// 연속 프로브 호출 간격 (ms)
        fn probe_gaps_ms(&self) -> Vec<u64> {
            let calls = self.probe_calls.lock();
            calls
                .windows(2)
                .map(|w| (w[1] - w[0]).as_millis() as u64)
                .collect()
        }
    }

    #[async_trait]
    impl BackendProbe for MockBackend {
        async fn probe_session(&self) -> Result<(), CoreError> {
            self.probe_calls.lock().push(Instant::now());
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            let scripted = self.scripted.lock().pop_front();
            if let Some(result) = scripted {
                return result;
            }
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(CoreError::Unreachable("connection refused".to_string()))
            }
        }

        async fn keep_alive(&self) -> Result<(), CoreError> {
            self.keep_alive_calls.fetch_add(1, Ordering::SeqCst);
            if self.keep_alive_ok.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(CoreError::ServiceUnavailable("503".to_string()))
            }
        }

        fn mode(&self) -> ConnectionType {
            ConnectionType::Real
        }
    }

    struct MockNetwork {
        online: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockNetwork {
        fn new(online: bool) -> Arc<Self> {
            Arc::new(Self {
                online: AtomicBool::new(online),
                calls: AtomicUsize::new(0),
            })
        }

        fn set_online(&self, online: bool) {
            self.online.store(online, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NetworkProbe for MockNetwork {
        async fn is_online(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.online.load(Ordering::SeqCst)
        }
    }

    // ── 헬퍼 ──

    fn no_jitter_config() -> ConnectionConfig {
        ConnectionConfig {
            jitter_ratio: 0.0,
            ..ConnectionConfig::default()
        }
    }

    struct Harness {
        handle: MonitorHandle,
        task: JoinHandle<()>,
        _shutdown_tx: watch::Sender<bool>,
    }

    fn spawn_monitor(
        config: ConnectionConfig,
        backend: Arc<MockBackend>,
        network: Arc<MockNetwork>,
    ) -> Harness {
        let (monitor, handle) = ConnectionMonitor::new(config, backend, network);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(monitor.run(shutdown_rx));
        Harness {
            handle,
            task,
            _shutdown_tx: shutdown_tx,
        }
    }

    /// 액터가 대기 중인 명령을 처리하도록 양보
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn drain(rx: &mut broadcast::Receiver<ConnectionEvent>) -> Vec<ConnectionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    fn retry_bases(events: &[ConnectionEvent]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                ConnectionEvent::RetryScheduled { base_delay_ms, .. } => Some(*base_delay_ms),
                _ => None,
            })
            .collect()
    }

    // ── 시나리오 ──

    #[tokio::test(start_paused = true)]
    async fn successful_check_connects() {
        let backend = MockBackend::new(true);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        let outcome = h.handle.check_connection().await.unwrap();
        assert!(outcome.is_connected());

        let status = h.handle.status();
        assert!(status.state.is_connected);
        assert_eq!(status.state.phase, ConnectionPhase::Connected);
        assert_eq!(status.state.connection_type, ConnectionType::Real);
        assert!(status.state.last_successful_connection.is_some());
        assert_eq!(status.metrics.success_rate, 100);
        assert_eq!(backend.probe_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn three_failures_back_off_two_four_eight_seconds() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));
        let mut events = h.handle.events();

        let outcome = h.handle.check_connection().await.unwrap();
        assert_eq!(outcome.error().map(|e| e.kind), Some(ErrorKind::BackendBlocked));

        // 재시도 #1(+2s), #2(+4s) 실행 후 #3(8s) 예약 상태
        tokio::time::sleep(Duration::from_millis(6_500)).await;

        assert_eq!(backend.probe_count(), 3);
        assert_eq!(backend.probe_gaps_ms(), vec![2_000, 4_000]);
        assert_eq!(retry_bases(&drain(&mut events)), vec![2_000, 4_000, 8_000]);

        let status = h.handle.status();
        assert_eq!(status.state.reconnect_attempts, 3);
        assert_eq!(status.state.phase, ConnectionPhase::Reconnecting);
        assert!(!status.state.is_connected);
        assert_eq!(status.next_retry_in_ms, Some(8_000));
    }

    #[tokio::test(start_paused = true)]
    async fn jitter_stays_within_thirty_percent() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(ConnectionConfig::default(), backend, MockNetwork::new(true));
        let mut events = h.handle.events();

        h.handle.check_connection().await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;

        let mut previous = 0;
        let scheduled: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                ConnectionEvent::RetryScheduled {
                    base_delay_ms,
                    delay_ms,
                    ..
                } => Some((base_delay_ms, delay_ms)),
                _ => None,
            })
            .collect();
        assert!(scheduled.len() >= 3);
        for (base, total) in scheduled {
            assert!(base >= previous);
            assert!(total >= base);
            assert!(total <= base + base * 3 / 10 + 1);
            previous = base;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn max_attempts_enter_extended_backoff_then_fresh_cycle() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));
        let mut events = h.handle.events();

        // t=0 최초 실패, 재시도 t=2,6,14,30,60 → 6번째 실패 후 확장 대기
        h.handle.check_connection().await.unwrap();
        tokio::time::sleep(Duration::from_millis(61_000)).await;

        assert_eq!(backend.probe_count(), 6);
        let status = h.handle.status();
        assert_eq!(status.state.reconnect_attempts, 5);
        assert_eq!(status.next_retry_in_ms, Some(30_000));

        let seen = drain(&mut events);
        assert_eq!(
            retry_bases(&seen),
            vec![2_000, 4_000, 8_000, 16_000, 30_000]
        );
        assert!(seen
            .iter()
            .any(|e| matches!(e, ConnectionEvent::ExtendedBackoff { delay_ms: 30_000 })));

        // 확장 대기 종료(t=90) → 카운터 초기화 후 새 주기
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.probe_count(), 7);
        assert_eq!(h.handle.status().state.reconnect_attempts, 1);
        assert_eq!(retry_bases(&drain(&mut events)), vec![2_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_never_exceed_maximum() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(no_jitter_config(), backend, MockNetwork::new(true));
        let mut status_rx = h.handle.subscribe();

        h.handle.check_connection().await.unwrap();

        let deadline = Instant::now() + Duration::from_secs(300);
        while Instant::now() < deadline {
            tokio::select! {
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let attempts = status_rx.borrow().state.reconnect_attempts;
                    assert!(attempts <= 5, "attempts = {attempts}");
                }
                _ = tokio::time::sleep_until(deadline) => break,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_attempts() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        h.handle.check_connection().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(h.handle.status().state.reconnect_attempts, 2);

        backend.set_healthy(true);
        tokio::time::sleep(Duration::from_secs(4)).await;

        let status = h.handle.status();
        assert!(status.state.is_connected);
        assert_eq!(status.state.reconnect_attempts, 0);
        assert_eq!(status.state.last_error, None);
        assert_eq!(status.next_retry_in_ms, None);
    }

    #[tokio::test(start_paused = true)]
    async fn offline_then_online_polls_without_spending_attempts() {
        let backend = MockBackend::new(true);
        let network = MockNetwork::new(true);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), network.clone());

        h.handle.check_connection().await.unwrap();
        assert_eq!(h.handle.status().state.phase, ConnectionPhase::Connected);

        network.set_online(false);
        backend.set_healthy(false);
        h.handle.network_changed(false).await.unwrap();
        settle().await;

        let status = h.handle.status();
        assert_eq!(status.state.phase, ConnectionPhase::Disconnected);
        assert_eq!(status.state.connection_type, ConnectionType::Offline);
        assert_eq!(
            status.state.last_error.as_ref().map(|e| e.kind),
            Some(ErrorKind::Offline)
        );
        assert_eq!(status.state.reconnect_attempts, 0);

        // 5초 주기 폴링: t≈5, 10 (백엔드 호출 없음)
        tokio::time::sleep(Duration::from_millis(12_000)).await;
        assert_eq!(network.calls(), 2);
        assert_eq!(backend.probe_count(), 1);
        assert_eq!(h.handle.status().state.reconnect_attempts, 0);

        network.set_online(true);
        backend.set_healthy(true);
        tokio::time::sleep(Duration::from_millis(4_000)).await;

        let status = h.handle.status();
        assert_eq!(network.calls(), 3);
        assert_eq!(backend.probe_count(), 2);
        assert!(status.state.is_connected);
        assert_eq!(status.state.phase, ConnectionPhase::Connected);
        assert_eq!(status.state.reconnect_attempts, 0);
        assert!(status.state.network_online);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_without_network_is_classified_offline() {
        let backend = MockBackend::new(false);
        let network = MockNetwork::new(false);
        let h = spawn_monitor(no_jitter_config(), backend, network);
        let mut events = h.handle.events();

        let outcome = h.handle.check_connection().await.unwrap();
        assert_eq!(outcome.error().map(|e| e.kind), Some(ErrorKind::Offline));

        let status = h.handle.status();
        assert_eq!(status.state.reconnect_attempts, 0);
        assert!(!status.state.network_online);
        assert_eq!(status.next_retry_in_ms, Some(5_000));
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, ConnectionEvent::WaitingForNetwork { poll_interval_ms: 5_000 })));
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_network_detection_still_recovers_via_backend() {
        let backend = MockBackend::new(true);
        backend.push_result(Err(CoreError::Unreachable("connection reset".to_string())));
        let network = MockNetwork::new(false);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), network.clone());
        let mut events = h.handle.events();

        h.handle.start_health_check().await.unwrap();
        settle().await;
        assert_eq!(
            h.handle.status().state.last_error.as_ref().map(|e| e.kind),
            Some(ErrorKind::Offline)
        );

        // 5초 폴링 6회(30초 = max_delay) 후 백엔드 직접 확인
        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(backend.probe_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let status = h.handle.status();
        assert_eq!(backend.probe_count(), 2);
        assert_eq!(network.calls(), 7);
        assert!(status.state.is_connected);
        assert!(status.state.network_online);
        assert_eq!(status.state.phase, ConnectionPhase::Connected);
        assert_eq!(status.state.reconnect_attempts, 0);

        let waits = drain(&mut events)
            .iter()
            .filter(|e| matches!(e, ConnectionEvent::WaitingForNetwork { .. }))
            .count();
        assert_eq!(waits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn offline_backend_checks_repeat_without_spending_attempts() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(false));

        h.handle.check_connection().await.unwrap();
        tokio::time::sleep(Duration::from_secs(95)).await;

        // t=0 최초, 이후 30초마다 직접 확인
        assert_eq!(backend.probe_count(), 4);
        assert_eq!(backend.probe_gaps_ms(), vec![30_000, 30_000, 30_000]);
        let status = h.handle.status();
        assert_eq!(status.state.reconnect_attempts, 0);
        assert_eq!(status.state.phase, ConnectionPhase::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_check_keeps_extended_wait() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        h.handle.check_connection().await.unwrap();
        tokio::time::sleep(Duration::from_millis(61_000)).await;
        assert_eq!(h.handle.status().next_retry_in_ms, Some(30_000));

        // t=81 수동 확인 실패 → 확장 대기 마감(t=90) 유지
        tokio::time::sleep(Duration::from_secs(20)).await;
        let outcome = h.handle.check_connection().await.unwrap();
        assert!(!outcome.is_connected());
        let status = h.handle.status();
        assert_eq!(status.state.reconnect_attempts, 5);
        assert_eq!(status.next_retry_in_ms, Some(9_000));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.probe_count(), 8);
        assert_eq!(h.handle.status().state.reconnect_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_check_keeps_pending_backoff() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        h.handle.check_connection().await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        h.handle.check_connection().await.unwrap();

        let status = h.handle.status();
        assert_eq!(status.state.reconnect_attempts, 1);
        assert_eq!(status.next_retry_in_ms, Some(1_500));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_retry_after_delays_next_attempt() {
        let backend = MockBackend::new(true);
        backend.push_result(Err(CoreError::RateLimit {
            retry_after_secs: 12,
        }));
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));
        let mut events = h.handle.events();

        h.handle.check_connection().await.unwrap();
        assert_eq!(h.handle.status().next_retry_in_ms, Some(12_000));
        assert!(drain(&mut events).iter().any(|e| matches!(
            e,
            ConnectionEvent::RetryScheduled {
                attempt: 1,
                base_delay_ms: 2_000,
                delay_ms: 12_000,
            }
        )));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(backend.probe_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(backend.probe_count(), 2);
        assert!(h.handle.status().state.is_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn network_online_signal_triggers_immediate_check() {
        let backend = MockBackend::new(false);
        let network = MockNetwork::new(false);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), network.clone());

        h.handle.check_connection().await.unwrap();
        assert_eq!(backend.probe_count(), 1);

        network.set_online(true);
        backend.set_healthy(true);
        h.handle.network_changed(true).await.unwrap();
        settle().await;

        assert_eq!(backend.probe_count(), 2);
        assert!(h.handle.status().state.is_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_monitor_makes_no_calls() {
        let backend = MockBackend::new(true);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        h.handle.check_connection().await.unwrap();
        h.handle.start_health_check().await.unwrap();
        h.handle.start_keep_alive().await.unwrap();
        h.handle.pause_health_checks().await.unwrap();
        settle().await;

        let status = h.handle.status();
        assert!(status.state.is_paused);
        assert_eq!(status.state.phase, ConnectionPhase::Paused);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(backend.probe_count(), 1);
        assert_eq!(backend.keep_alive_calls.load(Ordering::SeqCst), 0);

        let err = h.handle.check_connection().await.unwrap_err();
        assert!(matches!(err, CoreError::MonitorPaused));

        h.handle.resume_health_checks().await.unwrap();
        settle().await;

        let status = h.handle.status();
        assert!(!status.state.is_paused);
        assert_eq!(status.state.phase, ConnectionPhase::Connected);
        assert_eq!(backend.probe_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_reconnect_loop() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        h.handle.check_connection().await.unwrap();
        h.handle.pause_health_checks().await.unwrap();
        settle().await;
        assert_eq!(h.handle.status().next_retry_in_ms, None);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(backend.probe_count(), 1);

        // 재개 시 직전 단계(Reconnecting)로 복귀 후 확인
        h.handle.resume_health_checks().await.unwrap();
        settle().await;
        let status = h.handle.status();
        assert_eq!(backend.probe_count(), 2);
        assert_eq!(status.state.phase, ConnectionPhase::Reconnecting);
        assert_eq!(status.state.reconnect_attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn health_check_cadence_follows_visibility() {
        let backend = MockBackend::new(true);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        h.handle.start_health_check().await.unwrap();
        settle().await;
        assert_eq!(backend.probe_count(), 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(backend.probe_count(), 2);

        h.handle.set_visibility(Visibility::Background).await.unwrap();
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(backend.probe_count(), 2);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(backend.probe_count(), 3);
        assert_eq!(h.handle.diagnostics().health_check_interval_ms, 60_000);

        // 전면 복귀 → 즉시 확인
        h.handle.set_visibility(Visibility::Foreground).await.unwrap();
        settle().await;
        assert_eq!(backend.probe_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn background_pauses_when_configured() {
        let backend = MockBackend::new(true);
        let config = ConnectionConfig {
            pause_in_background: true,
            ..no_jitter_config()
        };
        let h = spawn_monitor(config, backend.clone(), MockNetwork::new(true));

        h.handle.start_health_check().await.unwrap();
        h.handle.set_visibility(Visibility::Background).await.unwrap();
        settle().await;
        assert!(h.handle.status().state.is_paused);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(backend.probe_count(), 1);

        h.handle.set_visibility(Visibility::Foreground).await.unwrap();
        settle().await;
        assert!(!h.handle.status().state.is_paused);
        assert_eq!(backend.probe_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_failure_leaves_state_untouched() {
        let backend = MockBackend::new(true);
        backend.keep_alive_ok.store(false, Ordering::SeqCst);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        h.handle.check_connection().await.unwrap();
        h.handle.start_keep_alive().await.unwrap();
        tokio::time::sleep(Duration::from_secs(4 * 60 + 1)).await;

        assert_eq!(backend.keep_alive_calls.load(Ordering::SeqCst), 1);
        let status = h.handle.status();
        assert!(status.state.is_connected);
        assert_eq!(status.state.reconnect_attempts, 0);
        assert_eq!(status.metrics.total_connections, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_checks_are_coalesced() {
        let backend = MockBackend::with_latency(true, Duration::from_millis(500));
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        let first = {
            let handle = h.handle.clone();
            tokio::spawn(async move { handle.check_connection().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(h.handle.status().check_in_progress);

        let second = h.handle.check_connection().await.unwrap();
        let first = first.await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.probe_count(), 1);
        assert!(!h.handle.status().check_in_progress);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_probe_times_out_after_ten_seconds() {
        let backend = MockBackend::with_latency(true, Duration::from_secs(60));
        let h = spawn_monitor(no_jitter_config(), backend, MockNetwork::new(true));

        let started = Instant::now();
        let outcome = h.handle.check_connection().await.unwrap();

        assert_eq!(outcome.error().map(|e| e.kind), Some(ErrorKind::Timeout));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_counts_attempt_and_asks_for_login() {
        let backend = MockBackend::new(true);
        backend.push_result(Err(CoreError::Auth("JWT expired".to_string())));
        let h = spawn_monitor(no_jitter_config(), backend, MockNetwork::new(true));

        let outcome = h.handle.check_connection().await.unwrap();
        let kind = outcome.error().map(|e| e.kind);
        assert_eq!(kind, Some(ErrorKind::Unauthorized));

        let diag = h.handle.diagnostics();
        assert_eq!(diag.status.state.reconnect_attempts, 1);
        assert!(diag.recommendations.contains(&Recommendation::Reauthenticate));
    }

    #[tokio::test(start_paused = true)]
    async fn reported_failure_while_connected_starts_reconnect() {
        let backend = MockBackend::new(true);
        let h = spawn_monitor(no_jitter_config(), backend.clone(), MockNetwork::new(true));

        h.handle.check_connection().await.unwrap();
        backend.set_healthy(false);
        h.handle
            .report_call_result(Err(CoreError::Unreachable("blocked".to_string())))
            .await
            .unwrap();
        settle().await;

        let status = h.handle.status();
        assert!(!status.state.is_connected);
        assert_eq!(status.state.phase, ConnectionPhase::Reconnecting);
        assert_eq!(status.state.reconnect_attempts, 1);

        // 잘못된 요청 보고는 상태에 영향 없음
        h.handle
            .report_call_result(Err(CoreError::Validation {
                field: "backend_request".to_string(),
                message: "bad filter".to_string(),
            }))
            .await
            .unwrap();
        settle().await;
        assert_eq!(h.handle.status().state.reconnect_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reported_success_restores_connection() {
        let backend = MockBackend::new(false);
        let h = spawn_monitor(no_jitter_config(), backend, MockNetwork::new(true));
        let mut events = h.handle.events();

        h.handle.check_connection().await.unwrap();
        h.handle
            .report_call_result(Ok(Duration::from_millis(120)))
            .await
            .unwrap();
        settle().await;

        let status = h.handle.status();
        assert!(status.state.is_connected);
        assert_eq!(status.state.reconnect_attempts, 0);
        assert_eq!(status.metrics.success_rate, 50);
        assert!(drain(&mut events).iter().any(|e| matches!(
            e,
            ConnectionEvent::Connected { restored: true, .. }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_stops_monitor() {
        let h = spawn_monitor(
            no_jitter_config(),
            MockBackend::new(true),
            MockNetwork::new(true),
        );

        h.handle.dispose().await.unwrap();
        h.task.await.unwrap();

        assert!(!h.handle.is_running());
        let err = h.handle.check_connection().await.unwrap_err();
        assert!(matches!(err, CoreError::MonitorStopped));
        assert!(h.handle.dispose().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_signal_stops_monitor() {
        let (monitor, handle) = ConnectionMonitor::new(
            no_jitter_config(),
            MockBackend::new(true),
            MockNetwork::new(true),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(monitor.run(shutdown_rx));

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
        assert!(!handle.is_running());
    }
}
