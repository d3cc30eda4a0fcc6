//! 라이프사이클 관리.
//!
//! 종료 신호 전파, OS 시그널 처리.

use tokio::sync::watch;
use tracing::info;

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    /// 종료 수신기 복제
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// 종료 신호 발송 (중복 호출 무시)
    pub fn shutdown(&self) {
        if self.is_shutting_down() {
            return;
        }
        info!("종료 신호 발송");
        let _ = self.shutdown_tx.send(true);
    }

    /// 종료 진행 여부
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// OS 시그널 또는 내부 종료 요청(콘솔 quit 등) 대기
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.subscribe();
        let requested = async move {
            let _ = rx.wait_for(|stop| *stop).await.map(|_| ());
        };
        tokio::select! {
            _ = Self::wait_for_signal() => {}
            _ = requested => {
                info!("내부 종료 요청 수신");
            }
        }
        self.shutdown();
    }

    /// OS 시그널 대기 (SIGINT, SIGTERM)
    async fn wait_for_signal() {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT 핸들러 등록 실패");
            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM 핸들러 등록 실패");

            tokio::select! {
                _ = sigint.recv() => {
                    info!("SIGINT 수신");
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM 수신");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c()
                .await
                .expect("Ctrl+C 핸들러 등록 실패");
            info!("Ctrl+C 수신");
        }
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
