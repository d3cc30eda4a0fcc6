//! 터미널 알림 어댑터.
//!
//! `DesktopNotifier` 포트 구현. 토스트 대신 시각이 붙은 한 줄을 출력한다.

use async_trait::async_trait;
use chrono::Local;
use fifatrack_core::error::CoreError;
use fifatrack_core::ports::notifier::DesktopNotifier;
use std::io::Write;
use std::sync::Mutex;
use tracing::{debug, warn};

/// 터미널 알림 어댑터: `DesktopNotifier` 포트 구현
pub struct TerminalNotifier<W: Write + Send = std::io::Stderr> {
    out: Mutex<W>,
}

impl TerminalNotifier {
    /// 표준 에러 출력으로 알림
    pub fn new() -> Self {
        Self::with_writer(std::io::stderr())
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> TerminalNotifier<W> {
    /// 지정된 출력으로 알림
    pub fn with_writer(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn write_line(&self, line: &str) -> Result<(), CoreError> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| CoreError::Internal("알림 출력 잠금 실패".to_string()))?;
        writeln!(out, "[{}] {}", Local::now().format("%H:%M:%S"), line)?;
        out.flush()?;
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<W: Write + Send> DesktopNotifier for TerminalNotifier<W> {
    async fn show_notification(&self, title: &str, body: &str) -> Result<(), CoreError> {
        debug!("알림: {title}");
        self.write_line(&format!("{title}: {body}"))
    }

    async fn show_error(&self, message: &str) -> Result<(), CoreError> {
        warn!("에러 알림: {message}");
        self.write_line(&format!("❗ {message}"))
    }
}
