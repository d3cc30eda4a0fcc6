//! 대화형 콘솔.
//!
//! 표준 입력에서 한 줄 명령을 읽어 연결 모니터를 조작하고
//! 상태/진단 정보를 JSON으로 출력한다.

use fifatrack_core::error::CoreError;
use fifatrack_core::models::connection::{CheckOutcome, ConnectionType, Visibility};
use fifatrack_core::models::locale::Locale;
use fifatrack_network::connectivity::MonitorHandle;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::i18n::{fill, Strings};
use crate::lifecycle::LifecycleManager;

/// 콘솔 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Status,
    Diagnostics,
    Check,
    Pause,
    Resume,
    Background,
    Foreground,
    Online,
    Offline,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// 입력 한 줄 파싱 (대소문자 무시, 빈 줄은 `None`)
    pub fn parse(line: &str) -> Option<Result<Self, String>> {
        let word = line.split_whitespace().next()?.to_ascii_lowercase();
        let cmd = match word.as_str() {
            "status" | "s" => Self::Status,
            "diag" | "diagnostics" | "d" => Self::Diagnostics,
            "check" | "c" => Self::Check,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "background" | "bg" => Self::Background,
            "foreground" | "fg" => Self::Foreground,
            "online" => Self::Online,
            "offline" => Self::Offline,
            "help" | "h" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => return Some(Err(word)),
        };
        Some(Ok(cmd))
    }
}

/// 대화형 콘솔
pub struct Console {
    handle: MonitorHandle,
    lifecycle: Arc<LifecycleManager>,
    strings: &'static Strings,
    locale: Locale,
}

impl Console {
    /// 새 콘솔 생성
    pub fn new(handle: MonitorHandle, lifecycle: Arc<LifecycleManager>, locale: Locale) -> Self {
        Self {
            handle,
            lifecycle,
            strings: Strings::for_locale(locale),
            locale,
        }
    }

    /// 표준 입력 루프 (quit, 종료 신호, EOF까지)
    pub async fn run(self) {
        let mut shutdown_rx = self.lifecycle.subscribe();
        let mut lines = spawn_stdin_reader();
        println!("{}", self.strings.console_ready);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                line = lines.recv() => match line {
                    Some(line) => {
                        if !self.handle_line(&line).await {
                            break;
                        }
                    }
                    None => {
                        debug!("표준 입력 종료, 콘솔 중지");
                        break;
                    }
                },
            }
        }
        info!("콘솔 종료");
    }

    /// 한 줄 처리. 콘솔을 계속 돌릴지 반환.
    async fn handle_line(&self, line: &str) -> bool {
        match ConsoleCommand::parse(line) {
            None => true,
            Some(Err(word)) => {
                println!("{}", fill(self.strings.console_unknown, &[("cmd", &word)]));
                println!("{}", self.strings.console_help);
                true
            }
            Some(Ok(ConsoleCommand::Quit)) => {
                self.lifecycle.shutdown();
                false
            }
            Some(Ok(cmd)) => {
                match self.execute(cmd).await {
                    Ok(output) => println!("{output}"),
                    Err(e) => println!("❗ {e}"),
                }
                true
            }
        }
    }

    /// 명령 실행 후 출력 문자열 반환
    pub async fn execute(&self, cmd: ConsoleCommand) -> Result<String, CoreError> {
        let output = match cmd {
            ConsoleCommand::Status => serde_json::to_string_pretty(&self.handle.status())?,
            ConsoleCommand::Diagnostics => {
                let diagnostics = self.handle.diagnostics();
                let mut out = serde_json::to_string_pretty(&diagnostics)?;
                if !diagnostics.recommendations.is_empty() {
                    out.push('\n');
                    out.push_str(self.strings.console_recommendations);
                    for rec in &diagnostics.recommendations {
                        out.push_str("\n  - ");
                        out.push_str(rec.message(self.locale));
                    }
                }
                out
            }
            ConsoleCommand::Check => {
                let outcome = self.handle.check_connection().await?;
                self.describe_outcome(&outcome)
            }
            ConsoleCommand::Pause => {
                self.handle.pause_health_checks().await?;
                self.strings.console_paused.to_string()
            }
            ConsoleCommand::Resume => {
                self.handle.resume_health_checks().await?;
                self.strings.console_resumed.to_string()
            }
            ConsoleCommand::Background => {
                self.handle.set_visibility(Visibility::Background).await?;
                fill(self.strings.console_visibility, &[("value", "background")])
            }
            ConsoleCommand::Foreground => {
                self.handle.set_visibility(Visibility::Foreground).await?;
                fill(self.strings.console_visibility, &[("value", "foreground")])
            }
            ConsoleCommand::Online => {
                self.handle.network_changed(true).await?;
                fill(self.strings.console_network, &[("value", "online")])
            }
            ConsoleCommand::Offline => {
                self.handle.network_changed(false).await?;
                fill(self.strings.console_network, &[("value", "offline")])
            }
            ConsoleCommand::Help | ConsoleCommand::Quit => self.strings.console_help.to_string(),
        };
        Ok(output)
    }

    fn describe_outcome(&self, outcome: &CheckOutcome) -> String {
        match outcome {
            CheckOutcome::Connected { response_time_ms } => {
                let connection_type = type_label(self.handle.status().state.connection_type);
                fill(
                    self.strings.console_check_ok,
                    &[("type", connection_type), ("ms", &response_time_ms.to_string())],
                )
            }
            CheckOutcome::Failed(error) => fill(
                self.strings.console_check_failed,
                &[("kind", &error.kind.to_string()), ("message", &error.message)],
            ),
        }
    }
}

/// 표준 입력 전용 스레드
///
/// 블로킹 풀 밖에서 읽으므로 런타임 종료가 입력 대기에 묶이지 않는다.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    let spawned = std::thread::Builder::new()
        .name("fifatrack-console".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("콘솔 입력 읽기 실패: {e}");
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("콘솔 입력 스레드 생성 실패: {e}");
    }
    rx
}

fn type_label(connection_type: ConnectionType) -> &'static str {
    match connection_type {
        ConnectionType::Real => "real",
        ConnectionType::Fallback => "fallback",
        ConnectionType::Offline => "offline",
        ConnectionType::Unknown => "unknown",
    }
}
