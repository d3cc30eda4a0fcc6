//! # fifatrack-app
//!
//! fifatrack 연결 모니터 바이너리 진입점.
//! 설정 로드, DI 와이어링, 알림/콘솔 태스크, 라이프사이클 관리.

mod console;
mod i18n;
mod lifecycle;
mod notification_manager;
mod notifier;
mod settings;

use anyhow::{anyhow, Result};
use clap::Parser;
use fifatrack_core::config::AppConfig;
use fifatrack_core::models::connection::CheckOutcome;
use fifatrack_core::models::locale::Locale;
use fifatrack_core::ports::backend::BackendProbe;
use fifatrack_core::ports::network::NetworkProbe;
use fifatrack_core::ports::notifier::DesktopNotifier;
use fifatrack_network::connectivity::ConnectionMonitor;
use fifatrack_network::network_probe::TcpNetworkProbe;
use fifatrack_network::supabase_client::SupabaseProbe;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::Console;
use crate::lifecycle::LifecycleManager;
use crate::notification_manager::NotificationManager;
use crate::notifier::TerminalNotifier;
use crate::settings::CliOverrides;

/// fifatrack 연결 모니터
///
/// Supabase 백엔드 연결 상태를 감시하고 끊기면 자동으로 재연결한다.
#[derive(Parser, Debug)]
#[command(name = "fifatrack")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼별 설정 디렉토리)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Supabase 프로젝트 URL
    #[arg(long, short = 'u')]
    backend_url: Option<String>,

    /// 대체 엔드포인트 URL
    #[arg(long)]
    fallback_url: Option<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 알림 언어 (ko, en)
    #[arg(long)]
    locale: Option<String>,

    /// 대화형 콘솔 없이 실행
    #[arg(long)]
    no_console: bool,

    /// 기본 설정 파일만 생성하고 종료
    #[arg(long)]
    init_config: bool,
}

/// 배너 출력
fn print_banner(config: &AppConfig) {
    println!();
    println!("┌──────────────────────────────────────────────┐");
    println!("│  ⚽ fifatrack 연결 모니터 v{:<18}│", env!("CARGO_PKG_VERSION"));
    println!("└──────────────────────────────────────────────┘");
    println!("  백엔드: {}", config.backend.url);
    if let Some(fallback) = &config.backend.fallback_url {
        println!("  대체:   {fallback}");
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // tracing 초기화
    let log_filter = format!(
        "fifatrack={},fifatrack_app={},fifatrack_core={},fifatrack_network={}",
        args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config_path = settings::resolve_config_path(args.config.as_deref());

    // 설정 파일 생성만 (즉시 종료)
    if args.init_config {
        let path = settings::init_config_file(&config_path)?;
        println!("✅ 설정 파일: {}", path.display());
        return Ok(());
    }

    let locale = match args.locale.as_deref() {
        Some(code) => Some(
            Locale::from_code(code).ok_or_else(|| anyhow!("지원하지 않는 언어: {code}"))?,
        ),
        None => None,
    };
    let overrides = CliOverrides {
        backend_url: args.backend_url.clone(),
        fallback_url: args.fallback_url.clone(),
        locale,
    };
    let config = settings::load(&config_path, &overrides)
        .map_err(|e| anyhow!("설정 로드 실패 ({}): {e}", config_path.display()))?;

    print_banner(&config);
    if config.backend.anon_key.is_empty() {
        warn!("backend.anon_key가 비어 있음, 백엔드가 요청을 거부할 수 있습니다");
    }

    // ── 어댑터 생성 (DI 와이어링) ──

    // 1. 백엔드 프로브
    let backend: Arc<dyn BackendProbe> = Arc::new(SupabaseProbe::new(
        &config.backend,
        config.connection.probe_timeout(),
    )?);

    // 2. 네트워크 프로브
    let network: Arc<dyn NetworkProbe> =
        Arc::new(TcpNetworkProbe::from_config(&config.connection));

    // 3. 알림 어댑터
    let notifier: Arc<dyn DesktopNotifier> = Arc::new(TerminalNotifier::new());

    // 4. 라이프사이클
    let lifecycle = Arc::new(LifecycleManager::new());

    // 5. 연결 모니터
    let (monitor, handle) = ConnectionMonitor::new(config.connection.clone(), backend, network);

    // 6. 알림 관리자
    let notification_manager = Arc::new(NotificationManager::new(
        config.notification.clone(),
        notifier,
    ));

    // ── 태스크 시작 ──

    let monitor_task = tokio::spawn(monitor.run(lifecycle.subscribe()));
    tokio::spawn(notification_manager.run(handle.events(), lifecycle.subscribe()));

    // 첫 연결 확인
    match handle.check_connection().await {
        Ok(CheckOutcome::Connected { response_time_ms }) => {
            info!("백엔드 연결 확인 ({response_time_ms}ms)");
        }
        Ok(CheckOutcome::Failed(err)) => {
            warn!("첫 연결 확인 실패 [{}]: {}", err.kind, err.message);
        }
        Err(e) => error!("첫 연결 확인 에러: {e}"),
    }

    handle.start_health_check().await?;
    handle.start_keep_alive().await?;

    if args.no_console {
        info!("fifatrack 실행 중 (Ctrl+C로 종료)");
    } else {
        let console = Console::new(
            handle.clone(),
            lifecycle.clone(),
            config.notification.locale,
        );
        tokio::spawn(console.run());
    }

    // OS 시그널 또는 콘솔 quit 대기
    lifecycle.wait_for_shutdown().await;

    handle.dispose().await?;
    if let Err(e) = monitor_task.await {
        warn!("연결 모니터 태스크 종료 에러: {e}");
    }

    info!("fifatrack 종료");
    Ok(())
}
