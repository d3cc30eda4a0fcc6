//! 설정 로드.
//!
//! 우선순위: CLI 인자 > 환경 변수(`FIFATRACK__섹션__키`) > 설정 파일 > 기본값.
//! 설정 파일이 없으면 기본값으로 생성한다.

use config::{Config, Environment};
use directories::ProjectDirs;
use fifatrack_core::config::AppConfig;
use fifatrack_core::config_manager::{ConfigManager, CONFIG_FILE_NAME};
use fifatrack_core::error::CoreError;
use fifatrack_core::models::locale::Locale;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 환경 변수 접두사
pub const ENV_PREFIX: &str = "FIFATRACK";

/// CLI에서 넘어온 설정 덮어쓰기
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend_url: Option<String>,
    pub fallback_url: Option<String>,
    pub locale: Option<Locale>,
}

/// 설정 파일 경로 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/fifatrack/config.json`
/// - Windows: `%APPDATA%\fifatrack\config.json`
/// - Linux: `~/.config/fifatrack/config.json`
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    cli_path
        .map(Path::to_path_buf)
        .or_else(|| {
            ConfigManager::config_dir()
                .ok()
                .map(|dir| dir.join(CONFIG_FILE_NAME))
        })
        .or_else(|| {
            ProjectDirs::from("com", "fifatrack", "fifatrack")
                .map(|p| p.config_dir().join(CONFIG_FILE_NAME))
        })
        .unwrap_or_else(|| PathBuf::from("./").join(CONFIG_FILE_NAME))
}

/// 환경 변수 소스 (`FIFATRACK__BACKEND__URL` → `backend.url`)
pub fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// 파일 설정 위에 환경 변수 덮어쓰기
pub fn apply_env_overrides(base: &AppConfig, env: Environment) -> Result<AppConfig, CoreError> {
    let merged = Config::builder()
        .add_source(
            Config::try_from(base)
                .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {e}")))?,
        )
        .add_source(env)
        .build()
        .map_err(|e| CoreError::Config(format!("환경 변수 설정 병합 실패: {e}")))?;

    merged
        .try_deserialize()
        .map_err(|e| CoreError::Config(format!("환경 변수 설정 해석 실패: {e}")))
}

/// CLI 인자 덮어쓰기
pub fn apply_cli_overrides(config: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(url) = &overrides.backend_url {
        config.backend.url = url.clone();
    }
    if let Some(url) = &overrides.fallback_url {
        config.backend.fallback_url = Some(url.clone());
    }
    if let Some(locale) = overrides.locale {
        config.notification.locale = locale;
    }
}

/// 최종 설정 로드 및 검증
pub fn load(config_path: &Path, overrides: &CliOverrides) -> Result<AppConfig, CoreError> {
    let manager = ConfigManager::with_path(config_path.to_path_buf())?;
    info!("설정 파일: {}", manager.config_path().display());

    let mut config = apply_env_overrides(&manager.get(), env_source())?;
    apply_cli_overrides(&mut config, overrides);
    config.validate()?;

    debug!("설정 로드 완료: backend={}", config.backend.url);
    Ok(config)
}

/// 기본 설정 파일 생성 (이미 있으면 그대로 둔다)
pub fn init_config_file(config_path: &Path) -> Result<PathBuf, CoreError> {
    let manager = ConfigManager::with_path(config_path.to_path_buf())?;
    Ok(manager.config_path().to_path_buf())
}
