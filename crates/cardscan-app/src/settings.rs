//! 설정 로드.
//!
//! 기본값 → JSON 설정 파일 → `CARDSCAN__*` 환경 변수 순으로 덮어쓴다.
//! 경로를 지정하지 않으면 플랫폼별 설정 디렉토리의 `config.json`을 쓴다
//! (없으면 `ConfigManager`가 기본값으로 생성).

use anyhow::{Context, Result};
use cardscan_core::config::ScannerConfig;
use cardscan_core::config_manager::ConfigManager;
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 환경 변수 접두사 (`CARDSCAN__DETECTION__SAMPLE_INTERVAL_MS=200`)
pub const ENV_PREFIX: &str = "CARDSCAN";
/// 환경 변수 키 구분자
pub const ENV_SEPARATOR: &str = "__";

/// 플랫폼별 기본 설정 디렉토리
///
/// - macOS: `~/Library/Application Support/com.cardscan.scanner`
/// - Windows: `%APPDATA%\cardscan\scanner\config`
/// - Linux: `~/.config/scanner`
pub fn default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "cardscan", "scanner").map(|p| p.config_dir().to_path_buf())
}

/// CLI 인자 기준으로 설정 파일 경로 결정
///
/// 명시 경로가 없으면 기본 디렉토리에 `ConfigManager`로 파일을 준비한다.
/// 그마저 실패하면 `None` (기본값 + 환경 변수만 사용).
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let dir = default_config_dir()?;
    match ConfigManager::in_dir(&dir) {
        Ok(manager) => {
            info!("설정 파일: {}", manager.config_path().display());
            Some(manager.config_path().to_path_buf())
        }
        Err(e) => {
            warn!("설정 관리자 초기화 실패, 기본 설정 사용: {}", e);
            None
        }
    }
}

/// 프로세스 환경 변수를 포함해 설정 로드
pub fn load(path: Option<&Path>) -> Result<ScannerConfig> {
    load_with_env(path, None)
}

/// 설정 로드: `env`가 주어지면 프로세스 환경 대신 그 맵을 쓴다
pub fn load_with_env(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<ScannerConfig> {
    let defaults = Config::try_from(&ScannerConfig::default_config())
        .context("기본 설정 직렬화 실패")?;

    let mut builder = Config::builder().add_source(defaults);
    if let Some(path) = path {
        debug!("설정 파일 레이어: {}", path.display());
        builder = builder.add_source(File::from(path).format(FileFormat::Json).required(false));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env),
    );

    let config: ScannerConfig = builder
        .build()
        .context("설정 병합 실패")?
        .try_deserialize()
        .context("설정 역직렬화 실패")?;
    config.validate().context("설정 검증 실패")?;

    Ok(config)
}
