//! 스캐너 설정 파일.
//!
//! `config.json` 하나에 `ScannerConfig`를 pretty JSON으로 둔다. 파일이 없으면
//! 기본값으로 만들고, 검증에 실패한 설정은 메모리에도 파일에도 남기지 않는다.

use crate::config::ScannerConfig;
use crate::error::CoreError;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 설정 파일 이름
pub const CONFIG_FILE_NAME: &str = "config.json";

/// 설정 파일 관리자
#[derive(Debug, Clone)]
pub struct ConfigManager {
    current: Arc<RwLock<ScannerConfig>>,
    path: PathBuf,
}

impl ConfigManager {
    /// 파일 경로로 열기 (없으면 상위 디렉토리와 기본 설정 파일 생성)
    pub fn with_path(path: PathBuf) -> Result<Self, CoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                fs::create_dir_all(dir)
                    .map_err(|e| io_error("설정 디렉토리 생성 실패", dir, e))?;
                info!("설정 디렉토리 생성: {}", dir.display());
            }
        }

        let current = if path.exists() {
            read_config(&path)?
        } else {
            let defaults = ScannerConfig::default_config();
            write_config(&path, &defaults)?;
            info!("기본 설정 파일 생성: {}", path.display());
            defaults
        };

        Ok(Self {
            current: Arc::new(RwLock::new(current)),
            path,
        })
    }

    /// 디렉토리 안의 `config.json`으로 열기
    pub fn in_dir(dir: &Path) -> Result<Self, CoreError> {
        Self::with_path(dir.join(CONFIG_FILE_NAME))
    }

    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// 현재 설정 (복제본)
    pub fn get(&self) -> ScannerConfig {
        self.current.read().clone()
    }

    /// 검증 → 파일 저장 → 메모리 반영
    pub fn update(&self, config: ScannerConfig) -> Result<(), CoreError> {
        config.validate()?;
        write_config(&self.path, &config)?;
        *self.current.write() = config;
        debug!("설정 저장 완료: {}", self.path.display());
        Ok(())
    }
}

fn io_error(what: &str, path: &Path, e: std::io::Error) -> CoreError {
    CoreError::Config(format!("{}: {}: {}", what, path.display(), e))
}

fn read_config(path: &Path) -> Result<ScannerConfig, CoreError> {
    let content = fs::read_to_string(path).map_err(|e| io_error("설정 파일 읽기 실패", path, e))?;
    let config: ScannerConfig = serde_json::from_str(&content).map_err(|e| {
        CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
    })?;
    config.validate()?;
    debug!("설정 파일 로드 완료: {}", path.display());
    Ok(config)
}

fn write_config(path: &Path, config: &ScannerConfig) -> Result<(), CoreError> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {}", e)))?;
    fs::write(path, content).map_err(|e| io_error("설정 파일 저장 실패", path, e))
}
