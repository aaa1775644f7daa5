//! # cardscan-app
//!
//! CardScan 바이너리 진입점.
//! 설정 로드, 어댑터 와이어링, 라이프사이클 관리, CLI 하위 명령.

mod capture_sink;
mod display;
mod frame_player;
mod lifecycle;
mod settings;

use anyhow::{anyhow, bail, Context, Result};
use cardscan_core::config::ScannerConfig;
use cardscan_core::models::verdict::DetectionVerdict;
use cardscan_core::ports::frame_source::FrameSource;
use cardscan_vision::detector::{FrameDetector, FrameEvaluation};
use cardscan_vision::scanner::CardScanner;
use cardscan_vision::source::ImageFrameSource;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::capture_sink::FileCaptureSink;
use crate::display::TerminalDisplay;
use crate::frame_player::FramePlayer;
use crate::lifecycle::LifecycleManager;

/// CardScan: ID 카드 업로드 / 카메라 자동 캡처
#[derive(Parser, Debug)]
#[command(name = "cardscan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 이미지 한 장의 감지 영역 판정 (JSON 출력)
    Analyze {
        /// 분석할 이미지 파일
        image: PathBuf,
    },

    /// 이미지 시퀀스를 카메라 영상처럼 재생하며 자동 캡처 세션 실행
    Scan {
        /// 프레임 이미지 디렉토리 (이름순 재생)
        frames: PathBuf,

        /// 캡처 결과 저장 디렉토리
        #[arg(long, short = 'o', default_value = "cardscan-out")]
        output_dir: PathBuf,

        /// 초당 프레임 수
        #[arg(long, default_value = "10")]
        fps: u32,

        /// 캡처를 기다리는 최대 시간 (초)
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        /// 반복 없이 마지막 프레임에서 멈춤
        #[arg(long)]
        once: bool,

        /// 자동 캡처 대신 워밍업 후 바로 수동 캡처
        #[arg(long)]
        manual: bool,
    },

    /// 업로드 전처리 (크기 초과 시 리사이즈 + JPEG 재인코딩)
    Upload {
        /// 업로드할 이미지 파일
        file: PathBuf,

        /// 위젯 값 저장 디렉토리
        #[arg(long, short = 'o', default_value = "cardscan-out")]
        output_dir: PathBuf,

        /// Base64 본문 대신 요약만 출력
        #[arg(long)]
        summary: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "cardscan={},cardscan_app={},cardscan_core={},cardscan_vision={}",
        args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = settings::resolve_config_path(args.config.as_deref());
    let config = settings::load(config_path.as_deref())?;

    match args.command {
        Command::Analyze { image } => analyze(&config, &image),
        Command::Scan {
            frames,
            output_dir,
            fps,
            timeout_secs,
            once,
            manual,
        } => {
            let options = ScanOptions {
                frames,
                output_dir,
                fps,
                timeout: Duration::from_secs(timeout_secs),
                once,
                manual,
            };
            scan(config, options).await
        }
        Command::Upload {
            file,
            output_dir,
            summary,
        } => upload(config, &file, output_dir, summary).await,
    }
}

// ============================================================
// analyze
// ============================================================

#[derive(Serialize)]
struct AnalyzeReport<'a> {
    image: &'a Path,
    width: u32,
    height: u32,
    threshold: f64,
    #[serde(flatten)]
    verdict: DetectionVerdict,
}

fn analyze(config: &ScannerConfig, path: &Path) -> Result<()> {
    let frame = image::open(path)
        .with_context(|| format!("이미지 열기 실패: {}", path.display()))?
        .to_rgba8();
    let source = ImageFrameSource::with_frame(frame);
    let (width, height) = source.dimensions();

    let detector = FrameDetector::from_config(&config.detection);
    let evaluation = detector.evaluate(&source);
    if evaluation == FrameEvaluation::NotReady {
        warn!("감지 영역이 비어 있음: {}x{}", width, height);
    }
    let verdict = evaluation.into_verdict();

    let report = AnalyzeReport {
        image: path,
        width,
        height,
        threshold: config.detection.detection_threshold,
        verdict,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ============================================================
// scan
// ============================================================

struct ScanOptions {
    frames: PathBuf,
    output_dir: PathBuf,
    fps: u32,
    timeout: Duration,
    once: bool,
    manual: bool,
}

async fn scan(config: ScannerConfig, options: ScanOptions) -> Result<()> {
    if options.fps == 0 {
        bail!("--fps는 0보다 커야 함");
    }
    let frame_interval =
        Duration::from_millis(1000 / u64::from(options.fps)).max(Duration::from_millis(1));
    let mut player = FramePlayer::load_dir(&options.frames, frame_interval)?;
    if options.once {
        player = player.once();
    }

    let sink = Arc::new(FileCaptureSink::new(&options.output_dir)?);
    let display = Arc::new(TerminalDisplay::from_config(&config));
    let warmup = config.detection.warmup_delay();
    let scanner = CardScanner::new(config, display, sink.clone())?;

    let lifecycle = LifecycleManager::new();
    let source = Arc::new(ImageFrameSource::new());
    let player_task = tokio::spawn(player.run(source.clone(), lifecycle.subscribe()));

    scanner.open_camera(source.clone())?;
    info!("스캔 시작: {} ({}fps)", options.frames.display(), options.fps);

    let mut progress = sink.subscribe();
    let outcome = tokio::select! {
        result = async {
            if options.manual {
                tokio::time::sleep(warmup).await;
                scanner.manual_capture().await.map_err(anyhow::Error::from)
            } else {
                progress
                    .wait_for(|p| p.delivered > 0)
                    .await
                    .map(|_| ())
                    .map_err(|_| anyhow!("캡처 싱크 종료"))
            }
        } => result,
        _ = lifecycle.wait_for_signal() => Err(anyhow!("사용자 중단")),
        _ = tokio::time::sleep(options.timeout) => {
            Err(anyhow!("{}초 안에 캡처되지 않음", options.timeout.as_secs()))
        }
    };

    scanner.destroy();
    lifecycle.shutdown();
    if let Err(e) = player_task.await {
        warn!("프레임 플레이어 태스크 오류: {}", e);
    }

    outcome?;
    let progress = sink.progress();
    match progress.last_image {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => bail!("캡처 결과물 없음 (실패 {}회)", progress.failed),
    }
}

// ============================================================
// upload
// ============================================================

#[derive(Serialize)]
struct UploadSummary<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    mime_type: &'a str,
    encoded_len: usize,
    original_len: usize,
}

async fn upload(
    config: ScannerConfig,
    path: &Path,
    output_dir: PathBuf,
    summary: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("파일 읽기 실패: {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("파일 이름 없음: {}", path.display()))?;
    let mime_type = image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");

    let sink = Arc::new(FileCaptureSink::new(output_dir)?);
    let display = Arc::new(TerminalDisplay::from_config(&config));
    let scanner = CardScanner::new(config, display, sink)?;

    let data = scanner.upload_file(&bytes, name, mime_type).await?;
    if summary {
        let report = UploadSummary {
            name: &data.name,
            mime_type: &data.mime_type,
            encoded_len: data.file.len(),
            original_len: bytes.len(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&data)?);
    }
    Ok(())
}
