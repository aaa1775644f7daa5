//! 프레임 감지기.
//!
//! 샘플러 + 점수기를 묶어 한 틱의 판정을 만든다. 픽셀 접근 실패는
//! 에러로 올리지 않고 실패 판정(점수 0, 재시도 안내)으로 바꾼다.

use crate::sampler::{sample, Sample};
use crate::scorer::HeuristicScorer;
use cardscan_core::config::DetectionConfig;
use cardscan_core::models::frame::GuideRegion;
use cardscan_core::models::verdict::DetectionVerdict;
use cardscan_core::ports::frame_source::FrameSource;
use tracing::{debug, warn};

/// 한 틱의 평가 결과
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvaluation {
    /// 소스 준비 안 됨: 판정 없이 건너뜀
    NotReady,
    /// 판정 완료
    Scored(DetectionVerdict),
}

impl FrameEvaluation {
    /// 양성 판정 여부 (준비 안 됨은 음성 취급)
    pub fn is_positive(&self) -> bool {
        matches!(self, FrameEvaluation::Scored(v) if v.detected)
    }

    /// 단발 분석용 판정. 준비 안 됨은 영역 퇴화 판정으로 바꾼다.
    pub fn into_verdict(self) -> DetectionVerdict {
        match self {
            FrameEvaluation::NotReady => DetectionVerdict::invalid_area(),
            FrameEvaluation::Scored(verdict) => verdict,
        }
    }
}

/// 가이드 영역 감지기
#[derive(Debug, Clone)]
pub struct FrameDetector {
    region: GuideRegion,
    scorer: HeuristicScorer,
}

impl FrameDetector {
    pub fn new(region: GuideRegion, scorer: HeuristicScorer) -> Self {
        Self { region, scorer }
    }

    /// 감지 설정으로 생성
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.guide, HeuristicScorer::new(config.detection_threshold))
    }

    pub fn region(&self) -> &GuideRegion {
        &self.region
    }

    /// 현재 프레임 평가
    pub fn evaluate(&self, source: &dyn FrameSource) -> FrameEvaluation {
        match sample(source, &self.region) {
            Ok(Sample::NotReady) => FrameEvaluation::NotReady,
            Ok(Sample::Pixels(buffer)) => {
                let verdict = self.scorer.score(&buffer);
                debug!(
                    "프레임 판정: score={:.1}, detected={}",
                    verdict.score, verdict.detected
                );
                FrameEvaluation::Scored(verdict)
            }
            Err(e) => {
                warn!("픽셀 접근 실패: {}", e);
                FrameEvaluation::Scored(DetectionVerdict::failed())
            }
        }
    }
}
