//! 휴리스틱 점수기.
//!
//! 학습된 분류기가 아닌 픽셀 통계 휴리스틱. 세 가지 독립 점수를 계산한다.
//!
//! 1. 텍스트 패턴: 2픽셀 간격 격자에서 오른쪽 2칸 픽셀과의 밝기 차가 50 초과인 에지 수.
//!    한 행의 에지 수가 `width / 20`을 넘으면 "가로줄"로 센다.
//! 2. 공식 색상: 4픽셀마다 샘플링해 파랑 우세(>100) 또는 진한 빨강 비율.
//! 3. 레이아웃 활동량: 4x4 격자에서 밝기가 128에서 벗어난 정도의 합.
//!
//! 종합 점수는 세 점수의 산술 평균.

use cardscan_core::models::frame::{PixelBuffer, BYTES_PER_PIXEL};
use cardscan_core::models::verdict::{DetectionVerdict, ScoreBreakdown};

/// 에지로 세는 최소 밝기 차 (초과)
const EDGE_CONTRAST: f64 = 50.0;
/// 텍스트 점수 100에 필요한 가로줄 수
const FULL_SCORE_LINES: f64 = 10.0;
/// 레이아웃 활동량 → 점수 환산 나눗수
const ACTIVITY_DIVISOR: f64 = 2000.0;
/// 레이아웃 활동량 기준 밝기
const NEUTRAL_LUMINANCE: f64 = 128.0;

/// 휴리스틱 점수기
#[derive(Debug, Clone, Copy)]
pub struct HeuristicScorer {
    threshold: f64,
}

impl HeuristicScorer {
    /// 감지 임계값(종합 점수)으로 생성
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 세부 점수 계산
    pub fn breakdown(&self, buffer: &PixelBuffer) -> ScoreBreakdown {
        let data = buffer.as_bytes();
        let (w, h) = (buffer.width() as usize, buffer.height() as usize);
        ScoreBreakdown {
            text: text_pattern_score(data, w, h),
            color: official_color_score(data),
            layout: layout_activity_score(data, w, h),
        }
    }

    /// 버퍼 판정
    pub fn score(&self, buffer: &PixelBuffer) -> DetectionVerdict {
        DetectionVerdict::from_breakdown(self.breakdown(buffer), self.threshold)
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new(50.0)
    }
}

#[inline]
fn luminance(data: &[u8], idx: usize) -> f64 {
    (data[idx] as f64 + data[idx + 1] as f64 + data[idx + 2] as f64) / 3.0
}

/// 텍스트 패턴 대비 점수 (0 ~ 100)
pub fn text_pattern_score(data: &[u8], width: usize, height: usize) -> f64 {
    let row_threshold = width as f64 / 20.0;
    let mut horizontal_lines = 0usize;

    let mut y = 0;
    while y + 2 < height {
        let mut line_contrast = 0usize;

        let mut x = 0;
        while x + 2 < width {
            let idx = (y * width + x) * BYTES_PER_PIXEL;
            let right_idx = idx + 2 * BYTES_PER_PIXEL;
            if right_idx + 2 < data.len() {
                let contrast = (luminance(data, idx) - luminance(data, right_idx)).abs();
                if contrast > EDGE_CONTRAST {
                    line_contrast += 1;
                }
            }
            x += 2;
        }

        if line_contrast as f64 > row_threshold {
            horizontal_lines += 1;
        }
        y += 2;
    }

    (horizontal_lines as f64 / FULL_SCORE_LINES * 100.0).min(100.0)
}

/// 공식 색상 점수 (0 ~ 100)
pub fn official_color_score(data: &[u8]) -> f64 {
    let mut official = 0usize;
    let mut total = 0usize;

    for px in data.chunks(BYTES_PER_PIXEL).step_by(4) {
        if px.len() < 3 {
            continue;
        }
        let (r, g, b) = (px[0], px[1], px[2]);
        total += 1;

        let blue_dominant = b > r && b > g && b > 100;
        let strong_red = r > 150 && g < 100 && b < 100;
        if blue_dominant || strong_red {
            official += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }
    (official as f64 / total as f64 * 200.0).min(100.0)
}

/// 레이아웃 활동량 점수 (0 ~ 100)
pub fn layout_activity_score(data: &[u8], width: usize, height: usize) -> f64 {
    let mid_width = width / 2;
    let mut left_activity = 0.0;
    let mut right_activity = 0.0;

    for y in (0..height).step_by(4) {
        for x in (0..width).step_by(4) {
            let idx = (y * width + x) * BYTES_PER_PIXEL;
            if idx + 2 >= data.len() {
                continue;
            }
            let activity = (luminance(data, idx) - NEUTRAL_LUMINANCE).abs();
            if x < mid_width {
                left_activity += activity;
            } else {
                right_activity += activity;
            }
        }
    }

    ((left_activity + right_activity) / ACTIVITY_DIVISOR).min(100.0)
}
