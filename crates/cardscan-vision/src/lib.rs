//! # cardscan-vision
//!
//! 프레임 분석 / 자동 캡처 결정 엔진.
//! 가이드 영역 샘플링 → 휴리스틱 점수 → 안정화 추적 → 카운트다운 검증 → 캡처
//! 파이프라인과, 파일 업로드 전처리를 담당한다.

pub mod capture;
pub mod channel_notifier;
pub mod countdown;
pub mod detector;
pub mod encoder;
pub mod resize;
pub mod sampler;
pub mod scanner;
pub mod scorer;
pub mod session;
pub mod source;
pub mod stability;
pub mod upload;
