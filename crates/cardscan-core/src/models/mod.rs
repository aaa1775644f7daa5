//! CardScan 도메인 모델.
//!
//! 프레임 샘플링, 판정, 캡처 결과물, 오버레이 알림에 쓰이는
//! 데이터 구조체를 정의한다. 외부로 전달되는 모델은 `serde`를 구현한다.

pub mod artifact;
pub mod frame;
pub mod scan;
pub mod verdict;
