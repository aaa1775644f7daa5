//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 코어는 렌더링 리소스를 직접 잡지 않고 이 trait들만 통해
//! 프레임을 읽고 알림/결과물을 내보낸다. `cardscan-app`에서 `Arc<dyn T>`로 와이어링한다.

pub mod capture_sink;
pub mod frame_source;
pub mod notifier;
