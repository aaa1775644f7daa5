//! 캡처 결과 싱크 포트.
//!
//! 구현: `cardscan-app::capture_sink` (파일 저장 + 미리보기 JSON)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::artifact::{CapturedArtifact, FileData};

/// 캡처 결과물 / 위젯 값 변경 수신자
#[async_trait]
pub trait CaptureSink: Send + Sync {
    /// 캡처 완료된 이미지 전달 (소유권 이전)
    async fn deliver(&self, artifact: CapturedArtifact) -> Result<(), CoreError>;

    /// 캡처 실패 통지. 부분 결과물은 전달되지 않는다.
    async fn capture_failed(&self, error: &CoreError);

    /// 위젯 값 변경 (업로드 완료 시 Some, 제거 시 None)
    async fn file_changed(&self, value: Option<&FileData>);
}
