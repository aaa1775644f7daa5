//! 캡처 결과물 모델.
//!
//! 카메라 캡처/파일 업로드로 생성되어 주변 UI에 넘겨지는 이미지 데이터.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 캡처 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// 사용자 버튼 (안정화/카운트다운 우회)
    Manual,
    /// 안정화 + 카운트다운 성공 후 자동 캡처
    Auto,
}

/// 인코딩 완료된 캡처 이미지
///
/// 성공한 캡처마다 한 번 생성되어 캡처 싱크로 소유권이 넘어간다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedArtifact {
    /// 캡처 식별자
    pub capture_id: Uuid,
    /// 인코딩된 이미지 바이트
    #[serde(skip)]
    pub image_bytes: Vec<u8>,
    /// 파일 이름 (예: "camera-capture.jpg")
    pub source_name: String,
    /// MIME 타입 (예: "image/jpeg")
    pub mime_type: String,
    /// 이미지 너비 (픽셀)
    pub width: u32,
    /// 이미지 높이 (픽셀)
    pub height: u32,
    /// 캡처 경로
    pub mode: CaptureMode,
    /// 캡처 시각
    pub captured_at: DateTime<Utc>,
}

impl CapturedArtifact {
    /// 미리보기/업로드용 Base64 파일 데이터로 변환
    pub fn to_file_data(&self) -> FileData {
        FileData::from_bytes(&self.image_bytes, &self.source_name, &self.mime_type)
    }
}

/// 위젯 값: Base64 파일 데이터 (data URL 접두사 없음)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    /// Base64 인코딩된 파일 내용
    pub file: String,
    /// 파일 이름
    pub name: String,
    /// MIME 타입
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl FileData {
    /// 원시 바이트로 생성
    pub fn from_bytes(bytes: &[u8], name: &str, mime_type: &str) -> Self {
        Self {
            file: B64.encode(bytes),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
        }
    }

    /// `data:<mime>;base64,<file>` 형식 URL
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.file)
    }

    /// Base64 내용을 바이트로 복원
    pub fn decode(&self) -> Result<Vec<u8>, crate::error::CoreError> {
        B64.decode(&self.file)
            .map_err(|e| crate::error::CoreError::Decoding(format!("Base64 디코딩 실패: {e}")))
    }
}
