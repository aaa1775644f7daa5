//! CardScan 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환하거나 `#[from] CoreError`로 래핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 샘플링, 인코딩, 설정, 유효성 검증 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 프레임 소스 준비 안 됨 (영상 크기 0, 샘플링 영역 퇴화)
    #[error("프레임 소스 준비 안 됨")]
    SourceNotReady,

    /// 픽셀 데이터 읽기 실패
    #[error("픽셀 접근 실패: {0}")]
    PixelAccess(String),

    /// RGBA 버퍼 길이가 width * height * 4와 불일치
    #[error("잘못된 픽셀 버퍼: expected={expected} bytes, actual={actual} bytes")]
    InvalidBuffer {
        /// 기대 바이트 수
        expected: usize,
        /// 실제 바이트 수
        actual: usize,
    },

    /// 이미지 인코딩 실패
    #[error("이미지 인코딩 실패: {0}")]
    Encoding(String),

    /// 이미지 디코딩 실패
    #[error("이미지 디코딩 실패: {0}")]
    Decoding(String),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 ({field}): {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 카메라 세션이 이미 닫힘
    #[error("카메라 세션 종료됨")]
    SessionClosed,

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 필드 유효성 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
