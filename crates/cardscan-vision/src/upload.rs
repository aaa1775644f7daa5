//! 파일 업로드 전처리.
//!
//! 크기 제한을 넘는 이미지는 긴 변을 줄이고 JPEG로 다시 인코딩한 뒤
//! Base64 `FileData`로 바꾼다. 제한 이하면 원본 바이트를 그대로 쓴다.

use crate::encoder::{decode_image, encode_jpeg, JPEG_MIME};
use crate::resize::fit_within;
use cardscan_core::config::UploadConfig;
use cardscan_core::error::CoreError;
use cardscan_core::models::artifact::FileData;
use tracing::{debug, info};

/// 업로드 파일을 위젯 값으로 변환
pub fn prepare_upload(
    bytes: &[u8],
    name: &str,
    mime_type: &str,
    config: &UploadConfig,
) -> Result<FileData, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::validation("file", "빈 파일"));
    }

    if bytes.len() <= config.max_file_size {
        debug!("업로드 원본 사용: {} ({} bytes)", name, bytes.len());
        return Ok(FileData::from_bytes(bytes, name, mime_type));
    }

    let image = decode_image(bytes)?;
    let (src_w, src_h) = (image.width(), image.height());
    let resized = fit_within(&image, config.max_width_or_height)?;
    let encoded = encode_jpeg(&resized, config.jpeg_quality)?;

    info!(
        "업로드 축소: {} {}x{} ({} bytes) → {}x{} ({} bytes)",
        name,
        src_w,
        src_h,
        bytes.len(),
        resized.width(),
        resized.height(),
        encoded.len()
    );

    Ok(FileData::from_bytes(&encoded, name, JPEG_MIME))
}
