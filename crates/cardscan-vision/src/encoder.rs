//! JPEG 인코더.
//!
//! 캡처 결과물과 업로드 재인코딩에 쓰는 JPEG 인코딩 / 이미지 디코딩.

use cardscan_core::error::CoreError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};
use tracing::debug;

/// JPEG MIME 타입
pub const JPEG_MIME: &str = "image/jpeg";

/// JPEG 인코딩
///
/// 알파 채널은 버린다. `quality`는 1 ~ 100으로 고정된다.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let rgb = image.to_rgb8();
    let (w, h) = rgb.dimensions();
    if w == 0 || h == 0 {
        return Err(CoreError::Encoding(format!("빈 이미지: {}x{}", w, h)));
    }

    let quality = quality.clamp(1, 100);
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .encode(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
        .map_err(|e| CoreError::Encoding(format!("JPEG 인코딩 실패: {e}")))?;

    let raw_size = (w as usize) * (h as usize) * 3;
    debug!(
        "JPEG 인코딩: {}x{} → {} bytes (품질 {}, 압축률 {:.1}%)",
        w,
        h,
        encoded.len(),
        quality,
        (encoded.len() as f32 / raw_size as f32) * 100.0
    );

    Ok(encoded)
}

/// 메모리 이미지 디코딩 (포맷 자동 감지)
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, CoreError> {
    image::load_from_memory(bytes)
        .map_err(|e| CoreError::Decoding(format!("이미지 디코딩 실패: {e}")))
}
