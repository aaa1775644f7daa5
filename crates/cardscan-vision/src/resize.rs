//! 이미지 리사이즈.
//!
//! fast_image_resize 기반 고속 리사이즈. 업로드 전처리에서 긴 변을
//! 제한할 때 쓴다.

use cardscan_core::error::CoreError;
use fast_image_resize::{images::Image as FirImage, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// 긴 변이 `max_side` 이하가 되는 크기 계산 (비율 유지, 확대 없음)
///
/// 소수점은 버리고 각 변은 최소 1.
pub fn fit_dimensions(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    if width == 0 || height == 0 || max_side == 0 {
        return (width, height);
    }

    if width > height {
        if width > max_side {
            let h = (height as f64 * max_side as f64 / width as f64).floor() as u32;
            return (max_side, h.max(1));
        }
    } else if height > max_side {
        let w = (width as f64 * max_side as f64 / height as f64).floor() as u32;
        return (w.max(1), max_side);
    }

    (width, height)
}

/// 고속 리사이즈
pub fn fast_resize(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, CoreError> {
    let (src_w, src_h) = (image.width(), image.height());

    if src_w == width && src_h == height {
        return Ok(image.clone());
    }

    if src_w == 0 || src_h == 0 {
        return Err(CoreError::Internal("소스 이미지 크기 0".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(CoreError::Internal("목표 이미지 크기 0".to_string()));
    }

    let src_image = FirImage::from_vec_u8(
        src_w,
        src_h,
        image.to_rgba8().into_raw(),
        fast_image_resize::PixelType::U8x4,
    )
    .map_err(|e| CoreError::Internal(format!("소스 이미지 생성 실패: {e}")))?;

    let mut dst_image = FirImage::new(width, height, fast_image_resize::PixelType::U8x4);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));

    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| CoreError::Internal(format!("리사이즈 실패: {e}")))?;

    let result = RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| CoreError::Internal("결과 이미지 생성 실패".to_string()))?;

    debug!("리사이즈: {}x{} → {}x{}", src_w, src_h, width, height);

    Ok(DynamicImage::ImageRgba8(result))
}

/// 긴 변 제한 리사이즈 (이미 작으면 그대로)
pub fn fit_within(image: &DynamicImage, max_side: u32) -> Result<DynamicImage, CoreError> {
    let (w, h) = fit_dimensions(image.width(), image.height(), max_side);
    fast_resize(image, w, h)
}
