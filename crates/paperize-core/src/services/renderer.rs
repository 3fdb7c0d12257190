//! 壁纸渲染服务
//!
//! 解码壁纸并依次应用：缩放到屏幕尺寸、变暗、模糊。

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, Rgba, RgbaImage};

use crate::models::{DisplaySize, ScalingMode, TransformOptions};
use crate::utils::error::{AppError, AppResult};

use super::resolver::{ContentResolver, LocalContentResolver};

/// blur_percent = 100 时的高斯模糊 sigma
pub const MAX_BLUR_SIGMA: f32 = 25.0;

/// 超过该 sigma 时在缩小后的副本上模糊
const DOWNSCALED_BLUR_THRESHOLD: f32 = 5.0;
const DOWNSCALE_FACTOR: u32 = 4;

/// 渲染能力
pub trait Renderer: Send + Sync {
    /// 渲染失败时返回 `ContentUnavailable` 或 `Render`
    fn render(&self, uri: &str, options: &TransformOptions) -> AppResult<DynamicImage>;
}

/// 基于 image crate 的渲染器
pub struct ImageRenderer<R = LocalContentResolver> {
    resolver: R,
}

impl ImageRenderer<LocalContentResolver> {
    pub fn with_defaults() -> Self {
        Self::new(LocalContentResolver::new())
    }
}

impl<R: ContentResolver> ImageRenderer<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    fn decode(&self, uri: &str) -> AppResult<DynamicImage> {
        let content = self.resolver.resolve(uri)?;

        let reader = ImageReader::open(&content.path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|_| AppError::ContentUnavailable(uri.to_string()))?;

        reader
            .decode()
            .map_err(|e| AppError::Render(format!("{}: {}", uri, e)))
    }
}

impl<R: ContentResolver> Renderer for ImageRenderer<R> {
    fn render(&self, uri: &str, options: &TransformOptions) -> AppResult<DynamicImage> {
        let img = self.decode(uri)?;
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(AppError::Render(format!("{}: 图片尺寸为 0", uri)));
        }

        let mut result = scale(&img, options.scaling_mode, options.display);

        if options.darken && options.darken_percent < 100 {
            result = darken(result, options.darken_percent);
        }

        if options.blur && options.blur_percent > 0 {
            let sigma = f32::from(options.blur_percent) / 100.0 * MAX_BLUR_SIGMA;
            result = blur(&result, sigma);
        }

        tracing::debug!(
            "渲染完成: {} ({}x{} -> {}x{}, {})",
            uri,
            width,
            height,
            result.width(),
            result.height(),
            options.scaling_mode.as_str()
        );

        Ok(result)
    }
}

/// 按缩放模式把图片调整到屏幕尺寸
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale(img: &DynamicImage, mode: ScalingMode, display: DisplaySize) -> DynamicImage {
    let (img_width, img_height) = img.dimensions();
    let target_width = display.width.max(1);
    let target_height = display.height.max(1);

    let scale_x = f64::from(target_width) / f64::from(img_width);
    let scale_y = f64::from(target_height) / f64::from(img_height);

    match mode {
        ScalingMode::None => img.clone(),
        ScalingMode::Stretch => {
            img.resize_exact(target_width, target_height, FilterType::CatmullRom)
        }
        ScalingMode::Fill => {
            // 等比放大铺满，居中裁剪
            let factor = scale_x.max(scale_y);
            let scaled_width = ((f64::from(img_width) * factor).round() as u32).max(target_width);
            let scaled_height =
                ((f64::from(img_height) * factor).round() as u32).max(target_height);

            let resized = img.resize_exact(scaled_width, scaled_height, FilterType::CatmullRom);

            let crop_x = (scaled_width - target_width) / 2;
            let crop_y = (scaled_height - target_height) / 2;
            resized.crop_imm(crop_x, crop_y, target_width, target_height)
        }
        ScalingMode::Fit => {
            // 等比缩放完整显示，空白处填黑
            let factor = scale_x.min(scale_y);
            let scaled_width = ((f64::from(img_width) * factor).round() as u32).clamp(1, target_width);
            let scaled_height =
                ((f64::from(img_height) * factor).round() as u32).clamp(1, target_height);

            let resized = img
                .resize_exact(scaled_width, scaled_height, FilterType::CatmullRom)
                .to_rgba8();

            let mut canvas = RgbaImage::from_pixel(target_width, target_height, Rgba([0, 0, 0, 255]));
            let offset_x = (target_width - scaled_width) / 2;
            let offset_y = (target_height - scaled_height) / 2;
            image::imageops::overlay(&mut canvas, &resized, i64::from(offset_x), i64::from(offset_y));
            DynamicImage::ImageRgba8(canvas)
        }
    }
}

/// 按保留亮度百分比缩放 RGB 通道
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn darken(img: DynamicImage, percent: u8) -> DynamicImage {
    let factor = f32::from(percent.min(100)) / 100.0;
    let mut rgba = img.into_rgba8();

    for pixel in rgba.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            *channel = (f32::from(*channel) * factor).round() as u8;
        }
    }

    DynamicImage::ImageRgba8(rgba)
}

/// 高斯模糊；sigma 较大时先缩小再模糊再放大
#[allow(clippy::cast_precision_loss)]
pub fn blur(img: &DynamicImage, sigma: f32) -> DynamicImage {
    if sigma <= DOWNSCALED_BLUR_THRESHOLD {
        return img.blur(sigma);
    }

    let (width, height) = img.dimensions();
    let small_width = (width / DOWNSCALE_FACTOR).max(1);
    let small_height = (height / DOWNSCALE_FACTOR).max(1);

    let small = img.resize_exact(small_width, small_height, FilterType::Triangle);
    let blurred_small = small.blur((sigma / DOWNSCALE_FACTOR as f32).max(1.0));

    blurred_small.resize_exact(width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_png;
    use tempfile::TempDir;

    fn options(mode: ScalingMode, width: u32, height: u32) -> TransformOptions {
        TransformOptions {
            scaling_mode: mode,
            display: DisplaySize { width, height },
            ..TransformOptions::default()
        }
    }

    #[test]
    fn test_fill_crops_to_display() {
        let tmp = TempDir::new().unwrap();
        let uri = write_png(tmp.path(), "wide.png", 40, 20, [200, 100, 50]);

        let img = ImageRenderer::with_defaults()
            .render(&uri, &options(ScalingMode::Fill, 10, 10))
            .unwrap();
        assert_eq!(img.dimensions(), (10, 10));
    }

    #[test]
    fn test_fit_letterboxes_on_black() {
        let tmp = TempDir::new().unwrap();
        let uri = write_png(tmp.path(), "wide.png", 40, 20, [255, 255, 255]);

        let img = ImageRenderer::with_defaults()
            .render(&uri, &options(ScalingMode::Fit, 20, 20))
            .unwrap()
            .to_rgba8();
        assert_eq!(img.dimensions(), (20, 20));
        // 上下为黑边，中间为原图
        assert_eq!(img.get_pixel(10, 0).0, [0, 0, 0, 255]);
        assert!(img.get_pixel(10, 10).0[0] > 250);
    }

    #[test]
    fn test_stretch_and_none() {
        let tmp = TempDir::new().unwrap();
        let uri = write_png(tmp.path(), "a.png", 8, 4, [1, 2, 3]);
        let renderer = ImageRenderer::with_defaults();

        let stretched = renderer.render(&uri, &options(ScalingMode::Stretch, 3, 9)).unwrap();
        assert_eq!(stretched.dimensions(), (3, 9));

        let untouched = renderer.render(&uri, &options(ScalingMode::None, 3, 9)).unwrap();
        assert_eq!(untouched.dimensions(), (8, 4));
    }

    #[test]
    fn test_darken_scales_channels() {
        let tmp = TempDir::new().unwrap();
        let uri = write_png(tmp.path(), "a.png", 4, 4, [200, 100, 50]);

        let mut opts = options(ScalingMode::None, 4, 4);
        opts.darken = true;
        opts.darken_percent = 50;

        let img = ImageRenderer::with_defaults().render(&uri, &opts).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0).0, [100, 50, 25, 255]);
    }

    #[test]
    fn test_blur_keeps_dimensions() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(32, 16, Rgba([9, 9, 9, 255])));
        assert_eq!(blur(&img, 2.0).dimensions(), (32, 16));
        assert_eq!(blur(&img, MAX_BLUR_SIGMA).dimensions(), (32, 16));
    }

    #[test]
    fn test_failures_are_classified() {
        let tmp = TempDir::new().unwrap();
        let renderer = ImageRenderer::with_defaults();
        let opts = TransformOptions::default();

        let missing = tmp.path().join("gone.png");
        let err = renderer.render(&missing.to_string_lossy(), &opts).unwrap_err();
        assert!(matches!(err, AppError::ContentUnavailable(_)));

        let garbage = tmp.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        let err = renderer.render(&garbage.to_string_lossy(), &opts).unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
        assert!(err.is_content_failure());
    }
}
