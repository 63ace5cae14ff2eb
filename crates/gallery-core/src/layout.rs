//! Gallery layout: width shares inside a block and column bucketing for
//! multi-file uploads.

use crate::config::GalleryConfig;
use crate::model::ImageRecord;

/// Rendered width of one image inside its block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageWidth {
    /// Share of the block width, 0..=100.
    Percent(f64),
    /// Natural pixel width (small lone images are not stretched).
    Pixels(u32),
}

impl ImageWidth {
    pub fn to_css(self) -> String {
        match self {
            ImageWidth::Percent(p) => format!("{}%", (p * 10_000.0).round() / 10_000.0),
            ImageWidth::Pixels(px) => format!("{px}px"),
        }
    }
}

/// Distribute images round-robin into `ceil(n / 3)` buckets, one per new
/// block. The remainder lands in the leading buckets: 7 images become
/// buckets of 3, 2 and 2.
pub fn bucket_into_columns(images: Vec<ImageRecord>) -> Vec<Vec<ImageRecord>> {
    bucket_with_capacity(images, GalleryConfig::default().max_images_per_block)
}

pub fn bucket_with_capacity(images: Vec<ImageRecord>, capacity: usize) -> Vec<Vec<ImageRecord>> {
    let capacity = capacity.max(1);
    let columns = images.len().div_ceil(capacity);
    let mut buckets: Vec<Vec<ImageRecord>> = (0..columns)
        .map(|_| Vec::with_capacity(capacity))
        .collect();
    for (i, image) in images.into_iter().enumerate() {
        buckets[i % columns].push(image);
    }
    buckets
}

/// Percentage of the block width given to `image`.
pub fn width_share(image: &ImageRecord, total_aspect_ratio: f64) -> f64 {
    if total_aspect_ratio <= 0.0 {
        return 100.0;
    }
    image.aspect_ratio / total_aspect_ratio * 100.0
}

/// Widths for every image of a block, in render order.
pub fn image_widths(images: &[ImageRecord], config: &GalleryConfig) -> Vec<ImageWidth> {
    if let [only] = images
        && only.pixel_width < config.natural_width_threshold
    {
        return vec![ImageWidth::Pixels(only.pixel_width)];
    }

    let total: f64 = images.iter().map(|img| img.aspect_ratio).sum();
    images
        .iter()
        .map(|img| ImageWidth::Percent(width_share(img, total)))
        .collect()
}
