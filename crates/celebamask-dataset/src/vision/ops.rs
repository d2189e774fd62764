use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast;
use ndarray::Array3;

/// Number of semantic classes in a CelebAMask label image.
pub const NUM_CLASSES: usize = 8;

/// Class id to RGB triple, for rendering label images.
pub const COLOR_MAP: [[u8; 3]; NUM_CLASSES] = [
    [0, 0, 0],
    [0, 0, 205],
    [132, 112, 255],
    [25, 25, 112],
    [187, 255, 255],
    [102, 205, 170],
    [227, 207, 87],
    [142, 142, 56],
];

/// Converts an RGB image to a `[3, H, W]` float tensor in `[-1, 1]`.
///
/// Pixels are scaled to `[0, 1]` and then normalized channel-wise with
/// mean 0.5 and std 0.5.
pub fn image_to_tensor(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut tensor = Array3::<f32>::zeros((3, height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        for channel in 0..3 {
            tensor[[channel, y as usize, x as usize]] =
                (pixel[channel] as f32 / 255.0 - 0.5) / 0.5;
        }
    }

    tensor
}

/// One-hot encodes a label image into a `[NUM_CLASSES, H, W]` float tensor,
/// rescaled to `[-1, 1]`.
///
/// Channel `i` is hot where the label equals `i`. Label values outside
/// `[0, NUM_CLASSES)` set no channel at all; the dataset defines exactly
/// [NUM_CLASSES] classes, so such values do not occur in well-formed assets
/// and are passed through silently rather than rejected.
pub fn mask_to_one_hot(mask: &GrayImage) -> Array3<f32> {
    let (width, height) = mask.dimensions();
    let mut labels = Array3::<f32>::zeros((NUM_CLASSES, height as usize, width as usize));

    for (x, y, pixel) in mask.enumerate_pixels() {
        let class = pixel[0] as usize;
        if class < NUM_CLASSES {
            labels[[class, y as usize, x as usize]] = 1.0;
        }
    }

    labels.mapv_into(|value| (value - 0.5) / 0.5)
}

/// Renders a label image through [COLOR_MAP] for visual inspection.
///
/// Out-of-palette values render as black.
pub fn colorize_mask(mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let class = mask.get_pixel(x, y)[0] as usize;
        Rgb(COLOR_MAP.get(class).copied().unwrap_or([0, 0, 0]))
    })
}

/// Equalizes the histogram of each RGB band independently.
pub fn equalize_histogram(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();

    let bands: Vec<GrayImage> = (0..3)
        .map(|channel| {
            let band = GrayImage::from_fn(width, height, |x, y| {
                Luma([image.get_pixel(x, y)[channel]])
            });
            contrast::equalize_histogram(&band)
        })
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            bands[0].get_pixel(x, y)[0],
            bands[1].get_pixel(x, y)[0],
            bands[2].get_pixel(x, y)[0],
        ])
    })
}

/// Applies gamma correction through a per-channel lookup table.
///
/// `gamma < 1.0` brightens, `gamma > 1.0` darkens.
pub fn adjust_gamma(image: &RgbImage, gamma: f32) -> RgbImage {
    let table: [u8; 256] = std::array::from_fn(|value| {
        ((value as f32 / 255.0).powf(gamma) * 255.0).round().clamp(0.0, 255.0) as u8
    });

    let mut image = image.clone();
    for pixel in image.pixels_mut() {
        for channel in 0..3 {
            pixel[channel] = table[pixel[channel] as usize];
        }
    }

    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn one_hot_matches_worked_example() {
        // Label rows [[0, 1], [2, 7]].
        let mask = GrayImage::from_raw(2, 2, vec![0, 1, 2, 7]).unwrap();

        let encoded = mask_to_one_hot(&mask);

        assert_eq!(encoded.dim(), (NUM_CLASSES, 2, 2));
        let hot = [(0, 0, 0), (1, 0, 1), (2, 1, 0), (7, 1, 1)];
        for channel in 0..NUM_CLASSES {
            for y in 0..2 {
                for x in 0..2 {
                    let expected = if hot.contains(&(channel, y, x)) {
                        1.0
                    } else {
                        -1.0
                    };
                    assert_eq!(encoded[[channel, y, x]], expected);
                }
            }
        }
    }

    #[test]
    pub fn one_hot_round_trip_restores_binary_channels() {
        let values: Vec<u8> = (0..NUM_CLASSES as u8).cycle().take(24).collect();
        let mask = GrayImage::from_raw(6, 4, values).unwrap();

        let restored = mask_to_one_hot(&mask).mapv_into(|value| value * 0.5 + 0.5);

        for (x, y, pixel) in mask.enumerate_pixels() {
            for channel in 0..NUM_CLASSES {
                let expected = if channel == pixel[0] as usize { 1.0 } else { 0.0 };
                assert_eq!(restored[[channel, y as usize, x as usize]], expected);
            }
        }
    }

    #[test]
    pub fn one_hot_exactly_one_channel_hot_per_pixel() {
        let mask = GrayImage::from_raw(4, 2, vec![0, 3, 5, 7, 1, 1, 6, 2]).unwrap();

        let restored = mask_to_one_hot(&mask).mapv_into(|value| value * 0.5 + 0.5);

        for y in 0..2 {
            for x in 0..4 {
                let hot: f32 = (0..NUM_CLASSES).map(|c| restored[[c, y, x]]).sum();
                assert_eq!(hot, 1.0);
            }
        }
    }

    #[test]
    pub fn out_of_range_label_sets_no_channel() {
        let mask = GrayImage::from_raw(1, 1, vec![NUM_CLASSES as u8 + 1]).unwrap();

        let encoded = mask_to_one_hot(&mask);

        for channel in 0..NUM_CLASSES {
            assert_eq!(encoded[[channel, 0, 0]], -1.0);
        }
    }

    #[test]
    pub fn image_tensor_is_channel_first_and_in_range() {
        let image = RgbImage::from_fn(8, 4, |x, y| Rgb([x as u8 * 30, y as u8 * 60, 255]));

        let tensor = image_to_tensor(&image);

        assert_eq!(tensor.dim(), (3, 4, 8));
        assert!(tensor.iter().all(|&value| (-1.0..=1.0).contains(&value)));
        assert_eq!(tensor[[2, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 0, 0]], -1.0);
        assert_eq!(tensor[[1, 1, 0]], (60.0 / 255.0 - 0.5) / 0.5);
    }

    #[test]
    pub fn colorize_uses_palette() {
        let mask = GrayImage::from_raw(3, 1, vec![0, 4, 9]).unwrap();

        let rendered = colorize_mask(&mask);

        assert_eq!(rendered.get_pixel(0, 0).0, COLOR_MAP[0]);
        assert_eq!(rendered.get_pixel(1, 0).0, COLOR_MAP[4]);
        // Out of palette renders black.
        assert_eq!(rendered.get_pixel(2, 0).0, [0, 0, 0]);
    }

    #[test]
    pub fn gamma_one_is_identity() {
        let image = RgbImage::from_fn(4, 4, |x, y| Rgb([x as u8, y as u8, 200]));

        assert_eq!(adjust_gamma(&image, 1.0), image);
    }

    #[test]
    pub fn gamma_below_one_brightens() {
        let image = RgbImage::from_pixel(2, 2, Rgb([64, 64, 64]));

        let adjusted = adjust_gamma(&image, 0.5);

        assert!(adjusted.get_pixel(0, 0)[0] > 64);
    }

    #[test]
    pub fn equalize_preserves_dimensions_and_flattens_constant_images() {
        let image = RgbImage::from_pixel(5, 3, Rgb([90, 90, 90]));

        let equalized = equalize_histogram(&image);

        assert_eq!(equalized.dimensions(), (5, 3));
        let first = *equalized.get_pixel(0, 0);
        assert!(equalized.pixels().all(|&pixel| pixel == first));
    }
}
