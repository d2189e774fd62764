use std::sync::Mutex;

use image::imageops;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};
use rand::Rng;
use rand::rngs::StdRng;

use crate::transform::RngSource;

/// Parameter ranges for [PairedAugmentation].
///
/// The defaults mirror the augmentation policy the dataset was trained with:
/// a coin-flip horizontal mirror, and a coin-flip affine perturbation of up
/// to 10% shift, ±20% scale and 15° rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentationConfig {
    /// Probability of a horizontal flip.
    pub flip_prob: f64,

    /// Probability of the combined shift/scale/rotate transform.
    pub shift_scale_rotate_prob: f64,

    /// Maximum shift in either axis, as a fraction of the image extent.
    pub shift_limit: f32,

    /// Maximum scale change; the factor is drawn from `1 ± scale_limit`.
    pub scale_limit: f32,

    /// Maximum rotation in degrees, either direction.
    pub rotate_limit: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            flip_prob: 0.5,
            shift_scale_rotate_prob: 0.5,
            shift_limit: 0.1,
            scale_limit: 0.2,
            rotate_limit: 15.0,
        }
    }
}

/// One random draw, applied identically to an image and its mask.
struct Draw {
    flip: bool,
    affine: Option<AffineDraw>,
}

struct AffineDraw {
    shift_x: f32,
    shift_y: f32,
    scale: f32,
    angle: f32,
}

/// Applies the same randomly drawn horizontal flip and affine perturbation to
/// a face image and its segmentation mask.
///
/// The image is warped with bilinear interpolation and a constant black
/// border; the mask is warped with nearest-neighbor interpolation and a
/// constant border of class 0, so class ids stay exact integers and no new
/// class values are introduced.
///
/// The rng lives behind a mutex so a batch loader may call
/// [apply](PairedAugmentation::apply) from several workers at once.
pub struct PairedAugmentation {
    config: AugmentationConfig,
    rng: Mutex<StdRng>,
}

impl PairedAugmentation {
    /// Creates a new paired augmentation.
    ///
    /// # Arguments
    ///
    /// * `config` - Parameter ranges.
    /// * `rng` - The source of the random number generator.
    pub fn new<R>(config: AugmentationConfig, rng: R) -> Self
    where
        R: Into<RngSource>,
    {
        Self {
            config,
            rng: Mutex::new(rng.into().into()),
        }
    }

    /// Applies one random draw to both the image and the mask.
    pub fn apply(&self, image: &RgbImage, mask: &GrayImage) -> (RgbImage, GrayImage) {
        let draw = {
            let mut rng = self.rng.lock().unwrap();
            self.draw(&mut rng, image.width(), image.height())
        };

        let mut image = image.clone();
        let mut mask = mask.clone();

        if draw.flip {
            image = imageops::flip_horizontal(&image);
            mask = imageops::flip_horizontal(&mask);
        }

        if let Some(affine) = draw.affine {
            let projection = Self::projection(&affine, image.width(), image.height());
            image = warp(&image, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]));
            mask = warp(&mask, &projection, Interpolation::Nearest, Luma([0]));
        }

        (image, mask)
    }

    fn draw(&self, rng: &mut StdRng, width: u32, height: u32) -> Draw {
        let flip = rng.random_bool(self.config.flip_prob);

        let affine = rng
            .random_bool(self.config.shift_scale_rotate_prob)
            .then(|| {
                let shift = self.config.shift_limit;
                let scale = self.config.scale_limit;
                let rotate = self.config.rotate_limit;

                AffineDraw {
                    shift_x: rng.random_range(-shift..=shift) * width as f32,
                    shift_y: rng.random_range(-shift..=shift) * height as f32,
                    scale: 1.0 + rng.random_range(-scale..=scale),
                    angle: rng.random_range(-rotate..=rotate).to_radians(),
                }
            });

        Draw { flip, affine }
    }

    /// Scale and rotation act about the image center, then the shift applies.
    fn projection(affine: &AffineDraw, width: u32, height: u32) -> Projection {
        let center_x = width as f32 / 2.0;
        let center_y = height as f32 / 2.0;

        Projection::translate(affine.shift_x + center_x, affine.shift_y + center_y)
            * Projection::rotate(affine.angle)
            * Projection::scale(affine.scale, affine.scale)
            * Projection::translate(-center_x, -center_y)
    }
}
