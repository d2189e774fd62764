use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use globwalk::{self, DirEntry};
use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transform::{Mapper, MapperDataset, ReplicateDataset, RngSource};
use crate::vision::{AugmentationConfig, PairedAugmentation, image_to_tensor, mask_to_one_hot};
use crate::{Dataset, InMemDataset};

const LABEL_DATA_DIR: &str = "label_data";
const UNLABEL_DATA_DIR: &str = "unlabel_data";
const IMAGE_DIR: &str = "image";
const LABEL_DIR: &str = "label";
const IMAGE_EXT: &str = "jpg";
const LABEL_EXT: &str = "png";
const TRAIN_FRACTION: f64 = 0.8;

/// Default edge length samples are resized to.
pub const DEFAULT_RESOLUTION: u32 = 256;

/// Which split of the labeled data to expose.
///
/// The labeled identifier list is partitioned by position: the first 80%
/// is the training split, the remainder the validation split.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// The first 80% of the labeled identifiers.
    Train,
    /// The remaining 20%.
    Val,
    /// The full labeled identifier list.
    TrainVal,
}

impl FromStr for Phase {
    type Err = CelebAMaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Phase::Train),
            "val" => Ok(Phase::Val),
            "train-val" => Ok(Phase::TrainVal),
            _ => Err(CelebAMaskError::InvalidPhase(s.to_string())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Train => write!(f, "train"),
            Phase::Val => write!(f, "val"),
            Phase::TrainVal => write!(f, "train-val"),
        }
    }
}

/// Error type for [CelebAMaskDataset].
#[derive(Error, Debug)]
pub enum CelebAMaskError {
    /// Unknown error.
    #[error("unknown: `{0}`")]
    Unknown(String),

    /// I/O operation error.
    #[error("I/O error: `{0}`")]
    IOError(String),

    /// Phase selector not one of `train`, `val`, `train-val`.
    #[error("invalid phase: `{0}`")]
    InvalidPhase(String),
}

/// Transform applied to unlabeled images in place of the default
/// normalization.
pub type UnlabelTransform = Arc<dyn Fn(&RgbImage) -> Array3<f32> + Send + Sync>;

/// Sample yielded by [CelebAMaskDataset].
#[derive(Debug, Clone, PartialEq)]
pub struct CelebAMaskItem {
    /// Image tensor of shape `[3, resolution, resolution]`, values in `[-1, 1]`.
    pub image: Array3<f32>,

    /// One-hot mask tensor of shape `[NUM_CLASSES, resolution, resolution]`
    /// with values in `{-1, 1}`; `None` for unlabeled data.
    ///
    /// [NUM_CLASSES]: crate::vision::NUM_CLASSES
    pub mask: Option<Array3<f32>>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
struct CelebAMaskItemRaw {
    image_path: PathBuf,
    mask_path: Option<PathBuf>,
}

struct PathsToSample {
    resolution: u32,
    augmentation: Option<PairedAugmentation>,
    unlabel_transform: UnlabelTransform,
}

impl Mapper<CelebAMaskItemRaw, CelebAMaskItem> for PathsToSample {
    /// Loads a raw item (path pair) from disk and converts it into tensors.
    ///
    /// Missing or unreadable files panic here, at access time; there is no
    /// retry or recovery.
    fn map(&self, item: &CelebAMaskItemRaw) -> CelebAMaskItem {
        let image = image::open(&item.image_path)
            .unwrap_or_else(|err| panic!("Should be able to load image {:?}: {err}", item.image_path))
            .into_rgb8();
        let image = imageops::resize(&image, self.resolution, self.resolution, FilterType::Triangle);

        match &item.mask_path {
            Some(mask_path) => {
                let mask = image::open(mask_path)
                    .unwrap_or_else(|err| panic!("Should be able to load mask {mask_path:?}: {err}"))
                    .into_luma8();
                // Nearest keeps class ids exact.
                let mask =
                    imageops::resize(&mask, self.resolution, self.resolution, FilterType::Nearest);

                let (image, mask) = match &self.augmentation {
                    Some(augmentation) => augmentation.apply(&image, &mask),
                    None => (image, mask),
                };

                CelebAMaskItem {
                    image: image_to_tensor(&image),
                    mask: Some(mask_to_one_hot(&mask)),
                }
            }
            None => CelebAMaskItem {
                image: (self.unlabel_transform)(&image),
                mask: None,
            },
        }
    }
}

type CelebAMaskMapper =
    MapperDataset<InMemDataset<CelebAMaskItemRaw>, PathsToSample, CelebAMaskItemRaw>;

/// The CelebAMask face-parsing dataset: face images paired with 8-class
/// semantic segmentation masks.
///
/// Expected directory layout (consumed read-only):
///
/// ```text
/// <dataroot>/label_data/image/**/*.jpg
/// <dataroot>/label_data/label/**/*.png     (grayscale, pixel = class id)
/// <dataroot>/unlabel_data/image/**/*.jpg
/// ```
///
/// Identifiers are ordered lexicographically by path before the train/val
/// split, so the split boundary is reproducible across platforms.
pub struct CelebAMaskDataset {
    dataset: ReplicateDataset<CelebAMaskMapper, CelebAMaskItem>,
    data_size: usize,
}

impl Dataset<CelebAMaskItem> for CelebAMaskDataset {
    fn get(&self, index: usize) -> Option<CelebAMaskItem> {
        self.dataset.get(index)
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl CelebAMaskDataset {
    /// Builder over the labeled tree (`label_data/`), exposing the given
    /// phase.
    pub fn labeled<P: AsRef<Path>>(root: P, phase: Phase) -> CelebAMaskDatasetBuilder {
        CelebAMaskDatasetBuilder::new(root, Mode::Labeled(phase))
    }

    /// Builder over the unlabeled tree (`unlabel_data/`); the full identifier
    /// list is exposed and the phase selector does not apply.
    pub fn unlabeled<P: AsRef<Path>>(root: P) -> CelebAMaskDatasetBuilder {
        CelebAMaskDatasetBuilder::new(root, Mode::Unlabeled)
    }

    /// Number of samples actually on disk, before any replication-factor
    /// padding of the reported length.
    pub fn data_size(&self) -> usize {
        self.data_size
    }
}

enum Mode {
    Labeled(Phase),
    Unlabeled,
}

/// Builder for [CelebAMaskDataset].
///
/// Entry points are [CelebAMaskDataset::labeled] and
/// [CelebAMaskDataset::unlabeled].
pub struct CelebAMaskDatasetBuilder {
    root: PathBuf,
    mode: Mode,
    resolution: u32,
    augmentation: Option<(AugmentationConfig, RngSource)>,
    unlabel_transform: Option<UnlabelTransform>,
    min_size: Option<usize>,
}

impl CelebAMaskDatasetBuilder {
    fn new<P: AsRef<Path>>(root: P, mode: Mode) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mode,
            resolution: DEFAULT_RESOLUTION,
            augmentation: None,
            unlabel_transform: None,
            min_size: None,
        }
    }

    /// Sets the square size samples are resized to.
    pub fn resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Enables paired image/mask augmentation with default parameter ranges.
    ///
    /// Augmentation only ever applies to the labeled training phases
    /// (`train` and `train-val`); it has no effect on the validation phase
    /// or on the unlabeled tree.
    ///
    /// # Arguments
    ///
    /// * `rng` - The source of the random number generator.
    pub fn augment<R>(self, rng: R) -> Self
    where
        R: Into<RngSource>,
    {
        self.augment_with(AugmentationConfig::default(), rng)
    }

    /// Enables paired augmentation with explicit parameter ranges.
    pub fn augment_with<R>(mut self, config: AugmentationConfig, rng: R) -> Self
    where
        R: Into<RngSource>,
    {
        self.augmentation = Some((config, rng.into()));
        self
    }

    /// Overrides the transform applied to unlabeled images in place of the
    /// default `[-1, 1]` normalization. Labeled samples are not affected.
    pub fn unlabel_transform(mut self, transform: UnlabelTransform) -> Self {
        self.unlabel_transform = Some(transform);
        self
    }

    /// Pads the reported length to at least `min_size`, typically
    /// `batch size × device count`, so a fixed-size batch sampling scheme
    /// never runs out of indices. Indices past the real sample count wrap
    /// modulo the real count.
    pub fn min_size(mut self, min_size: usize) -> Self {
        self.min_size = Some(min_size);
        self
    }

    /// Scans the directory tree and builds the dataset.
    ///
    /// # Returns
    ///
    /// A new dataset instance, or an error if the image directory cannot be
    /// walked.
    pub fn build(self) -> Result<CelebAMaskDataset, CelebAMaskError> {
        let data_root = self.root.join(match self.mode {
            Mode::Labeled(_) => LABEL_DATA_DIR,
            Mode::Unlabeled => UNLABEL_DATA_DIR,
        });
        let image_dir = data_root.join(IMAGE_DIR);
        let label_dir = data_root.join(LABEL_DIR);

        let identifiers = Self::scan_identifiers(&image_dir)?;

        let (identifiers, labeled, augment_phase) = match self.mode {
            Mode::Labeled(phase) => {
                let border = (identifiers.len() as f64 * TRAIN_FRACTION) as usize;
                let identifiers = match phase {
                    Phase::Train => identifiers[..border].to_vec(),
                    Phase::Val => identifiers[border..].to_vec(),
                    Phase::TrainVal => identifiers,
                };
                (identifiers, true, phase != Phase::Val)
            }
            Mode::Unlabeled => (identifiers, false, false),
        };

        if identifiers.is_empty() {
            log::warn!("No samples found under {}", image_dir.display());
        } else {
            log::info!(
                "Found {} samples under {}",
                identifiers.len(),
                image_dir.display()
            );
        }

        let items = identifiers
            .iter()
            .map(|id| CelebAMaskItemRaw {
                image_path: image_dir.join(format!("{id}.{IMAGE_EXT}")),
                mask_path: labeled.then(|| label_dir.join(format!("{id}.{LABEL_EXT}"))),
            })
            .collect::<Vec<_>>();

        let augmentation = match self.augmentation {
            Some((config, rng)) if augment_phase => Some(PairedAugmentation::new(config, rng)),
            _ => None,
        };

        let mapper = PathsToSample {
            resolution: self.resolution,
            augmentation,
            unlabel_transform: self
                .unlabel_transform
                .unwrap_or_else(|| Arc::new(|image| image_to_tensor(image))),
        };

        let data_size = items.len();
        let dataset = InMemDataset::new(items);
        let dataset = MapperDataset::new(dataset, mapper);
        let dataset = ReplicateDataset::new(dataset, self.min_size.unwrap_or(0));

        Ok(CelebAMaskDataset { dataset, data_size })
    }

    /// Walks `image_dir` recursively and returns the identifier list: paths
    /// relative to `image_dir`, extension stripped, in lexicographic order.
    fn scan_identifiers(image_dir: &Path) -> Result<Vec<String>, CelebAMaskError> {
        let walker = globwalk::GlobWalkerBuilder::from_patterns(
            image_dir,
            &[format!("*.{IMAGE_EXT}")],
        )
        .follow_links(true)
        .sort_by(|p1: &DirEntry, p2: &DirEntry| p1.path().cmp(p2.path()))
        .build()
        .map_err(|err| CelebAMaskError::Unknown(format!("{err:?}")))?
        .filter_map(Result::ok);

        let mut identifiers = Vec::new();
        for entry in walker {
            let identifier = entry
                .path()
                .strip_prefix(image_dir)
                .map_err(|err| CelebAMaskError::IOError(format!("{err}")))?
                .with_extension("")
                .to_string_lossy()
                .into_owned();
            identifiers.push(identifier);
        }

        Ok(identifiers)
    }
}
