use celebamask_dataset::Dataset;
use celebamask_dataset::vision::{CelebAMaskDataset, NUM_CLASSES, Phase};

fn main() {
    let root = std::env::args().nth(1).expect("Usage: inspect <dataroot>");

    let dataset = CelebAMaskDataset::labeled(&root, Phase::Val)
        .build()
        .expect("Should be able to scan the dataset root");

    println!("Validation samples: {}", dataset.len());

    if let Some(item) = dataset.get(0) {
        println!("Image shape: {:?}", item.image.dim());

        if let Some(mask) = &item.mask {
            println!("Mask shape: {:?}", mask.dim());

            // Per-class pixel counts, recovered from the one-hot encoding.
            let mut counts = [0usize; NUM_CLASSES];
            let (_, height, width) = mask.dim();
            for y in 0..height {
                for x in 0..width {
                    for (class, count) in counts.iter_mut().enumerate() {
                        if mask[[class, y, x]] == 1.0 {
                            *count += 1;
                        }
                    }
                }
            }
            println!("Class coverage: {counts:?}");
        }
    }
}
