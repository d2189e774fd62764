mod augmentation;
mod celeba_mask;
mod ops;

pub use augmentation::*;
pub use celeba_mask::*;
pub use ops::*;
