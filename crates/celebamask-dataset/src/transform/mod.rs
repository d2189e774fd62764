mod mapper;
mod options;
mod replicate;

pub use mapper::*;
pub use options::*;
pub use replicate::*;
