pub mod device;
pub mod sample;
pub mod stats;

pub use device::*;
pub use sample::*;
pub use stats::*;
