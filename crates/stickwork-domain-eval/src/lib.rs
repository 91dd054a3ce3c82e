pub mod calibration;
pub mod grading;
pub mod judge;
pub mod matcher;
pub mod stats;
pub mod sweeper;
pub mod timeline;

pub use calibration::*;
pub use grading::*;
pub use judge::*;
pub use matcher::*;
pub use stats::*;
pub use sweeper::*;
pub use timeline::*;
