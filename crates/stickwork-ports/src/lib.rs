pub mod highlight;
pub mod midi;
pub mod playback;
pub mod storage;
pub mod types;

pub use highlight::*;
pub use midi::*;
pub use playback::*;
pub use storage::*;
pub use types::*;
