pub mod app;
pub mod clock;
pub mod diagnostics;
pub mod ipc;
pub mod session;

pub use app::*;
pub use clock::*;
pub use diagnostics::*;
pub use ipc::*;
pub use session::*;
