pub mod extract;
pub mod identity;
pub mod model;
pub mod percussion;

pub use extract::*;
pub use identity::*;
pub use model::*;
pub use percussion::*;
