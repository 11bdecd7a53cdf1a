pub mod chains;
pub mod errors;
pub mod intent;
pub mod route;
pub mod transfer;

pub use chains::*;
pub use errors::*;
pub use intent::*;
pub use route::*;
pub use transfer::*;
