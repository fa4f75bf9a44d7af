//! Picture extraction for deck conversion: format conversion, cropping and
//! deterministic file naming.

pub mod convert;
pub mod store;

pub use convert::{CommandConverter, ImageConverter};
pub use store::DirImageStore;
