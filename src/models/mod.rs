pub mod image;
pub mod provider;
pub mod upload;

pub use self::image::*;
pub use self::provider::*;
pub use self::upload::*;
