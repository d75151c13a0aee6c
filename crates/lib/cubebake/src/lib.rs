pub mod dispatch;
pub mod error;
pub mod face;
pub mod image;
pub mod kernel;
pub mod sampler;

pub use dispatch::{dispatch_groups, CubemapParams, GROUP_SIZE};
pub use error::ConvertError;
pub use face::CubeFace;
pub use glam;
pub use image::{CubeImage, ImageRgba32f};
pub use kernel::TexelOrigin;
pub use sampler::{AddressMode, SamplerDesc, TexelFilter};
