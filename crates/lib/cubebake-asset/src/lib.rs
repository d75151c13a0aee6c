pub mod image;
pub mod write;

pub use self::image::{load_image, load_image_from_memory};
pub use write::{
    write_cube, write_dds_cube, write_exr_faces, write_exr_strip, OutputContainer, PixelFormat,
};
