#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Cube face size must be non-zero")]
    InvalidFaceSize,

    #[error("Input image has no texels")]
    EmptyInput,

    #[error("Input image data has {actual} floats, expected {expected}")]
    InputSizeMismatch { expected: usize, actual: usize },

    #[error("Output cube face size is {actual}, expected {expected}")]
    OutputSizeMismatch { expected: u32, actual: u32 },
}
