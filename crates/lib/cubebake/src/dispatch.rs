use rayon::prelude::*;

use crate::{
    face::CubeFace,
    image::{CubeImage, ImageRgba32f},
    kernel::{convert_texel, TexelOrigin},
    sampler::SamplerDesc,
    ConvertError,
};

/// Texels per work group along x, y and faces.
pub const GROUP_SIZE: [u32; 3] = [16, 16, 1];

fn div_up(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

/// Number of work groups covering every texel of a cube with `face_size`^2 texels per face.
pub fn dispatch_groups(face_size: u32) -> [u32; 3] {
    [
        div_up(face_size, GROUP_SIZE[0]),
        div_up(face_size, GROUP_SIZE[1]),
        div_up(6, GROUP_SIZE[2]),
    ]
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubemapParams {
    pub face_size: u32,
    pub texel_origin: TexelOrigin,
    pub sampler: SamplerDesc,
}

impl Default for CubemapParams {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl CubemapParams {
    pub fn new(face_size: u32) -> Self {
        Self {
            face_size,
            texel_origin: TexelOrigin::Center,
            sampler: SamplerDesc::default(),
        }
    }

    pub fn texel_origin(mut self, texel_origin: TexelOrigin) -> Self {
        self.texel_origin = texel_origin;
        self
    }

    pub fn sampler(mut self, sampler: SamplerDesc) -> Self {
        self.sampler = sampler;
        self
    }

    fn validate(&self, input: &ImageRgba32f) -> Result<(), ConvertError> {
        if self.face_size == 0 {
            return Err(ConvertError::InvalidFaceSize);
        }

        if input.is_empty() {
            return Err(ConvertError::EmptyInput);
        }

        let expected = input.width() as usize * input.height() as usize * 4;
        if input.data.len() != expected {
            return Err(ConvertError::InputSizeMismatch {
                expected,
                actual: input.data.len(),
            });
        }

        Ok(())
    }

    /// Allocates a cube and fills it from the equirectangular `input`.
    pub fn convert(&self, input: &ImageRgba32f) -> Result<CubeImage, ConvertError> {
        self.validate(input)?;

        let mut output = CubeImage::new(self.face_size);
        self.dispatch(input, &mut output);

        Ok(output)
    }

    /// Fills an existing cube, which must have been allocated with this `face_size`.
    pub fn convert_into(
        &self,
        input: &ImageRgba32f,
        output: &mut CubeImage,
    ) -> Result<(), ConvertError> {
        self.validate(input)?;

        if output.face_size != self.face_size
            || output.data.len() != CubeImage::face_floats(self.face_size) * 6
        {
            return Err(ConvertError::OutputSizeMismatch {
                expected: self.face_size,
                actual: output.face_size,
            });
        }

        self.dispatch(input, output);

        Ok(())
    }

    // Every texel is written by exactly one closure invocation: faces and row bands
    // are disjoint chunks of the output buffer.
    fn dispatch(&self, input: &ImageRgba32f, output: &mut CubeImage) {
        let face_size = self.face_size;
        let row_floats = face_size as usize * 4;
        let band_rows = GROUP_SIZE[1] as usize;

        log::debug!(
            "Converting {}x{} equirect to {}^2 cube; {:?} groups of {:?}",
            input.width(),
            input.height(),
            face_size,
            dispatch_groups(face_size),
            GROUP_SIZE,
        );

        output
            .data
            .par_chunks_mut(CubeImage::face_floats(face_size))
            .enumerate()
            .for_each(|(face_idx, face_data)| {
                let face = CubeFace::ALL[face_idx];

                face_data
                    .par_chunks_mut(row_floats * band_rows)
                    .enumerate()
                    .for_each(|(band, band_data)| {
                        for (row, row_data) in band_data.chunks_exact_mut(row_floats).enumerate() {
                            let y = (band * band_rows + row) as u32;

                            for (x, texel) in row_data.chunks_exact_mut(4).enumerate() {
                                let color = convert_texel(
                                    input,
                                    &self.sampler,
                                    face,
                                    x as u32,
                                    y,
                                    face_size,
                                    self.texel_origin,
                                );
                                color.write_to_slice(texel);
                            }
                        }
                    });
            });
    }
}
