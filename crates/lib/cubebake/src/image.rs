use glam::{Vec2, Vec3, Vec4};

use crate::{face::CubeFace, kernel::TexelOrigin, ConvertError};

fn pixel_offset(width: u32, x: u32, y: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}

/// A 2D float image, four channels per pixel, rows stored top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRgba32f {
    pub size: [u32; 2],
    pub data: Vec<f32>,
}

impl ImageRgba32f {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: [width, height],
            data: vec![0.0; width as usize * height as usize * 4],
        }
    }

    pub fn from_raw(size: [u32; 2], data: Vec<f32>) -> Result<Self, ConvertError> {
        let expected = size[0] as usize * size[1] as usize * 4;
        if data.len() != expected {
            return Err(ConvertError::InputSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self { size, data })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Vec4) -> Self {
        let mut image = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                image.put_pixel(x, y, f(x, y));
            }
        }
        image
    }

    pub fn width(&self) -> u32 {
        self.size[0]
    }

    pub fn height(&self) -> u32 {
        self.size[1]
    }

    pub fn is_empty(&self) -> bool {
        self.size[0] == 0 || self.size[1] == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        let offset = pixel_offset(self.size[0], x, y);
        Vec4::from_slice(&self.data[offset..offset + 4])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: Vec4) {
        let offset = pixel_offset(self.size[0], x, y);
        rgba.write_to_slice(&mut self.data[offset..offset + 4]);
    }
}

/// Six square float faces stored back to back in face index order.
#[derive(Clone, Debug, PartialEq)]
pub struct CubeImage {
    pub face_size: u32,
    pub data: Vec<f32>,
}

impl CubeImage {
    pub fn new(face_size: u32) -> Self {
        Self {
            face_size,
            data: vec![0.0; Self::face_floats(face_size) * 6],
        }
    }

    pub(crate) fn face_floats(face_size: u32) -> usize {
        face_size as usize * face_size as usize * 4
    }

    pub fn face(&self, face: CubeFace) -> &[f32] {
        let len = Self::face_floats(self.face_size);
        let start = face.index() * len;
        &self.data[start..start + len]
    }

    fn texel_offset(&self, face: CubeFace, x: u32, y: u32) -> usize {
        Self::face_floats(self.face_size) * face.index() + pixel_offset(self.face_size, x, y)
    }

    pub fn texel(&self, face: CubeFace, x: u32, y: u32) -> Vec4 {
        let offset = self.texel_offset(face, x, y);
        Vec4::from_slice(&self.data[offset..offset + 4])
    }

    pub fn put_texel(&mut self, face: CubeFace, x: u32, y: u32, rgba: Vec4) {
        let offset = self.texel_offset(face, x, y);
        rgba.write_to_slice(&mut self.data[offset..offset + 4]);
    }

    fn texel_coords(&self, uv: Vec2, origin: TexelOrigin) -> Vec2 {
        let st = Vec2::new(uv.x + 1.0, 1.0 - uv.y) * 0.5 * self.face_size as f32;

        match origin {
            TexelOrigin::Center => st.floor(),
            TexelOrigin::Corner => st.round(),
        }
    }

    /// Finds the texel whose footprint contains `dir`, under the given texel origin convention.
    ///
    /// Directions on a cube edge or corner touch several faces. The first of those with a
    /// texel at that spot wins, so corner-convention texels on the left and top borders
    /// come back as the same sampling point, possibly on the neighboring face.
    pub fn texel_for_direction(&self, dir: Vec3, origin: TexelOrigin) -> (CubeFace, u32, u32) {
        let (face, uv) = CubeFace::from_direction(dir);
        let max = Vec2::splat(self.face_size.saturating_sub(1) as f32);
        let major = dir.abs().max_element();

        let tied = CubeFace::ALL
            .into_iter()
            .filter(|&other| other != face && dir.dot(other.normal()) == major);

        for candidate in std::iter::once(face).chain(tied) {
            let xy = self.texel_coords(candidate.face_uv(dir), origin);
            if xy.cmpge(Vec2::ZERO).all() && xy.cmple(max).all() {
                return (candidate, xy.x as u32, xy.y as u32);
            }
        }

        let xy = self.texel_coords(uv, origin).clamp(Vec2::ZERO, max);
        (face, xy.x as u32, xy.y as u32)
    }

    pub fn sample_nearest(&self, dir: Vec3) -> Vec4 {
        let (face, x, y) = self.texel_for_direction(dir, TexelOrigin::Center);
        self.texel(face, x, y)
    }
}

#[test]
fn test_from_raw_checks_len() {
    assert!(ImageRgba32f::from_raw([2, 2], vec![0.0; 16]).is_ok());
    assert!(matches!(
        ImageRgba32f::from_raw([2, 2], vec![0.0; 15]),
        Err(ConvertError::InputSizeMismatch {
            expected: 16,
            actual: 15
        })
    ));
}

#[test]
fn test_cube_texel_addressing() {
    let mut cube = CubeImage::new(3);
    cube.put_texel(CubeFace::NegY, 2, 1, Vec4::new(1.0, 2.0, 3.0, 4.0));

    assert_eq!(cube.texel(CubeFace::NegY, 2, 1), Vec4::new(1.0, 2.0, 3.0, 4.0));
    assert_eq!(cube.texel(CubeFace::PosY, 2, 1), Vec4::ZERO);

    // Only the written face sees the change
    let nonzero_faces = CubeFace::ALL
        .iter()
        .filter(|&&face| cube.face(face).iter().any(|&v| v != 0.0))
        .count();
    assert_eq!(nonzero_faces, 1);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_pixel_offset_does_not_wrap() {
    // 70000^2 texels overflow u32 arithmetic
    assert_eq!(pixel_offset(70_000, 3, 70_000), (70_000 * 70_000 + 3) * 4);
    assert_eq!(pixel_offset(4, 1, 2), 36);
}
