use glam::{Vec2, Vec4};

use crate::image::ImageRgba32f;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum TexelFilter {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum AddressMode {
    Repeat,
    ClampToEdge,
}

impl AddressMode {
    fn apply(self, coord: i64, extent: u32) -> u32 {
        let extent = extent as i64;
        match self {
            AddressMode::Repeat => coord.rem_euclid(extent) as u32,
            AddressMode::ClampToEdge => coord.clamp(0, extent - 1) as u32,
        }
    }
}

// `Vec4::lerp` is `a + (b - a) * t`, which yields NaN for an infinite `a` or `b` even
// when its weight is zero.
fn lerp(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    if t == 0.0 {
        a
    } else if a.is_finite() && b.is_finite() {
        a.lerp(b, t)
    } else {
        a * (1.0 - t) + b * t
    }
}

/// Fixed-function style texture sampling of an [`ImageRgba32f`] at normalized coordinates.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SamplerDesc {
    pub texel_filter: TexelFilter,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self::equirect(TexelFilter::Linear)
    }
}

impl SamplerDesc {
    /// Wraps around horizontally and clamps at the poles.
    pub fn equirect(texel_filter: TexelFilter) -> Self {
        Self {
            texel_filter,
            address_u: AddressMode::Repeat,
            address_v: AddressMode::ClampToEdge,
        }
    }

    fn fetch(&self, image: &ImageRgba32f, x: i64, y: i64) -> Vec4 {
        image.pixel(
            self.address_u.apply(x, image.width()),
            self.address_v.apply(y, image.height()),
        )
    }

    /// `image` must not be empty.
    pub fn sample(&self, image: &ImageRgba32f, uv: Vec2) -> Vec4 {
        let size = Vec2::new(image.width() as f32, image.height() as f32);
        let texel = uv * size;

        match self.texel_filter {
            TexelFilter::Nearest => {
                let p = texel.floor();
                self.fetch(image, p.x as i64, p.y as i64)
            }
            TexelFilter::Linear => {
                let texel = texel - Vec2::splat(0.5);
                let p = texel.floor();
                let t = texel - p;
                let (x, y) = (p.x as i64, p.y as i64);

                // Lerp rather than weighted sum so equal neighbors come back unchanged
                let top = lerp(self.fetch(image, x, y), self.fetch(image, x + 1, y), t.x);
                let bottom = lerp(
                    self.fetch(image, x, y + 1),
                    self.fetch(image, x + 1, y + 1),
                    t.x,
                );
                lerp(top, bottom, t.y)
            }
        }
    }
}

#[test]
fn test_address_modes() {
    assert_eq!(AddressMode::Repeat.apply(-1, 8), 7);
    assert_eq!(AddressMode::Repeat.apply(8, 8), 0);
    assert_eq!(AddressMode::Repeat.apply(-17, 8), 7);
    assert_eq!(AddressMode::ClampToEdge.apply(-1, 8), 0);
    assert_eq!(AddressMode::ClampToEdge.apply(12, 8), 7);
}

#[test]
fn test_linear_wraps_horizontally() {
    let image = ImageRgba32f::from_fn(4, 1, |x, _| Vec4::splat(x as f32));
    let sampler = SamplerDesc::equirect(TexelFilter::Linear);

    // Halfway between the last and the first column
    let c = sampler.sample(&image, Vec2::new(0.0, 0.5));
    assert!((c.x - 1.5).abs() < 1e-6, "{:?}", c);

    // Negative u reaches the same place as u + 1
    let a = sampler.sample(&image, Vec2::new(-0.3, 0.5));
    let b = sampler.sample(&image, Vec2::new(0.7, 0.5));
    assert!(a.abs_diff_eq(b, 1e-5), "{:?} vs {:?}", a, b);
}

#[test]
fn test_linear_clamps_vertically() {
    let image = ImageRgba32f::from_fn(1, 4, |_, y| Vec4::splat(y as f32));
    let sampler = SamplerDesc::equirect(TexelFilter::Linear);

    assert_eq!(sampler.sample(&image, Vec2::new(0.5, 0.0)).x, 0.0);
    assert_eq!(sampler.sample(&image, Vec2::new(0.5, 1.0)).x, 3.0);
}

#[test]
fn test_nearest_texel_centers() {
    let image = ImageRgba32f::from_fn(4, 2, |x, y| Vec4::new(x as f32, y as f32, 0.0, 1.0));
    let sampler = SamplerDesc::equirect(TexelFilter::Nearest);

    for y in 0..2 {
        for x in 0..4 {
            let uv = (Vec2::new(x as f32, y as f32) + 0.5) / Vec2::new(4.0, 2.0);
            assert_eq!(sampler.sample(&image, uv), image.pixel(x, y));
        }
    }
}

#[test]
fn test_linear_keeps_infinity_local() {
    let image = ImageRgba32f::from_fn(4, 1, |x, _| {
        if x == 1 {
            Vec4::splat(f32::INFINITY)
        } else {
            Vec4::ONE
        }
    });
    let sampler = SamplerDesc::equirect(TexelFilter::Linear);

    // Texel centers next to the infinite texel read back unchanged
    assert_eq!(sampler.sample(&image, Vec2::new(0.5 / 4.0, 0.5)), Vec4::ONE);
    assert_eq!(sampler.sample(&image, Vec2::new(2.5 / 4.0, 0.5)), Vec4::ONE);
    assert_eq!(
        sampler.sample(&image, Vec2::new(1.5 / 4.0, 0.5)),
        Vec4::splat(f32::INFINITY)
    );

    // Blending with it saturates instead of producing NaN
    let c = sampler.sample(&image, Vec2::new(2.0 / 4.0, 0.5));
    assert_eq!(c, Vec4::splat(f32::INFINITY));
}
