//! Per-texel inverse sampling: reconstruct the direction a cube texel represents,
//! then look that direction up in the equirectangular source.
//!
//! Faces are laid out as OpenGL/Vulkan/DDS cube maps expect; image row 0 is the top of
//! each face (`v = +1`).

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3, Vec4};

use crate::{face::CubeFace, image::ImageRgba32f, sampler::SamplerDesc};

/// Where a texel's sampling point sits within its footprint.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum TexelOrigin {
    /// `(x + 0.5) / N`; symmetric around the face center and seam-free.
    Center,

    /// `x / N`; the raw integer-coordinate convention. Shifts the whole face by half
    /// a texel towards its top-left corner.
    Corner,
}

impl TexelOrigin {
    pub fn offset(self) -> f32 {
        match self {
            TexelOrigin::Center => 0.5,
            TexelOrigin::Corner => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    /// Azimuth around +Y, measured from +X towards +Z. In (-pi, pi].
    pub phi: f32,

    /// Polar angle from +Y. In [0, pi].
    pub theta: f32,
}

/// Normalized direction through texel `(x, y)` of `face` on a cube with `face_size`^2 texels per face.
pub fn sampling_vector(
    face: CubeFace,
    x: u32,
    y: u32,
    face_size: u32,
    origin: TexelOrigin,
) -> Vec3 {
    let st = (Vec2::new(x as f32, y as f32) + origin.offset()) / face_size as f32;
    let uv = Vec2::new(2.0 * st.x - 1.0, 1.0 - 2.0 * st.y);

    face.direction(uv).normalize()
}

pub fn spherical(dir: Vec3) -> Spherical {
    let phi = dir.z.atan2(dir.x);

    // atan2(-0.0, -x) lands on -pi, which is the same meridian as +pi
    let phi = if phi <= -PI { phi + TAU } else { phi };

    // Normalized vectors can overshoot +-1 by an ulp near the poles
    let theta = dir.y.clamp(-1.0, 1.0).acos();

    Spherical { phi, theta }
}

/// Equirectangular coordinates for `dir`. `u` is in (-0.5, 0.5] and relies on
/// repeat addressing; `v` is in [0, 1].
pub fn equirect_uv(dir: Vec3) -> Vec2 {
    let Spherical { phi, theta } = spherical(dir);
    Vec2::new(phi / TAU, theta / PI)
}

/// Color for one output texel.
pub fn convert_texel(
    input: &ImageRgba32f,
    sampler: &SamplerDesc,
    face: CubeFace,
    x: u32,
    y: u32,
    face_size: u32,
    origin: TexelOrigin,
) -> Vec4 {
    let dir = sampling_vector(face, x, y, face_size, origin);
    sampler.sample(input, equirect_uv(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_texels(face_size: u32) -> impl Iterator<Item = (CubeFace, u32, u32)> {
        CubeFace::ALL.into_iter().flat_map(move |face| {
            (0..face_size).flat_map(move |y| (0..face_size).map(move |x| (face, x, y)))
        })
    }

    fn texel_diagonal_angle(face_size: u32) -> f32 {
        // Largest at the face center, where the plane is closest to the origin
        let texel = 2.0 / face_size as f32;
        (texel * std::f32::consts::SQRT_2).atan()
    }

    #[test]
    fn test_unit_length() {
        for face_size in [1, 2, 3, 16, 33] {
            for origin in [TexelOrigin::Center, TexelOrigin::Corner] {
                for (face, x, y) in all_texels(face_size) {
                    let dir = sampling_vector(face, x, y, face_size, origin);
                    assert!(
                        (dir.length() - 1.0).abs() < 1e-5,
                        "{:?} {} {} {} {:?}",
                        face,
                        x,
                        y,
                        face_size,
                        dir
                    );
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        for (face, x, y) in all_texels(7) {
            let a = sampling_vector(face, x, y, 7, TexelOrigin::Center);
            let b = sampling_vector(face, x, y, 7, TexelOrigin::Center);
            assert_eq!(a.to_array().map(f32::to_bits), b.to_array().map(f32::to_bits));

            let a = equirect_uv(a);
            let b = equirect_uv(b);
            assert_eq!(a.to_array().map(f32::to_bits), b.to_array().map(f32::to_bits));
        }
    }

    #[test]
    fn test_ranges() {
        for origin in [TexelOrigin::Center, TexelOrigin::Corner] {
            for (face, x, y) in all_texels(16) {
                let dir = sampling_vector(face, x, y, 16, origin);
                let Spherical { phi, theta } = spherical(dir);
                assert!(phi > -PI && phi <= PI, "phi {} for {:?}", phi, dir);
                assert!((0.0..=PI).contains(&theta), "theta {} for {:?}", theta, dir);

                let uv = equirect_uv(dir);
                assert!(uv.x > -0.5 && uv.x <= 0.5, "u {} for {:?}", uv.x, dir);
                assert!((0.0..=1.0).contains(&uv.y), "v {} for {:?}", uv.y, dir);
            }
        }
    }

    #[test]
    fn test_poles_are_not_nan() {
        assert_eq!(spherical(Vec3::Y).theta, 0.0);
        assert_eq!(spherical(Vec3::NEG_Y).theta, PI);

        let over = spherical(Vec3::new(0.0, 1.000_000_1, 0.0));
        assert_eq!(over.theta, 0.0);

        let under = spherical(Vec3::new(0.0, -1.000_000_1, 0.0));
        assert_eq!(under.theta, PI);
    }

    #[test]
    fn test_negative_zero_azimuth_folds_to_pi() {
        let s = spherical(Vec3::new(-1.0, 0.0, -0.0));
        assert_eq!(s.phi, PI);
        assert_eq!(equirect_uv(Vec3::new(-1.0, 0.0, -0.0)).x, 0.5);
    }

    #[test]
    fn test_face_centers() {
        for face_size in [2, 8, 64] {
            let tolerance = texel_diagonal_angle(face_size);
            let c = face_size / 2;

            for face in CubeFace::ALL {
                let dir = sampling_vector(face, c, c, face_size, TexelOrigin::Center);
                let angle = dir.angle_between(face.normal());
                assert!(
                    angle < tolerance,
                    "{:?} at N={}: {} rad off",
                    face,
                    face_size,
                    angle
                );
            }
        }

        // The corner convention puts texel N/2 exactly on the face axis
        for face in CubeFace::ALL {
            let dir = sampling_vector(face, 4, 4, 8, TexelOrigin::Corner);
            assert!(dir.abs_diff_eq(face.normal(), 1e-6), "{:?} {:?}", face, dir);
        }
    }

    #[test]
    fn test_edge_continuity() {
        const N: u32 = 4;
        let tolerance = texel_diagonal_angle(N);

        // (face, texel) pairs sharing a cube edge
        let pairs = [
            // +X left edge meets +Z right edge
            ((CubeFace::PosX, 0, 1), (CubeFace::PosZ, 3, 1)),
            // +X right edge meets -Z left edge
            ((CubeFace::PosX, 3, 1), (CubeFace::NegZ, 0, 1)),
            // -X right edge meets +Z left edge
            ((CubeFace::NegX, 3, 2), (CubeFace::PosZ, 0, 2)),
            // +Z top row meets +Y bottom row
            ((CubeFace::PosZ, 1, 0), (CubeFace::PosY, 1, 3)),
            // +Z bottom row meets -Y top row
            ((CubeFace::PosZ, 2, 3), (CubeFace::NegY, 2, 0)),
        ];

        for ((fa, xa, ya), (fb, xb, yb)) in pairs {
            let a = sampling_vector(fa, xa, ya, N, TexelOrigin::Center);
            let b = sampling_vector(fb, xb, yb, N, TexelOrigin::Center);
            let angle = a.angle_between(b);
            assert!(
                angle < tolerance,
                "{:?}({},{}) vs {:?}({},{}): {} rad",
                fa,
                xa,
                ya,
                fb,
                xb,
                yb,
                angle
            );
        }
    }

    #[test]
    fn test_texel_round_trip() {
        use crate::image::CubeImage;

        let cube = CubeImage::new(13);
        for (face, x, y) in all_texels(13) {
            let dir = sampling_vector(face, x, y, 13, TexelOrigin::Center);
            assert_eq!(
                cube.texel_for_direction(dir, TexelOrigin::Center),
                (face, x, y)
            );
        }
    }

    #[test]
    fn test_corner_texel_round_trip() {
        use crate::image::CubeImage;

        for face_size in [1, 2, 3, 4, 7, 8] {
            let cube = CubeImage::new(face_size);

            for (face, x, y) in all_texels(face_size) {
                let dir = sampling_vector(face, x, y, face_size, TexelOrigin::Corner);
                let found = cube.texel_for_direction(dir, TexelOrigin::Corner);

                if x > 0 && y > 0 {
                    assert_eq!(found, (face, x, y), "N={}", face_size);
                } else {
                    // Left column and top row sit on cube edges shared with a neighbor
                    let (f, fx, fy) = found;
                    let back = sampling_vector(f, fx, fy, face_size, TexelOrigin::Corner);
                    assert!(
                        back.abs_diff_eq(dir, 1e-5),
                        "N={} {:?}({},{}) came back as {:?}({},{})",
                        face_size,
                        face,
                        x,
                        y,
                        f,
                        fx,
                        fy
                    );
                }
            }
        }
    }

    #[test]
    fn test_axis_directions_map_to_expected_uv() {
        let cases = [
            (Vec3::X, Vec2::new(0.0, 0.5)),
            (Vec3::Z, Vec2::new(0.25, 0.5)),
            (Vec3::NEG_X, Vec2::new(0.5, 0.5)),
            (Vec3::NEG_Z, Vec2::new(-0.25, 0.5)),
            (Vec3::Y, Vec2::new(0.0, 0.0)),
            (Vec3::NEG_Y, Vec2::new(0.0, 1.0)),
        ];

        for (dir, expected) in cases {
            let uv = equirect_uv(dir);
            assert!(uv.abs_diff_eq(expected, 1e-6), "{:?}: {:?}", dir, uv);
        }
    }
}
