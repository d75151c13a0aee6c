use glam::{Vec2, Vec3};

/// Cube faces in the order used by image arrays and DDS cube maps.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum CubeFace {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

/// Per-face frame: a face-plane point is `major + u * u_axis + v * v_axis`,
/// with `u` pointing right and `v` pointing up in the face image.
struct FaceBasis {
    major: Vec3,
    u_axis: Vec3,
    v_axis: Vec3,
}

const FACE_BASES: [FaceBasis; 6] = [
    // +X: ( 1,  v, -u)
    FaceBasis {
        major: Vec3::X,
        u_axis: Vec3::NEG_Z,
        v_axis: Vec3::Y,
    },
    // -X: (-1,  v,  u)
    FaceBasis {
        major: Vec3::NEG_X,
        u_axis: Vec3::Z,
        v_axis: Vec3::Y,
    },
    // +Y: ( u,  1, -v)
    FaceBasis {
        major: Vec3::Y,
        u_axis: Vec3::X,
        v_axis: Vec3::NEG_Z,
    },
    // -Y: ( u, -1,  v)
    FaceBasis {
        major: Vec3::NEG_Y,
        u_axis: Vec3::X,
        v_axis: Vec3::Z,
    },
    // +Z: ( u,  v,  1)
    FaceBasis {
        major: Vec3::Z,
        u_axis: Vec3::X,
        v_axis: Vec3::Y,
    },
    // -Z: (-u,  v, -1)
    FaceBasis {
        major: Vec3::NEG_Z,
        u_axis: Vec3::NEG_X,
        v_axis: Vec3::Y,
    },
];

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn normal(self) -> Vec3 {
        FACE_BASES[self.index()].major
    }

    /// File name suffix, e.g. `px` for +X.
    pub fn suffix(self) -> &'static str {
        match self {
            CubeFace::PosX => "px",
            CubeFace::NegX => "nx",
            CubeFace::PosY => "py",
            CubeFace::NegY => "ny",
            CubeFace::PosZ => "pz",
            CubeFace::NegZ => "nz",
        }
    }

    /// Unnormalized direction through the face-plane point `uv` in [-1, 1]^2.
    pub fn direction(self, uv: Vec2) -> Vec3 {
        let basis = &FACE_BASES[self.index()];
        basis.major + uv.x * basis.u_axis + uv.y * basis.v_axis
    }

    /// Inverse of [`CubeFace::direction`]: the face hit by `dir` and the face-plane point.
    ///
    /// Ties on the major axis resolve to X, then Y, then Z.
    pub fn from_direction(dir: Vec3) -> (Self, Vec2) {
        let abs = dir.abs();

        let face = if abs.x >= abs.y && abs.x >= abs.z {
            if dir.x >= 0.0 {
                CubeFace::PosX
            } else {
                CubeFace::NegX
            }
        } else if abs.y >= abs.z {
            if dir.y >= 0.0 {
                CubeFace::PosY
            } else {
                CubeFace::NegY
            }
        } else if dir.z >= 0.0 {
            CubeFace::PosZ
        } else {
            CubeFace::NegZ
        };

        (face, face.face_uv(dir))
    }

    /// Where `dir` crosses the plane of this face. Only meaningful if `dir` points into it.
    pub fn face_uv(self, dir: Vec3) -> Vec2 {
        let basis = &FACE_BASES[self.index()];
        Vec2::new(dir.dot(basis.u_axis), dir.dot(basis.v_axis)) / dir.dot(basis.major)
    }
}

#[test]
fn test_face_table() {
    let uv = Vec2::new(0.25, -0.5);
    let (u, v) = (uv.x, uv.y);

    let expected = [
        Vec3::new(1.0, v, -u),
        Vec3::new(-1.0, v, u),
        Vec3::new(u, 1.0, -v),
        Vec3::new(u, -1.0, v),
        Vec3::new(u, v, 1.0),
        Vec3::new(-u, v, -1.0),
    ];

    for (face, expected) in CubeFace::ALL.iter().zip(expected) {
        assert_eq!(face.direction(uv), expected, "{:?}", face);
    }
}

#[test]
fn test_from_direction_inverts_direction() {
    let uv = Vec2::new(-0.3, 0.7);

    for face in CubeFace::ALL {
        let (hit, hit_uv) = CubeFace::from_direction(face.direction(uv) * 3.5);
        assert_eq!(hit, face);
        assert!((hit_uv - uv).abs().max_element() < 1e-6, "{:?}", face);
    }
}

#[test]
fn test_from_index() {
    assert_eq!(CubeFace::from_index(3), Some(CubeFace::NegY));
    assert_eq!(CubeFace::from_index(6), None);

    for (i, face) in CubeFace::ALL.iter().enumerate() {
        assert_eq!(face.index(), i);
    }
}
