use anyhow::Context as _;
use cubebake::{glam::Vec4, CubeFace, CubeImage};
use ddsfile::{AlphaMode, Caps2, D3D10ResourceDimension, Dds, DxgiFormat, NewDxgiParams};
use half::f16;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba16f,
    Rgba32f,
}

impl FromStr for PixelFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgba16f" => Ok(PixelFormat::Rgba16f),
            "rgba32f" => Ok(PixelFormat::Rgba32f),
            _ => anyhow::bail!("Unknown pixel format {:?}; expected rgba16f or rgba32f", s),
        }
    }
}

impl PixelFormat {
    fn dxgi_format(self) -> DxgiFormat {
        match self {
            PixelFormat::Rgba16f => DxgiFormat::R16G16B16A16_Float,
            PixelFormat::Rgba32f => DxgiFormat::R32G32B32A32_Float,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum OutputContainer {
    /// A single DDS cube map.
    Dds,

    /// One EXR per face, suffixed `_px`, `_nx`, ... `_nz`.
    ExrFaces,

    /// One EXR with the six faces side by side in face order.
    ExrStrip,
}

impl FromStr for OutputContainer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dds" => Ok(OutputContainer::Dds),
            "exr-faces" => Ok(OutputContainer::ExrFaces),
            "exr-strip" => Ok(OutputContainer::ExrStrip),
            _ => anyhow::bail!(
                "Unknown output container {:?}; expected dds, exr-faces or exr-strip",
                s
            ),
        }
    }
}

fn to_f16(v: f32) -> f16 {
    let max = f16::MAX.to_f32();
    f16::from_f32(v.clamp(-max, max))
}

/// Writes `cube` to `dir` in the given container, returning the paths written.
pub fn write_cube(
    cube: &CubeImage,
    format: PixelFormat,
    container: OutputContainer,
    dir: &Path,
    stem: &str,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("create_dir_all {:?}", dir))?;

    match container {
        OutputContainer::Dds => {
            let path = dir.join(format!("{}.dds", stem));
            let file = File::create(&path).with_context(|| format!("create {:?}", path))?;
            let mut writer = BufWriter::new(file);

            write_dds_cube(cube, format, &mut writer)?;
            writer.flush().with_context(|| format!("flush {:?}", path))?;

            Ok(vec![path])
        }
        OutputContainer::ExrFaces => write_exr_faces(cube, format, dir, stem),
        OutputContainer::ExrStrip => {
            let path = dir.join(format!("{}.exr", stem));
            write_exr_strip(cube, format, &path)?;
            Ok(vec![path])
        }
    }
}

/// Writes a DX10 DDS cube map, faces in [`CubeFace`] order. Texel data is stored in native
/// byte order, which is what DDS readers expect on little-endian hosts.
pub fn write_dds_cube(
    cube: &CubeImage,
    format: PixelFormat,
    writer: &mut impl Write,
) -> anyhow::Result<()> {
    let mut dds = Dds::new_dxgi(NewDxgiParams {
        height: cube.face_size,
        width: cube.face_size,
        depth: None,
        format: format.dxgi_format(),
        mipmap_levels: Some(1),
        // Face count; ddsfile divides by six for the DX10 cube count
        array_layers: Some(6),
        caps2: Some(
            Caps2::CUBEMAP
                | Caps2::CUBEMAP_POSITIVEX
                | Caps2::CUBEMAP_NEGATIVEX
                | Caps2::CUBEMAP_POSITIVEY
                | Caps2::CUBEMAP_NEGATIVEY
                | Caps2::CUBEMAP_POSITIVEZ
                | Caps2::CUBEMAP_NEGATIVEZ,
        ),
        is_cubemap: true,
        resource_dimension: D3D10ResourceDimension::Texture2D,
        alpha_mode: AlphaMode::Unknown,
    })
    .context("failed to create DDS header")?;

    dds.data = match format {
        PixelFormat::Rgba32f => bytemuck::cast_slice(cube.data.as_slice()).to_vec(),
        PixelFormat::Rgba16f => {
            let data: Vec<f16> = cube.data.iter().copied().map(to_f16).collect();
            bytemuck::cast_slice(data.as_slice()).to_vec()
        }
    };

    dds.write(writer).context("failed to write DDS")?;

    Ok(())
}

fn write_rgba_exr(
    path: &Path,
    format: PixelFormat,
    size: [usize; 2],
    pixel: impl Sync + Fn(usize, usize) -> Vec4,
) -> anyhow::Result<()> {
    let [width, height] = size;

    match format {
        PixelFormat::Rgba32f => exr::prelude::write_rgba_file(path, width, height, |x, y| {
            let c = pixel(x, y);
            (c.x, c.y, c.z, c.w)
        }),
        PixelFormat::Rgba16f => exr::prelude::write_rgba_file(path, width, height, |x, y| {
            let c = pixel(x, y);
            (to_f16(c.x), to_f16(c.y), to_f16(c.z), to_f16(c.w))
        }),
    }
    .with_context(|| format!("failed to write {:?}", path))
}

pub fn write_exr_faces(
    cube: &CubeImage,
    format: PixelFormat,
    dir: &Path,
    stem: &str,
) -> anyhow::Result<Vec<PathBuf>> {
    let face_size = cube.face_size as usize;

    CubeFace::ALL
        .iter()
        .map(|&face| -> anyhow::Result<PathBuf> {
            let path = dir.join(format!("{}_{}.exr", stem, face.suffix()));
            write_rgba_exr(&path, format, [face_size, face_size], |x, y| {
                cube.texel(face, x as u32, y as u32)
            })?;
            Ok(path)
        })
        .collect()
}

pub fn write_exr_strip(cube: &CubeImage, format: PixelFormat, path: &Path) -> anyhow::Result<()> {
    let face_size = cube.face_size as usize;

    write_rgba_exr(path, format, [face_size * 6, face_size], |x, y| {
        let face = CubeFace::ALL[x / face_size];
        cube.texel(face, (x % face_size) as u32, y as u32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_image;
    use std::io::Cursor;

    fn face_colors(face_size: u32) -> CubeImage {
        let mut cube = CubeImage::new(face_size);
        for face in CubeFace::ALL {
            for y in 0..face_size {
                for x in 0..face_size {
                    let c = Vec4::new(face.index() as f32, x as f32 * 0.5, y as f32 * 0.25, 1.0);
                    cube.put_texel(face, x, y, c);
                }
            }
        }
        cube
    }

    #[test]
    fn test_parse() {
        assert_eq!("rgba16f".parse::<PixelFormat>().unwrap(), PixelFormat::Rgba16f);
        assert_eq!("RGBA32F".parse::<PixelFormat>().unwrap(), PixelFormat::Rgba32f);
        assert!("rgb8".parse::<PixelFormat>().is_err());

        assert_eq!("dds".parse::<OutputContainer>().unwrap(), OutputContainer::Dds);
        assert_eq!(
            "exr-strip".parse::<OutputContainer>().unwrap(),
            OutputContainer::ExrStrip
        );
        assert!("ktx2".parse::<OutputContainer>().is_err());
    }

    #[test]
    fn test_f16_saturates() {
        assert_eq!(to_f16(1.0e9), f16::MAX);
        assert_eq!(to_f16(-1.0e9), -f16::MAX);
        assert_eq!(to_f16(0.5), f16::from_f32(0.5));
    }

    #[test]
    fn test_dds_cube() {
        let cube = face_colors(4);

        for (format, texel_bytes) in [(PixelFormat::Rgba32f, 16), (PixelFormat::Rgba16f, 8)] {
            let mut bytes = Vec::new();
            write_dds_cube(&cube, format, &mut bytes).unwrap();

            let dds = Dds::read(&mut Cursor::new(&bytes)).unwrap();
            assert_eq!(dds.get_width(), 4);
            assert_eq!(dds.get_height(), 4);
            assert_eq!(dds.get_dxgi_format(), Some(format.dxgi_format()));
            assert!(dds.header.caps2.contains(Caps2::CUBEMAP));

            let header10 = dds.header10.as_ref().unwrap();
            assert_eq!(header10.array_size, 1);
            assert!(header10.misc_flag.contains(ddsfile::MiscFlag::TEXTURECUBE));
            assert_eq!(dds.data.len(), 4 * 4 * 6 * texel_bytes);
        }

        // Face 5, texel (3, 2) holds (5, 1.5, 0.5, 1)
        let mut bytes = Vec::new();
        write_dds_cube(&cube, PixelFormat::Rgba32f, &mut bytes).unwrap();
        let dds = Dds::read(&mut Cursor::new(&bytes)).unwrap();

        let offset = (5 * 16 + 2 * 4 + 3) * 16;
        let texel: Vec<f32> = dds.data[offset..offset + 16]
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(texel, vec![5.0, 1.5, 0.5, 1.0]);
    }

    #[test]
    fn test_exr_faces() {
        let dir = tempfile::tempdir().unwrap();
        let cube = face_colors(5);

        let paths = write_cube(
            &cube,
            PixelFormat::Rgba32f,
            OutputContainer::ExrFaces,
            dir.path(),
            "sky",
        )
        .unwrap();
        assert_eq!(paths.len(), 6);

        for (face, path) in CubeFace::ALL.iter().zip(&paths) {
            assert!(path
                .to_string_lossy()
                .ends_with(&format!("sky_{}.exr", face.suffix())));

            let image = load_image(path).unwrap();
            assert_eq!(image.size, [5, 5]);
            for y in 0..5 {
                for x in 0..5 {
                    assert_eq!(image.pixel(x, y), cube.texel(*face, x, y));
                }
            }
        }
    }

    #[test]
    fn test_exr_strip() {
        let dir = tempfile::tempdir().unwrap();
        let cube = face_colors(3);

        let paths = write_cube(
            &cube,
            PixelFormat::Rgba16f,
            OutputContainer::ExrStrip,
            dir.path(),
            "sky",
        )
        .unwrap();
        assert_eq!(paths, vec![dir.path().join("sky.exr")]);

        let image = load_image(&paths[0]).unwrap();
        assert_eq!(image.size, [18, 3]);

        // All test values are exactly representable in f16
        for face in CubeFace::ALL {
            for y in 0..3 {
                for x in 0..3 {
                    assert_eq!(
                        image.pixel(face.index() as u32 * 3 + x, y),
                        cube.texel(face, x, y)
                    );
                }
            }
        }
    }
}
