use anyhow::Context;
use cubebake::{glam::Vec4, ImageRgba32f};
use exr::prelude::{self as exrs, ReadChannels as _, ReadLayers as _};
use std::{
    fs::File,
    io::{BufRead, BufReader, Cursor, Seek},
    path::Path,
};

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Loads a panorama as linear RGBA floats. Picks the decoder by file extension:
/// OpenEXR, Radiance HDR, or any format the `image` crate knows.
pub fn load_image(path: impl AsRef<Path>) -> anyhow::Result<ImageRgba32f> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {:?}", path))?;

    let image = load_from_reader(BufReader::new(file), extension(path).as_deref())
        .with_context(|| format!("failed to load image data from {:?}", path))?;

    log::info!(
        "Loaded image {:?}: {}x{}",
        path,
        image.width(),
        image.height()
    );

    Ok(image)
}

/// Like [`load_image`], with the extension supplied separately.
pub fn load_image_from_memory(
    bytes: &[u8],
    extension: Option<&str>,
) -> anyhow::Result<ImageRgba32f> {
    let extension = extension.map(str::to_ascii_lowercase);
    load_from_reader(Cursor::new(bytes), extension.as_deref())
}

fn load_from_reader(
    reader: impl BufRead + Seek + Send,
    extension: Option<&str>,
) -> anyhow::Result<ImageRgba32f> {
    match extension {
        Some("exr") => load_exr(reader),
        Some("hdr") => load_hdr(reader),
        _ => load_ldr(reader),
    }
}

fn load_hdr(reader: impl BufRead) -> anyhow::Result<ImageRgba32f> {
    let image = radiant::load(reader).context("failed to decode Radiance HDR")?;

    let data: Vec<f32> = image
        .data
        .iter()
        .flat_map(|px| [px.r, px.g, px.b, 1.0].into_iter())
        .collect();

    Ok(ImageRgba32f::from_raw(
        [image.width as _, image.height as _],
        data,
    )?)
}

fn load_exr(reader: impl BufRead + Seek + Send) -> anyhow::Result<ImageRgba32f> {
    let exr_reader = exrs::read()
        .no_deep_data()
        .largest_resolution_level()
        .rgb_channels(
            |resolution, _channels: &exrs::RgbChannels| -> ImageRgba32f {
                ImageRgba32f::new(resolution.width() as _, resolution.height() as _)
            },
            |output, position, (r, g, b): (f32, f32, f32)| {
                output.put_pixel(position.0 as _, position.1 as _, Vec4::new(r, g, b, 1.0));
            },
        )
        .first_valid_layer()
        .all_attributes();

    let maybe_image: Result<
        exrs::Image<exrs::Layer<exrs::SpecificChannels<ImageRgba32f, exrs::RgbChannels>>>,
        exrs::Error,
    > = exr_reader.from_buffered(reader);

    Ok(maybe_image?.layer_data.channel_data.pixels)
}

// 8-bit sources come out in [0, 1] without any transfer function applied.
fn load_ldr(reader: impl BufRead + Seek) -> anyhow::Result<ImageRgba32f> {
    let image = image::io::Reader::new(reader)
        .with_guessed_format()?
        .decode()
        .context("failed to decode image")?;

    if !matches!(
        image.color(),
        image::ColorType::Rgb32F | image::ColorType::Rgba32F
    ) {
        log::warn!(
            "Source is {:?}; treating its values as linear radiance",
            image.color()
        );
    }

    let image = image.into_rgba32f();
    let size = [image.width(), image.height()];

    Ok(ImageRgba32f::from_raw(size, image.into_raw())?)
}

#[test]
fn test_load_png_from_memory() {
    let mut png = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image::RgbaImage::from_fn(3, 2, |x, y| {
        image::Rgba([if x == 0 { 255 } else { 0 }, 0, 0, if y == 0 { 255 } else { 0 }])
    }))
    .write_to(&mut png, image::ImageOutputFormat::Png)
    .unwrap();

    let loaded = load_image_from_memory(png.get_ref(), Some("PNG")).unwrap();
    assert_eq!(loaded.size, [3, 2]);
    assert_eq!(loaded.pixel(0, 0), Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(loaded.pixel(1, 1), Vec4::new(0.0, 0.0, 0.0, 0.0));
}

#[test]
fn test_load_garbage_fails() {
    assert!(load_image_from_memory(b"definitely not an image", Some("hdr")).is_err());
    assert!(load_image_from_memory(b"definitely not an image", Some("exr")).is_err());
    assert!(load_image_from_memory(b"definitely not an image", None).is_err());
}

#[test]
fn test_missing_file_fails() {
    let err = load_image("/nonexistent/panorama.hdr").unwrap_err();
    assert!(format!("{:#}", err).contains("panorama.hdr"));
}
