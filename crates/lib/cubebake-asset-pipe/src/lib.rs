use anyhow::{Context as _, Result};
use cubebake::{CubemapParams, SamplerDesc, TexelFilter, TexelOrigin};
use cubebake_asset::{OutputContainer, PixelFormat};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Instant,
};

pub struct EnvMapProcessParams {
    pub path: PathBuf,
    pub output_dir: PathBuf,
    pub output_name: String,
    pub face_size: u32,
    pub format: PixelFormat,
    pub container: OutputContainer,
    pub texel_origin: TexelOrigin,
    pub filter: TexelFilter,
}

impl EnvMapProcessParams {
    /// Defaults: 1024^2 faces, half-float DDS into `baked/`, named after the source file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let output_name = path
            .file_stem()
            .map_or_else(|| "env".to_owned(), |s| s.to_string_lossy().into_owned());

        Self {
            path,
            output_dir: PathBuf::from("baked"),
            output_name,
            face_size: 1024,
            format: PixelFormat::Rgba16f,
            container: OutputContainer::Dds,
            texel_origin: TexelOrigin::Center,
            filter: TexelFilter::Linear,
        }
    }

    pub fn cubemap_params(&self) -> CubemapParams {
        CubemapParams::new(self.face_size)
            .texel_origin(self.texel_origin)
            .sampler(SamplerDesc::equirect(self.filter))
    }
}

/// Loads one equirectangular map, bakes it into a cube and writes it out.
/// Returns the files written.
pub fn process_env_map(params: &EnvMapProcessParams) -> Result<Vec<PathBuf>> {
    let t0 = Instant::now();
    let image = cubebake_asset::load_image(&params.path)?;
    log::info!("Loading {:?} took {:?}", params.path, t0.elapsed());

    if image.width() != image.height() * 2 {
        log::warn!(
            "{:?} is {}x{}; equirectangular maps are normally 2:1",
            params.path,
            image.width(),
            image.height()
        );
    }

    let t0 = Instant::now();
    let cube = params
        .cubemap_params()
        .convert(&image)
        .with_context(|| format!("converting {:?}", params.path))?;
    log::info!(
        "Baked {}^2 cube from {:?} in {:?}",
        params.face_size,
        params.path,
        t0.elapsed()
    );

    let written = cubebake_asset::write_cube(
        &cube,
        params.format,
        params.container,
        &params.output_dir,
        &params.output_name,
    )?;

    for path in &written {
        log::info!("Wrote {:?}", path);
    }

    Ok(written)
}

fn source_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_owned())
}

/// Processes every distinct source map once. Fails if two distinct sources would be
/// written under the same output name.
pub fn process_env_maps(
    params: impl IntoIterator<Item = EnvMapProcessParams>,
) -> Result<Vec<PathBuf>> {
    let mut seen_sources = HashSet::new();
    let mut seen_outputs = HashSet::new();
    let mut written = Vec::new();

    for params in params {
        if !seen_sources.insert(source_key(&params.path)) {
            log::info!("{:?} already processed; skipping", params.path);
            continue;
        }

        let output = (params.output_dir.clone(), params.output_name.clone());
        if !seen_outputs.insert(output) {
            anyhow::bail!(
                "Output name {:?} in {:?} is used by more than one source map",
                params.output_name,
                params.output_dir
            );
        }

        written.extend(process_env_map(&params)?);
    }

    Ok(written)
}
