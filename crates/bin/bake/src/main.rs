use cubebake::{TexelFilter, TexelOrigin};
use cubebake_asset::{OutputContainer, PixelFormat};
use cubebake_asset_pipe::{process_env_maps, EnvMapProcessParams};
use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "bake",
    about = "Bakes equirectangular environment maps into cube maps."
)]
struct Opt {
    /// Equirectangular source maps (.exr, .hdr, or any common LDR format)
    #[structopt(parse(from_os_str), required = true)]
    inputs: Vec<PathBuf>,

    /// Texels along each cube face edge
    #[structopt(long, default_value = "1024")]
    size: u32,

    #[structopt(short = "o", long, parse(from_os_str), default_value = "baked")]
    output_dir: PathBuf,

    /// rgba16f or rgba32f
    #[structopt(long, default_value = "rgba16f")]
    format: PixelFormat,

    /// dds, exr-faces or exr-strip
    #[structopt(long, default_value = "dds")]
    container: OutputContainer,

    /// linear or nearest
    #[structopt(long, default_value = "linear", parse(try_from_str = parse_filter))]
    filter: TexelFilter,

    /// center or corner
    #[structopt(long, default_value = "center", parse(try_from_str = parse_texel_origin))]
    texel_origin: TexelOrigin,

    #[structopt(short, long)]
    verbose: bool,
}

fn parse_filter(s: &str) -> Result<TexelFilter> {
    match s {
        "linear" => Ok(TexelFilter::Linear),
        "nearest" => Ok(TexelFilter::Nearest),
        _ => anyhow::bail!("Unknown filter {:?}; expected linear or nearest", s),
    }
}

fn parse_texel_origin(s: &str) -> Result<TexelOrigin> {
    match s {
        "center" => Ok(TexelOrigin::Center),
        "corner" => Ok(TexelOrigin::Corner),
        _ => anyhow::bail!("Unknown texel origin {:?}; expected center or corner", s),
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let default_level = if opt.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let params = opt.inputs.iter().map(|path| EnvMapProcessParams {
        output_dir: opt.output_dir.clone(),
        face_size: opt.size,
        format: opt.format,
        container: opt.container,
        texel_origin: opt.texel_origin,
        filter: opt.filter,
        ..EnvMapProcessParams::new(path)
    });

    let written = process_env_maps(params)?;
    println!("Done. Wrote {} files.", written.len());

    Ok(())
}
