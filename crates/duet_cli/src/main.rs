use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use duet_core::{load_obj, EnvironmentMap, Mesh, PointLight};
use duet_math::{Camera, Vec3};
use duet_renderer::{
    rasterize_frame, raytrace_frame, BvhConfig, RenderConfig, RenderContext, Scene,
    DEFAULT_HEIGHT, DEFAULT_WIDTH,
};

const USAGE: &str = "\
Usage: duet [mesh.obj] [environment.hdr|png] [options]

Options:
  --mode raytrace|rasterize   render pipeline (default: raytrace)
  --output <file.png>         output image (default: duet.png)
  --width <N>                 frame width (default: 512)
  --height <N>                frame height (default: 384)
  --shadows                   trace shadow rays for diffuse surfaces
  --sah                       build BVHs with the surface area heuristic
  --eye <x,y,z>               camera position (default: 0,0,1.5)
  --gamma <g>                 output gamma (default: 1.0)
  -h, --help                  print this message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Raytrace,
    Rasterize,
}

/// Command-line options.
#[derive(Debug, Clone, PartialEq)]
struct Options {
    mesh: Option<PathBuf>,
    environment: Option<PathBuf>,
    mode: Mode,
    output: PathBuf,
    width: u32,
    height: u32,
    shadows: bool,
    sah: bool,
    eye: Vec3,
    gamma: f32,
    help: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mesh: None,
            environment: None,
            mode: Mode::Raytrace,
            output: PathBuf::from("duet.png"),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            shadows: false,
            sah: false,
            eye: Camera::default().position,
            gamma: 1.0,
            help: false,
        }
    }
}

impl Options {
    fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("missing value for {flag}"))
            };

            match arg.as_str() {
                "-h" | "--help" => options.help = true,
                "--shadows" => options.shadows = true,
                "--sah" => options.sah = true,
                "--mode" => {
                    options.mode = match value("--mode")?.as_str() {
                        "raytrace" => Mode::Raytrace,
                        "rasterize" => Mode::Rasterize,
                        other => bail!("unknown mode '{other}'"),
                    }
                }
                "--output" => options.output = PathBuf::from(value("--output")?),
                "--width" => options.width = value("--width")?.parse().context("invalid --width")?,
                "--height" => {
                    options.height = value("--height")?.parse().context("invalid --height")?
                }
                "--eye" => options.eye = parse_vec3(&value("--eye")?)?,
                "--gamma" => options.gamma = value("--gamma")?.parse().context("invalid --gamma")?,
                flag if flag.starts_with("--") => bail!("unknown option '{flag}'"),
                _ if options.mesh.is_none() => options.mesh = Some(PathBuf::from(arg)),
                _ if options.environment.is_none() => {
                    options.environment = Some(PathBuf::from(arg))
                }
                _ => bail!("unexpected argument '{arg}'"),
            }
        }

        Ok(options)
    }
}

/// Parse `x,y,z`.
fn parse_vec3(s: &str) -> Result<Vec3> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid vector '{s}'"))?;

    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => bail!("expected three components in '{s}'"),
    }
}

/// Load the mesh, falling back to the built-in triangle.
fn load_mesh(path: Option<&Path>) -> Mesh {
    let Some(path) = path else {
        log::warn!("No .obj file given, using a single triangle");
        return Mesh::single_triangle();
    };

    match load_obj(path) {
        Ok(mesh) => mesh,
        Err(e) => {
            log::warn!("Could not load {}: {e}. Using a single triangle", path.display());
            Mesh::single_triangle()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::parse(std::env::args().skip(1))?;
    if options.help {
        println!("{USAGE}");
        return Ok(());
    }

    log::info!("Starting duet");

    let mesh = load_mesh(options.mesh.as_deref());
    let bvh_config = if options.sah {
        BvhConfig::sah()
    } else {
        BvhConfig::default()
    };

    let mut builder = Scene::builder()
        .add_mesh(mesh)
        .add_light(PointLight::default())
        .with_bvh_config(bvh_config);
    if let Some(path) = &options.environment {
        let environment = EnvironmentMap::load(path)
            .with_context(|| format!("failed to load environment map {}", path.display()))?;
        builder = builder.with_environment(environment);
    }
    let scene = builder.build();

    let camera = Camera {
        position: options.eye,
        ..Camera::default()
    };
    let ctx = RenderContext::new(camera, options.width, options.height).with_config(RenderConfig {
        shadows: options.shadows,
        ..RenderConfig::default()
    });

    let framebuffer = match options.mode {
        Mode::Raytrace => raytrace_frame(&scene, &ctx)?,
        Mode::Rasterize => rasterize_frame(&scene, &ctx)?,
    };
    framebuffer
        .save_png(&options.output, options.gamma)
        .with_context(|| format!("failed to write {}", options.output.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options> {
        Options::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let options = parse(&[]).expect("parse");
        assert_eq!(options, Options::default());
        assert_eq!(options.eye, Vec3::new(0.0, 0.0, 1.5));
        assert_eq!((options.width, options.height), (512, 384));
    }

    #[test]
    fn test_positional_and_flags() {
        let options = parse(&[
            "cornellbox.obj",
            "uffizi.hdr",
            "--mode",
            "rasterize",
            "--shadows",
            "--sah",
            "--width",
            "64",
            "--eye",
            "1, 2,3",
            "--gamma",
            "2.2",
        ])
        .expect("parse");

        assert_eq!(options.mesh, Some(PathBuf::from("cornellbox.obj")));
        assert_eq!(options.environment, Some(PathBuf::from("uffizi.hdr")));
        assert_eq!(options.mode, Mode::Rasterize);
        assert!(options.shadows && options.sah);
        assert_eq!(options.width, 64);
        assert_eq!(options.eye, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(options.gamma, 2.2);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["--mode", "pathtrace"]).is_err());
        assert!(parse(&["--width"]).is_err());
        assert!(parse(&["--eye", "1,2"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["a.obj", "b.hdr", "c"]).is_err());
    }

    #[test]
    fn test_missing_obj_falls_back() {
        let mesh = load_mesh(Some(Path::new("does/not/exist.obj")));
        assert_eq!(mesh.triangle_count(), 1);
    }
}
