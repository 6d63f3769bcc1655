//! Command-line entry point: parse arguments, acquire a device, render the
//! user's fragment shader over a full-screen quad, and write the capture.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use shadershot_engine::device::{self, AcquireOptions, DriverTier, Gpu};
use shadershot_engine::export::{self, ContainerFormat};
use shadershot_engine::geometry::{GeometryMode, QuadGeometry, VertexDim};
use shadershot_engine::logging::{init_logging, LoggingConfig};
use shadershot_engine::pipeline::{render_frame, RenderParams};
use shadershot_engine::shader::{
    compile_file, compile_str, vertex_shader_source, FRAGMENT_PROFILE, VERTEX_ENTRY,
    VERTEX_PROFILE,
};
use shadershot_engine::target::{RenderTarget, DEFAULT_SIZE};
use shadershot_engine::uniforms::load_sidecar;

#[derive(Debug, Parser)]
#[command(name = "shadershot", about = "Render a fragment shader to an image file")]
struct Cli {
    /// Path to the WGSL fragment shader to render.
    shader: Option<PathBuf>,

    /// Output image path.
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    /// Device tier to use; `auto` walks hardware, then warp, then reference.
    #[arg(long, value_enum, default_value_t = DriverArg::Auto)]
    driver: DriverArg,

    /// Output container.
    #[arg(long, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,

    /// Quad geometry variant.
    #[arg(long, value_enum, default_value_t = GeometryArg::Triangles)]
    geometry: GeometryArg,

    /// Vertex position component count.
    #[arg(long, value_enum, default_value_t = VertexDimArg::Two)]
    vertex_dim: VertexDimArg,

    /// Fragment shader entry point.
    #[arg(long, default_value = "main")]
    entry: String,

    /// Clear color behind the quad, as RRGGBB or RRGGBBAA hex.
    #[arg(long, value_parser = parse_background)]
    background: Option<wgpu::Color>,

    /// Print a JSON report about the selected adapter and exit.
    #[arg(long)]
    get_info: bool,

    /// Raise log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log errors only.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn parse_background(text: &str) -> Result<wgpu::Color, String> {
    let hex = text.strip_prefix('#').unwrap_or(text);
    if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("`{text}` is not RRGGBB or RRGGBBAA hex"));
    }

    let channel = |index: usize| {
        u8::from_str_radix(&hex[index..index + 2], 16).unwrap_or(0) as f64 / 255.0
    };
    Ok(wgpu::Color {
        r: channel(0),
        g: channel(2),
        b: channel(4),
        a: if hex.len() == 8 { channel(6) } else { 1.0 },
    })
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum DriverArg {
    Auto,
    Hardware,
    Warp,
    Reference,
}

impl DriverArg {
    fn acquire_options(self) -> AcquireOptions {
        match self {
            DriverArg::Auto => AcquireOptions::default(),
            DriverArg::Hardware => AcquireOptions::pinned(DriverTier::Hardware),
            DriverArg::Warp => AcquireOptions::pinned(DriverTier::Warp),
            DriverArg::Reference => AcquireOptions::pinned(DriverTier::Reference),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
    Bmp,
}

impl From<FormatArg> for ContainerFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => ContainerFormat::Png,
            FormatArg::Jpeg => ContainerFormat::Jpeg,
            FormatArg::Bmp => ContainerFormat::Bmp,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum GeometryArg {
    Triangles,
    Indexed,
}

impl From<GeometryArg> for GeometryMode {
    fn from(arg: GeometryArg) -> Self {
        match arg {
            GeometryArg::Triangles => GeometryMode::Triangles,
            GeometryArg::Indexed => GeometryMode::Indexed,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum VertexDimArg {
    #[value(name = "2")]
    Two,
    #[value(name = "3")]
    Three,
}

impl From<VertexDimArg> for VertexDim {
    fn from(arg: VertexDimArg) -> Self {
        match arg {
            VertexDimArg::Two => VertexDim::Two,
            VertexDimArg::Three => VertexDim::Three,
        }
    }
}

/// The one run mode the arguments describe, decided before any device work.
enum Mode {
    Render(PathBuf),
    Info,
}

fn run_mode(cli: &Cli) -> Result<Mode, String> {
    match (&cli.shader, cli.get_info) {
        (Some(shader), false) => Ok(Mode::Render(shader.clone())),
        (None, true) => Ok(Mode::Info),
        (None, false) => Err("requires a pixel shader argument or --get-info".to_string()),
        (Some(_), true) => {
            Err("cannot specify both a pixel shader and --get-info".to_string())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_flags(cli.verbose, cli.quiet));

    let mode = match run_mode(&cli) {
        Ok(mode) => mode,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let gpu = match device::acquire(&cli.driver.acquire_options()) {
        Ok(gpu) => gpu,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "using {} ({} tier)",
        gpu.adapter().get_info().name,
        gpu.driver_tier().label()
    );

    let result = match mode {
        Mode::Info => print_info(&gpu),
        Mode::Render(shader) => render(&cli, &gpu, &shader),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_info(gpu: &Gpu) -> anyhow::Result<()> {
    println!("{}", gpu.adapter_report().to_json_pretty()?);
    Ok(())
}

fn render(cli: &Cli, gpu: &Gpu, shader: &std::path::Path) -> anyhow::Result<()> {
    let device = gpu.device();

    let vertex_dim = VertexDim::from(cli.vertex_dim);
    let vertex = compile_str(
        device,
        vertex_shader_source(vertex_dim),
        VERTEX_ENTRY,
        VERTEX_PROFILE,
    )?;
    let fragment = compile_file(device, shader, &cli.entry, FRAGMENT_PROFILE)?;

    let params = RenderParams {
        background: cli.background,
        sidecar: load_sidecar(shader),
    };

    let geometry = QuadGeometry::new(cli.geometry.into(), vertex_dim);
    let target = RenderTarget::new(device, DEFAULT_SIZE, DEFAULT_SIZE);

    render_frame(gpu, &vertex, &fragment, &geometry, &target, &params)?;
    export::export_target(gpu, &target, cli.format.into(), &cli.output)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("shadershot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_the_canonical_run() {
        let cli = parse(&["blob.frag"]);
        assert_eq!(cli.output, PathBuf::from("output.png"));
        assert_eq!(cli.driver, DriverArg::Auto);
        assert_eq!(cli.format, FormatArg::Png);
        assert_eq!(cli.geometry, GeometryArg::Triangles);
        assert_eq!(cli.vertex_dim, VertexDimArg::Two);
        assert_eq!(cli.entry, "main");
        assert!(!cli.get_info);
    }

    #[test]
    fn shader_alone_selects_render_mode() {
        let cli = parse(&["blob.frag"]);
        assert!(matches!(run_mode(&cli), Ok(Mode::Render(path)) if path == PathBuf::from("blob.frag")));
    }

    #[test]
    fn get_info_alone_selects_info_mode() {
        let cli = parse(&["--get-info"]);
        assert!(matches!(run_mode(&cli), Ok(Mode::Info)));
    }

    #[test]
    fn no_shader_and_no_info_is_rejected() {
        let cli = parse(&[]);
        let err = run_mode(&cli).err().unwrap();
        assert!(err.contains("pixel shader"));
        assert!(err.contains("--get-info"));
    }

    #[test]
    fn shader_plus_info_is_rejected() {
        let cli = parse(&["blob.frag", "--get-info"]);
        assert!(run_mode(&cli).is_err());
    }

    #[test]
    fn driver_values_map_to_single_tier_options() {
        let cli = parse(&["blob.frag", "--driver", "warp"]);
        let options = cli.driver.acquire_options();
        assert_eq!(options.driver_tiers, vec![DriverTier::Warp]);

        let auto = parse(&["blob.frag"]).driver.acquire_options();
        assert_eq!(auto.driver_tiers.len(), 3);
    }

    #[test]
    fn background_flag_builds_a_clear_color() {
        let cli = parse(&["blob.frag", "--background", "#1a2b3c"]);
        let color = cli.background.unwrap();
        assert!((color.r - 0x1a as f64 / 255.0).abs() < 1e-9);
        assert!((color.g - 0x2b as f64 / 255.0).abs() < 1e-9);
        assert!((color.b - 0x3c as f64 / 255.0).abs() < 1e-9);
        assert_eq!(color.a, 1.0);

        assert_eq!(parse(&["blob.frag"]).background, None);
    }

    #[test]
    fn background_alpha_component_is_honored() {
        let color = parse_background("00000080").unwrap();
        assert!((color.a - 128.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_background_values_are_rejected() {
        assert!(parse_background("red").is_err());
        assert!(parse_background("#12345").is_err());
        assert!(parse_background("gggggg").is_err());
        assert!(Cli::try_parse_from(["shadershot", "blob.frag", "--background", "zz"]).is_err());
    }

    #[test]
    fn quiet_and_verbose_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["shadershot", "blob.frag", "-q", "-v"]).is_err());
        assert_eq!(parse(&["blob.frag", "-vv"]).verbose, 2);
        assert!(parse(&["blob.frag", "--quiet"]).quiet);
    }

    #[test]
    fn vertex_dim_accepts_numeric_names() {
        let cli = parse(&["blob.frag", "--vertex-dim", "3"]);
        assert_eq!(VertexDim::from(cli.vertex_dim), VertexDim::Three);
    }
}
