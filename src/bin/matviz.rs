use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "matviz", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the full animation as an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame; `.png` rasterizes, `.svg` writes the vector document.
    Frame(FrameArgs),
    /// Print the access-event sequence as JSON lines.
    Trace(TraceArgs),
}

#[derive(Args, Debug)]
struct SimArgs {
    /// Title text shown above the animation.
    #[arg(long, default_value = "")]
    title: String,

    /// Matrix dimensions, `N` for square or `MxNxK` (A is MxK, B is KxN).
    #[arg(long, default_value = "12x12x12", value_parser = parse_dims)]
    dims: matviz::Dims,

    /// Traversal strategy.
    #[arg(long, value_enum, default_value_t = VariantChoice::Naive)]
    variant: VariantChoice,

    /// Block side for the blocked variants.
    #[arg(long)]
    block1: Option<usize>,

    /// L1 sub-block side inside each block (`blocked` variant only).
    #[arg(long)]
    l1: Option<usize>,

    /// Outer block side (`blocked2` variant only).
    #[arg(long)]
    block2: Option<usize>,

    /// Frames per second of the encoded video.
    #[arg(long, default_value_t = 24)]
    fps: u32,

    /// Raster scale; frames are 380*scale x 200*scale pixels.
    #[arg(long, default_value_t = 3)]
    scale: u32,

    /// Hide the linear-memory strips under the grids.
    #[arg(long)]
    no_linear: bool,

    /// Cache lines attributed to L1 in the hit statistics.
    #[arg(long, default_value_t = 0)]
    l1_lines: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantChoice {
    Naive,
    Transposed,
    Blocked,
    Blocked2,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    sim: SimArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    sim: SimArgs,

    /// Frame index (0-based, one frame per access event).
    #[arg(long)]
    frame: u64,

    /// Output path (`.png` or `.svg`).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct TraceArgs {
    #[command(flatten)]
    sim: SimArgs,

    /// Output path; defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Trace(args) => cmd_trace(args),
    }
}

/// Map CLI flags onto the flat configuration record. Block parameters the
/// selected variant does not consume are ignored with a warning, matching
/// the permissive behavior of the reference tool.
fn to_config(args: &SimArgs) -> matviz::SimConfig {
    let warn_unused = |flag: &str| {
        eprintln!("warning: --{flag} is unused by the '{:?}' variant", args.variant);
    };

    let variant = match args.variant {
        VariantChoice::Naive | VariantChoice::Transposed => {
            if args.block1.is_some() {
                warn_unused("block1");
            }
            if args.l1.is_some() {
                warn_unused("l1");
            }
            if args.block2.is_some() {
                warn_unused("block2");
            }
            match args.variant {
                VariantChoice::Naive => matviz::Variant::Naive,
                _ => matviz::Variant::Transposed,
            }
        }
        VariantChoice::Blocked => {
            if args.block2.is_some() {
                warn_unused("block2");
            }
            matviz::Variant::Blocked {
                block1: args.block1.unwrap_or(4),
                l1: args.l1,
            }
        }
        VariantChoice::Blocked2 => {
            if args.l1.is_some() {
                warn_unused("l1");
            }
            matviz::Variant::Blocked2 {
                block1: args.block1.unwrap_or(4),
                block2: args.block2.unwrap_or(8),
            }
        }
    };

    let mut cfg = matviz::SimConfig::new(args.title.clone(), args.dims, variant);
    cfg.fps = args.fps;
    cfg.scale = args.scale;
    cfg.show_linear = !args.no_linear;
    cfg.cache.l1_lines = args.l1_lines;
    cfg
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = to_config(&args.sim);
    let stats = matviz::render_to_mp4(&cfg, &args.out, matviz::RenderToMp4Opts::default())
        .with_context(|| format!("render '{}'", args.out.display()))?;

    println!("Totals: {}", stats.totals);
    eprintln!("wrote {} ({} frames)", args.out.display(), stats.frames);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = to_config(&args.sim);
    ensure_parent(&args.out)?;

    let ext = args
        .out
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("svg") => {
            let svg = matviz::scene_svg(&cfg, matviz::FrameIndex(args.frame))?;
            std::fs::write(&args.out, svg)
                .with_context(|| format!("write svg '{}'", args.out.display()))?;
        }
        Some("png") | None => {
            let frame = matviz::render_frame(&cfg, matviz::FrameIndex(args.frame))?;
            image::save_buffer_with_format(
                &args.out,
                &frame.data,
                frame.width,
                frame.height,
                image::ColorType::Rgba8,
                image::ImageFormat::Png,
            )
            .with_context(|| format!("write png '{}'", args.out.display()))?;
        }
        Some(other) => {
            anyhow::bail!("unsupported frame extension '.{other}' (expected .png or .svg)");
        }
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_trace(args: TraceArgs) -> anyhow::Result<()> {
    let cfg = to_config(&args.sim);

    let count = match &args.out {
        Some(path) => {
            ensure_parent(path)?;
            let f = std::fs::File::create(path)
                .with_context(|| format!("create trace file '{}'", path.display()))?;
            matviz::write_trace_json(&cfg, std::io::BufWriter::new(f))?
        }
        None => matviz::write_trace_json(&cfg, std::io::stdout().lock())?,
    };

    eprintln!("{count} events");
    Ok(())
}

fn parse_dims(s: &str) -> Result<matviz::Dims, String> {
    let parts: Vec<usize> = s
        .split(['x', 'X'])
        .map(|p| {
            p.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid dimension '{p}'"))
        })
        .collect::<Result<_, _>>()?;

    let dims = match parts.as_slice() {
        [side] => matviz::Dims::square(*side),
        [m, n, k] => matviz::Dims::new(*m, *n, *k),
        _ => return Err("dims must be 'N' or 'MxNxK'".to_string()),
    };
    dims.map_err(|e| e.to_string())
}
