use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use slidecanvas::{CanvasSession, PdfMode, SessionOpts};

#[derive(Parser, Debug)]
#[command(name = "slidecanvas", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export every slide to PDF and/or PPTX.
    Export(ExportArgs),
    /// Render one slide as a PNG.
    Frame(FrameArgs),
    /// Print the parsed presentation as JSON.
    Dump(ProjectArgs),
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// Project directory; slide sources are read from `<dir>/slides/`.
    #[arg(long)]
    dir: PathBuf,

    /// Session options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root that image sources resolve against (default: `<dir>/public`, else `<dir>`).
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Output PDF path.
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Output PPTX path.
    #[arg(long)]
    pptx: Option<PathBuf>,

    /// Rasterize slides into the PDF instead of drawing vectors.
    #[arg(long, default_value_t = false)]
    raster: bool,

    /// Worker threads for raster PDF pages.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Slide index (0-based).
    #[arg(long)]
    index: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Output width in pixels (default: canvas width).
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels (default: canvas height).
    #[arg(long)]
    height: Option<u32>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Dump(args) => cmd_dump(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn open_session(
    project: &ProjectArgs,
    tweak: impl FnOnce(&mut SessionOpts),
) -> anyhow::Result<CanvasSession> {
    let mut opts = match &project.config {
        Some(path) => SessionOpts::from_path(path)?,
        None => SessionOpts::from_env(),
    };
    if let Some(root) = &project.assets {
        opts.assets_root = root.clone();
    } else if opts.assets_root == Path::new(".") {
        let public = project.dir.join("public");
        opts.assets_root = if public.is_dir() {
            public
        } else {
            project.dir.clone()
        };
    }
    tweak(&mut opts);

    let mut session = CanvasSession::new(opts)?;
    let count = session
        .load_slides_dir(&project.dir)
        .with_context(|| format!("load slides from '{}'", project.dir.display()))?;
    for diag in session.diagnostics() {
        eprintln!("warning: {diag}");
    }
    tracing::info!(slides = count, "project loaded");
    Ok(session)
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<ExitCode> {
    if args.pdf.is_none() && args.pptx.is_none() {
        anyhow::bail!("nothing to export: pass --pdf and/or --pptx");
    }
    let session = open_session(&args.project, |opts| {
        if args.raster {
            opts.pdf_mode = PdfMode::Raster;
        }
        if args.threads.is_some() {
            opts.pdf_threads = args.threads;
        }
    })?;

    let mut failed = false;
    if let Some(out) = &args.pdf {
        match session
            .export_pdf()
            .map_err(anyhow::Error::from)
            .and_then(|bytes| write_output(out, &bytes))
        {
            Ok(()) => eprintln!("wrote {}", out.display()),
            Err(err) => {
                eprintln!("pdf export failed: {err:#}");
                failed = true;
            }
        }
    }
    if let Some(out) = &args.pptx {
        match session
            .export_pptx()
            .map_err(anyhow::Error::from)
            .and_then(|bytes| write_output(out, &bytes))
        {
            Ok(()) => eprintln!("wrote {}", out.display()),
            Err(err) => {
                eprintln!("pptx export failed: {err:#}");
                failed = true;
            }
        }
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<ExitCode> {
    let mut session = open_session(&args.project, |_| {})?;
    let canvas = session.opts().canvas;
    let width = args.width.unwrap_or(canvas.width);
    let height = args.height.unwrap_or(canvas.height);

    let mut frame = session.render_frame(args.index, width, height)?;
    frame.unpremultiply();

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_dump(args: ProjectArgs) -> anyhow::Result<ExitCode> {
    let session = open_session(&args, |_| {})?;
    println!("{}", session.dump_json()?);
    Ok(ExitCode::SUCCESS)
}
