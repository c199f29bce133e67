use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use dialogue_screen::{Renderer, RendererOpts, Scene, SceneRequest};

#[derive(Parser, Debug)]
#[command(name = "dialogue-screen", version)]
struct Cli {
    /// Log more (`-v` debug, `-vv` trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a scene JSON file to PNG.
    Render(RenderArgs),
    /// Build a scene from query-style options and render it to PNG.
    Quick(QuickArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Asset root; overrides `assetsRoot` from the config.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Renderer options JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct QuickArgs {
    #[command(flatten)]
    request: SceneRequest,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Command::Render(args) => {
            let scene = Scene::from_path(&args.scene)?;
            render_to(&scene, &args.common, &load_opts(&args.common)?)
        }
        Command::Quick(args) => {
            let opts = load_opts(&args.common)?;
            let mut request = args.request;
            // Shells pass "\n" through literally.
            request.text = request.text.replace("\\n", "\n");
            let scene = request.into_scene(&opts.request_defaults)?;
            render_to(&scene, &args.common, &opts)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn load_opts(common: &CommonArgs) -> anyhow::Result<RendererOpts> {
    let mut opts = match &common.config {
        Some(path) => RendererOpts::from_path(path)?,
        None => RendererOpts::default(),
    };
    if let Some(root) = &common.assets {
        opts = opts.with_assets_root(root);
    }
    Ok(opts)
}

fn render_to(scene: &Scene, common: &CommonArgs, opts: &RendererOpts) -> anyhow::Result<()> {
    let renderer = Renderer::new(opts).context("set up renderer")?;
    let image = renderer.render(scene)?;
    image.write_to_path(&common.out)?;
    eprintln!("wrote {} ({} bytes)", common.out.display(), image.len());
    Ok(())
}
