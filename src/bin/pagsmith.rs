use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use pagsmith::{
    AmbiguityPolicy, EditorConfig, FrameRenderer, ModificationList, PersistencePipeline,
    PngSequenceSink, SourceContext, generate_batch, load_batch,
    sdk::{capability, memory::MemorySdk},
    write_png,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pagsmith", version, about)]
struct Cli {
    /// JSON config file; defaults apply when absent.
    #[arg(long, global = true, default_value = "pagsmith.json")]
    config: PathBuf,

    /// Override the ambiguity policy from the config.
    #[arg(long, global = true, value_enum)]
    ambiguity: Option<AmbiguityArg>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a modification list to a template and write the edited document.
    Apply(ApplyArgs),
    /// Generate one document per config entry (JSON or CSV).
    Batch(BatchArgs),
    /// Render every frame of a document as numbered PNGs.
    Render(RenderArgs),
    /// Render a single frame at a given progress as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input template.
    #[arg(long)]
    template: PathBuf,

    /// Modification list JSON.
    #[arg(long)]
    mods: PathBuf,

    /// Output document path.
    #[arg(long)]
    out: PathBuf,

    /// Extra directory searched for relative image paths.
    #[arg(long)]
    images_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Input template.
    #[arg(long)]
    template: PathBuf,

    /// Batch configs (`.json` or `.csv`).
    #[arg(long)]
    configs: PathBuf,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// Extra directory searched for relative image paths.
    #[arg(long)]
    images_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input document.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Modification list JSON (image replacements and transforms).
    #[arg(long)]
    mods: Option<PathBuf>,

    /// Output directory for frames.
    #[arg(long)]
    out_dir: PathBuf,

    /// Frame rate; the document's own rate when unset.
    #[arg(long)]
    fps: Option<f64>,

    /// Frame file name prefix.
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input document.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Modification list JSON (image replacements and transforms).
    #[arg(long)]
    mods: Option<PathBuf>,

    /// Timeline progress in `[0, 1]`.
    #[arg(long, default_value_t = 0.0)]
    progress: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AmbiguityArg {
    First,
    Reject,
}

impl From<AmbiguityArg> for AmbiguityPolicy {
    fn from(a: AmbiguityArg) -> Self {
        match a {
            AmbiguityArg::First => AmbiguityPolicy::First,
            AmbiguityArg::Reject => AmbiguityPolicy::Reject,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = EditorConfig::load(&cli.config)
        .with_context(|| format!("load config '{}'", cli.config.display()))?;
    if let Some(a) = cli.ambiguity {
        config.ambiguity = a.into();
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    capability::init(MemorySdk::is_available());

    match cli.cmd {
        Command::Apply(args) => cmd_apply(args, &config),
        Command::Batch(args) => cmd_batch(args, &config),
        Command::Render(args) => cmd_render(args, &config),
        Command::Frame(args) => cmd_frame(args, &config),
    }
}

fn sources_for(list_path: Option<&Path>, images_dir: Option<&Path>) -> SourceContext {
    let mut sources = SourceContext::new();
    if let Some(dir) = list_path.and_then(Path::parent)
        && !dir.as_os_str().is_empty()
    {
        sources = sources.with_search_root(dir);
    }
    if let Some(dir) = images_dir {
        sources = sources.with_search_root(dir);
    }
    sources
}

fn read_list(path: Option<&Path>) -> anyhow::Result<ModificationList> {
    match path {
        Some(p) => Ok(ModificationList::from_path(p)
            .with_context(|| format!("load modification list '{}'", p.display()))?),
        None => Ok(ModificationList::default()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_apply(args: ApplyArgs, config: &EditorConfig) -> anyhow::Result<()> {
    let input = std::fs::read(&args.template)
        .with_context(|| format!("read template '{}'", args.template.display()))?;
    let list = read_list(Some(args.mods.as_path()))?;
    let images_dir = args.images_dir.as_deref().or(config.images_dir.as_deref());
    let sources = sources_for(Some(args.mods.as_path()), images_dir);

    let sdk = MemorySdk::new();
    let out = PersistencePipeline::new(&sdk, &sources)
        .with_policy(config.ambiguity)
        .run(&input, &list)?;
    std::fs::write(&args.out, &out.bytes)
        .with_context(|| format!("write '{}'", args.out.display()))?;

    print_json(&serde_json::json!({
        "output": args.out,
        "ledger": out.ledger,
        "failures": out.failures,
    }))
}

fn cmd_batch(args: BatchArgs, config: &EditorConfig) -> anyhow::Result<()> {
    let entries = load_batch(&args.configs)
        .with_context(|| format!("load batch configs '{}'", args.configs.display()))?;
    let images_dir = args.images_dir.as_deref().or(config.images_dir.as_deref());
    let sources = sources_for(Some(args.configs.as_path()), images_dir);

    let report = generate_batch(
        &MemorySdk::new(),
        &args.template,
        &entries,
        &args.out_dir,
        &sources,
        config.ambiguity,
    )?;
    print_json(&report)
}

fn cmd_render(args: RenderArgs, config: &EditorConfig) -> anyhow::Result<()> {
    let input = std::fs::read(&args.in_path)
        .with_context(|| format!("read document '{}'", args.in_path.display()))?;
    let list = read_list(args.mods.as_deref())?;
    let sources = sources_for(args.mods.as_deref(), config.images_dir.as_deref());

    let sdk = MemorySdk::new();
    let mut renderer =
        FrameRenderer::load(&sdk, &sources, &input, &list)?.with_policy(config.ambiguity);
    let prefix = args.prefix.unwrap_or_else(|| config.frame_prefix.clone());
    let mut sink = PngSequenceSink::new(&args.out_dir, prefix);
    let report = renderer.render_all(args.fps.or(config.fps), &mut sink)?;
    print_json(&report)
}

fn cmd_frame(args: FrameArgs, config: &EditorConfig) -> anyhow::Result<()> {
    let input = std::fs::read(&args.in_path)
        .with_context(|| format!("read document '{}'", args.in_path.display()))?;
    let list = read_list(args.mods.as_deref())?;
    let sources = sources_for(args.mods.as_deref(), config.images_dir.as_deref());

    let sdk = MemorySdk::new();
    let mut renderer =
        FrameRenderer::load(&sdk, &sources, &input, &list)?.with_policy(config.ambiguity);
    let frame = renderer.render_frame(args.progress)?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create '{}'", parent.display()))?;
    }
    write_png(&args.out, &frame)?;
    println!("wrote {}", args.out.display());
    Ok(())
}
