use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "photoveil", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite an edit document and write it as a PNG.
    Export(ExportArgs),
    /// Print the live-preview layers of an edit document as JSON.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Input edit document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory that storage keys resolve against (defaults to the document's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Engine config JSON; `PHOTOVEIL_*` environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Directory the PNG is written to.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<photoveil::EngineConfig> {
    let base = match path {
        Some(p) => photoveil::EngineConfig::from_path(p)?,
        None => photoveil::EngineConfig::default(),
    };
    Ok(base.with_env()?)
}

fn open_session(args: &CommonArgs) -> anyhow::Result<photoveil::EditorSession> {
    let config = load_config(args.config.as_deref())?;
    let doc = photoveil::EditDocument::from_path(&args.in_path)
        .with_context(|| format!("load edit document '{}'", args.in_path.display()))?;

    let root = match &args.assets {
        Some(dir) => dir.clone(),
        None => args
            .in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let loader = photoveil::FsAssetLoader::with_route(root, config.asset_route.clone());
    let session = photoveil::EditorSession::from_document(&doc, config, Arc::new(loader))?;
    Ok(session)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut session = open_session(&args.common)?;
    let image = session.export()?;
    let path = photoveil::DownloadTarget::new(&args.out_dir)
        .save(&image)
        .with_context(|| format!("save export into '{}'", args.out_dir.display()))?;

    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let mut session = open_session(&args.common)?;
    session.resolve_aspects();
    let frame = session
        .preview()
        .context("document has no laid-out base image")?;
    let json = serde_json::to_string_pretty(&frame).context("serialize preview")?;
    println!("{json}");
    Ok(())
}
