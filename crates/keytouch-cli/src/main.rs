//! keytouch
//!
//! Drive touch-only applications from the keyboard: each mapped key or chord
//! becomes a synthesized touch contact at a fixed screen position.

mod creator;
mod quickstart;
mod runner;
mod shell;
mod store;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use keytouch_core::allocator::PointerIds;
use keytouch_core::Hotkey;
use quickstart::QuickStart;
use std::path::PathBuf;
use store::Store;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "keytouch")]
#[command(about = "Keyboard to multi-touch mapper")]
#[command(version)]
struct Cli {
    /// Data directory holding `mappings/` and `quickstart.json`
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    /// Defaults to the interactive shell
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List mapping files
    List,

    /// Print a mapping with its pointer ids
    Show { name: String },

    /// Start a mapping and run until the quit hotkey
    Start(StartArgs),

    /// Repeat the last start
    Qs,

    /// Record a new mapping by pressing keys and clicking positions
    Create { name: String },

    /// Interactive prompt
    Shell,
}

#[derive(Args, Debug, Clone)]
struct StartArgs {
    /// Mapping name, with or without `.txt`
    name: String,

    /// Application that should receive the touches
    #[arg(long)]
    target: Option<String>,

    /// Only inject while the target is in the foreground
    #[arg(long)]
    focus_gating: bool,

    #[arg(long, default_value_t = 50)]
    keepalive_ms: u64,

    #[arg(long, default_value = "ctrl+q")]
    quit_hotkey: Hotkey,
}

impl From<StartArgs> for QuickStart {
    fn from(args: StartArgs) -> Self {
        Self {
            filename: args.name,
            target: args.target,
            focus_gating: args.focus_gating,
            keepalive_ms: args.keepalive_ms,
            quit_hotkey: args.quit_hotkey,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let store = Store::new(cli.dir);
    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut out = std::io::stdout();
            shell::run(&mut input, &mut out, |cmd| execute(&store, cmd))
        }
        cmd => execute(&store, cmd),
    }
}

fn execute(store: &Store, command: Commands) -> Result<()> {
    match command {
        Commands::List => cmd_list(store),
        Commands::Show { name } => cmd_show(store, &name),
        Commands::Start(args) => cmd_start(store, args.into()),
        Commands::Qs => cmd_quickstart(store),
        Commands::Create { name } => runner::create(store, &name),
        Commands::Shell => bail!("already in the shell"),
    }
}

fn cmd_list(store: &Store) -> Result<()> {
    let names = store.list()?;
    if names.is_empty() {
        println!("no mappings in {}", store.mappings_dir().display());
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_show(store: &Store, name: &str) -> Result<()> {
    let table = store.load(name)?;
    let ids = PointerIds::allocate(&table);
    println!("{} ({} entries)", name, table.len());
    for (key, point) in table.iter() {
        let id = ids.get(key).map_or_else(|| "-".to_string(), |id| id.to_string());
        println!("  {:>3}  {:<16} ({}, {})", id, key.to_string(), point.x, point.y);
    }
    Ok(())
}

fn cmd_start(store: &Store, qs: QuickStart) -> Result<()> {
    if !store.exists(&qs.filename) {
        bail!("no mapping named {}", qs.filename);
    }
    quickstart::save(&store.quickstart_path(), &qs).context("recording quickstart")?;
    info!("Starting {}", qs.filename);
    runner::start(store, &qs)
}

fn cmd_quickstart(store: &Store) -> Result<()> {
    let Some(qs) = quickstart::load(&store.quickstart_path())? else {
        bail!("nothing to repeat yet; use start first");
    };
    info!("Quick start: {}", qs.filename);
    runner::start(store, &qs)
}
