use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use navigation_sync::config::ProjectLayout;
use navigation_sync::engine::{CycleOutcome, DirectCommand, SyncEngine};
use navigation_sync::model::CommandSpec;
use navigation_sync::prompt::{AcceptDefaults, Prompter, TerminalPrompter};
use navigation_sync::slug::{default_component_name, humanize, slugify};
use navigation_sync::vcs::{GitCli, NoVcs, VersionControl};
use navigation_sync::watch::{ChangeFeed, ManifestWatcher, NullFeed};

#[derive(Debug, Parser)]
#[command(name = "navsync")]
#[command(about = "Keep generated screen files in sync with the navigation manifest")]
struct Cli {
    /// Project root all layout paths hang off (defaults to the current directory)
    #[arg(long, env = "NAVSYNC_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Answer every prompt with its default
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Never offer to commit
    #[arg(long, global = true)]
    no_commit: bool,

    /// Debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a screen to the manifest and generate its files
    Add {
        /// Screen name (free text is turned into a slug)
        name: String,

        /// Exported component name
        #[arg(long)]
        component: Option<String>,

        /// Tab title
        #[arg(long)]
        title: Option<String>,

        /// Tab bar icon name
        #[arg(long)]
        icon: Option<String>,
    },

    /// Remove a screen from the manifest and delete its files
    Delete {
        /// Declared screen name
        name: String,
    },

    /// Watch the manifest and sync on every change (the default)
    Watch,
}

type BoxedEngine = SyncEngine<Box<dyn Prompter>, Box<dyn VersionControl>, Box<dyn ChangeFeed>>;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    };

    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "navigation_sync=debug,navsync=debug"
    } else {
        "navigation_sync=info,navsync=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("NAVSYNC_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let layout = ProjectLayout::load(&root)?;
    if !layout.manifest_path().is_file() {
        bail!("manifest not found at {}", layout.manifest_path().display());
    }

    match &cli.cmd {
        None | Some(Command::Watch) => cmd_watch(cli, layout),
        Some(Command::Add {
            name,
            component,
            title,
            icon,
        }) => cmd_add(cli, layout, name, component, title, icon),
        Some(Command::Delete { name }) => cmd_delete(cli, layout, name),
    }
}

// ── Commands ────────────────────────────────────────────────────────────────

fn cmd_watch(cli: &Cli, layout: ProjectLayout) -> anyhow::Result<()> {
    let feed = ManifestWatcher::new(
        &layout.manifest_path(),
        Duration::from_millis(layout.config.debounce_ms),
    )?;
    let mut engine = engine(cli, layout, prompter(cli), Box::new(feed));
    engine.initialize();
    engine.run();
    Ok(())
}

fn cmd_add(
    cli: &Cli,
    layout: ProjectLayout,
    name: &str,
    component: &Option<String>,
    title: &Option<String>,
    icon: &Option<String>,
) -> anyhow::Result<()> {
    let slug = slugify(name);
    if slug.is_empty() {
        bail!("invalid screen name '{}'", name);
    }

    let mut prompter = prompter(cli);
    let component = component
        .clone()
        .or_else(|| prompter.input("Component name:", Some(default_component_name(&slug).as_str())));
    let title = title
        .clone()
        .or_else(|| prompter.input("Title:", Some(humanize(&slug).as_str())));
    let icon = icon
        .clone()
        .or_else(|| prompter.input("Tab bar icon:", Some(slug.as_str())));

    let spec = CommandSpec {
        name: slug,
        component_name: component,
        title,
        icon,
    };
    let mut engine = engine(cli, layout, prompter, Box::new(NullFeed));
    report(engine.apply_direct(&DirectCommand::Add(spec))?);
    Ok(())
}

fn cmd_delete(cli: &Cli, layout: ProjectLayout, name: &str) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        bail!("missing screen name");
    }
    let mut engine = engine(cli, layout, prompter(cli), Box::new(NullFeed));
    report(engine.apply_direct(&DirectCommand::Delete(CommandSpec::named(name)))?);
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn prompter(cli: &Cli) -> Box<dyn Prompter> {
    if cli.yes {
        Box::new(AcceptDefaults)
    } else {
        Box::new(TerminalPrompter)
    }
}

fn engine(
    cli: &Cli,
    layout: ProjectLayout,
    prompter: Box<dyn Prompter>,
    feed: Box<dyn ChangeFeed>,
) -> BoxedEngine {
    let vcs: Box<dyn VersionControl> = if cli.no_commit {
        Box::new(NoVcs)
    } else {
        Box::new(GitCli::new(layout.root.clone()))
    };
    SyncEngine::new(layout, prompter, vcs, feed)
}

fn report(outcome: CycleOutcome) {
    match outcome {
        CycleOutcome::Applied(files) => tracing::info!("Done ({} files touched).", files.len()),
        CycleOutcome::NoChanges => tracing::info!("Nothing to do."),
        other => tracing::info!("Stopped: {:?}", other),
    }
}
