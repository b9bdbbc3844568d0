//! Catalog Harvest command-line entry point.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use catalog_harvest::{
    list_outputs, read_records, CategoryKind, ChromiumDriver, CsvSink, FixtureSite,
    HarvestConfig, HarvestSummary, Harvester, PageDriver, Target,
};
use catalog_harvest_cli::{load_config, render_outputs, render_preview, select_targets};

#[derive(Parser)]
#[command(
    name = "catalog-harvest",
    about = "Harvest product listings from infinite-scroll catalog pages into CSV",
    version
)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Brand,
    Keyword,
}

impl From<KindArg> for CategoryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Brand => CategoryKind::Brand,
            KindArg::Keyword => CategoryKind::Keyword,
        }
    }
}

/// Options shared by the harvesting commands.
#[derive(Args, Default)]
struct HarvestArgs {
    /// Only harvest targets of this kind.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// Only harvest targets with this label. Can be repeated.
    #[arg(long)]
    only: Vec<String>,

    /// Items to collect per target.
    #[arg(long)]
    target_count: Option<usize>,

    /// Directory for result files.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest the configured targets with Chromium (default).
    Run {
        #[command(flatten)]
        harvest: HarvestArgs,

        /// Show the browser window.
        #[arg(long)]
        headful: bool,
    },

    /// Harvest against recorded fixture pages instead of a live browser.
    Replay {
        /// Fixture JSON: a map of URL to recorded page.
        fixture: PathBuf,

        #[command(flatten)]
        harvest: HarvestArgs,
    },

    /// Print the resolved target list.
    Targets {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List result files and their row counts.
    Outputs {
        /// Directory to scan (defaults to the configured output_dir).
        dir: Option<PathBuf>,
    },

    /// Print the first rows of a result file.
    Preview {
        file: PathBuf,

        /// Rows to show.
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   catalog-harvest completions bash > ~/.local/share/bash-completion/completions/catalog-harvest
    ///   catalog-harvest completions zsh > ~/.zfunc/_catalog-harvest
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Run {
        harvest: HarvestArgs::default(),
        headful: false,
    }) {
        Commands::Run { harvest, headful } => {
            let mut config = load_config(cli.config.as_deref())?;
            let targets = prepare(&mut config, &harvest)?;
            if headful {
                config.browser.headless = false;
            }

            let driver = ChromiumDriver::launch(&config.browser).await?;
            let summary = harvest_with(driver, config, &targets).await?;
            finish(&summary)?;
        }

        Commands::Replay { fixture, harvest } => {
            let mut config = load_config(cli.config.as_deref())?;
            let targets = prepare(&mut config, &harvest)?;

            let site = FixtureSite::load(&fixture)
                .with_context(|| format!("failed to load fixture {}", fixture.display()))?;
            tracing::info!("Replaying {}", fixture.display());

            let summary = harvest_with(site, config, &targets).await?;
            finish(&summary)?;
        }

        Commands::Targets { json } => {
            let config = load_config(cli.config.as_deref())?;
            let targets = config.targets();
            if json {
                println!("{}", serde_json::to_string_pretty(&targets)?);
            } else {
                for t in &targets {
                    println!("{:<8} {:<12} {}", t.kind.as_str(), t.label, t.url);
                }
            }
        }

        Commands::Outputs { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => load_config(cli.config.as_deref())?.output_dir,
            };
            let outputs = list_outputs(&dir)?;
            print!("{}", render_outputs(&outputs));
        }

        Commands::Preview { file, limit } => {
            let records = read_records(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            print!("{}", render_preview(&records, limit));
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "catalog-harvest", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Apply command-line overrides and pick the targets to run.
fn prepare(config: &mut HarvestConfig, args: &HarvestArgs) -> anyhow::Result<Vec<Target>> {
    if let Some(count) = args.target_count {
        config.target_count = count;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    config.validate()?;

    let targets = select_targets(config, args.kind.map(Into::into), &args.only);
    if targets.is_empty() {
        bail!("no targets match the given filters");
    }
    Ok(targets)
}

async fn harvest_with<D: PageDriver>(
    driver: D,
    config: HarvestConfig,
    targets: &[Target],
) -> anyhow::Result<HarvestSummary> {
    let sink = CsvSink::new(&config.output_dir);
    let mut harvester = Harvester::new(driver, sink, config);
    let summary = harvester.run(targets).await;

    let (driver, _) = harvester.into_parts();
    if let Err(e) = driver.close().await {
        tracing::warn!("Failed to close browser: {e:#}");
    }
    Ok(summary)
}

fn finish(summary: &HarvestSummary) -> anyhow::Result<()> {
    for path in summary.written_paths() {
        println!("{}", path.display());
    }
    if summary.saved() == 0 {
        bail!("no target was harvested ({} failed)", summary.failed());
    }
    Ok(())
}
