use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;
use wp_migrate::config::{self, MigrateConfig};
use wp_migrate::export::read_export;
use wp_migrate::{output, pipeline};

#[derive(Parser)]
#[command(name = "wp-migrate")]
#[command(about = "Migrate a WordPress export into a static HTML site")]
#[command(long_about = "\
Migrate a WordPress export into a static HTML site

Reads a WXR export, sorts every item into a destination and writes one
index.html per page:

  site/
  ├── pokemon/
  │   ├── 1/index.html                        # chapter: slug pokemon-1
  │   └── the-origin-of-species-faq/index.html   # standalone series page
  ├── blog/
  │   ├── index.html                          # category index, rebuilt each run
  │   └── my-review/index.html                # blog post
  ├── search.json                             # shared search manifest (blog entries replaced)
  └── blog-manifest.json                      # pages written by the last run

Drafts, attachments, stubs and excluded categories are skipped.
Run 'wp-migrate check EXPORT' to see where every item would go.
Run 'wp-migrate gen-config' to generate a documented migrate.toml.")]
#[command(version = env!("WP_MIGRATE_VERSION"))]
struct Cli {
    /// Output directory
    #[arg(long, default_value = "site", global = true)]
    output: PathBuf,

    /// Config file (default: migrate.toml next to the export)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full migration: read → classify → normalize → emit → index
    Build {
        /// WordPress WXR export file
        export: PathBuf,
    },
    /// Classify the export and show where every item would go, writing nothing
    Check {
        /// WordPress WXR export file
        export: PathBuf,
    },
    /// Print the export's inventory
    Read {
        /// WordPress WXR export file
        export: PathBuf,
        /// List every record
        #[arg(long)]
        records: bool,
        /// Print records as JSON instead
        #[arg(long, conflicts_with = "records")]
        json: bool,
    },
    /// Print a stock migrate.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Command::Build { export } => {
            let config = load_config(cli.config.as_deref(), export)?;
            println!("==> Migrating {} → {}", export.display(), cli.output.display());
            let report = pipeline::run(export, &cli.output, &config)?;
            output::print_run_report(&report);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check { export } => {
            let config = load_config(cli.config.as_deref(), export)?;
            println!("==> Checking {}", export.display());
            let document = read_export(export)?;
            let plan = pipeline::plan(&document, &config);
            output::print_plan(&plan, cli.verbose > 0);
        }
        Command::Read {
            export,
            records,
            json,
        } => {
            let document = read_export(export)?;
            if *json {
                let all: Vec<_> = document.records().collect();
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else {
                let listed: Vec<_> = if *records {
                    document.records().collect()
                } else {
                    Vec::new()
                };
                output::print_read_output(&document.inventory(), &listed);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. Defaults to warnings only.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, _) => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>, export: &Path) -> Result<MigrateConfig, config::ConfigError> {
    let config = config::load_config(explicit, export)?;
    tracing::debug!(series = config.series.len(), "config loaded");
    Ok(config)
}
