use anyhow::Result;
use clap::{Parser, Subcommand};
use quire::build::{build_site, plan_site};
use quire::config::Config;
use quire::merge::Resolver;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Plans the routes of a personal blog and resolves its merge fields.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    /// Log progress at INFO level (otherwise `RUST_LOG` decides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan the site and write `routes.json` to the output directory.
    Build {
        /// A directory inside the project. `quire.yaml` is searched for here
        /// and in every parent directory.
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Defaults to `public/` next to `quire.yaml`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the planned routes, one per line.
    Routes {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Resolve the merge fields in TEXT using the project's `merge_fields`.
    Resolve {
        text: String,

        #[arg(default_value = ".")]
        dir: PathBuf,

        /// The number of substitution passes allowed.
        #[arg(long, default_value_t = quire::merge::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        true => EnvFilter::new("info"),
        false => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Resolves `dir` first so the search for `quire.yaml` can climb above the
/// working directory.
fn load_config(dir: &Path, output: Option<&Path>) -> Result<Config> {
    Config::from_directory(&dir.canonicalize()?, output)
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Build { dir, output } => {
            let config = load_config(&dir, output.as_deref())?;
            let summary = build_site(&config)?;
            println!(
                "Wrote {} routes to {}",
                summary.routes,
                summary.manifest_path.display()
            );
        }
        Command::Routes { dir } => {
            let config = load_config(&dir, None)?;
            let (_, routes) = plan_site(&config)?;
            for route in routes {
                println!("{}\t{}", route.path, route.template.name());
            }
        }
        Command::Resolve {
            text,
            dir,
            max_depth,
        } => {
            let config = load_config(&dir, None)?;
            let resolver = Resolver::new(&config.merge_fields).with_max_depth(max_depth);
            println!("{}", resolver.resolve(&text)?);
        }
    }
    Ok(())
}
