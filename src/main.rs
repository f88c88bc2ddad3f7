use clap::{ArgGroup, Parser, Subcommand};
use icon_dl::{Config, FormatValidator, IconDownloader, links, shutdown_token, sweep};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "icon-dl")]
#[command(about = "Download SVG/PNG icon pairs from an icon catalog", version)]
#[command(group(ArgGroup::new("source").required(true).args(["family", "config"])))]
struct Cli {
    /// Icon family; reads configuration_<family>.json
    #[arg(short, long)]
    family: Option<String>,

    /// Explicit configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the icon root directory
    #[arg(long)]
    icon_dir: Option<PathBuf>,

    /// Override the number of attempts per asset
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Override how many corrupted cycles trigger a new session
    #[arg(long)]
    rotation_threshold: Option<u32>,

    /// Proxy URL for the session pool (repeatable, replaces the configured pool)
    #[arg(long = "proxy")]
    proxies: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Download every icon listed by the link source (default)
    Download,
    /// Re-extract the catalog page and rewrite the link cache
    Links,
    /// Delete icon files that fail validation
    Clean,
}

impl Cli {
    fn load_config(&self) -> icon_dl::Result<Config> {
        let path = match (&self.config, &self.family) {
            (Some(path), _) => path.clone(),
            (None, Some(family)) => Config::family_path(family),
            (None, None) => {
                return Err(icon_dl::Error::config(
                    "either --family or --config is required",
                    "family",
                ));
            }
        };
        let mut config = Config::from_file(&path)?;

        if let Some(dir) = &self.icon_dir {
            config.catalog.icon_dir = dir.clone();
        }
        if let Some(attempts) = self.max_attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(threshold) = self.rotation_threshold {
            config.session.rotation_threshold = threshold;
        }
        if !self.proxies.is_empty() {
            config.session.proxies = self.proxies.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("icon_dl=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command.unwrap_or(Commands::Download) {
        Commands::Download => {
            let urls = links::load_or_extract(&config).await?;
            let mut downloader = IconDownloader::new(config)?;
            let summary = downloader.run(&urls, &shutdown_token()).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Links => {
            let urls = links::refresh_cache(&config).await?;
            println!(
                "{} links written to {}",
                urls.len(),
                config.catalog.links_file.display()
            );
        }
        Commands::Clean => {
            let report = sweep(config.icon_dir(), &FormatValidator).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
