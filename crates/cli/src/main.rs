mod app;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cidfetch_core::{
    load_config, metrics, validate_config, CandidateCatalog, CatalogConfig, Config, ContentId,
    HttpCandidateCatalog, RetrievalCandidate,
};

use app::{App, CandidatesArg, Commands};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "cidfetch.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let app = App::parse();

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = resolve_config(app.config.as_deref())?;

    let result = match app.cmd {
        Commands::Candidates(arg) => candidates(&config, arg).await,
        Commands::Config => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            print!("{}", rendered);
            Ok(())
        }
    };

    if app.metrics {
        eprint!("{}", metrics::encode_metrics());
    }
    result
}

/// Load the explicit config file, else the default one if present, else defaults.
fn resolve_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };

    let config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => Config::default(),
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn candidates(config: &Config, arg: CandidatesArg) -> Result<()> {
    let cid = ContentId::parse(&arg.cid).with_context(|| format!("Invalid CID {:?}", arg.cid))?;

    let catalog_config = match (arg.endpoint, &config.catalog) {
        (Some(endpoint), existing) => CatalogConfig {
            endpoint,
            timeout_secs: existing.as_ref().map_or(30, |c| c.timeout_secs),
        },
        (None, Some(existing)) => existing.clone(),
        (None, None) => bail!("No catalog endpoint configured; pass --endpoint or set [catalog]"),
    };

    let catalog =
        HttpCandidateCatalog::new(&catalog_config).context("Failed to create catalog client")?;
    let found = catalog
        .candidates(&cid)
        .await
        .with_context(|| format!("Candidate lookup for {} failed", cid))?;

    info!(cid = %cid, candidates = found.len(), "Catalog lookup complete");

    if arg.json {
        let json = serde_json::to_string_pretty(&found).context("Failed to encode candidates")?;
        println!("{}", json);
    } else {
        print!("{}", render_table(&found));
    }
    Ok(())
}

/// Plain-text listing, one candidate per line.
fn render_table(candidates: &[RetrievalCandidate]) -> String {
    let provider_width = candidates
        .iter()
        .map(|c| c.provider.as_str().len())
        .chain(std::iter::once("PROVIDER".len()))
        .max()
        .unwrap_or(0);
    let root_width = candidates
        .iter()
        .map(|c| c.root_cid.as_str().len())
        .chain(std::iter::once("ROOT".len()))
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "{:<pw$}  {:<rw$}  DEAL\n",
        "PROVIDER",
        "ROOT",
        pw = provider_width,
        rw = root_width
    );
    for candidate in candidates {
        let deal = candidate
            .deal_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        out.push_str(&format!(
            "{:<pw$}  {:<rw$}  {}\n",
            candidate.provider.as_str(),
            candidate.root_cid.as_str(),
            deal,
            pw = provider_width,
            rw = root_width
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cidfetch_core::testing::fixtures;

    #[test]
    fn test_render_table() {
        let mut candidates = fixtures::candidates(&["f01234", "f05"]);
        candidates[0].deal_id = Some(42);

        let table = render_table(&candidates);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "PROVIDER  ROOT      DEAL");
        assert_eq!(lines[1], "f01234    bafyroot  42");
        assert_eq!(lines[2], "f05       bafyroot  -");
    }

    #[test]
    fn test_resolve_config_defaults_without_file() {
        let config = resolve_config(None).unwrap();
        assert!(config.catalog.is_none());
        assert_eq!(config.peer.max_providers, 20);
    }

    #[test]
    fn test_resolve_config_missing_explicit_file() {
        let result = resolve_config(Some(Path::new("/nonexistent/cidfetch.toml")));
        assert!(result.is_err());
    }
}
