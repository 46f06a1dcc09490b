pub mod config;
pub mod extract;
pub mod run;

use std::path::Path;

use recon_core::ReconConfig;
use tracing::debug;

/// Output format
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per record
    Csv,
    /// Plain text summary
    Text,
}

/// Load `--config` if given, else the default config file when it exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ReconConfig> {
    if let Some(path) = config_path {
        return ReconConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(ReconConfig::from_file(&default_path)?)
    } else {
        Ok(ReconConfig::default())
    }
}

/// Write `content` to `output`, or stdout.
pub fn write_output(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            println!(
                "{} Output written to {}",
                console::style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}
