use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use engine_logging::engine_info;
use oai_harvester_core::HarvestConfig;

/// Reads the RON config file, if any, on top of the built-in defaults.
/// Fields missing from the file keep their default values.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<HarvestConfig> {
    let Some(path) = path else {
        return Ok(HarvestConfig::default());
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("reading config file {:?}", path))?;
    let config: HarvestConfig =
        ron::from_str(&content).with_context(|| format!("parsing config file {:?}", path))?;
    engine_info!("Loaded harvest settings from {:?}", path);
    Ok(config)
}

/// Command-line values that replace configured ones.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct HarvestOverrides {
    /// Repository endpoint, e.g. http://export.arxiv.org/oai2
    #[arg(long)]
    pub base_url: Option<String>,

    /// Record set specifier; an empty value harvests all sets.
    #[arg(long)]
    pub set: Option<String>,

    /// Metadata prefix.
    #[arg(long = "format")]
    pub metadata_prefix: Option<String>,

    /// Lower datestamp bound, YYYY-MM-DD or an ISO-8601 datetime.
    #[arg(long)]
    pub from: Option<String>,

    /// Directory plus filename prefix of the page files.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Zero-padding width of page numbers; 0 disables padding.
    #[arg(long)]
    pub padding: Option<usize>,
}

impl HarvestOverrides {
    /// Applies the overrides and validates the result.
    pub(crate) fn apply(self, mut config: HarvestConfig) -> anyhow::Result<HarvestConfig> {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(set) = self.set {
            config.set = Some(set).filter(|set| !set.trim().is_empty());
        }
        if let Some(metadata_prefix) = self.metadata_prefix {
            config.metadata_prefix = metadata_prefix;
        }
        if let Some(from) = self.from {
            config.from = Some(from);
        }
        if let Some(out) = self.out {
            config.base_path = out;
        }
        if let Some(padding) = self.padding {
            config.page_padding = padding;
        }
        config.validate().context("invalid harvest settings")?;
        Ok(config)
    }
}
