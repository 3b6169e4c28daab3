//! Service configuration loading and types.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use imagery::{DirectorySceneSource, HttpSceneSource, SceneSource};
use pm25::PipelineSettings;
use serde::{Deserialize, Serialize};

/// Service configuration loaded from YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub region: RegionConfig,
    pub cache: CacheConfig,
    pub imagery: ImageryConfig,
    pub pipeline: PipelineSettings,
    pub precompute: PrecomputeConfig,
}

/// The served region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Display name used in messages
    pub name: String,
    /// Path segment of the boundary endpoint (`/{slug}/map-data`)
    pub slug: String,
    pub boundary_path: PathBuf,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: "Hamburg".to_string(),
            slug: "hamburg".to_string(),
            boundary_path: PathBuf::from("data/hamburg.geojson"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
        }
    }
}

/// Which scene source backs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Http,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageryConfig {
    pub source: SourceKind,
    /// Gateway base URL, required for `http`
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
    /// Scene archive root for `directory`
    pub root: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ImageryConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Directory,
            endpoint: None,
            api_token: None,
            root: PathBuf::from("data/scenes"),
            timeout_secs: 60,
        }
    }
}

impl ImageryConfig {
    /// Build the configured scene source.
    pub fn build_source(&self) -> Result<Arc<dyn SceneSource>> {
        match self.source {
            SourceKind::Http => {
                let Some(endpoint) = self.endpoint.as_deref() else {
                    bail!("imagery.endpoint is required when imagery.source is http");
                };
                let source = HttpSceneSource::new(
                    endpoint,
                    self.api_token.clone(),
                    Duration::from_secs(self.timeout_secs),
                )
                .context("Failed to create imagery client")?;
                Ok(Arc::new(source))
            }
            SourceKind::Directory => Ok(Arc::new(DirectorySceneSource::new(self.root.clone()))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecomputeConfig {
    /// Recompute every dataset in the background at startup
    pub on_startup: bool,
    /// Periodic refresh; disabled when unset
    pub refresh_interval_secs: Option<u64>,
}

impl Default for PrecomputeConfig {
    fn default() -> Self {
        Self {
            on_startup: true,
            refresh_interval_secs: None,
        }
    }
}

impl PrecomputeConfig {
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl ServiceConfig {
    /// Load configuration from a YAML file, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read: {:?}", path))?;
            Self::from_yaml(&content).with_context(|| format!("Failed to parse: {:?}", path))?
        } else {
            tracing::warn!(
                "Config file {} does not exist, using defaults",
                path.display()
            );
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `AQ_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("AQ_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("AQ_REGION_PATH") {
            self.region.boundary_path = PathBuf::from(path);
        }
        if let Some(endpoint) = lookup("AQ_IMAGERY_ENDPOINT") {
            self.imagery.endpoint = Some(endpoint);
            self.imagery.source = SourceKind::Http;
        }
        if let Some(token) = lookup("AQ_IMAGERY_TOKEN") {
            self.imagery.api_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let slug = self.region.slug.trim_matches('/');
        if slug.is_empty() || slug.contains('/') {
            bail!("region.slug must be a single path segment, got {:?}", self.region.slug);
        }
        if slug == "pm25" {
            bail!("region.slug must not be \"pm25\"");
        }
        let export = &self.pipeline.export;
        for (key, value) in [
            ("pipeline.export.scale_m", export.scale_m),
            ("pipeline.export.meters_per_degree", export.meters_per_degree),
        ] {
            if !(value.is_finite() && value > 0.0) {
                bail!("{} must be a positive number, got {}", key, value);
            }
        }
        Ok(())
    }
}
