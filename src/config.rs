use crate::engine::EngineConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl EngineConfig {
    /// Load engine tuning from a YAML file. Missing fields take their
    /// defaults, so a partial file tuning one threshold is valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        let config: EngineConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        Ok(config)
    }
}
