//! Persistence of the [`FlowConfig`] kept at the storage root.

use artifact_protocol::FlowConfig;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::Result;
use crate::index::write_atomic;
use crate::layout::StorageLayout;

/// Load the configuration stored under the layout's root.
///
/// Falls back to defaults when the file is absent or malformed. The
/// returned configuration always points at the layout's root.
pub async fn load_config(layout: &StorageLayout) -> FlowConfig {
    let path = layout.config_path();
    let mut config = match fs::read_to_string(&path).await {
        Ok(content) => match serde_json::from_str::<FlowConfig>(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring malformed config {}: {e}", path.display());
                FlowConfig::new(layout.root())
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config at {}, using defaults", path.display());
            FlowConfig::new(layout.root())
        }
        Err(e) => {
            warn!("Failed to read config {}: {e}", path.display());
            FlowConfig::new(layout.root())
        }
    };
    config.storage_root = layout.root().to_path_buf();
    config
}

/// Write the configuration to the layout's config file.
pub async fn save_config(layout: &StorageLayout, config: &FlowConfig) -> Result<()> {
    let content = serde_json::to_vec_pretty(config)?;
    write_atomic(&layout.config_path(), &content).await?;
    debug!("Saved config to {}", layout.config_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());

        let config = FlowConfig::new(temp_dir.path())
            .with_watch_root("/tmp/notes")
            .with_debounce(Duration::from_millis(50));
        save_config(&layout, &config).await.unwrap();

        assert_eq!(load_config(&layout).await, config);
    }

    #[tokio::test]
    async fn test_malformed_config_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        fs::write(layout.config_path(), "[1, 2").await.unwrap();

        assert_eq!(load_config(&layout).await, FlowConfig::new(temp_dir.path()));
    }

    #[tokio::test]
    async fn test_root_follows_layout() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp_dir.path());
        save_config(&layout, &FlowConfig::new("/somewhere/else")).await.unwrap();

        assert_eq!(load_config(&layout).await.storage_root, temp_dir.path());
    }
}
