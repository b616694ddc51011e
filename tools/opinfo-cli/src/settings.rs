// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use serde::Deserialize;
use spiral_config::{ConfigLayering, LayeredConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::Result;

/// `[opinfo]` section of the layered configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OpInfoSettings {
    /// Register the built-in AiCPU catalog before any catalog file.
    pub builtin_catalog: bool,
    /// Extra JSON catalogs loaded after the built-ins. Relative entries are
    /// resolved against the config root.
    pub catalogs: Vec<PathBuf>,
    /// Seal the registry once every catalog is loaded.
    pub seal: bool,
}

impl Default for OpInfoSettings {
    fn default() -> Self {
        Self {
            builtin_catalog: true,
            catalogs: Vec::new(),
            seal: true,
        }
    }
}

/// `[metrics]` section of the layered configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub num_labels: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub opinfo: OpInfoSettings,
    pub metrics: MetricsSettings,
}

impl Settings {
    /// Merges base.toml, site.toml and run.json found under `root`, or under
    /// the default SpiralTorch config directory when no root is given.
    pub fn load(root: Option<&Path>) -> Result<Self> {
        let layering = match root {
            Some(root) => ConfigLayering::discover_in(root),
            None => ConfigLayering::discover(),
        };
        let config = LayeredConfig::load(layering)?;
        debug!(overrides = config.events().len(), "loaded layered config");

        let mut opinfo: OpInfoSettings = config.section(&["opinfo"])?.unwrap_or_default();
        if let Some(root) = config.layering().root.as_deref() {
            opinfo.resolve_catalogs(root);
        }
        Ok(Self {
            opinfo,
            metrics: config.section(&["metrics"])?.unwrap_or_default(),
        })
    }
}

impl OpInfoSettings {
    fn resolve_catalogs(&mut self, root: &Path) {
        for catalog in &mut self.catalogs {
            if catalog.is_relative() {
                *catalog = root.join(&*catalog);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_catalogs_join_the_config_root() {
        let mut settings = OpInfoSettings {
            catalogs: vec![PathBuf::from("site_ops.json"), PathBuf::from("/srv/ops.json")],
            ..OpInfoSettings::default()
        };
        settings.resolve_catalogs(Path::new("/etc/spiraltorch"));
        assert_eq!(
            settings.catalogs,
            vec![
                PathBuf::from("/etc/spiraltorch/site_ops.json"),
                PathBuf::from("/srv/ops.json")
            ]
        );
    }
}
