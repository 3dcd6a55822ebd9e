// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! CLI-owned configuration discovery and the on-disk shape it loads
//! (spec §6 "Policy configuration format", extended with the LLM registry
//! and adapter manifest the daemon also needs at startup).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use aegis_orchestrator_core::domain::policy::PolicyConfig;
use aegis_orchestrator_core::infrastructure::command_adapter::CommandAdapterSpec;
use aegis_orchestrator_core::infrastructure::llm::registry::LLMRegistryConfig;

/// Everything the daemon or an embedded run needs at startup, loaded as one
/// YAML document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AegisConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub llm: LLMRegistryConfig,
    #[serde(default)]
    pub adapters: Vec<CommandAdapterSpec>,
    /// Enables exploit steps that would otherwise be gated (spec §4.4).
    #[serde(default)]
    pub lab_mode: bool,
    /// Directory adapter evidence paths are written under.
    #[serde(default = "default_evidence_dir")]
    pub evidence_dir: String,
}

fn default_evidence_dir() -> String {
    "evidence".to_string()
}

/// Discovery order, overridable at every step by environment or flag:
/// 1. `--config` flag
/// 2. `AEGIS_CONFIG_PATH` env var
/// 3. `./aegis-config.yaml`
/// 4. `~/.aegis/config.yaml`
/// 5. `/etc/aegis/config.yaml`
/// 6. built-in default (no policy rules, no LLM providers, no adapters)
impl AegisConfig {
    pub fn load_or_default(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(&path).with_context(|| format!("failed to load config from {}", path.display()));
        }

        if let Ok(path) = std::env::var("AEGIS_CONFIG_PATH") {
            return Self::load_from(Path::new(&path))
                .with_context(|| format!("failed to load config from AEGIS_CONFIG_PATH={path}"));
        }

        for candidate in Self::discovery_paths() {
            if candidate.exists() {
                return Self::load_from(&candidate);
            }
        }

        let mut config = Self::default();
        if let Ok(v) = std::env::var("AEGIS_LAB_MODE") {
            config.lab_mode = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(dir) = std::env::var("AEGIS_EVIDENCE_DIR") {
            config.evidence_dir = dir;
        }
        Ok(config)
    }

    fn discovery_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./aegis-config.yaml")];
        if let Some(home) = dirs_next::home_dir() {
            paths.push(home.join(".aegis").join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/aegis/config.yaml"));
        paths
    }

    fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

        if let Ok(v) = std::env::var("AEGIS_LAB_MODE") {
            config.lab_mode = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(dir) = std::env::var("AEGIS_EVIDENCE_DIR") {
            config.evidence_dir = dir;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_explicit_path_errors() {
        let result = AegisConfig::load_from(Path::new("/nonexistent/aegis-config.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn parses_minimal_yaml() {
        let yaml = "lab_mode: true\nevidence_dir: /tmp/evidence\n";
        let config: AegisConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.lab_mode);
        assert_eq!(config.evidence_dir, "/tmp/evidence");
        assert!(config.adapters.is_empty());
    }
}
