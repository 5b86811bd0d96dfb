//! Daemon configuration
//!
//! Read from `~/.config/k90/k90d.toml`. A missing file means defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use k90_keyboard::GKeyMap;
use serde::{Deserialize, Serialize};

fn default_device_name() -> String {
    "Corsair K90 G-keys".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct K90Config {
    /// Name of the virtual input device carrying G-key events
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Log filter used when neither RUST_LOG nor --log-level is given
    #[serde(default)]
    pub log_level: Option<String>,

    /// Linux key codes for G1..G18; all 18 or none
    #[serde(default)]
    pub gkey_codes: Option<Vec<u16>>,
}

impl Default for K90Config {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            log_level: None,
            gkey_codes: None,
        }
    }
}

impl K90Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("k90")
            .join("k90d.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: K90Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.keymap()?;
        Ok(config)
    }

    /// G-key table, the default unless the file overrides it as a whole
    pub fn keymap(&self) -> anyhow::Result<GKeyMap> {
        match &self.gkey_codes {
            Some(codes) => Ok(GKeyMap::from_slice(codes)?),
            None => Ok(GKeyMap::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = K90Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, K90Config::default());
        assert_eq!(config.keymap().unwrap(), GKeyMap::default());
    }

    #[test]
    fn test_full_table_override() {
        let codes: Vec<String> = (59..77).map(|c| c.to_string()).collect();
        let toml_str = format!(
            "device_name = \"K90 test\"\nlog_level = \"debug\"\ngkey_codes = [{}]\n",
            codes.join(", ")
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_str.as_bytes()).unwrap();
        let config = K90Config::load(file.path()).unwrap();

        assert_eq!(config.device_name, "K90 test");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        let keymap = config.keymap().unwrap();
        assert_eq!(keymap.code(1), Some(59));
        assert_eq!(keymap.code(18), Some(76));
    }

    #[test]
    fn test_partial_table_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"gkey_codes = [183, 184, 185]\n").unwrap();
        assert!(K90Config::load(file.path()).is_err());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: K90Config = toml::from_str("").unwrap();
        assert_eq!(config.device_name, "Corsair K90 G-keys");
        assert!(config.gkey_codes.is_none());
    }
}
