use crate::infrastructure::serde_json_adapter::EXPORT_FILE_NAME;
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage_key: String,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_export_file_name")]
    pub export_file_name: String,
}

fn default_export_file_name() -> String {
    EXPORT_FILE_NAME.to_string()
}

impl Config {
    /// Directory the history store lives in: the configured one, or the
    /// platform data directory.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = self.data_dir.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            return Ok(dir.clone());
        }
        ProjectDirs::from("", "", "url-editor")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| anyhow!("no home directory; pass --data-dir"))
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let bytes: Vec<u8> = if let Some(p) = path {
        std::fs::read(p).with_context(|| format!("reading config: {}", p.display()))?
    } else {
        include_bytes!("../../config/default.yml").to_vec()
    };

    let config: Config = serde_yaml::from_slice(&bytes)?;
    if config.storage_key.trim().is_empty() {
        return Err(anyhow!("config: storage_key must not be empty"));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_uses_history_key() {
        let cfg = load_config(None).expect("default config");
        assert_eq!(cfg.storage_key, "urlHistory");
        assert_eq!(cfg.export_file_name, "url-editor-data.json");
    }

    #[test]
    fn configured_data_dir_wins() {
        let cfg = Config {
            storage_key: "k".to_string(),
            data_dir: Some(PathBuf::from("/tmp/somewhere")),
            export_file_name: "x.json".to_string(),
        };
        assert_eq!(cfg.resolve_data_dir().expect("dir"), PathBuf::from("/tmp/somewhere"));
    }

    #[test]
    fn file_config_is_loaded_and_checked() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cfg.yml");

        std::fs::write(&path, "storage_key: other\nexport_file_name: out.json\n").expect("write");
        let cfg = load_config(Some(&path)).expect("load");
        assert_eq!(cfg.storage_key, "other");
        assert_eq!(cfg.data_dir, None);

        std::fs::write(&path, "storage_key: '  '\nexport_file_name: out.json\n").expect("write");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn export_file_name_defaults_when_omitted() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cfg.yml");

        std::fs::write(&path, "storage_key: other\n").expect("write");
        let cfg = load_config(Some(&path)).expect("load");
        assert_eq!(cfg.export_file_name, EXPORT_FILE_NAME);
    }
}
