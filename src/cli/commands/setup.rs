//! Config file setup.

use anyhow::bail;
use std::path::Path;

use crate::config::{self, Config, ConfigError};

/// Write a default config file (to `path`, else the user config directory)
pub fn cmd_init(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => config::config_path().ok_or(ConfigError::NoConfigDir)?,
    };
    if target.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }

    config::save_to(&Config::default(), &target)?;
    println!("Wrote default config to {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake").join("config.toml");

        cmd_init(Some(&path), false).unwrap();

        let loaded = config::load_from(&path);
        assert!(loaded.import.verify_checksum);
        assert_eq!(loaded.import.max_parallel, 1);
        assert!(loaded.library.root.is_none());
    }

    #[test]
    fn test_init_refuses_to_clobber_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[import]\nmax_parallel = 8\n").unwrap();

        assert!(cmd_init(Some(&path), false).is_err());
        assert_eq!(config::load_from(&path).import.max_parallel, 8);

        cmd_init(Some(&path), true).unwrap();
        assert_eq!(config::load_from(&path).import.max_parallel, 1);
    }
}
