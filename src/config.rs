use anyhow::Context;
use directories::ProjectDirs;
use sheetcalc_core::SheetConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `config.toml` in the platform config directory.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sheetcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

/// Load the sheet configuration. An explicit path must exist; the user
/// config file is optional and defaults apply without it.
pub(crate) fn load(explicit: Option<&Path>) -> anyhow::Result<SheetConfig> {
    if let Some(path) = explicit {
        return SheetConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    match user_config_path() {
        Some(path) if path.is_file() => {
            debug!(path = %path.display(), "loading user config");
            SheetConfig::from_file(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))
        }
        _ => Ok(SheetConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_config_path_is_deterministic() {
        assert_eq!(user_config_path(), user_config_path());
        if let Some(path) = user_config_path() {
            assert!(path.ends_with("config.toml"));
        }
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load(Some(Path::new("/nonexistent/sheetcalc/config.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to load config"));
    }
}
