//! Sheet sizing configuration.
//!
//! ```toml
//! rows = 26
//! cols = 26
//! max_rows = 255
//! max_cols = 255
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, SheetError};

pub const DEFAULT_SIZE: usize = 26;
pub const DEFAULT_MAX: usize = 255;

const MAX_CONFIG_FILE_BYTES: u64 = 65_536;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    /// Rows a new sheet starts with.
    pub rows: usize,
    /// Columns a new sheet starts with.
    pub cols: usize,
    pub max_rows: usize,
    pub max_cols: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig {
            rows: DEFAULT_SIZE,
            cols: DEFAULT_SIZE,
            max_rows: DEFAULT_MAX,
            max_cols: DEFAULT_MAX,
        }
    }
}

impl SheetConfig {
    pub fn from_toml_str(content: &str) -> Result<SheetConfig> {
        let config: SheetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<SheetConfig> {
        let len = std::fs::metadata(path)?.len();
        if len > MAX_CONFIG_FILE_BYTES {
            return Err(SheetError::InvalidConfig(format!(
                "{} is too large ({} bytes, max {})",
                path.display(),
                len,
                MAX_CONFIG_FILE_BYTES
            )));
        }
        let content = std::fs::read_to_string(path)?;
        SheetConfig::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SheetError::InvalidConfig(
                "a sheet needs at least one row and one column".to_string(),
            ));
        }
        if self.rows > self.max_rows || self.cols > self.max_cols {
            return Err(SheetError::InvalidConfig(format!(
                "initial size {}x{} exceeds maximum {}x{}",
                self.rows, self.cols, self.max_rows, self.max_cols
            )));
        }
        Ok(())
    }
}
