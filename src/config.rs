//! Site configuration.
//!
//! Handles loading and validating `site.toml`. Config files are sparse —
//! every field has a default, so a file overrides just the values it names.
//! Unknown keys are rejected to catch typos early.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! dest = "build"            # Build destination directory
//!
//! [site]
//! title = "My Site"         # Exposed to templates as site metadata
//! description = "..."
//! author = "..."
//!
//! # stylesheet = "style.css"  # Custom stylesheet (default: embedded one)
//! # favicon = "icon.ico"      # Browser tab icon, copied to static/
//! # assets = "assets/"        # Script/asset bundle, copied into static/
//!
//! [build]
//! overwrite = true          # Replace pre-existing rendered files
//! dir_mode = "755"          # Octal mode for created directories
//! html_mode = "644"         # Octal mode for rendered files
//! static_mode = "644"       # Octal mode for files under static/
//!
//! [safety]
//! check_urls = true         # Reject routes with URL-unsafe characters
//! check_paths = false       # Reject routes with filesystem-hostile
//!                           # characters (includes '.', so float-typed
//!                           # placeholders need this off)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fsio::Mode;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Build destination directory.
    pub dest: PathBuf,
    /// Custom stylesheet copied to `static/stylesheet.css`; the embedded
    /// default is written when unset.
    pub stylesheet: Option<PathBuf>,
    /// Browser tab icon copied to `static/favicon.ico`.
    pub favicon: Option<PathBuf>,
    /// Directory of scripts/extras copied recursively into `static/`.
    pub assets: Option<PathBuf>,
    /// Site metadata exposed to templates.
    pub site: SiteSection,
    /// Build replay policy.
    pub build: BuildSection,
    /// Route character screens.
    pub safety: SafetySection,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            dest: PathBuf::from("build"),
            stylesheet: None,
            favicon: None,
            assets: None,
            site: SiteSection::default(),
            build: BuildSection::default(),
            safety: SafetySection::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    pub overwrite: bool,
    pub dir_mode: Mode,
    pub html_mode: Mode,
    pub static_mode: Mode,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            overwrite: true,
            dir_mode: Mode::DIR,
            html_mode: Mode::FILE,
            static_mode: Mode::FILE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafetySection {
    pub check_urls: bool,
    pub check_paths: bool,
}

impl Default for SafetySection {
    fn default() -> Self {
        Self {
            check_urls: true,
            check_paths: false,
        }
    }
}

impl SiteConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: SiteConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate referenced paths exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(stylesheet) = &self.stylesheet {
            if !stylesheet.is_file() {
                return Err(ConfigError::Validation(format!(
                    "stylesheet does not exist: {}",
                    stylesheet.display()
                )));
            }
        }
        if let Some(favicon) = &self.favicon {
            if !favicon.is_file() {
                return Err(ConfigError::Validation(format!(
                    "favicon does not exist: {}",
                    favicon.display()
                )));
            }
        }
        if let Some(assets) = &self.assets {
            if !assets.is_dir() {
                return Err(ConfigError::Validation(format!(
                    "assets directory does not exist: {}",
                    assets.display()
                )));
            }
        }
        Ok(())
    }

    /// The documented stock config, as printed by `flatsite gen-config`.
    pub fn stock_toml() -> &'static str {
        STOCK_CONFIG
    }
}

const STOCK_CONFIG: &str = r#"# flatsite site configuration
# All options are optional - defaults shown below.

# Build destination directory.
dest = "build"

# Custom stylesheet copied to static/stylesheet.css.
# The embedded default stylesheet is used when unset.
# stylesheet = "style.css"

# Browser tab icon, copied to static/favicon.ico.
# favicon = "icon.ico"

# Directory of scripts and extras, copied recursively into static/.
# assets = "assets/"

[site]
# Metadata exposed to templates.
# title = "My Site"
# description = "What this site is about"
# author = "You"

[build]
# Replace pre-existing rendered files and static assets.
overwrite = true
# Octal permission modes, as strings.
dir_mode = "755"
html_mode = "644"
static_mode = "644"

[safety]
# Reject generated routes containing URL-unsafe characters.
check_urls = true
# Reject generated routes containing filesystem-hostile characters.
# The screen includes '.', which every float-typed placeholder value
# would trip, so this defaults off.
check_paths = false
"#;
