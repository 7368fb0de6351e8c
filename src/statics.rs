//! Static file collection.
//!
//! Pages reference files that are not rendered — images, downloadable
//! documents, arbitrary extras. Each is registered on the session as a
//! [`StaticAsset`] with a display name and a source path; collection
//! deploys every asset under the site root, namespaced by kind
//! (`files/`, `images/`, `downloads/`), as symlinks by default or copies
//! on request.
//!
//! Destinations must be unique. With `handle_duplicate` a colliding asset
//! is placed under a short content-addressed subdirectory instead of
//! failing.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use maud::{Markup, html};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::builder::PageContext;
use crate::fsio::{self, Mode};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("{0} either does not exist or is not a file")]
    NotAFile(PathBuf),
    #[error("source and destination must have the same extension: {src} vs {dest}")]
    ExtensionMismatch { src: String, dest: String },
    #[error("'{0}' is already in use; change the source name or pass an explicit destination")]
    DuplicateDestination(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Namespace an asset deploys under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticKind {
    File,
    Image,
    Download,
}

impl StaticKind {
    pub fn dir(self) -> &'static str {
        match self {
            StaticKind::File => "files",
            StaticKind::Image => "images",
            StaticKind::Download => "downloads",
        }
    }
}

/// One registered static file.
#[derive(Debug, Clone)]
pub struct StaticAsset {
    pub name: String,
    pub source: PathBuf,
    pub kind: StaticKind,
    destination: String,
}

impl StaticAsset {
    /// Destination relative to the kind directory.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Deployment path relative to the site root.
    pub fn site_path(&self) -> String {
        format!("{}/{}", self.kind.dir(), self.destination)
    }

    /// An `<img>` snippet linking this asset relative to the page being
    /// rendered.
    pub fn html_image(&self, ctx: &PageContext<'_>) -> Markup {
        let url = ctx.asset_url(self);
        html! { img src=(url) class="img-fluid" alt=(self.name); }
    }

    /// An `<a download>` snippet linking this asset relative to the page
    /// being rendered.
    pub fn html_download(&self, ctx: &PageContext<'_>) -> Markup {
        let url = ctx.asset_url(self);
        html! { a href=(url) download { (self.name) } }
    }
}

/// How [`AssetSet::collect`] deploys assets.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Replace existing files at their destinations.
    pub overwrite: bool,
    /// Copy instead of symlinking. Symlinks need server support; copies
    /// always work.
    pub copy_locally: bool,
    pub file_mode: Mode,
    pub dir_mode: Mode,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            copy_locally: false,
            file_mode: Mode::FILE,
            dir_mode: Mode::DIR,
        }
    }
}

/// All static assets registered on one session.
#[derive(Debug, Default)]
pub struct AssetSet {
    assets: Vec<StaticAsset>,
    taken: BTreeSet<String>,
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assets(&self) -> &[StaticAsset] {
        &self.assets
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Register one asset.
    ///
    /// Destination rules: an explicit destination carrying an extension
    /// must match the source extension and is used verbatim; an
    /// extension-less destination is a directory joined with the source
    /// basename; no destination means the source basename. A single
    /// leading `/` is stripped.
    pub fn add(
        &mut self,
        kind: StaticKind,
        name: &str,
        source: &Path,
        dest: Option<&str>,
        handle_duplicate: bool,
    ) -> Result<StaticAsset, AssetError> {
        if !source.is_file() {
            return Err(AssetError::NotAFile(source.to_path_buf()));
        }
        let basename = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut filename = match dest {
            None => basename,
            Some(d) => {
                let d = d.strip_prefix('/').unwrap_or(d);
                if Path::new(d).extension().is_some() {
                    if Path::new(d).extension() != source.extension() {
                        return Err(AssetError::ExtensionMismatch {
                            src: source.display().to_string(),
                            dest: d.to_string(),
                        });
                    }
                    d.to_string()
                } else if d.is_empty() {
                    basename
                } else {
                    format!("{}/{}", d.trim_end_matches('/'), basename)
                }
            }
        };

        let mut site_path = format!("{}/{}", kind.dir(), filename);
        if self.taken.contains(&site_path) {
            if !handle_duplicate {
                return Err(AssetError::DuplicateDestination(filename));
            }
            // Salted with the registration index so the same source can be
            // registered more than once.
            let salt = format!("{}:{}", source.display(), self.assets.len());
            filename = format!("{}/{}", short_digest(&salt), filename);
            site_path = format!("{}/{}", kind.dir(), filename);
        }
        self.taken.insert(site_path);

        let asset = StaticAsset {
            name: name.to_string(),
            source: source.to_path_buf(),
            kind,
            destination: filename,
        };
        self.assets.push(asset.clone());
        Ok(asset)
    }

    /// Deploy every registered asset under `site_root`.
    pub fn collect(&self, site_root: &Path, opts: &CollectOptions) -> Result<(), AssetError> {
        for asset in &self.assets {
            let dst = site_root.join(asset.site_path());
            if let Some(parent) = dst.parent() {
                fsio::ensure_dir(parent, opts.dir_mode)?;
            }
            if dst.exists() || dst.is_symlink() {
                if !opts.overwrite {
                    continue;
                }
                std::fs::remove_file(&dst)?;
            }
            if opts.copy_locally {
                fsio::copy_file(&asset.source, &dst)?;
                fsio::set_mode(&dst, opts.file_mode)?;
            } else {
                fsio::symlink_file(&asset.source, &dst)?;
            }
        }
        Ok(())
    }
}

/// Eight hex characters of SHA-256, used to give duplicate destinations a
/// unique subdirectory.
fn short_digest(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest
        .iter()
        .take(4)
        .map(|b| format!("{b:02x}"))
        .collect()
}
