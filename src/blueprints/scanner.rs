//! Blueprint directory scanner.
//!
//! [`BlueprintScanner::scan`] walks the blueprint root lazily and yields one
//! [`BlueprintFile`] per usable `*.yaml` file. Files that are hidden, empty,
//! unparseable or of an unsupported version are skipped with a log line; a
//! `metadata` block that cannot be decoded aborts the scan.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use idp_engine::blueprints::BlueprintScanner;
//!
//! let scanner = BlueprintScanner::new("/blueprints");
//! for blueprint in scanner.scan() {
//!     let blueprint = blueprint.unwrap();
//!     println!("{} {}", blueprint.path, blueprint.hash);
//! }
//! ```

use crate::blueprints::SUPPORTED_VERSION;
use crate::blueprints::hashing::digest;
use crate::blueprints::metadata::BlueprintMetadata;
use crate::error::BlueprintError;
use log::{debug, warn};
use serde::Serialize;
use serde_yaml::Value;
use std::collections::VecDeque;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

const BLUEPRINT_EXTENSION: &str = "yaml";

/// A scanned blueprint file, ready for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlueprintFile {
    /// Path relative to the blueprint root, `/`-separated.
    pub path: String,
    pub version: u64,
    /// SHA-512 hex digest of the raw file bytes.
    pub hash: String,
    /// Modification time in seconds since the epoch.
    pub last_m: i64,
    pub meta: Option<BlueprintMetadata>,
}

/// Walks a blueprint root directory.
#[derive(Debug, Clone)]
pub struct BlueprintScanner {
    root: PathBuf,
}

impl BlueprintScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily scan the root directory.
    pub fn scan(&self) -> Scan {
        Scan {
            root: self.root.clone(),
            pending_dirs: vec![self.root.clone()],
            pending_files: VecDeque::new(),
        }
    }

    /// Scan eagerly, stopping at the first fatal error.
    pub fn find(&self) -> Result<Vec<BlueprintFile>, BlueprintError> {
        self.scan().collect()
    }

    /// Scan and serialize the results as a JSON array.
    pub fn find_as_json(&self) -> Result<serde_json::Value, BlueprintError> {
        Ok(serde_json::to_value(self.find()?)?)
    }
}

/// Iterator returned by [`BlueprintScanner::scan`].
#[derive(Debug)]
pub struct Scan {
    root: PathBuf,
    pending_dirs: Vec<PathBuf>,
    pending_files: VecDeque<PathBuf>,
}

impl Iterator for Scan {
    type Item = Result<BlueprintFile, BlueprintError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(file) = self.pending_files.pop_front() {
                match inspect(&self.root, &file) {
                    Ok(Some(blueprint)) => return Some(Ok(blueprint)),
                    Ok(None) => continue,
                    Err(error) => {
                        // A fatal error ends the scan.
                        self.pending_dirs.clear();
                        self.pending_files.clear();
                        return Some(Err(error));
                    }
                }
            }

            let dir = self.pending_dirs.pop()?;
            self.expand(&dir);
        }
    }
}

impl Scan {
    fn expand(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) => {
                warn!("Cannot read blueprint directory {}: {}", dir.display(), error);
                return;
            }
        };

        let mut paths: Vec<(PathBuf, fs::FileType)> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let file_type = entry.file_type().ok()?;
                Some((entry.path(), file_type))
            })
            .collect();
        paths.sort_by(|a, b| a.0.cmp(&b.0));

        let mut subdirs = Vec::new();
        for (path, file_type) in paths {
            if file_type.is_dir() {
                if !is_hidden(&path) {
                    subdirs.push(path);
                }
            } else if file_type.is_symlink() && path.is_dir() {
                debug!("Not following directory symlink {}", path.display());
            } else if path.extension().is_some_and(|ext| ext == BLUEPRINT_EXTENSION) {
                self.pending_files.push_back(path);
            }
        }

        // Pushed in reverse so subdirectories are visited in sorted order.
        self.pending_dirs.extend(subdirs.into_iter().rev());
    }
}

/// Path of `path` relative to `root` as a `/`-separated string.
pub fn relative_blueprint_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

fn inspect(root: &Path, file: &Path) -> Result<Option<BlueprintFile>, BlueprintError> {
    let Some(path) = relative_blueprint_path(root, file) else {
        return Ok(None);
    };
    if path.split('/').any(|segment| segment.starts_with('.')) {
        debug!("Skipping hidden blueprint {}", path);
        return Ok(None);
    }

    let bytes = fs::read(file)?;
    let document: Value = match serde_yaml::from_slice(&bytes) {
        Ok(document) => document,
        Err(error) => {
            warn!("Failed to parse blueprint {}: {}", path, error);
            return Ok(None);
        }
    };

    let mapping = match document {
        Value::Null => return Ok(None),
        Value::Mapping(mapping) if mapping.is_empty() => return Ok(None),
        Value::Mapping(mapping) => mapping,
        _ => {
            warn!("Blueprint {} is not a mapping, skipping", path);
            return Ok(None);
        }
    };

    let version = match mapping.get("version") {
        None => SUPPORTED_VERSION,
        Some(value) => match value.as_u64() {
            Some(version) => version,
            None => {
                warn!("Blueprint {} has a non-numeric version, skipping", path);
                return Ok(None);
            }
        },
    };
    if version != SUPPORTED_VERSION {
        warn!("Blueprint {} has unsupported version {}, skipping", path, version);
        return Ok(None);
    }

    let meta = match mapping.get("metadata") {
        None | Some(Value::Null) => None,
        Some(Value::Mapping(block)) if block.is_empty() => None,
        Some(block) => Some(
            serde_yaml::from_value::<BlueprintMetadata>(block.clone()).map_err(|source| {
                BlueprintError::Metadata {
                    path: path.clone(),
                    source,
                }
            })?,
        ),
    };

    let last_m = fs::metadata(file)?
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default();

    Ok(Some(BlueprintFile {
        path,
        version,
        hash: digest(&bytes),
        last_m,
        meta,
    }))
}
