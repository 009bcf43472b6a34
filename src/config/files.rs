//! File validation and distinct display names.
//!
//! Every input path is validated, resolved to its canonical form and
//! deduplicated. Files that share a base name are given a distinct name by
//! prepending parent directory names until no two files collide, so that
//! diagnostics can tell `prod/config.json` from `dev/config.json`.

use crate::error::ErrorList;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on path segments collected per file and on naming passes.
pub const MAX_ITERATIONS: usize = 100;

/// Reasons a path is rejected.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{{file}} required")]
    FileRequired,

    #[error("{{directory}} required")]
    DirectoryRequired,

    #[error("invalid, no such file [{0}]")]
    NoSuchFile(String),

    #[error("invalid, no such directory [{0}]")]
    NoSuchDirectory(String),

    #[error("invalid, permission denied [{0}]")]
    PermissionDenied(String),

    #[error("invalid, file is a directory [{0}]")]
    IsDirectory(String),

    #[error("invalid, is not a directory [{0}]")]
    NotDirectory(String),

    #[error("invalid file [{0}]")]
    NoFileName(String),

    #[error("parent directory {0} does not exist")]
    ParentMissing(String),

    #[error("invalid, {source} [{path}]")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    fn from_io(err: io::Error, path: &Path, missing: fn(String) -> FileError) -> Self {
        let shown = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => missing(shown),
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied(shown),
            _ => FileError::Io {
                path: shown,
                source: err,
            },
        }
    }
}

/// A validated input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDetail {
    /// Path as supplied by the caller.
    pub name: String,
    /// Canonical absolute path, used as the deduplication key.
    pub full_path: PathBuf,
    /// Shortest collision-free display name.
    pub distinct_name: String,
    /// Ancestor directory names not yet prepended, closest first.
    pub path_components: VecDeque<String>,
}

impl FileDetail {
    /// Validate `path` and build its detail with the base name as distinct name.
    ///
    /// Display names come from the path as supplied, made absolute without
    /// following symlinks; only `full_path` is canonical.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();
        let full_path = validate_file(path)?;
        let name = path.display().to_string();
        let shown = lexical_absolute(path).map_err(|e| FileError::Io {
            path: name.clone(),
            source: e,
        })?;

        let Some(base) = shown.file_name() else {
            return Err(FileError::NoFileName(name));
        };
        let distinct_name = base.to_string_lossy().into_owned();

        let path_components = shown
            .parent()
            .map(|dir| {
                dir.ancestors()
                    .filter_map(Path::file_name)
                    .take(MAX_ITERATIONS)
                    .map(|segment| segment.to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            name,
            full_path,
            distinct_name,
            path_components,
        })
    }

    /// Prepend the next ancestor directory to the distinct name.
    ///
    /// Returns `false` once every ancestor has been used.
    fn widen(&mut self) -> bool {
        match self.path_components.pop_front() {
            Some(segment) => {
                self.distinct_name = Path::new(&segment)
                    .join(&self.distinct_name)
                    .to_string_lossy()
                    .into_owned();
                true
            }
            None => false,
        }
    }
}

/// Absolute form of `path` with `.` and `..` removed lexically.
fn lexical_absolute(path: &Path) -> io::Result<PathBuf> {
    let mut clean = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other),
        }
    }
    Ok(clean)
}

/// Validate that `path` exists and is a regular file; returns its canonical path.
pub fn validate_file(path: impl AsRef<Path>) -> Result<PathBuf, FileError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(FileError::FileRequired);
    }

    let metadata =
        std::fs::metadata(path).map_err(|e| FileError::from_io(e, path, FileError::NoSuchFile))?;
    if metadata.is_dir() {
        return Err(FileError::IsDirectory(path.display().to_string()));
    }

    dunce::canonicalize(path).map_err(|e| FileError::from_io(e, path, FileError::NoSuchFile))
}

/// Validate that `path` exists and is a directory; returns its canonical path.
pub fn validate_dir(path: impl AsRef<Path>) -> Result<PathBuf, FileError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(FileError::DirectoryRequired);
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| FileError::from_io(e, path, FileError::NoSuchDirectory))?;
    if !metadata.is_dir() {
        return Err(FileError::NotDirectory(path.display().to_string()));
    }

    dunce::canonicalize(path).map_err(|e| FileError::from_io(e, path, FileError::NoSuchDirectory))
}

/// Validate a file that may not exist yet, as long as its parent directory does.
///
/// Returns the absolute path the file has or would have.
pub fn validate_file_or_parent_dir(path: impl AsRef<Path>) -> Result<PathBuf, FileError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(FileError::FileRequired);
    }

    let absolute = std::path::absolute(path).map_err(|e| FileError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let parent = absolute.parent().unwrap_or(Path::new("/"));
    if !parent.is_dir() {
        return Err(FileError::ParentMissing(parent.display().to_string()));
    }

    match std::fs::metadata(&absolute) {
        Ok(metadata) if metadata.is_dir() => {
            Err(FileError::IsDirectory(path.display().to_string()))
        }
        Ok(_) => Ok(absolute),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(absolute),
        Err(e) => Err(FileError::from_io(e, path, FileError::NoSuchFile)),
    }
}

/// Validate, deduplicate and name a list of files.
///
/// Rejected and duplicate paths are recorded in `errors` and skipped. The
/// returned details keep the order in which paths were supplied.
pub fn distinct_filenames<P: AsRef<Path>>(filenames: &[P], errors: &mut ErrorList) -> Vec<FileDetail> {
    let mut files: Vec<FileDetail> = Vec::new();
    let mut by_full_path: HashMap<PathBuf, usize> = HashMap::new();

    for filename in filenames {
        let file = match FileDetail::resolve(filename) {
            Ok(file) => file,
            Err(e) => {
                errors.add(e.to_string());
                continue;
            }
        };

        if let Some(&first) = by_full_path.get(&file.full_path) {
            errors.add(format!(
                "file is duplicate of {}, skipping [{}]",
                files[first].name, file.name
            ));
            continue;
        }

        by_full_path.insert(file.full_path.clone(), files.len());
        files.push(file);
    }

    assign_distinct_names(&mut files);
    files
}

/// Widen colliding names one ancestor at a time until every name is unique.
///
/// A file that runs out of ancestors keeps its colliding name.
fn assign_distinct_names(files: &mut [FileDetail]) {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, file) in files.iter().enumerate() {
        groups.entry(file.distinct_name.clone()).or_default().push(i);
    }

    for pass in 0..MAX_ITERATIONS {
        let colliding: Vec<String> = groups
            .iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(name, _)| name.clone())
            .collect();
        if colliding.is_empty() {
            debug!("Distinct names settled after {} passes", pass);
            return;
        }

        let mut widened = false;
        for name in colliding {
            let Some(members) = groups.remove(&name) else {
                continue;
            };

            let mut exhausted = Vec::new();
            for i in members {
                if files[i].widen() {
                    widened = true;
                    groups
                        .entry(files[i].distinct_name.clone())
                        .or_default()
                        .push(i);
                } else {
                    exhausted.push(i);
                }
            }
            if !exhausted.is_empty() {
                groups.entry(name).or_default().extend(exhausted);
            }
        }

        if !widened {
            break;
        }
    }

    for (name, members) in groups.iter().filter(|(_, m)| m.len() > 1) {
        warn!("{} files share the name {}", members.len(), name);
    }
}
