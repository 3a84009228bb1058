//! Game objects of every JSON file below a data directory.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::decode::RecordDecoder;
use crate::error::{Result, TilecovError};
use crate::filter::{Filter, is_excluded};
use crate::fs::FileSystem;
use crate::record::GameObject;
use crate::store::{Arity, RecordStore};

/// Relative paths that never hold game objects.
const BLACKLIST: [&str; 1] = ["monsters/monster_goals.json"];

/// Decoded game objects keyed by path relative to the tree root.
#[derive(Debug, Default)]
pub struct JsonFileTree {
    root: PathBuf,
    files: BTreeMap<PathBuf, Vec<GameObject>>,
    skipped: Vec<(PathBuf, TilecovError)>,
}

impl JsonFileTree {
    /// Decode the JSON files below `root`.
    ///
    /// With a `target`, only files whose parent directory, relative to `root`,
    /// equals `target` are read. Files that fail to decode are logged and kept
    /// in [`JsonFileTree::skipped`].
    pub fn load<F: FileSystem + ?Sized>(fs: &F, root: &Path, target: Option<&Path>) -> Result<Self> {
        if !fs.is_dir(root) {
            return Err(TilecovError::DirectoryNotFound(root.to_path_buf()));
        }
        let store = RecordStore::<GameObject>::create()
            .arity(Arity::List)
            .with_decoder(RecordDecoder::declared()?);

        let mut tree = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };
        for path in fs.list_files(root)? {
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            if !should_include(relative, target) {
                continue;
            }
            let relative = relative.to_path_buf();
            match store.execute_path(fs, &path) {
                Ok(decoded) => {
                    let objects = decoded.map(|decoded| decoded.into_vec()).unwrap_or_default();
                    debug!("{}: {} objects", relative.display(), objects.len());
                    tree.files.insert(relative, objects);
                }
                Err(err) => {
                    warn!("skipping {}: {err}", path.display());
                    tree.skipped.push((relative, err));
                }
            }
        }
        Ok(tree)
    }

    /// Directory the tree was read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files in path order with their objects.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &[GameObject])> {
        self.files
            .iter()
            .map(|(path, objects)| (path.as_path(), objects.as_slice()))
    }

    /// Files that could not be decoded, with the reason.
    pub fn skipped(&self) -> &[(PathBuf, TilecovError)] {
        &self.skipped
    }

    /// Non-excluded objects of every file whose relative path starts with `prefix`.
    pub fn objects_under(&self, prefix: &Path, filters: &[Filter]) -> Vec<&GameObject> {
        self.files
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .flat_map(|(_, objects)| objects.iter())
            .filter(|object| !is_excluded(filters, *object))
            .collect()
    }

    /// Ids of all non-excluded objects.
    pub fn object_ids(&self, filters: &[Filter]) -> HashSet<String> {
        self.files
            .values()
            .flatten()
            .filter(|object| !is_excluded(filters, *object))
            .flat_map(|object| object.ids().iter().cloned())
            .collect()
    }

    /// Number of decoded files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file was decoded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn should_include(relative: &Path, target: Option<&Path>) -> bool {
    if relative.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return false;
    }
    if BLACKLIST.iter().any(|entry| relative == Path::new(entry)) {
        return false;
    }
    match target {
        Some(target) => relative.parent() == Some(target),
        None => true,
    }
}
