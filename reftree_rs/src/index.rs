//! Per-build source entity index.
//!
//! Each tree build owns exactly one `FileIndex`; nothing here is shared
//! across builds. A file is read and parsed at most once per build, and a
//! file that cannot be read or parsed contributes zero entities instead of
//! failing the traversal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::imports;
use crate::parse;
use crate::types::{CodeEntity, EntityKind, ImportStatement};

#[derive(Default)]
struct FileRecord {
    entities: Vec<CodeEntity>,
    imports: Vec<ImportStatement>,
}

/// Memoized per-file parse results for the lifetime of one build.
#[derive(Default)]
pub struct FileIndex {
    cache: HashMap<PathBuf, FileRecord>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached results. Called at the start of every build.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Number of files parsed so far in this build.
    pub fn files_indexed(&self) -> usize {
        self.cache.len()
    }

    /// Top-level entities of `path`, parsed on first access.
    pub fn entities(&mut self, path: &Path) -> &[CodeEntity] {
        &self.record(path).entities
    }

    /// Import statements of `path`, extracted alongside the entity parse.
    pub fn imports(&mut self, path: &Path) -> &[ImportStatement] {
        &self.record(path).imports
    }

    /// First entity in `path` matching both name and kind.
    pub fn find(&mut self, path: &Path, name: &str, kind: EntityKind) -> Option<CodeEntity> {
        self.entities(path)
            .iter()
            .find(|e| e.name == name && e.kind == kind)
            .cloned()
    }

    /// Names of all entities in `path`, in declaration order.
    pub fn entity_names(&mut self, path: &Path) -> Vec<String> {
        self.entities(path).iter().map(|e| e.name.clone()).collect()
    }

    fn record(&mut self, path: &Path) -> &FileRecord {
        let key = path.to_path_buf();
        if !self.cache.contains_key(&key) {
            let record = load_record(path);
            self.cache.insert(key.clone(), record);
        }
        self.cache.get(&key).expect("record inserted above")
    }
}

fn load_record(path: &Path) -> FileRecord {
    let Ok(source) = std::fs::read_to_string(path) else {
        return FileRecord::default();
    };
    let file_path = crate::fs_utils::display_path(path);
    match parse::parse_source(&source, &file_path) {
        Ok((entities, tree)) => FileRecord {
            entities,
            imports: imports::collect_imports(tree.root_node(), &source),
        },
        Err(_) => FileRecord::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    #[test]
    fn unreadable_file_degrades_to_empty() {
        let mut index = FileIndex::new();
        assert!(index.entities(Path::new("/nonexistent/nope.py")).is_empty());
    }

    #[test]
    fn broken_file_degrades_to_empty() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let path = write(tmp.path(), "broken.py", "def broken(:\n");
        let mut index = FileIndex::new();
        assert!(index.entities(&path).is_empty());
        assert!(index.imports(&path).is_empty());
    }

    #[test]
    fn results_are_cached_per_build() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let path = write(tmp.path(), "mod.py", "def one():\n    pass\n");
        let mut index = FileIndex::new();
        assert_eq!(index.entities(&path).len(), 1);

        // On-disk change is invisible until the cache is cleared.
        write(tmp.path(), "mod.py", "def one():\n    pass\n\ndef two():\n    pass\n");
        assert_eq!(index.entities(&path).len(), 1);
        index.clear();
        assert_eq!(index.entities(&path).len(), 2);
    }

    #[test]
    fn find_matches_name_and_kind() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let path = write(
            tmp.path(),
            "mod.py",
            "def job():\n    pass\n\nclass Job:\n    pass\n",
        );
        let mut index = FileIndex::new();
        assert!(index.find(&path, "job", EntityKind::Function).is_some());
        assert!(index.find(&path, "Job", EntityKind::Class).is_some());
        assert!(index.find(&path, "job", EntityKind::Class).is_none());
        assert!(index.find(&path, "missing", EntityKind::Function).is_none());
    }
}
