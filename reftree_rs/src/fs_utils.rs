use std::fs;
use std::path::{Path, PathBuf};

/// Directories that never contain first-party Python sources.
const SKIP_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    ".venv",
    "node_modules",
    "site-packages",
    "venv",
];

/// Gather every `.py` file under `root`, depth-first, in a deterministic
/// case-insensitive order. Hidden entries and artifact directories are
/// skipped; unreadable directories contribute nothing instead of failing
/// the walk.
pub fn gather_python_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    gather_into(root, &mut files);
    files
}

fn gather_into(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut dir_entries: Vec<_> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && !SKIP_DIRS.contains(&name.as_ref())
        })
        .collect();

    dir_entries.sort_by(|a, b| {
        a.file_name()
            .to_string_lossy()
            .to_lowercase()
            .cmp(&b.file_name().to_string_lossy().to_lowercase())
    });

    for entry in dir_entries {
        let path = entry.path();
        if path.is_file() {
            if path.extension().is_some_and(|ext| ext == "py") {
                files.push(path);
            }
            continue;
        }
        if path.is_dir() {
            gather_into(&path, files);
        }
    }
}

/// Render a path with forward slashes for stable display and node ids.
pub fn display_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// True when both paths name the same file (canonicalized when possible).
pub fn same_file(a: &Path, b: &Path) -> bool {
    let ca = a.canonicalize().unwrap_or_else(|_| a.to_path_buf());
    let cb = b.canonicalize().unwrap_or_else(|_| b.to_path_buf());
    ca == cb
}
