//! Filesystem utilities.

use dotkit_types::{DotkitError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::fs;
use walkdir::WalkDir;

/// Expand path with tilde.
pub fn expand_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }

    path.to_path_buf()
}

/// Replace a file's contents atomically.
///
/// Content goes to a temporary file in the same directory which is then
/// renamed over the target, so readers never observe a torn file. Concurrent
/// writers are not serialized: the last rename wins.
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    fs::create_dir_all(&parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| DotkitError::Io(e.error))?;

    Ok(())
}

/// Copy a directory tree, creating the destination as needed.
///
/// Returns the number of files copied.
pub fn copy_dir_recursive(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<usize> {
    let src = src.as_ref();
    let dest = dest.as_ref();
    let mut copied = 0;

    fs::create_dir_all(dest)?;

    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| DotkitError::Io(e.into()))?;
        let relative = entry.path().strip_prefix(src)
            .map_err(|e| DotkitError::Bug(format!("walkdir escaped its root: {}", e)))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Remove empty directories from `start` upward, stopping at `stop`.
pub fn prune_empty_dirs(start: impl AsRef<Path>, stop: impl AsRef<Path>) -> Result<()> {
    let stop = stop.as_ref();
    let mut current = start.as_ref().to_path_buf();

    while current.starts_with(stop) && current != stop {
        let is_empty = match fs::read_dir(&current) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => break,
        };
        if !is_empty {
            break;
        }
        fs::remove_dir(&current)?;
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    Ok(())
}

/// Render a path relative to `base` with `/` separators.
pub fn relative_slash_path(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents_and_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_copy_dir_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join("scripts")).unwrap();
        fs::write(src.join("hooks.yaml"), "hooks: []").unwrap();
        fs::write(src.join("scripts").join("run.sh"), "echo hi").unwrap();

        let dest = temp_dir.path().join("dest");
        let copied = copy_dir_recursive(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert!(dest.join("scripts").join("run.sh").is_file());
    }

    #[test]
    fn test_prune_empty_dirs_stops_at_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("agents");
        let deep = root.join("ns").join("inner");
        fs::create_dir_all(&deep).unwrap();

        prune_empty_dirs(&deep, &root).unwrap();

        assert!(!root.join("ns").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_relative_slash_path() {
        let base = Path::new("/tmp/root");
        let path = base.join("agents").join("a.md");
        assert_eq!(relative_slash_path(&path, base).as_deref(), Some("agents/a.md"));
        assert_eq!(relative_slash_path(Path::new("/elsewhere"), base), None);
    }
}
