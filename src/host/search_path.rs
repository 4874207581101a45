//==================================================
// File: host/search_path.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: File lookup along a list of search roots
// Objective: Resolve relative script names to existing files with caching
//==================================================

use std::collections::HashMap;
use std::path::{Path, PathBuf};

//==================================================
// Section 1.0 - Search Path
//==================================================
// Roots are tried in order; the first existing file wins.

#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
    cache: HashMap<String, PathBuf>,
}

impl SearchPath {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
            cache: HashMap::new(),
        }
    }

    pub fn add_root(&mut self, root: impl AsRef<Path>) {
        self.roots.push(root.as_ref().to_path_buf());
        self.cache.clear();
    }

    pub fn resolve(&mut self, name: &str) -> Option<PathBuf> {
        if let Some(path) = self.cache.get(name) {
            if path.is_file() {
                return Some(path.clone());
            }
            self.cache.remove(name);
        }

        let candidate = Path::new(name);
        let resolved = if candidate.is_absolute() {
            candidate.is_file().then(|| candidate.to_path_buf())
        } else {
            self.roots
                .iter()
                .map(|root| root.join(name))
                .find(|path| path.is_file())
        }?;
        self.cache.insert(name.to_string(), resolved.clone());
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn first_root_with_the_file_wins() {
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        fs::write(second.path().join("lib.scm"), "(define x 1)").expect("write");
        let mut search = SearchPath::new([first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(search.resolve("lib.scm"), Some(second.path().join("lib.scm")));

        fs::write(first.path().join("lib.scm"), "(define x 2)").expect("write");
        // Cached until the cached file disappears.
        assert_eq!(search.resolve("lib.scm"), Some(second.path().join("lib.scm")));
        fs::remove_file(second.path().join("lib.scm")).expect("remove");
        assert_eq!(search.resolve("lib.scm"), Some(first.path().join("lib.scm")));
    }

    #[test]
    fn missing_files_resolve_to_none() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut search = SearchPath::new([root.path().to_path_buf()]);
        assert_eq!(search.resolve("nope.scm"), None);
    }
}

//==================================================
// End of file
//==================================================
