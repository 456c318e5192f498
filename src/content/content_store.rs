use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use spdlog::debug;

use crate::content::content_file::ContentFile;
use crate::content::{ContentError, Slug};

#[derive(Debug, Clone, PartialEq)]
pub struct ContentLink {
    pub slug: Slug,
    pub path: PathBuf,
}

/// Reads content files from a root directory.
///
/// Two layouts are recognised: `root/<slug>.md[x]` and
/// `root/<slug>/<index_base_name>.md[x]` for posts shipping their own assets.
#[derive(Debug, Clone)]
pub struct ContentStore {
    pub root_dir: PathBuf,
    pub index_base_name: String,
}

impl ContentStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        ContentStore {
            root_dir: root_dir.into(),
            index_base_name: "index".to_string(),
        }
    }

    /// Lists every content file, sorted by slug.
    pub fn list(&self) -> Result<Vec<ContentLink>, ContentError> {
        let mut links = self.retrieve_files()?;
        links.extend(self.retrieve_dirs()?);
        links.sort_by(|a, b| a.slug.cmp(&b.slug));

        let mut seen: HashMap<&Slug, &PathBuf> = HashMap::new();
        for link in links.iter() {
            if let Some(first) = seen.insert(&link.slug, &link.path) {
                return Err(ContentError::DuplicateSlug {
                    slug: link.slug.0.clone(),
                    first: first.clone(),
                    second: link.path.clone(),
                });
            }
        }

        Ok(links)
    }

    pub fn read_all(&self) -> Result<Vec<ContentFile>, ContentError> {
        let links = self.list()?;
        debug!("Reading {} content files from {}", links.len(), self.root_dir.display());
        links.into_iter()
            .map(|link| ContentFile::from_file(link.slug, link.path))
            .collect()
    }

    pub fn read(&self, slug: &str) -> Result<ContentFile, ContentError> {
        if slug.is_empty() || slug.contains('/') || slug.contains("..") {
            return Err(ContentError::NotFound { slug: slug.to_string() });
        }

        match self.find(slug) {
            Some(path) => ContentFile::from_file(Slug(slug.to_string()), path),
            None => Err(ContentError::NotFound { slug: slug.to_string() }),
        }
    }

    fn find(&self, slug: &str) -> Option<PathBuf> {
        for ext in ["mdx", "md"] {
            let file = self.root_dir.join(format!("{}.{}", slug, ext));
            if file.is_file() {
                return Some(file);
            }
            let index = self.root_dir.join(slug).join(format!("{}.{}", self.index_base_name, ext));
            if index.is_file() {
                return Some(index);
            }
        }
        None
    }

    fn retrieve_files(&self) -> Result<Vec<ContentLink>, ContentError> {
        let mut links = vec![];
        let entries = fs::read_dir(&self.root_dir).map_err(|e| ContentError::io(&self.root_dir, e))?;
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else { continue };
            if !file_type.is_file() {
                continue;
            }
            let path = entry.path();
            if ContentFile::guess_type(&path).is_none() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                links.push(ContentLink {
                    slug: Slug(stem.to_string()),
                    path,
                });
            }
        }
        Ok(links)
    }

    fn retrieve_dirs(&self) -> Result<Vec<ContentLink>, ContentError> {
        let mut links = vec![];
        let entries = fs::read_dir(&self.root_dir).map_err(|e| ContentError::io(&self.root_dir, e))?;
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else { continue };
            if !file_type.is_dir() {
                continue;
            }
            let dir = entry.path();
            let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(|n| n.to_string()) else {
                continue;
            };
            if let Some(path) = self.index_file(&dir) {
                links.push(ContentLink {
                    slug: Slug(name),
                    path,
                });
            }
        }
        Ok(links)
    }

    fn index_file(&self, dir: &Path) -> Option<PathBuf> {
        ["mdx", "md"].iter()
            .map(|ext| dir.join(format!("{}.{}", self.index_base_name, ext)))
            .find(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_list_files_and_dirs() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b-second.mdx", "b");
        write(tmp.path(), "a-first.md", "a");
        write(tmp.path(), "c-dir/index.mdx", "c");
        write(tmp.path(), "c-dir/cover.png", "png");
        write(tmp.path(), "notes.txt", "ignored");
        write(tmp.path(), "empty-dir/readme.txt", "ignored");

        let store = ContentStore::new(tmp.path());
        let slugs: Vec<String> = store.list().unwrap().into_iter().map(|l| l.slug.0).collect();
        assert_eq!(slugs, ["a-first", "b-second", "c-dir"]);

        let files = store.read_all().unwrap();
        let raw: Vec<&str> = files.iter().map(|f| f.raw_content.as_str()).collect();
        assert_eq!(raw, ["a", "b", "c"]);
    }

    #[test]
    fn test_read_by_slug() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "hello.mdx", "hello world");
        write(tmp.path(), "with-assets/index.md", "assets");

        let store = ContentStore::new(tmp.path());
        assert_eq!(store.read("hello").unwrap().raw_content, "hello world");
        assert_eq!(store.read("with-assets").unwrap().raw_content, "assets");
    }

    #[test]
    fn test_read_missing_slug() {
        let tmp = TempDir::new().unwrap();
        let store = ContentStore::new(tmp.path());
        let err = store.read("missing").unwrap_err();
        assert!(err.is_not_found());
        assert!(store.read("../etc/passwd").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_slug() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "twice.md", "one");
        write(tmp.path(), "twice.mdx", "two");
        let store = ContentStore::new(tmp.path());
        assert!(matches!(store.list(), Err(ContentError::DuplicateSlug { .. })));
    }

    #[test]
    fn test_empty_root() {
        let tmp = TempDir::new().unwrap();
        let store = ContentStore::new(tmp.path());
        assert!(store.read_all().unwrap().is_empty());
    }
}
