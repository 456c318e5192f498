use spdlog::{debug, error};

use crate::content::content_file::ContentFile;
use crate::content::content_store::ContentStore;
use crate::content::front_matter::{split_content, validate};
use crate::content::normalizer::normalize;
use crate::content::{ContentError, ContentItem};
use crate::query::Visibility;

pub const DEFAULT_EXCERPT_SEPARATOR: &str = "<!-- more -->";

/// Parses and validates one content file into a `ContentItem`.
pub fn parse_content_file(file: ContentFile, excerpt_separator: &str) -> Result<ContentItem, ContentError> {
    let split = split_content(&file.raw_content, excerpt_separator);
    let Some(yaml) = split.front_matter else {
        return Err(ContentError::MissingFrontMatter { file: file.file_path });
    };

    let front_matter = validate(&file.file_path, yaml)?;
    let item = normalize(file.slug.clone(), &file.file_path, front_matter, split.body, split.excerpt)?;
    Ok(item)
}

/// The content collection as seen by one environment.
///
/// Everything is read from disk on every call; memoizing is up to the caller.
#[derive(Debug, Clone)]
pub struct ContentRepository {
    pub store: ContentStore,
    pub excerpt_separator: String,
    pub visibility: Visibility,
}

impl ContentRepository {
    pub fn new(store: ContentStore, visibility: Visibility) -> Self {
        ContentRepository {
            store,
            excerpt_separator: DEFAULT_EXCERPT_SEPARATOR.to_string(),
            visibility,
        }
    }

    pub fn with_excerpt_separator(mut self, separator: &str) -> Self {
        self.excerpt_separator = separator.to_string();
        self
    }

    /// Loads every visible item. The first invalid file aborts the load.
    pub fn load_all(&self) -> Result<Vec<ContentItem>, ContentError> {
        let files = self.store.read_all()?;
        let mut items = Vec::with_capacity(files.len());
        for file in files {
            let path = file.file_path.clone();
            let item = parse_content_file(file, &self.excerpt_separator).inspect_err(|e| {
                error!("Invalid content file {}: {}", path.display(), e);
            })?;
            if self.visibility.allows(&item) {
                items.push(item);
            }
        }
        debug!("Loaded {} visible content items", items.len());
        Ok(items)
    }

    /// Loads one item. Items hidden by the visibility policy are not found.
    pub fn load(&self, slug: &str) -> Result<ContentItem, ContentError> {
        let file = self.store.read(slug)?;
        let item = parse_content_file(file, &self.excerpt_separator)?;
        if !self.visibility.allows(&item) {
            return Err(ContentError::NotFound { slug: slug.to_string() });
        }
        Ok(item)
    }
}
