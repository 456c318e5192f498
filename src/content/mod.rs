use std::io;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::content::front_matter::FrontMatterError;
use crate::render::RenderError;

pub mod content_file;
pub mod content_store;
pub mod front_matter;
pub mod normalizer;
pub mod page;
pub mod repository;

/// URL-safe identifier of a content item, taken from its file name.
#[derive(Debug, Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Slug(pub String);

impl Slug {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeLogEntry {
    pub date: NaiveDateTime,
    pub changes: Vec<String>,
}

/// One published piece of writing, fully validated and normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub slug: Slug,
    pub file_name: PathBuf,
    pub title: String,
    pub date: NaiveDateTime,
    pub published: bool,
    pub published_at: NaiveDateTime,
    pub author: String,
    pub tags: Vec<String>,
    pub category: String,
    pub thumbnail: String,
    pub description: Option<String>,
    pub change_log: Vec<ChangeLogEntry>,
    pub body: String,
    pub excerpt: Option<String>,
}

impl ContentItem {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content not found: {slug}")]
    NotFound { slug: String },

    #[error("error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("missing front matter block - file={}", file.display())]
    MissingFrontMatter { file: PathBuf },

    #[error(transparent)]
    InvalidFrontMatter(#[from] FrontMatterError),

    #[error("duplicate slug {slug}: {} and {}", first.display(), second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("error rendering {slug}: {source}")]
    Render {
        slug: String,
        #[source]
        source: RenderError,
    },
}

impl ContentError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ContentError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}
