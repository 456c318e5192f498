use std::fs;
use std::path::{Path, PathBuf};

use crate::content::{ContentError, Slug};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Markdown,
    Mdx,
}

/// Raw text of one content file, before any parsing.
#[derive(Debug, Clone)]
pub struct ContentFile {
    pub slug: Slug,
    pub file_path: PathBuf,
    pub format: ContentFormat,
    pub raw_content: String,
}

impl ContentFile {
    pub fn from_file(slug: Slug, file_path: PathBuf) -> Result<ContentFile, ContentError> {
        let format = match Self::guess_type(&file_path) {
            None => return Err(ContentError::NotFound { slug: slug.0 }),
            Some(format) => format,
        };

        let raw_content = fs::read_to_string(&file_path)
            .map_err(|e| ContentError::io(&file_path, e))?;

        Ok(ContentFile {
            slug,
            file_path,
            format,
            raw_content,
        })
    }

    pub fn guess_type(file_name: &Path) -> Option<ContentFormat> {
        match file_name.extension().and_then(|e| e.to_str()) {
            Some("md") => Some(ContentFormat::Markdown),
            Some("mdx") => Some(ContentFormat::Mdx),
            _ => None,
        }
    }
}
