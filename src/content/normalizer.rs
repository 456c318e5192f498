use std::path::Path;

use chrono::NaiveDateTime;

use crate::content::front_matter::{FrontMatter, FrontMatterError};
use crate::content::{ChangeLogEntry, ContentItem, Slug};
use crate::text_utils::parse_date_time;

pub fn default_thumbnail(category: &str) -> String {
    format!("{}-category", category)
}

/// Turns validated front matter and body into a `ContentItem`.
pub fn normalize(
    slug: Slug,
    file: &Path,
    front_matter: FrontMatter,
    body: String,
    excerpt: Option<String>,
) -> Result<ContentItem, FrontMatterError> {
    let to_date = |value: &str, field: &str| -> Result<NaiveDateTime, FrontMatterError> {
        parse_date_time(value).map_err(|reason| FrontMatterError {
            file: file.to_path_buf(),
            field: field.to_string(),
            reason,
        })
    };

    let date = to_date(&front_matter.date, "date")?;
    let published_at = to_date(&front_matter.published_at, "publishedAt")?;

    let mut change_log = Vec::with_capacity(front_matter.change_log.len());
    for (i, entry) in front_matter.change_log.into_iter().enumerate() {
        change_log.push(ChangeLogEntry {
            date: to_date(&entry.date, &format!("changeLog[{}].date", i))?,
            changes: entry.changes,
        });
    }

    let thumbnail = front_matter.thumbnail
        .unwrap_or_else(|| default_thumbnail(&front_matter.category));

    Ok(ContentItem {
        slug,
        file_name: file.to_path_buf(),
        title: front_matter.title,
        date,
        published: front_matter.published,
        published_at,
        author: front_matter.author,
        tags: front_matter.tags,
        category: front_matter.category,
        thumbnail,
        description: front_matter.description,
        change_log,
        body,
        excerpt,
    })
}
