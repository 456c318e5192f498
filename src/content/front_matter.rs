//! Splitting and shape-checking of the YAML block at the top of a content file.
//!
//! ```text
//! ---
//! title: Why I moved my blog to Rust
//! date: 2024-06-01
//! publishedAt: 2024-06-02
//! published: true
//! author: Jane Doe
//! tags: [rust, web]
//! category: engineering
//! changeLog:
//!   - date: 2024-06-02
//!     changes: [Initial release]
//! ---
//! Preview paragraph.
//!
//! <!-- more -->
//!
//! The rest of the post.
//! ```
//!
//! Validation stops at the first offending field and reports it together with
//! the file it came from.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::text_utils::parse_date_time;

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid front matter: field `{field}` {reason} - file={}", file.display())]
pub struct FrontMatterError {
    pub file: PathBuf,
    pub field: String,
    pub reason: String,
}

/// Front matter that passed shape checking. Dates are still text, they are
/// known to parse and the normalizer converts them.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: String,
    pub date: String,
    pub published_at: String,
    pub published: bool,
    pub author: String,
    pub tags: Vec<String>,
    pub category: String,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub change_log: Vec<RawChangeLogEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawChangeLogEntry {
    pub date: String,
    pub changes: Vec<String>,
}

/// A content file cut into its three parts.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitContent<'a> {
    pub front_matter: Option<&'a str>,
    pub body: String,
    pub excerpt: Option<String>,
}

/// Separates the `---` delimited block from the body, then cuts the excerpt
/// at the first line containing `excerpt_separator`.
///
/// The returned body keeps the excerpt text but not the separator line.
pub fn split_content<'a>(raw: &'a str, excerpt_separator: &str) -> SplitContent<'a> {
    let (front_matter, rest) = split_front_matter(raw);
    let (excerpt, body) = split_excerpt(rest, excerpt_separator);
    SplitContent {
        front_matter,
        body,
        excerpt,
    }
}

pub fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = text.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return (None, text);
    };
    if first.trim_end() != DELIMITER {
        return (None, text);
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let yaml = &text[start..offset];
            let body = &text[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    // Unterminated block, treat the whole file as body
    (None, text)
}

const FENCE_MARKERS: [&str; 2] = ["```", "~~~"];

/// Cuts `body` at the first line containing `separator`. Lines inside fenced
/// code blocks never count as the separator.
pub fn split_excerpt(body: &str, separator: &str) -> (Option<String>, String) {
    if separator.is_empty() {
        return (None, body.to_string());
    }

    let mut excerpt = String::new();
    let mut content = String::new();
    let mut found = false;
    let mut fence: Option<&str> = None;
    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_start();
        match fence {
            Some(marker) if trimmed.starts_with(marker) => fence = None,
            Some(_) => {}
            None => fence = FENCE_MARKERS.iter().copied().find(|m| trimmed.starts_with(m)),
        }
        if !found && fence.is_none() && line.contains(separator) {
            found = true;
            continue;
        }
        if !found {
            excerpt.push_str(line);
        }
        content.push_str(line);
    }

    if found {
        (Some(excerpt.trim().to_string()), content)
    } else {
        (None, content)
    }
}

pub fn validate(file: &Path, yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    let checker = ShapeChecker { file };

    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| checker.error("(document)", &format!("is not valid YAML: {}", e)))?;
    let map = match value {
        Value::Mapping(map) => map,
        _ => return Err(checker.error("(document)", "must be a mapping of fields")),
    };

    let title = checker.string(&map, "title")?;
    let date = checker.date(&map, "date")?;
    let published_at = checker.date(&map, "publishedAt")?;
    let published = checker.boolean(&map, "published")?;
    let author = checker.string(&map, "author")?;
    let tags = checker.label_list(&map, "tags")?;
    let category = checker.label(&map, "category")?;
    let change_log = checker.change_log(&map, "changeLog")?;
    let thumbnail = checker.optional_string(&map, "thumbnail")?;
    let description = checker.optional_string(&map, "description")?;

    Ok(FrontMatter {
        title,
        date,
        published_at,
        published,
        author,
        tags,
        category,
        thumbnail,
        description,
        change_log,
    })
}

struct ShapeChecker<'a> {
    file: &'a Path,
}

impl ShapeChecker<'_> {
    fn error(&self, field: &str, reason: &str) -> FrontMatterError {
        FrontMatterError {
            file: self.file.to_path_buf(),
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    fn required<'m>(&self, map: &'m Mapping, field: &str) -> Result<&'m Value, FrontMatterError> {
        match map.get(field) {
            None | Some(Value::Null) => Err(self.error(field, "is required")),
            Some(v) => Ok(v),
        }
    }

    fn string(&self, map: &Mapping, field: &str) -> Result<String, FrontMatterError> {
        match self.required(map, field)? {
            Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
            Value::String(_) => Err(self.error(field, "must not be empty")),
            _ => Err(self.error(field, "must be a string")),
        }
    }

    fn optional_string(&self, map: &Mapping, field: &str) -> Result<Option<String>, FrontMatterError> {
        match map.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.error(field, "must be a string")),
        }
    }

    fn boolean(&self, map: &Mapping, field: &str) -> Result<bool, FrontMatterError> {
        match self.required(map, field)? {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.error(field, "must be a boolean")),
        }
    }

    fn date(&self, map: &Mapping, field: &str) -> Result<String, FrontMatterError> {
        let value = self.required(map, field)?;
        self.date_value(value, field)
    }

    fn date_value(&self, value: &Value, field: &str) -> Result<String, FrontMatterError> {
        match value {
            Value::String(s) => match parse_date_time(s) {
                Ok(_) => Ok(s.clone()),
                Err(e) => Err(self.error(field, &format!("must be a valid date: {}", e))),
            },
            _ => Err(self.error(field, "must be a date string")),
        }
    }

    fn string_list(&self, map: &Mapping, field: &str) -> Result<Vec<String>, FrontMatterError> {
        let Value::Sequence(items) = self.required(map, field)? else {
            return Err(self.error(field, "must be an array"));
        };
        self.strings(items, field)
    }

    /// Tags and categories travel comma-joined in listing URLs.
    fn label(&self, map: &Mapping, field: &str) -> Result<String, FrontMatterError> {
        let value = self.string(map, field)?;
        self.comma_free(value, field)
    }

    fn label_list(&self, map: &Mapping, field: &str) -> Result<Vec<String>, FrontMatterError> {
        self.string_list(map, field)?
            .into_iter()
            .enumerate()
            .map(|(i, value)| self.comma_free(value, &format!("{}[{}]", field, i)))
            .collect()
    }

    fn comma_free(&self, value: String, field: &str) -> Result<String, FrontMatterError> {
        if value.contains(',') {
            return Err(self.error(field, "must not contain a comma"));
        }
        Ok(value)
    }

    fn strings(&self, items: &[Value], field: &str) -> Result<Vec<String>, FrontMatterError> {
        items.iter().enumerate()
            .map(|(i, item)| match item {
                Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
                _ => Err(self.error(&format!("{}[{}]", field, i), "must be a non-empty string")),
            })
            .collect()
    }

    fn change_log(&self, map: &Mapping, field: &str) -> Result<Vec<RawChangeLogEntry>, FrontMatterError> {
        let Value::Sequence(entries) = self.required(map, field)? else {
            return Err(self.error(field, "must be an array"));
        };
        if entries.is_empty() {
            return Err(self.error(field, "must have at least one entry"));
        }

        let mut change_log = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let entry_field = format!("{}[{}]", field, i);
            let Value::Mapping(entry) = entry else {
                return Err(self.error(&entry_field, "must be a mapping with date and changes"));
            };

            let date_field = format!("{}.date", entry_field);
            let date = match entry.get("date") {
                None | Some(Value::Null) => return Err(self.error(&date_field, "is required")),
                Some(v) => self.date_value(v, &date_field)?,
            };

            let changes_field = format!("{}.changes", entry_field);
            let changes = match entry.get("changes") {
                Some(Value::Sequence(items)) if !items.is_empty() => self.strings(items, &changes_field)?,
                Some(Value::Sequence(_)) => return Err(self.error(&changes_field, "must not be empty")),
                None | Some(Value::Null) => return Err(self.error(&changes_field, "is required")),
                Some(_) => return Err(self.error(&changes_field, "must be an array of strings")),
            };

            change_log.push(RawChangeLogEntry { date, changes });
        }
        Ok(change_log)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_data::{POST_DATA_MDX, VALID_FRONT_MATTER};

    use super::*;

    fn file() -> PathBuf {
        PathBuf::from("content/hello.mdx")
    }

    // Rewrites one top-level field, dropping its indented continuation lines
    fn rewrite(field: &str, replacement: Option<&str>) -> String {
        let key = format!("{}:", field);
        let mut out = vec![];
        let mut skipping = false;
        for line in VALID_FRONT_MATTER.lines() {
            if line.starts_with(&key) {
                skipping = true;
                if let Some(replacement) = replacement {
                    out.push(replacement);
                }
                continue;
            }
            if skipping && line.starts_with(' ') {
                continue;
            }
            skipping = false;
            out.push(line);
        }
        out.join("\n")
    }

    fn without(field: &str) -> String {
        rewrite(field, None)
    }

    fn replace(field: &str, line: &str) -> String {
        rewrite(field, Some(line))
    }

    #[test]
    fn test_split_content() {
        let split = split_content(POST_DATA_MDX, "<!-- more -->");
        assert!(split.front_matter.unwrap().contains("title: Shipping a blog in Rust"));
        assert_eq!(split.excerpt.as_deref(), Some("A short story about rewriting my site."));
        assert!(split.body.starts_with("\nA short story about rewriting my site.\n"));
        assert!(!split.body.contains("<!-- more -->"));
        assert!(split.body.contains("## Why"));
    }

    #[test]
    fn test_split_without_front_matter() {
        let (fm, body) = split_front_matter("# Just a title\n\nText\n");
        assert!(fm.is_none());
        assert_eq!(body, "# Just a title\n\nText\n");

        let (fm, body) = split_front_matter("---\ntitle: never closed\n");
        assert!(fm.is_none());
        assert_eq!(body, "---\ntitle: never closed\n");
    }

    #[test]
    fn test_split_without_excerpt() {
        let (excerpt, body) = split_excerpt("one\ntwo\n", "<!-- more -->");
        assert_eq!(excerpt, None);
        assert_eq!(body, "one\ntwo\n");
    }

    #[test]
    fn test_separator_inside_code_fence() {
        let body = "Intro\n\n```html\n<!-- more -->\n```\n\nStill intro\n\n<!-- more -->\n\nRest\n";
        let (excerpt, content) = split_excerpt(body, "<!-- more -->");
        let excerpt = excerpt.unwrap();
        assert!(excerpt.starts_with("Intro"));
        assert!(excerpt.contains("```html\n<!-- more -->\n```"));
        assert!(excerpt.ends_with("Still intro"));
        assert!(content.contains("```html\n<!-- more -->\n```"));
        assert_eq!(content.matches("<!-- more -->").count(), 1);

        let body = "~~~\n<!-- more -->\n~~~\nNo marker outside\n";
        let (excerpt, content) = split_excerpt(body, "<!-- more -->");
        assert!(excerpt.is_none());
        assert_eq!(content, body);
    }

    #[test]
    fn test_valid_front_matter() {
        let fm = validate(&file(), VALID_FRONT_MATTER).unwrap();
        assert_eq!(fm.title, "Shipping a blog in Rust");
        assert_eq!(fm.date, "2024-06-01");
        assert_eq!(fm.published_at, "2024-06-02 09:30");
        assert!(fm.published);
        assert_eq!(fm.author, "Jane Doe");
        assert_eq!(fm.tags, ["rust", "web", "rust"]);
        assert_eq!(fm.category, "engineering");
        assert_eq!(fm.thumbnail, None);
        assert_eq!(fm.change_log, vec![
            RawChangeLogEntry { date: "2024-06-02".to_string(), changes: vec!["Initial release".to_string()] },
            RawChangeLogEntry { date: "2024-07-10".to_string(), changes: vec!["Fixed typos".to_string(), "Added benchmarks".to_string()] },
        ]);
    }

    #[test]
    fn test_missing_fields_are_named() {
        for field in ["title", "date", "publishedAt", "published", "author", "tags", "category", "changeLog"] {
            let err = validate(&file(), &without(field)).unwrap_err();
            assert_eq!(err.field, field, "expected {} to be reported", field);
            assert_eq!(err.reason, "is required");
            assert_eq!(err.file, file());
        }
    }

    #[test]
    fn test_first_error_wins() {
        let yaml = "author: 3\npublished: maybe\n";
        let err = validate(&file(), yaml).unwrap_err();
        assert_eq!(err.field, "title");
    }

    #[test]
    fn test_published_must_be_boolean() {
        let err = validate(&file(), &replace("published", "published: \"true\"")).unwrap_err();
        assert_eq!(err.field, "published");
        assert_eq!(err.reason, "must be a boolean");
    }

    #[test]
    fn test_invalid_dates() {
        let err = validate(&file(), &replace("date", "date: 2024-13-01")).unwrap_err();
        assert_eq!(err.field, "date");

        let err = validate(&file(), &replace("publishedAt", "publishedAt: soon")).unwrap_err();
        assert_eq!(err.field, "publishedAt");
    }

    #[test]
    fn test_tags_must_be_array() {
        let err = validate(&file(), &replace("tags", "tags: rust")).unwrap_err();
        assert_eq!(err.field, "tags");
        assert_eq!(err.reason, "must be an array");

        let err = validate(&file(), &replace("tags", "tags: [rust, 42]")).unwrap_err();
        assert_eq!(err.field, "tags[1]");
    }

    #[test]
    fn test_labels_reject_commas() {
        let err = validate(&file(), &replace("tags", "tags: [rust, \"web, wasm\"]")).unwrap_err();
        assert_eq!(err.field, "tags[1]");
        assert_eq!(err.reason, "must not contain a comma");

        let err = validate(&file(), &replace("category", "category: \"design, ux\"")).unwrap_err();
        assert_eq!(err.field, "category");
        assert_eq!(err.reason, "must not contain a comma");

        let yaml = VALID_FRONT_MATTER.replace("[Initial release]", "[\"Fixed typos, links\"]");
        assert!(validate(&file(), &yaml).is_ok());
    }

    #[test]
    fn test_change_log_entries() {
        let yaml = VALID_FRONT_MATTER.replace("    changes: [Initial release]", "    changes: Initial release");
        let err = validate(&file(), &yaml).unwrap_err();
        assert_eq!(err.field, "changeLog[0].changes");

        let yaml = VALID_FRONT_MATTER.replace("  - date: 2024-07-10", "  - date: someday");
        let err = validate(&file(), &yaml).unwrap_err();
        assert_eq!(err.field, "changeLog[1].date");

        let err = validate(&file(), &replace("changeLog", "changeLog: []")).unwrap_err();
        assert_eq!(err.field, "changeLog");
    }

    #[test]
    fn test_not_a_mapping() {
        let err = validate(&file(), "- just\n- a list\n").unwrap_err();
        assert_eq!(err.field, "(document)");
        assert!(err.to_string().contains("content/hello.mdx"));
    }
}
