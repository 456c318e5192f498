use serde_yaml::Value;

use crate::content::content_file::{ContentFile, ContentFormat};
use crate::content::content_store::ContentStore;
use crate::content::front_matter::{split_front_matter, FrontMatterError};
use crate::content::{ContentError, Slug};

/// A standalone page such as the biography or the work history.
///
/// Front matter is optional here and only `title` is read from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub name: Slug,
    pub title: String,
    pub format: ContentFormat,
    pub body: String,
}

impl Page {
    pub fn load(store: &ContentStore, name: &str) -> Result<Page, ContentError> {
        let file = store.read(name)?;
        Self::from_file(file)
    }

    pub fn from_file(file: ContentFile) -> Result<Page, ContentError> {
        let (front_matter, body) = split_front_matter(&file.raw_content);
        let title = match front_matter {
            Some(yaml) => Self::title_from_yaml(&file, yaml)?,
            None => None,
        };

        Ok(Page {
            title: title.unwrap_or_else(|| Self::title_from_name(file.slug.as_str())),
            name: file.slug,
            format: file.format,
            body: body.to_string(),
        })
    }

    fn title_from_yaml(file: &ContentFile, yaml: &str) -> Result<Option<String>, ContentError> {
        let invalid = |field: &str, reason: String| FrontMatterError {
            file: file.file_path.clone(),
            field: field.to_string(),
            reason,
        };

        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| invalid("(document)", format!("is not valid YAML: {}", e)))?;
        match value.get("title") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(invalid("title", "must be a string".to_string()).into()),
        }
    }

    // about-me -> About me
    fn title_from_name(name: &str) -> String {
        let words = name.replace(['-', '_'], " ");
        let mut chars = words.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn file(slug: &str, raw: &str) -> ContentFile {
        ContentFile {
            slug: Slug(slug.to_string()),
            file_path: PathBuf::from(format!("pages/{}.mdx", slug)),
            format: ContentFormat::Mdx,
            raw_content: raw.to_string(),
        }
    }

    #[test]
    fn test_page_with_title() {
        let page = Page::from_file(file("about", "---\ntitle: About me\n---\nHello!\n")).unwrap();
        assert_eq!(page.title, "About me");
        assert_eq!(page.body, "Hello!\n");
    }

    #[test]
    fn test_page_without_front_matter() {
        let page = Page::from_file(file("work-history", "## 2020 - today\n")).unwrap();
        assert_eq!(page.title, "Work history");
        assert_eq!(page.body, "## 2020 - today\n");
    }

    #[test]
    fn test_page_with_invalid_title() {
        let err = Page::from_file(file("about", "---\ntitle: [a, b]\n---\n")).unwrap_err();
        assert!(matches!(err, ContentError::InvalidFrontMatter(ref e) if e.field == "title"));
    }
}
