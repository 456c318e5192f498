use std::path::PathBuf;

use anyhow::{Context, Result};
use spdlog::info;

use folio::config::{Config, LogLevel};
use folio::content::content_store::ContentStore;
use folio::content::page::Page;
use folio::content::repository::ContentRepository;
use folio::content::ContentError;
use folio::logger::configure_console_logger;
use folio::post_processor::item_format;
use folio::query::Visibility;
use folio::render::RenderPipeline;

use crate::config::open_config;
use crate::SiteArgs;

/// Number of posts and pages that loaded and rendered.
pub struct CheckReport {
    pub posts: usize,
    pub pages: usize,
}

/// Drafts included, stops at the first authoring error.
pub fn check_site(config: &Config) -> Result<CheckReport, ContentError> {
    let repository = ContentRepository::new(ContentStore::new(config.paths.content_dir.clone()), Visibility::All)
        .with_excerpt_separator(config.site.excerpt_separator());
    let pipeline = RenderPipeline::new(config.site.code_theme());

    let items = repository.load_all()?;
    for item in items.iter() {
        info!("Checking post {}", item.slug);
        // Listings render the excerpt and description on their own
        let sources = [Some(&item.body), item.excerpt.as_ref(), item.description.as_ref()];
        for src in sources.into_iter().flatten() {
            pipeline.render(src, item_format(item))
                .map_err(|source| ContentError::Render { slug: item.slug.to_string(), source })?;
        }
    }

    let pages = ContentStore::new(config.paths.pages_dir.clone());
    let page_links = if pages.root_dir.is_dir() { pages.list()? } else { vec![] };
    for link in page_links.iter() {
        let page = Page::load(&pages, link.slug.as_str())?;
        info!("Checking page {}", page.name);
        pipeline.render(&page.body, page.format)
            .map_err(|source| ContentError::Render { slug: page.name.to_string(), source })?;
    }

    Ok(CheckReport {
        posts: items.len(),
        pages: page_links.len(),
    })
}

pub fn check_cmd(args: SiteArgs) -> Result<()> {
    configure_console_logger(LogLevel::Warn)?;
    let config = open_config(args.config_path.map(PathBuf::from))?;

    let report = check_site(&config).context("Content check failed")?;
    println!("{} posts and {} pages are fine", report.posts, report.pages);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use folio::config::parse_config;

    use super::*;

    fn post(title: &str, body: &str, extra: &str) -> String {
        format!(r#"---
title: {title}
date: 2024-05-01
publishedAt: 2024-05-01
published: false
author: Jane Doe
tags: [notes]
category: journal
changeLog:
  - date: 2024-05-01
    changes: [Initial release]
{extra}---
{body}"#)
    }

    fn site(posts: &[(&str, String)]) -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        for sub in ["template", "content", "pages", "public"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
        }
        for (slug, content) in posts {
            fs::write(dir.path().join("content").join(format!("{}.mdx", slug)), content).unwrap();
        }
        fs::write(dir.path().join("pages").join("about.md"), "---\ntitle: About\n---\nHello.\n").unwrap();

        let cfg = format!(r#"
[personal]
name = "Jane Doe"
activity_start_year = 2008
blog_start_date = 2020-03-01

[paths]
template_dir = "{root}/template"
public_dir = "{root}/public"
content_dir = "{root}/content"
pages_dir = "{root}/pages"

[site]
mode = "development"
base_url = "https://example.com"
page_size = 5
render_cache_enabled = false

[server]
address = "127.0.0.1"
port = 8001
"#, root = dir.path().display());

        let config = parse_config(&cfg).unwrap();
        (dir, config)
    }

    #[test]
    fn test_valid_site() {
        let (_dir, config) = site(&[
            ("first", post("First", "Intro\n\n<!-- more -->\n\nRest\n", "")),
            ("second", post("Second", "Just a body.\n", "description: A *short* one\n")),
        ]);
        let report = check_site(&config).unwrap();
        assert_eq!(report.posts, 2);
        assert_eq!(report.pages, 1);
    }

    #[test]
    fn test_broken_excerpt_is_reported() {
        let body = "<Callout>\n\nIntro\n\n<!-- more -->\n\nRest\n\n</Callout>\n";
        let (_dir, config) = site(&[("wrapped", post("Wrapped", body, ""))]);

        match check_site(&config) {
            Err(ContentError::Render { slug, .. }) => assert_eq!(slug, "wrapped"),
            Err(e) => panic!("expected a render error, got {}", e),
            Ok(_) => panic!("expected a render error"),
        }
    }

    #[test]
    fn test_broken_description_is_reported() {
        let (_dir, config) = site(&[
            ("described", post("Described", "Fine body.\n", "description: \"<Callout>unclosed\"\n")),
        ]);
        assert!(matches!(check_site(&config), Err(ContentError::Render { .. })));
    }
}
