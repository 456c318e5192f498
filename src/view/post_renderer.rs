use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::aggregation::{category_url, tag_url};
use crate::content::ContentItem;
use crate::render::{HeadingOutline, NodeKind, RenderedDocument};
use crate::text_utils::{format_date_time, format_long_date};
use crate::view::nav_state::{NavLink, NavState};

#[derive(ramhorns::Content)]
struct ViewTag<'a> {
    tag: &'a str,
    url: String,
}

#[derive(ramhorns::Content)]
struct TocEntry<'a> {
    depth: u8,
    id: &'a str,
    text: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewText<'a> {
    text: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewChange<'a> {
    date: String,
    changes: Vec<ViewText<'a>>,
}

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    nav: Vec<NavLink>,
    menu_open: bool,
    slug: &'a str,
    author: &'a str,
    tags: Vec<ViewTag<'a>>,
    category: &'a str,
    category_url: String,
    thumbnail: &'a str,
    description: &'a str,
    date: &'a str,
    time: &'a str,
    long_date: String,
    published_at: String,
    draft: bool,
    toc: Vec<TocEntry<'a>>,
    has_toc: bool,
    change_log: Vec<ViewChange<'a>>,
    has_math: bool,
    has_diagrams: bool,
    post_title: &'a str,
    post_content: &'a str,
}

pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl PostRenderer<'_> {
    pub fn new(view_tpl_src: &str) -> io::Result<PostRenderer> {
        let template = match Template::new(view_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing post view template: {}", e)));
            }
        };

        Ok(PostRenderer {
            template,
        })
    }

    /// `body_html` is the document already passed through the component table.
    pub fn render(&self, item: &ContentItem, doc: &RenderedDocument, body_html: &str, nav: &NavState) -> String {
        let tags: Vec<ViewTag> = item.tags.iter().map(|t| ViewTag { tag: t.as_str(), url: tag_url(t) }).collect();
        let (date, time) = format_date_time(&item.date);
        let toc: Vec<TocEntry> = table_of_contents(&doc.headings).map(|h| TocEntry {
            depth: h.depth,
            id: h.id.as_str(),
            text: h.text.as_str(),
        }).collect();
        let change_log = item.change_log.iter().map(|entry| ViewChange {
            date: format_long_date(&entry.date),
            changes: entry.changes.iter().map(|c| ViewText { text: c.as_str() }).collect(),
        }).collect();

        self.template.render(&ViewItem {
            nav: nav.links(),
            menu_open: nav.menu_open,
            slug: item.slug.as_str(),
            author: item.author.as_str(),
            tags,
            category: item.category.as_str(),
            category_url: category_url(&item.category),
            thumbnail: item.thumbnail.as_str(),
            description: item.description.as_deref().unwrap_or_default(),
            date: date.as_str(),
            time: time.as_str(),
            long_date: format_long_date(&item.date),
            published_at: format_long_date(&item.published_at),
            draft: !item.published,
            has_toc: !toc.is_empty(),
            toc,
            change_log,
            has_math: doc.has_kind(NodeKind::Math),
            has_diagrams: doc.has_kind(NodeKind::Diagram),
            post_title: item.title.as_str(),
            post_content: body_html,
        })
    }
}

/// Headings shown in the sidebar outline: levels 2 and 3.
fn table_of_contents(headings: &[HeadingOutline]) -> impl Iterator<Item = &HeadingOutline> {
    headings.iter().filter(|h| h.depth == 2 || h.depth == 3)
}

#[cfg(test)]
mod tests {
    use crate::render::HeadingOutline;
    use crate::test_data::item;
    use crate::view::nav_state::Tab;

    use super::*;

    #[test]
    fn render_view() {
        let template_src = r##"
TITLE=[{{{post_title}}}]
AUTHOR=[{{author}}]
DATE=[{{date}}]
TIME=[{{time}}]
LONG=[{{long_date}}]
TAGS=[{{#tags}}({{tag}} {{url}}){{/tags}}]
TOC=[{{#toc}}({{depth}}#{{id}}){{/toc}}]
NAV=[{{#nav}}{{#active}}{{label}}{{/active}}{{/nav}}]
POST_CONTENT=[{{{post_content}}}]
"##;
        let post_renderer = PostRenderer::new(template_src).unwrap();
        let mut content = item("post-id", "<post-title>", "2024-01-02 03:04:05", "engineering", &["<rust>", "programming"]);
        content.author = "<Jane>".to_string();
        let doc = RenderedDocument {
            nodes: vec![],
            headings: vec![
                HeadingOutline { depth: 1, id: "top".to_string(), text: "Top".to_string() },
                HeadingOutline { depth: 2, id: "why".to_string(), text: "Why".to_string() },
            ],
        };

        let res = post_renderer.render(&content, &doc, "<post-content>", &NavState::new(Tab::Blog));
        assert_eq!(res, r##"
TITLE=[<post-title>]
AUTHOR=[&lt;Jane&gt;]
DATE=[2024-01-02]
TIME=[03:04:05]
LONG=[January 2, 2024]
TAGS=[(&lt;rust&gt; /blog?tags=%3Crust%3E)(programming /blog?tags=programming)]
TOC=[(2#why)]
NAV=[Blog]
POST_CONTENT=[<post-content>]"##);
    }
}
