use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, Utc};
use ntex::web;
use ntex::web::Error;
use ntex_files::NamedFile;
use ramhorns::Template;
use spdlog::{debug, error, info};
use thiserror::Error;

use crate::aggregation::{category_index, most_popular, tag_index, AggregateEntry};
use crate::config::Config;
use crate::content::content_file::{ContentFile, ContentFormat};
use crate::content::content_store::ContentStore;
use crate::content::page::Page;
use crate::content::repository::ContentRepository;
use crate::content::{ContentError, ContentItem};
use crate::content_cache::{ContentCache, Expire};
use crate::integrations::github::{Project, ProjectPage};
use crate::integrations::ExternalError;
use crate::paginator::Paginator;
use crate::query::{latest, ContentQuery};
use crate::query_string::ListingParams;
use crate::render::{RenderPipeline, RenderedDocument};
use crate::text_utils::format_long_date;
use crate::view::components::ComponentTable;
use crate::view::list_renderer::{ListEntry, ListRenderer};
use crate::view::nav_state::{NavLink, NavState};
use crate::view::post_renderer::PostRenderer;

const POPULAR_CATEGORY_COUNT: i64 = 5;

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("template error: {0}")]
    Template(#[from] io::Error),
}

impl PageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PageError::Content(e) if e.is_not_found())
    }
}

#[derive(ramhorns::Content)]
struct IndexPage<'a> {
    nav: Vec<NavLink>,
    menu_open: bool,
    name: &'a str,
    years_developing: i64,
    post_count: i64,
    days_since_started: i64,
    latest: Vec<LatestPost<'a>>,
    categories: Vec<ViewCategory<'a>>,
}

#[derive(ramhorns::Content)]
struct LatestPost<'a> {
    title: &'a str,
    link: String,
    long_date: String,
    thumbnail: &'a str,
    summary: String,
}

#[derive(ramhorns::Content)]
struct ViewCategory<'a> {
    label: &'a str,
    count: usize,
    url: &'a str,
}

#[derive(ramhorns::Content)]
struct StaticPage<'a> {
    nav: Vec<NavLink>,
    menu_open: bool,
    name: &'a str,
    title: &'a str,
    page_content: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewProject<'a> {
    name: &'a str,
    description: &'a str,
    url: &'a str,
    homepage_url: &'a str,
    has_homepage: bool,
    language: &'a str,
    stars: u32,
    forks: u32,
}

#[derive(ramhorns::Content)]
struct ViewProjectList<'a> {
    available: bool,
    items: Vec<ViewProject<'a>>,
    empty: bool,
    has_more: bool,
    cursor: &'a str,
}

#[derive(ramhorns::Content)]
struct ProjectsPage<'a> {
    nav: Vec<NavLink>,
    menu_open: bool,
    repos: ViewProjectList<'a>,
    gists: ViewProjectList<'a>,
}

#[derive(ramhorns::Content)]
struct MessagePage<'a> {
    nav: Vec<NavLink>,
    menu_open: bool,
    message: &'a str,
    retry_url: &'a str,
}

pub fn read_template(tpl_dir: &Path, file_name: &str) -> io::Result<String> {
    let full_path = tpl_dir.join(file_name);
    std::fs::read_to_string(&full_path)
        .map_err(|e| io::Error::new(e.kind(), format!("Error loading template {}: {}", full_path.display(), e)))
}

fn parse_template<'a>(src: &'a str, name: &str) -> io::Result<Template<'a>> {
    Template::new(src)
        .map_err(|e| io::Error::new(ErrorKind::InvalidInput, format!("Error parsing {} template: {}", name, e)))
}

/// Serves a file from `root_dir`, refusing anything that walks out of it.
pub fn get_file(root_dir: &Path, file: &str) -> Result<NamedFile, Error> {
    if file.contains("..") || file.starts_with('/') {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = root_dir.join(file);
    Ok(NamedFile::open(file_path)?)
}

/// Format of an item, from the extension of its file.
pub fn item_format(item: &ContentItem) -> ContentFormat {
    ContentFile::guess_type(&item.file_name).unwrap_or(ContentFormat::Markdown)
}

/// Everything a request needs to assemble a page. Shared by all workers.
pub struct SiteContext {
    pub config: Config,
    pub repository: ContentRepository,
    pub pages: ContentStore,
    pub pipeline: RenderPipeline,
    pub components: ComponentTable,
    pub documents: ContentCache<RenderedDocument>,
}

impl SiteContext {
    pub fn new(config: Config) -> Self {
        let repository = ContentRepository::new(
            ContentStore::new(config.paths.content_dir.clone()),
            config.site.mode.visibility(),
        ).with_excerpt_separator(config.site.excerpt_separator());
        let pages = ContentStore::new(config.paths.pages_dir.clone());
        let pipeline = RenderPipeline::new(config.site.code_theme());
        let documents = ContentCache::enabled(config.site.caching());

        SiteContext {
            config,
            repository,
            pages,
            pipeline,
            components: ComponentTable::default(),
            documents,
        }
    }

    fn template_dir(&self) -> &PathBuf {
        &self.config.paths.template_dir
    }

    /// Rendered body of a post, memoized when caching is on.
    pub fn post_document(&self, item: &ContentItem) -> Result<Arc<RenderedDocument>, ContentError> {
        self.documents.get_post_or(item.slug.as_str(), Expire::Never, || {
            info!("Rendering post {}", item.slug);
            self.pipeline.render(&item.body, item_format(item))
        }).map_err(|source| {
            error!("Error rendering post {}: {}", item.slug, source);
            ContentError::Render { slug: item.slug.to_string(), source }
        })
    }

    /// Excerpt (or description) of a post as HTML, empty if it has neither.
    pub fn summary_html(&self, item: &ContentItem) -> Result<String, ContentError> {
        let src = match (&item.excerpt, &item.description) {
            (Some(excerpt), _) => excerpt.as_str(),
            (None, Some(description)) => description.as_str(),
            (None, None) => return Ok(String::new()),
        };
        let doc = self.pipeline.render(src, item_format(item))
            .map_err(|source| ContentError::Render { slug: item.slug.to_string(), source })?;
        Ok(self.components.render_document(&doc))
    }

    pub fn category_view(&self) -> Result<Vec<AggregateEntry>, ContentError> {
        let items = self.repository.load_all()?;
        Ok(most_popular(&category_index(&items), 0))
    }

    pub fn tag_view(&self) -> Result<Vec<AggregateEntry>, ContentError> {
        let items = self.repository.load_all()?;
        Ok(most_popular(&tag_index(&items), 0))
    }

    pub fn render_index(&self, nav: &NavState) -> Result<String, PageError> {
        let index_tpl_src = read_template(self.template_dir(), "index.tpl")?;
        let index_tpl = parse_template(&index_tpl_src, "index")?;

        let items = self.repository.load_all()?;
        let post_count = items.len() as i64;
        let categories = most_popular(&category_index(&items), POPULAR_CATEGORY_COUNT);
        let latest_items = latest(items, self.config.site.home_post_count() as i64);

        let mut latest_posts = Vec::with_capacity(latest_items.len());
        for item in latest_items.iter() {
            latest_posts.push(LatestPost {
                title: item.title.as_str(),
                link: format!("/blog/{}", item.slug),
                long_date: format_long_date(&item.date),
                thumbnail: item.thumbnail.as_str(),
                summary: self.summary_html(item)?,
            });
        }

        let personal = &self.config.personal;
        let today = Utc::now().date_naive();
        let rendered = index_tpl.render(&IndexPage {
            nav: nav.links(),
            menu_open: nav.menu_open,
            name: personal.name.as_str(),
            years_developing: (today.year() - personal.activity_start_year) as i64,
            post_count,
            days_since_started: personal.blog_start_date.days_until(today),
            latest: latest_posts,
            categories: categories.iter().map(|c| ViewCategory {
                label: c.label.as_str(),
                count: c.count,
                url: c.url.as_str(),
            }).collect(),
        });

        Ok(rendered)
    }

    pub fn render_list(&self, params: &ListingParams, nav: &NavState) -> Result<String, PageError> {
        let items = self.repository.load_all()?;
        let tags = most_popular(&tag_index(&items), 0);
        let categories = most_popular(&category_index(&items), 0);

        let items = ContentQuery::new()
            .any_tag(&params.tags)
            .any_category(&params.categories)
            .sort(params.sort_key, params.sort_order)
            .run(items);
        debug!("Listing {} items for {:?}", items.len(), params);

        let paginator = Paginator::from(&items, self.config.site.page_size);
        let mut entries = vec![];
        for item in paginator.get_page(params.page) {
            entries.push(ListEntry {
                item,
                summary_html: self.summary_html(item)?,
            });
        }

        let template_src = read_template(self.template_dir(), "postlist.tpl")?;
        let list_renderer = ListRenderer::new(&template_src, paginator.page_count())?;
        Ok(list_renderer.render(&entries, params, &tags, &categories, nav))
    }

    pub fn render_post(&self, slug: &str, nav: &NavState) -> Result<String, PageError> {
        let item = self.repository.load(slug)?;
        let doc = self.post_document(&item)?;
        let body_html = self.components.render_document(&doc);

        let template_src = read_template(self.template_dir(), "view.tpl")?;
        let post_renderer = PostRenderer::new(&template_src)?;
        Ok(post_renderer.render(&item, &doc, &body_html, nav))
    }

    pub fn render_page(&self, name: &str, nav: &NavState) -> Result<String, PageError> {
        let page = Page::load(&self.pages, name)?;
        let doc = self.documents.get_page_or(name, Expire::Never, || {
            info!("Rendering page {}", name);
            self.pipeline.render(&page.body, page.format)
        }).map_err(|source| ContentError::Render { slug: name.to_string(), source })?;
        let body_html = self.components.render_document(&doc);

        let template_src = read_template(self.template_dir(), "page.tpl")?;
        let template = parse_template(&template_src, "page")?;
        Ok(template.render(&StaticPage {
            nav: nav.links(),
            menu_open: nav.menu_open,
            name: page.name.as_str(),
            title: page.title.as_str(),
            page_content: &body_html,
        }))
    }

    /// Either listing may have failed; its region then shows as unavailable.
    pub fn render_projects(&self,
                           repos: &Result<ProjectPage, ExternalError>,
                           gists: &Result<ProjectPage, ExternalError>,
                           nav: &NavState) -> Result<String, PageError> {
        let template_src = read_template(self.template_dir(), "projects.tpl")?;
        let template = parse_template(&template_src, "projects")?;
        Ok(template.render(&ProjectsPage {
            nav: nav.links(),
            menu_open: nav.menu_open,
            repos: project_list(repos),
            gists: project_list(gists),
        }))
    }

    pub fn render_not_found(&self, nav: &NavState) -> String {
        self.render_message("not_found.tpl", "Nothing to see here: this page does not exist.", "/", nav)
    }

    /// Generic failure page with a link that retries the same request.
    pub fn render_error(&self, retry_url: &str, nav: &NavState) -> String {
        self.render_message("error.tpl", "Something went wrong while building this page.", retry_url, nav)
    }

    fn render_message(&self, template_name: &str, message: &str, retry_url: &str, nav: &NavState) -> String {
        let page = MessagePage {
            nav: nav.links(),
            menu_open: nav.menu_open,
            message,
            retry_url,
        };
        let rendered = read_template(self.template_dir(), template_name)
            .and_then(|src| parse_template(&src, template_name).map(|tpl| tpl.render(&page)));
        match rendered {
            Ok(html) => html,
            Err(e) => {
                error!("Error rendering {}: {}", template_name, e);
                fallback_message(message, retry_url)
            }
        }
    }
}

fn fallback_message(message: &str, retry_url: &str) -> String {
    let message = quick_xml::escape::escape(message);
    let retry_url = quick_xml::escape::escape(retry_url);
    format!("<!DOCTYPE html><html><body><p>{}</p><p><a href=\"{}\">Try again</a></p></body></html>", message, retry_url)
}

fn view_project(project: &Project) -> ViewProject {
    ViewProject {
        name: project.name.as_str(),
        description: project.description.as_deref().unwrap_or_default(),
        url: project.url.as_str(),
        homepage_url: project.homepage_url.as_deref().unwrap_or_default(),
        has_homepage: project.homepage_url.is_some(),
        language: project.language.as_deref().unwrap_or_default(),
        stars: project.stars,
        forks: project.forks,
    }
}

fn project_list(page: &Result<ProjectPage, ExternalError>) -> ViewProjectList {
    match page {
        Ok(page) => ViewProjectList {
            available: true,
            items: page.items.iter().map(view_project).collect(),
            empty: page.items.is_empty(),
            has_more: page.has_more,
            cursor: page.cursor.as_deref().unwrap_or_default(),
        },
        Err(_) => ViewProjectList {
            available: false,
            items: vec![],
            empty: true,
            has_more: false,
            cursor: "",
        },
    }
}
