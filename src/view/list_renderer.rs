use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::aggregation::{category_url, tag_url, AggregateEntry};
use crate::content::ContentItem;
use crate::query::{SortKey, SortOrder};
use crate::query_string::ListingParams;
use crate::text_utils::{format_date_time, format_long_date};
use crate::view::nav_state::{NavLink, NavState};

#[derive(ramhorns::Content)]
struct ListPage<'a> {
    nav: Vec<NavLink>,
    menu_open: bool,
    post_list: Vec<PostItem<'a>>,
    no_posts: bool,
    tags: Vec<ViewAggregate<'a>>,
    categories: Vec<ViewAggregate<'a>>,
    filters: Vec<ViewFilter<'a>>,
    has_filters: bool,
    sort_by_title: bool,
    ascending: bool,
    page_list: Vec<ViewPagination>,
    show_pagination: bool,
    has_prev: bool,
    prev_url: String,
    has_next: bool,
    next_url: String,
}

#[derive(ramhorns::Content)]
struct PostItem<'a> {
    date: String,
    time: String,
    long_date: String,
    link: String,
    title: &'a str,
    category: &'a str,
    category_url: String,
    thumbnail: &'a str,
    tags: Vec<ViewTag<'a>>,
    summary: &'a str,
    draft: bool,
}

#[derive(ramhorns::Content)]
struct ViewTag<'a> {
    tag: &'a str,
    url: String,
}

#[derive(ramhorns::Content)]
struct ViewAggregate<'a> {
    label: &'a str,
    count: usize,
    url: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewFilter<'a> {
    kind: &'static str,
    label: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewPagination {
    current: bool,
    number: u32,
    url: String,
}

/// One listed post with its summary already rendered to HTML.
pub struct ListEntry<'a> {
    pub item: &'a ContentItem,
    pub summary_html: String,
}

pub struct ListRenderer<'a> {
    pub template: Template<'a>,
    pub page_count: u32,
}

impl ListRenderer<'_> {
    pub fn new(list_tpl_src: &str, page_count: u32) -> io::Result<ListRenderer> {
        let template = match Template::new(list_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing list template: {}", e)));
            }
        };

        Ok(ListRenderer {
            template,
            page_count,
        })
    }

    pub fn render(&self,
                  entries: &[ListEntry],
                  params: &ListingParams,
                  tags: &[AggregateEntry],
                  categories: &[AggregateEntry],
                  nav: &NavState) -> String {
        let mut post_list = vec![];
        for entry in entries {
            let item = entry.item;
            let (date, time) = format_date_time(&item.date);
            post_list.push(PostItem {
                date,
                time,
                long_date: format_long_date(&item.date),
                link: format!("/blog/{}", item.slug),
                title: item.title.as_str(),
                category: item.category.as_str(),
                category_url: category_url(&item.category),
                thumbnail: item.thumbnail.as_str(),
                tags: item.tags.iter().map(|t| ViewTag { tag: t.as_str(), url: tag_url(t) }).collect(),
                summary: entry.summary_html.as_str(),
                draft: !item.published,
            });
        }

        let cur_page = params.page;
        let mut page_list: Vec<ViewPagination> = Vec::with_capacity(self.page_count as usize);
        for i in 1..=self.page_count {
            page_list.push(ViewPagination {
                current: i == cur_page,
                number: i,
                url: params.page_url(i),
            })
        }

        let filters: Vec<ViewFilter> = params.tags.iter().map(|t| ViewFilter { kind: "tag", label: t.as_str() })
            .chain(params.categories.iter().map(|c| ViewFilter { kind: "category", label: c.as_str() }))
            .collect();

        self.template.render(&ListPage {
            nav: nav.links(),
            menu_open: nav.menu_open,
            no_posts: post_list.is_empty(),
            post_list,
            tags: aggregate(tags),
            categories: aggregate(categories),
            has_filters: !filters.is_empty(),
            filters,
            sort_by_title: params.sort_key == SortKey::Title,
            ascending: params.sort_order == SortOrder::Ascending,
            page_list,
            show_pagination: self.page_count > 1,
            has_prev: cur_page > 1 && cur_page <= self.page_count,
            prev_url: params.page_url(cur_page.saturating_sub(1)),
            has_next: cur_page < self.page_count,
            next_url: params.page_url(cur_page + 1),
        })
    }
}

fn aggregate(entries: &[AggregateEntry]) -> Vec<ViewAggregate> {
    entries.iter().map(|e| ViewAggregate {
        label: e.label.as_str(),
        count: e.count,
        url: e.url.as_str(),
    }).collect()
}
