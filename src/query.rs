use std::cmp::Ordering;

use crate::content::ContentItem;

/// Which items the current environment may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Development: drafts included.
    All,
    PublishedOnly,
}

impl Visibility {
    pub fn allows(&self, item: &ContentItem) -> bool {
        match self {
            Visibility::All => true,
            Visibility::PublishedOnly => item.published,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Title,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<SortKey> {
        match value.to_ascii_lowercase().as_str() {
            "date" => Some(SortKey::Date),
            "title" | "alphabetical" => Some(SortKey::Title),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<SortOrder> {
        match value.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Ascending),
            "desc" | "descending" => Some(SortOrder::Descending),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

pub fn filter_items<P>(mut items: Vec<ContentItem>, predicate: P) -> Vec<ContentItem>
where
    P: Fn(&ContentItem) -> bool,
{
    items.retain(|item| predicate(item));
    items
}

/// Stable sort: items with equal keys keep their relative order in both directions.
pub fn sort_items(items: &mut [ContentItem], key: SortKey, order: SortOrder) {
    let compare = |a: &ContentItem, b: &ContentItem| -> Ordering {
        match key {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Title => a.title.cmp(&b.title),
        }
    };

    match order {
        SortOrder::Ascending => items.sort_by(compare),
        SortOrder::Descending => items.sort_by(|a, b| compare(b, a)),
    }
}

/// Keeps the first `limit` items. Zero or negative means no limit.
pub fn limit_items<T>(mut items: Vec<T>, limit: i64) -> Vec<T> {
    if limit > 0 {
        items.truncate(limit as usize);
    }
    items
}

/// The `count` most recent items, newest first.
pub fn latest(items: Vec<ContentItem>, count: i64) -> Vec<ContentItem> {
    ContentQuery::new()
        .sort(SortKey::Date, SortOrder::Descending)
        .limit(count)
        .run(items)
}

/// Filter, sort and limit in one go, the way listings use it.
pub struct ContentQuery<'a> {
    filters: Vec<Box<dyn Fn(&ContentItem) -> bool + 'a>>,
    sort: Option<(SortKey, SortOrder)>,
    limit: i64,
}

impl<'a> Default for ContentQuery<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ContentQuery<'a> {
    pub fn new() -> Self {
        ContentQuery {
            filters: vec![],
            sort: None,
            limit: 0,
        }
    }

    pub fn filter<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ContentItem) -> bool + 'a,
    {
        self.filters.push(Box::new(predicate));
        self
    }

    /// Items carrying at least one of `tags`. An empty list filters nothing.
    pub fn any_tag(self, tags: &'a [String]) -> Self {
        if tags.is_empty() {
            return self;
        }
        self.filter(move |item| tags.iter().any(|t| item.has_tag(t)))
    }

    /// Items in any of `categories`. An empty list filters nothing.
    pub fn any_category(self, categories: &'a [String]) -> Self {
        if categories.is_empty() {
            return self;
        }
        self.filter(move |item| categories.iter().any(|c| *c == item.category))
    }

    pub fn sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort = Some((key, order));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn run(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        let mut items = filter_items(items, |item| self.filters.iter().all(|f| f(item)));
        if let Some((key, order)) = self.sort {
            sort_items(&mut items, key, order);
        }
        limit_items(items, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_data::item;

    use super::*;

    fn collection() -> Vec<ContentItem> {
        vec![
            item("b", "Borrowing", "2024-06-01", "rust", &["memory"]),
            item("a", "Async", "2024-01-01", "rust", &["tokio", "memory"]),
            item("c", "CSS grids", "2025-01-01", "web", &["css"]),
        ]
    }

    fn slugs(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|i| i.slug.as_str()).collect()
    }

    #[test]
    fn test_filter_keeps_order() {
        let items = filter_items(collection(), |i| i.category == "rust");
        assert_eq!(slugs(&items), ["b", "a"]);
    }

    #[test]
    fn test_filter_no_match() {
        let items = filter_items(collection(), |i| i.category == "cooking");
        assert!(items.is_empty());
        assert!(filter_items(vec![], |_| true).is_empty());
    }

    #[test]
    fn test_sort_by_date_reverses() {
        let mut desc = collection();
        sort_items(&mut desc, SortKey::Date, SortOrder::Descending);
        let mut asc = collection();
        sort_items(&mut asc, SortKey::Date, SortOrder::Ascending);

        assert_eq!(slugs(&desc), ["c", "b", "a"]);
        let mut reversed = slugs(&asc);
        reversed.reverse();
        assert_eq!(slugs(&desc), reversed);
    }

    #[test]
    fn test_sort_by_title() {
        let mut items = collection();
        sort_items(&mut items, SortKey::Title, SortOrder::Ascending);
        assert_eq!(slugs(&items), ["a", "b", "c"]);
        sort_items(&mut items, SortKey::Title, SortOrder::Descending);
        assert_eq!(slugs(&items), ["c", "b", "a"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut items = vec![
            item("x", "Same", "2024-01-01", "a", &[]),
            item("y", "Same", "2024-01-01", "a", &[]),
            item("z", "Same", "2024-01-01", "a", &[]),
        ];
        sort_items(&mut items, SortKey::Date, SortOrder::Descending);
        assert_eq!(slugs(&items), ["x", "y", "z"]);
        sort_items(&mut items, SortKey::Title, SortOrder::Ascending);
        assert_eq!(slugs(&items), ["x", "y", "z"]);
    }

    #[test]
    fn test_limit() {
        assert_eq!(slugs(&limit_items(collection(), 2)), ["b", "a"]);
        assert_eq!(limit_items(collection(), 3).len(), 3);
        assert_eq!(limit_items(collection(), 10).len(), 3);
        assert_eq!(limit_items(collection(), 0).len(), 3);
        assert_eq!(limit_items(collection(), -1).len(), 3);
        assert!(limit_items(Vec::<ContentItem>::new(), 2).is_empty());
    }

    #[test]
    fn test_latest_two() {
        let items = ContentQuery::new()
            .sort(SortKey::Date, SortOrder::Descending)
            .limit(2)
            .run(collection());
        assert_eq!(slugs(&items), ["c", "b"]);
        assert_eq!(slugs(&latest(collection(), 2)), ["c", "b"]);
        assert_eq!(latest(collection(), 0).len(), 3);
    }

    #[test]
    fn test_tag_and_category_filters() {
        let tags = vec!["memory".to_string(), "css".to_string()];
        let categories = vec!["rust".to_string()];
        let items = ContentQuery::new()
            .any_tag(&tags)
            .any_category(&categories)
            .sort(SortKey::Title, SortOrder::Ascending)
            .run(collection());
        assert_eq!(slugs(&items), ["a", "b"]);

        let none: Vec<String> = vec![];
        assert_eq!(ContentQuery::new().any_tag(&none).any_category(&none).run(collection()).len(), 3);
    }

    #[test]
    fn test_visibility() {
        let mut draft = item("d", "Draft", "2024-01-01", "a", &[]);
        draft.published = false;
        assert!(Visibility::All.allows(&draft));
        assert!(!Visibility::PublishedOnly.allows(&draft));
    }
}
