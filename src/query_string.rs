use std::collections::HashMap;

use crate::query::{SortKey, SortOrder};

/// Query parameters of the listing pages.
///
/// `?order=asc&sort=title&tags=rust,web&categories=engineering&page=2`
#[derive(PartialEq, Debug)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        QueryString {
            items,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(|v| v.as_str())
    }

    pub fn get_page(&self) -> u32 {
        let val = self.get("page").and_then(|v| v.trim().parse::<u32>().ok()).unwrap_or(1);
        if val == 0 { return 1; }
        val
    }

    pub fn get_sort_key(&self) -> SortKey {
        self.get("sort").and_then(SortKey::parse).unwrap_or(SortKey::Date)
    }

    pub fn get_sort_order(&self) -> SortOrder {
        self.get("order").and_then(SortOrder::parse).unwrap_or(SortOrder::Descending)
    }

    pub fn get_tags(&self) -> Vec<String> {
        self.get_list("tags")
    }

    pub fn get_categories(&self) -> Vec<String> {
        self.get_list("categories")
    }

    fn get_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            None => vec![],
            Some(val) => val.split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// The listing parameters of one request, able to rebuild the URL of any
/// other page of the same listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingParams {
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub page: u32,
}

impl Default for ListingParams {
    fn default() -> Self {
        ListingParams::from_query(&QueryString::from(""))
    }
}

impl ListingParams {
    pub fn from_query(qs: &QueryString) -> Self {
        ListingParams {
            sort_key: qs.get_sort_key(),
            sort_order: qs.get_sort_order(),
            tags: qs.get_tags(),
            categories: qs.get_categories(),
            page: qs.get_page(),
        }
    }

    /// Defaults are left out of the URL.
    pub fn page_url(&self, page: u32) -> String {
        let mut pairs: Vec<(&str, String)> = vec![];
        if self.sort_order != SortOrder::Descending {
            pairs.push(("order", self.sort_order.as_str().to_string()));
        }
        if self.sort_key != SortKey::Date {
            pairs.push(("sort", self.sort_key.as_str().to_string()));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if !self.categories.is_empty() {
            pairs.push(("categories", self.categories.join(",")));
        }
        if page > 1 {
            pairs.push(("page", page.to_string()));
        }

        if pairs.is_empty() {
            return "/blog".to_string();
        }
        format!("/blog?{}", serde_urlencoded::to_string(pairs).unwrap_or_default())
    }
}
