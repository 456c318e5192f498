use std::collections::HashMap;

use serde::Serialize;

use crate::content::ContentItem;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateEntry {
    pub label: String,
    pub count: usize,
    pub url: String,
}

/// Label → entry. Keys are unordered; use `most_popular` for presentation.
pub type AggregateIndex = HashMap<String, AggregateEntry>;

pub fn category_url(category: &str) -> String {
    filter_url("categories", category)
}

pub fn tag_url(tag: &str) -> String {
    filter_url("tags", tag)
}

fn filter_url(key: &str, label: &str) -> String {
    let query = serde_urlencoded::to_string(vec![(key, label)]).unwrap_or_default();
    format!("/blog?{}", query)
}

pub fn category_index(items: &[ContentItem]) -> AggregateIndex {
    let mut index = AggregateIndex::new();
    for item in items {
        bump(&mut index, &item.category, category_url);
    }
    index
}

/// A post tagged twice with the same tag counts once for that tag.
pub fn tag_index(items: &[ContentItem]) -> AggregateIndex {
    let mut index = AggregateIndex::new();
    for item in items {
        let mut seen: Vec<&str> = Vec::with_capacity(item.tags.len());
        for tag in item.tags.iter() {
            if seen.contains(&tag.as_str()) {
                continue;
            }
            seen.push(tag);
            bump(&mut index, tag, tag_url);
        }
    }
    index
}

fn bump(index: &mut AggregateIndex, label: &str, url: fn(&str) -> String) {
    index.entry(label.to_string())
        .or_insert_with(|| AggregateEntry {
            label: label.to_string(),
            count: 0,
            url: url(label),
        })
        .count += 1;
}

/// Entries by post count descending, ties by label.
pub fn most_popular(index: &AggregateIndex, limit: i64) -> Vec<AggregateEntry> {
    let mut entries: Vec<AggregateEntry> = index.values().cloned().collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    crate::query::limit_items(entries, limit)
}
