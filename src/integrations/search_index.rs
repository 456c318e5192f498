use markdown::{to_mdast, ParseOptions};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use spdlog::info;

use crate::config::Search;
use crate::content::ContentItem;
use crate::integrations::{credential, http_client, response_text, ExternalError};
use crate::render::inline::plain_text;
use crate::render::RenderedDocument;

const SERVICE: &str = "search index";

/// One searchable post, keyed by slug so re-indexing overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRecord {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    pub tags: Vec<String>,
    pub headings: Vec<String>,
    pub image: String,
}

/// Absolute URLs are kept as they are, bare names point at the site images.
pub fn image_url(thumbnail: &str, base_url: &str) -> String {
    if thumbnail.starts_with("http://") || thumbnail.starts_with("https://") {
        return thumbnail.to_string();
    }
    let base_url = base_url.trim_end_matches('/');
    if thumbnail.starts_with('/') {
        return format!("{}{}", base_url, thumbnail);
    }
    format!("{}/images/{}.png", base_url, thumbnail)
}

/// Markup-free text of a markdown fragment, paragraphs joined by a space.
pub fn markup_to_text(src: &str) -> String {
    let Ok(tree) = to_mdast(src, &ParseOptions::gfm()) else {
        return src.trim().to_string();
    };
    tree.children()
        .map(|blocks| blocks.iter()
            .map(|b| plain_text(std::slice::from_ref(b)))
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" "))
        .unwrap_or_default()
}

pub fn build_record(item: &ContentItem, doc: &RenderedDocument, base_url: &str) -> SearchRecord {
    let description = match (&item.description, &item.excerpt) {
        (Some(description), _) => description.clone(),
        (None, Some(excerpt)) => markup_to_text(excerpt),
        (None, None) => String::new(),
    };

    let mut tags: Vec<String> = Vec::with_capacity(item.tags.len());
    for tag in item.tags.iter() {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }

    SearchRecord {
        object_id: item.slug.to_string(),
        title: item.title.clone(),
        description,
        published_at: item.published_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        tags,
        headings: doc.headings.iter().map(|h| h.text.clone()).collect(),
        image: image_url(&item.thumbnail, base_url),
    }
}

/// Algolia style batch of `updateObject` actions.
pub fn batch_body(records: &[SearchRecord]) -> serde_json::Value {
    let requests: Vec<serde_json::Value> = records.iter()
        .map(|r| json!({ "action": "updateObject", "body": r }))
        .collect();
    json!({ "requests": requests })
}

pub struct SearchIndexClient {
    http: Client,
    app_id: String,
    index_name: String,
    api_key: String,
}

impl SearchIndexClient {
    pub fn new(app_id: &str, index_name: &str, api_key: String) -> Result<Self, ExternalError> {
        Ok(SearchIndexClient {
            http: http_client()?,
            app_id: app_id.to_string(),
            index_name: index_name.to_string(),
            api_key,
        })
    }

    pub fn from_config(cfg: &Search) -> Result<Self, ExternalError> {
        let api_key = credential(&cfg.api_key_env)?;
        Self::new(&cfg.app_id, &cfg.index_name, api_key)
    }

    pub fn batch_url(&self) -> String {
        format!("https://{}.algolia.net/1/indexes/{}/batch", self.app_id, self.index_name)
    }

    /// Inserts or replaces `records`, returning how many were sent.
    pub async fn upsert(&self, records: &[SearchRecord]) -> Result<usize, ExternalError> {
        if records.is_empty() {
            return Ok(0);
        }

        let resp = self.http.post(self.batch_url())
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .json(&batch_body(records))
            .send()
            .await?;
        response_text(SERVICE, resp).await?;

        info!("Indexed {} records into {}", records.len(), self.index_name);
        Ok(records.len())
    }
}
