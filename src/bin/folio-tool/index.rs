use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use spdlog::info;

use folio::config::{Config, LogLevel};
use folio::content::content_store::ContentStore;
use folio::content::repository::ContentRepository;
use folio::content::ContentError;
use folio::integrations::search_index::{build_record, SearchIndexClient, SearchRecord};
use folio::logger::configure_console_logger;
use folio::post_processor::item_format;
use folio::query::Visibility;
use folio::render::RenderPipeline;

use crate::config::open_config;
use crate::SiteArgs;

/// Search records for every published post, whatever the site mode.
pub fn published_records(config: &Config) -> Result<Vec<SearchRecord>, ContentError> {
    let repository = ContentRepository::new(ContentStore::new(config.paths.content_dir.clone()), Visibility::PublishedOnly)
        .with_excerpt_separator(config.site.excerpt_separator());
    let pipeline = RenderPipeline::new(config.site.code_theme());

    let mut records = vec![];
    for item in repository.load_all()? {
        let doc = pipeline.render(&item.body, item_format(&item))
            .map_err(|source| ContentError::Render { slug: item.slug.to_string(), source })?;
        records.push(build_record(&item, &doc, &config.site.base_url));
    }
    Ok(records)
}

pub fn index_cmd(args: SiteArgs) -> Result<()> {
    configure_console_logger(LogLevel::Info)?;
    let config = open_config(args.config_path.map(PathBuf::from))?;
    let search = config.search.as_ref()
        .ok_or_else(|| anyhow!("The configuration has no [search] table"))?;

    let records = published_records(&config).context("Could not build search records")?;
    info!("Built {} search records", records.len());

    let client = SearchIndexClient::from_config(search)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let sent = runtime.block_on(client.upsert(&records))
        .context("Could not update the search index")?;

    println!("{} records sent to {}", sent, search.index_name);
    Ok(())
}
