use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::{
    catalog::{FileMetadataStore, MetadataStore},
    handler::{DatabaseHandler, HandlerError},
    source::{AnySource, DataSource},
    translate::ChatCompletionTranslator,
};

use super::schema;

fn build_store(config: &schema::SqltalkConfig) -> Arc<dyn MetadataStore> {
    let store = FileMetadataStore::open(&config.catalog.path);
    info!(path = %store.path().display(), "Using catalog");
    Arc::new(store)
}

fn build_sources(
    config: &schema::SqltalkConfig,
) -> Result<BTreeMap<String, Arc<dyn DataSource>>, HandlerError> {
    config
        .sources
        .iter()
        .map(|source| -> Result<_, HandlerError> {
            let connected: Arc<dyn DataSource> = Arc::new(AnySource::connect_lazy(source)?);
            info!(name = %source.name, driver = %source.driver, "Configured source");
            Ok((source.name.clone(), connected))
        })
        .collect()
}

// Construct the session handler from the config
pub fn build_handler(config: &schema::SqltalkConfig) -> Result<DatabaseHandler, HandlerError> {
    let store = build_store(config);
    let sources = build_sources(config)?;
    let translator = Arc::new(ChatCompletionTranslator::new(&config.translator)?);

    Ok(DatabaseHandler::new(sources, store, translator))
}
