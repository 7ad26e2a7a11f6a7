pub mod config;
pub mod dedup;
pub mod derive;
pub mod identifier;
pub mod loader;
pub mod merge;
pub mod repair;
pub mod report;
pub mod schema;
pub mod sql;
pub mod validate;

use wasm_bindgen::prelude::*;

use config::{ConfigError, MergeConfig};
use loader::MemoryLoader;
use merge::merge_schemas;
use schema::render_document;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Merge schema documents passed as a JSON object of `{source: document}`.
///
/// Keys play the role of file names: they select the database name through
/// `database_mapping` or the `<name>_schema.json` convention. `config` is an
/// optional JSON `MergeConfig`.
#[wasm_bindgen(js_name = "mergeSchemas")]
pub fn merge_documents(documents: &str, config: Option<String>) -> Result<String, String> {
    let documents: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(documents).map_err(|e| e.to_string())?;
    let config: MergeConfig = match config.as_deref() {
        Some(json) => serde_json::from_str(json).map_err(|e| e.to_string())?,
        None => MergeConfig::default(),
    };

    if documents.len() < 2 {
        return Err(ConfigError::TooFewInputs(documents.len()).to_string());
    }

    let mut loader = MemoryLoader::new();
    let mut sources = Vec::with_capacity(documents.len());
    for (source, document) in documents {
        let bytes = serde_json::to_vec(&document).map_err(|e| e.to_string())?;
        loader.insert(source.clone(), bytes);
        sources.push(source);
    }

    let (merged, _stats) = merge_schemas(&sources, &loader, &config).map_err(|e| e.to_string())?;
    let bytes = render_document(&merged).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}
