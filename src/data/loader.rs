use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

use crate::data::data_model::Dataset;
use crate::descriptor::descriptor_model::Args;
use crate::descriptor::normalized_model::{DEFAULT_CALL, DataSource};
use crate::descriptor::ordered::OrderedMap;
use crate::error::DataError;
use crate::trace::trace::{CompileEvent, EventKind};

/// Data source id -> loaded dataset.
pub type LoadedData = OrderedMap<String, Dataset>;

// ============================================================================
// DataLoader trait: one loader module, one or more calls
// ============================================================================

/// Resolves one `module` of the descriptor's `data` section into datasets.
pub trait DataLoader: Send + Sync {
    fn load(&self, call: &str, args: &Args) -> Result<Dataset, DataError>;
}

/// Dataset given directly in the descriptor: `args` holds `table`,
/// `column_types` and `keys` (or their `records` / `types` aliases).
pub struct InlineLoader;

impl DataLoader for InlineLoader {
    fn load(&self, call: &str, args: &Args) -> Result<Dataset, DataError> {
        if call != DEFAULT_CALL {
            return Err(unknown_call("inline", call));
        }
        serde_json::from_value(Value::Object(args.clone())).map_err(|e| DataError::Malformed {
            module: "inline".to_string(),
            message: e.to_string(),
        })
    }
}

/// Dataset read from a JSON file at `args.path`, relative paths resolved
/// against `base_dir`.
pub struct JsonFileLoader {
    base_dir: PathBuf,
}

impl JsonFileLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }
}

impl DataLoader for JsonFileLoader {
    fn load(&self, call: &str, args: &Args) -> Result<Dataset, DataError> {
        if call != DEFAULT_CALL {
            return Err(unknown_call("json", call));
        }
        let path = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| DataError::Unavailable {
                module: "json".to_string(),
                call: call.to_string(),
                reason: "missing 'path' argument".to_string(),
            })?;
        let full = self.resolve(path);

        let text = std::fs::read_to_string(&full).map_err(|e| DataError::Unavailable {
            module: "json".to_string(),
            call: call.to_string(),
            reason: format!("{}: {}", full.display(), e),
        })?;
        serde_json::from_str(&text).map_err(|e| DataError::Malformed {
            module: "json".to_string(),
            message: format!("{}: {}", full.display(), e),
        })
    }
}

fn unknown_call(module: &str, call: &str) -> DataError {
    DataError::Unavailable {
        module: module.to_string(),
        call: call.to_string(),
        reason: format!("module has no call '{}'", call),
    }
}

// ============================================================================
// LoaderRegistry
// ============================================================================

/// Loader modules by name.
pub struct LoaderRegistry {
    loaders: OrderedMap<String, Box<dyn DataLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self {
            loaders: OrderedMap::new(),
        }
    }

    /// `inline` and `json`, with JSON paths resolved against `base_dir`.
    pub fn with_builtins(base_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register("inline", InlineLoader);
        registry.register("json", JsonFileLoader::new(base_dir));
        registry
    }

    pub fn register(&mut self, module: &str, loader: impl DataLoader + 'static) {
        self.loaders.insert(module.to_string(), Box::new(loader));
    }

    pub fn modules(&self) -> Vec<String> {
        self.loaders.keys().cloned().collect()
    }

    pub fn load(&self, source: &DataSource) -> Result<Dataset, DataError> {
        match self.loaders.get(source.module.as_str()) {
            Some(loader) => loader.load(&source.call, &source.args),
            None => Err(DataError::Unavailable {
                module: source.module.clone(),
                call: source.call.clone(),
                reason: "no loader registered for module".to_string(),
            }),
        }
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_builtins(".")
    }
}

/// Load every declared data source.
///
/// Sources are independent, so they load in parallel; results are put back
/// in declaration order. A source that fails to load is dropped and reported
/// as a `DataSourceDropped` event; banks that need it fail later with
/// `MissingDataSource`.
pub fn load_all(
    sources: &OrderedMap<String, DataSource>,
    registry: &LoaderRegistry,
) -> (LoadedData, Vec<CompileEvent>) {
    info!("loading {} data sources", sources.len());
    let entries: Vec<(&String, &DataSource)> = sources.iter().collect();
    let results: Vec<(String, Result<Dataset, DataError>)> = entries
        .par_iter()
        .map(|(dataid, source)| (dataid.to_string(), registry.load(source)))
        .collect();

    let mut data = LoadedData::new();
    let mut events = Vec::new();
    for (dataid, result) in results {
        match result {
            Ok(dataset) => {
                info!(
                    "  {}: {} rows, {} columns",
                    dataid,
                    dataset.row_count(),
                    dataset.column_types.len()
                );
                data.insert(dataid, dataset);
            }
            Err(e) => {
                warn!("dropping data source '{}': {}", dataid, e);
                events.push(CompileEvent::now(EventKind::DataSourceDropped, &dataid).with_detail(e));
            }
        }
    }
    (data, events)
}
