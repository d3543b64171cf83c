use tracing::debug;

use crate::bank::bank::BankBuilder;
use crate::bank::bank_model::BankOutput;
use crate::bank::banks;
use crate::data::data_model::Dataset;
use crate::descriptor::descriptor_model::Args;
use crate::descriptor::ids::BankId;
use crate::descriptor::ordered::OrderedMap;
use crate::error::{BankError, CompileError};

// ============================================================================
// BankFactory trait: one bank type
// ============================================================================

/// Builds one type of bank into the builder it is handed.
pub trait BankFactory: Send + Sync {
    fn build(&self, builder: &mut BankBuilder<'_>) -> Result<(), BankError>;
}

impl<F> BankFactory for F
where
    F: Fn(&mut BankBuilder<'_>) -> Result<(), BankError> + Send + Sync,
{
    fn build(&self, builder: &mut BankBuilder<'_>) -> Result<(), BankError> {
        self(builder)
    }
}

// ============================================================================
// BankRegistry
// ============================================================================

/// Bank factories by type name.
pub struct BankRegistry {
    factories: OrderedMap<String, Box<dyn BankFactory>>,
}

impl BankRegistry {
    pub fn new() -> Self {
        Self {
            factories: OrderedMap::new(),
        }
    }

    /// The built-in bank library.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("graph", banks::graph);
        registry.register("selector", banks::selector);
        registry.register("axis_controls", banks::axis_controls);
        registry.register("data_table", banks::data_table);
        registry.register("date_control", banks::date_control);
        registry.register("indicators", banks::indicators);
        registry.register("ranking", banks::ranking);
        registry.register("text_box", banks::text_box);
        registry.register("analytics_set", banks::analytics_set);
        registry.register("option_set", banks::option_set);
        registry
    }

    /// Add a factory, replacing any registered under the same name.
    pub fn register(&mut self, bank_type: &str, factory: impl BankFactory + 'static) {
        self.factories.insert(bank_type.to_string(), Box::new(factory));
    }

    pub fn contains(&self, bank_type: &str) -> bool {
        self.factories.contains_key(bank_type)
    }

    pub fn types(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Build the bank `uid` of type `bank_type` over `data`.
    pub fn create(
        &self,
        bank_type: &str,
        uid: &BankId,
        dataid: &str,
        data: &Dataset,
        args: &Args,
    ) -> Result<BankOutput, CompileError> {
        let factory = self
            .factories
            .get(bank_type)
            .ok_or_else(|| CompileError::UnknownBankType {
                bank: uid.clone(),
                bank_type: bank_type.to_string(),
            })?;

        debug!("building {} bank {}", bank_type, uid);
        let mut builder = BankBuilder::new(uid.clone(), dataid, data, args);
        factory
            .build(&mut builder)
            .map_err(|e| CompileError::BankArguments {
                bank: uid.clone(),
                message: e.to_string(),
            })?;
        Ok(builder.finish())
    }
}

impl Default for BankRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
