use tracing::info;

use crate::{
    bank::factory::BankRegistry,
    data::loader::{LoaderRegistry, load_all},
    descriptor::{descriptor_model::Descriptor, normalize::normalize},
    error::CompileError,
    graph::{assembler::assemble, context::CompiledContext},
    grid::grid::GridConfig,
};

pub use crate::graph::assembler::Compilation;

pub mod bank;
pub mod cli;
pub mod data;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod grid;
pub mod trace;

/// One compile pipeline: normalize, load data, assemble banks and
/// connections, lay out pages.
pub struct Compiler {
    banks: BankRegistry,
    loaders: LoaderRegistry,
    grid: GridConfig,
    strict: bool,
}

impl Compiler {
    /// Built-in banks and loaders, default grid, lenient merges.
    pub fn new() -> Self {
        Self {
            banks: BankRegistry::with_builtins(),
            loaders: LoaderRegistry::default(),
            grid: GridConfig::default(),
            strict: false,
        }
    }

    pub fn with_banks(mut self, banks: BankRegistry) -> Self {
        self.banks = banks;
        self
    }

    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    /// Fail on repeated widget ids instead of letting the later bank win.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn banks(&self) -> &BankRegistry {
        &self.banks
    }

    /// Compile `desc`. Validation errors and assembly failures abort the
    /// pass; dropped data sources, unmatched sinks, overrides and row
    /// overflows are returned as events.
    pub fn compile(&self, desc: &Descriptor) -> Result<Compilation, CompileError> {
        let normalized = normalize(desc)?;
        let (data, mut events) = load_all(&normalized.data, &self.loaders);

        let mut compilation = assemble(&normalized, &data, &self.banks, &self.grid, self.strict)?;
        events.append(&mut compilation.events);
        compilation.events = events;

        info!(
            "compiled '{}': {} pages, {} widgets, {} callbacks, {} events",
            compilation.context.name,
            compilation.context.pages.len(),
            compilation.context.widgets.len(),
            compilation.context.callbacks.len(),
            compilation.events.len()
        );
        Ok(compilation)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile with the built-in banks and loaders and the default grid.
pub fn compile(desc: &Descriptor) -> Result<CompiledContext, CompileError> {
    Compiler::new().compile(desc).map(|c| c.context)
}
