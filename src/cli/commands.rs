use std::path::Path;

use tracing::info;

use crate::Compiler;
use crate::bank::factory::BankRegistry;
use crate::cli::config::OutputFormat;
use crate::data::loader::LoaderRegistry;
use crate::descriptor::descriptor_model::Descriptor;
use crate::descriptor::normalize::normalize;
use crate::error::CompileError;
use crate::graph::context::CompiledContext;
use crate::grid::grid::GridConfig;
use crate::trace::logger::EventLogger;

// ============================================================================
// compile subcommand
// ============================================================================

/// Options for one `compile` run, CLI flags already merged over the config.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub output: Option<String>,
    pub format: OutputFormat,
    pub trace: Option<String>,
    pub strict: bool,
    pub grid: GridConfig,
}

pub fn cmd_compile(
    descriptor_path: &str,
    options: &CompileOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(descriptor_path);
    let desc = Descriptor::from_path(path)?;

    // JSON data files are resolved next to the descriptor
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let compiler = Compiler::new()
        .with_loaders(LoaderRegistry::with_builtins(base_dir))
        .with_grid(options.grid)
        .strict(options.strict);
    let compilation = compiler.compile(&desc)?;

    if let Some(trace_path) = &options.trace {
        EventLogger::new(trace_path).log_compilation(descriptor_path, &compilation);
    }
    for event in &compilation.events {
        info!("{:?} {}: {}", event.kind, event.subject, event.detail.as_deref().unwrap_or(""));
    }

    let content = render_context(&compilation.context, options.format)?;
    match &options.output {
        Some(out) => {
            std::fs::write(out, &content).map_err(|e| CompileError::Io {
                path: out.clone(),
                source: e,
            })?;
            eprintln!(
                "Compiled {} pages ({} events) into {}",
                compilation.context.pages.len(),
                compilation.events.len(),
                out
            );
        }
        None => print!("{}", content),
    }

    Ok(())
}

/// Serialize a compiled context in the requested format.
pub fn render_context(
    context: &CompiledContext,
    format: OutputFormat,
) -> Result<String, CompileError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(context)
            .map(|mut text| {
                text.push('\n');
                text
            })
            .map_err(|e| CompileError::Serialize {
                format: "json".to_string(),
                message: e.to_string(),
            }),
        OutputFormat::Yaml => serde_yaml::to_string(context).map_err(|e| CompileError::Serialize {
            format: "yaml".to_string(),
            message: e.to_string(),
        }),
    }
}

// ============================================================================
// validate subcommand
// ============================================================================

/// Validate and normalize a descriptor, printing a per-page summary.
/// Returns whether it is valid.
pub fn cmd_validate(descriptor_path: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let desc = Descriptor::from_path(Path::new(descriptor_path))?;

    match normalize(&desc) {
        Ok(normalized) => {
            println!("{}: valid", descriptor_path);
            for (pageid, page) in normalized.pages.iter() {
                println!(
                    "  {}: {} banks, {} layout rows, {} connections",
                    pageid,
                    page.banks.len(),
                    page.layout.len(),
                    page.connections.len()
                );
            }
            Ok(true)
        }
        Err(err) => {
            println!("{}: invalid", descriptor_path);
            for v in &err.violations {
                println!("  {}: {}", v.path, v.message);
            }
            Ok(false)
        }
    }
}

// ============================================================================
// banks subcommand
// ============================================================================

pub fn cmd_banks() {
    for bank_type in BankRegistry::with_builtins().types() {
        println!("{}", bank_type);
    }
}
