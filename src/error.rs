use std::fmt;

use crate::descriptor::ids::{BankId, Port, WidgetId};

// ============================================================================
// CompileError: anything that aborts a compile pass
// ============================================================================

#[derive(Debug)]
pub enum CompileError {
    /// Descriptor text could not be decoded
    Parse { context: String, message: String },

    /// Reading or writing a file failed
    Io { path: String, source: std::io::Error },

    /// Malformed identifiers or missing required structure
    Validation(ValidationError),

    /// A bank names a type no factory is registered for
    UnknownBankType { bank: BankId, bank_type: String },

    /// A bank references a data source that was never loaded
    MissingDataSource { bank: BankId, dataid: Option<String> },

    /// A factory rejected the arguments it was given
    BankArguments { bank: BankId, message: String },

    /// Two banks produced the same widget id (strict mode only)
    DuplicateWidget { widget: WidgetId, bank: BankId },

    /// The same widget property is produced by two callbacks
    ConflictingOutput {
        port: Port,
        first: WidgetId,
        second: WidgetId,
    },

    /// A connector's outputs do not line up with its callback's `provides`
    ConnectorMismatch { callback: WidgetId },

    /// Compiled context could not be serialized
    Serialize { format: String, message: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse { context, message } => {
                write!(f, "Failed to parse {}: {}", context, message)
            }
            CompileError::Io { path, source } => {
                write!(f, "I/O error on '{}': {}", path, source)
            }
            CompileError::Validation(err) => err.fmt(f),
            CompileError::UnknownBankType { bank, bank_type } => {
                write!(f, "Bank '{}' has unknown type '{}'", bank, bank_type)
            }
            CompileError::MissingDataSource { bank, dataid } => match dataid {
                Some(id) => write!(f, "Bank '{}' references missing data source '{}'", bank, id),
                None => write!(f, "Bank '{}' has no data source and none is declared", bank),
            },
            CompileError::BankArguments { bank, message } => {
                write!(f, "Bank '{}' rejected its arguments: {}", bank, message)
            }
            CompileError::DuplicateWidget { widget, bank } => {
                write!(f, "Widget '{}' from bank '{}' was already declared", widget, bank)
            }
            CompileError::ConflictingOutput { port, first, second } => {
                write!(
                    f,
                    "Property '{}' is produced by both callback '{}' and '{}'",
                    port, first, second
                )
            }
            CompileError::ConnectorMismatch { callback } => {
                write!(
                    f,
                    "Connector outputs for callback '{}' do not match its declared provides",
                    callback
                )
            }
            CompileError::Serialize { format, message } => {
                write!(f, "Failed to serialize context as {}: {}", format, message)
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Io { source, .. } => Some(source),
            CompileError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CompileError {
    fn from(err: ValidationError) -> Self {
        CompileError::Validation(err)
    }
}

// ============================================================================
// ValidationError: every violation found in one descriptor
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Dotted location in the descriptor, e.g. `pages.main.banks`
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether any violation is reported at `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor failed validation ({} violations)", self.violations.len())?;
        for v in &self.violations {
            write!(f, "\n  {}: {}", v.path, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// DataError: loader failures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// The loader module or its call could not be resolved
    Unavailable {
        module: String,
        call: String,
        reason: String,
    },

    /// The loader ran but produced something that is not a dataset
    Malformed { module: String, message: String },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Unavailable { module, call, reason } => {
                write!(f, "Data source {}.{} unavailable: {}", module, call, reason)
            }
            DataError::Malformed { module, message } => {
                write!(f, "Data source {} returned malformed data: {}", module, message)
            }
        }
    }
}

impl std::error::Error for DataError {}

// ============================================================================
// BankError: raised by a factory while building a bank
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BankError(pub String);

impl BankError {
    pub fn new(message: impl Into<String>) -> Self {
        BankError(message.into())
    }
}

impl fmt::Display for BankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BankError {}
