/*!
Error handling for the pipeline engine.

The engine distinguishes the error kinds surfaced at different layers:

- **Validation errors**: configuration issues collected during stage `init`,
  aborting pipeline startup
- **Stage errors**: non-recoverable per-batch failures returned from
  `produce`/`process`/`write`
- **Record errors**: per-record failures diverted to the error sink while the
  batch continues
- **Expression errors**: [`ElError`] with contract-exact messages that
  downstream callers assert on
- **Codec errors**: parse/serialize failures tagged with the offending message id

End-of-stream is not an error: readers return `Ok(None)`.
*/

use std::fmt;

/// Errors produced by expression language parsing and evaluation.
///
/// The `Display` output of several variants is a stable contract: callers
/// assert on the exact message text, so the formats here must not change.
#[derive(Debug, Clone, PartialEq)]
pub enum ElError {
    /// A function was invoked with the wrong number of arguments.
    Arity {
        /// Fully qualified function name, e.g. `str:substring`
        function: String,
        /// Number of arguments the function requires
        expected: usize,
        /// Number of arguments it was passed
        actual: usize,
    },

    /// A math function argument could not be converted to a float.
    FloatConversion {
        /// Zero-based argument index
        index: usize,
        /// String rendering of the offending value
        value: String,
        /// Type name of the offending value
        type_name: String,
        /// Operation (function) that rejected the argument
        operation: String,
    },

    /// A `record:*` function was evaluated without a record in the context.
    NoRecordContext,

    /// A `pipeline:*` function was evaluated without pipeline identity values.
    NoPipelineContext,

    /// A `job:*` function (other than `startTime`) was evaluated without job
    /// context.
    NoJobContext,

    /// A bare identifier did not match any parameter binding.
    UnknownParameter(String),

    /// A function call did not match any registered function.
    UnknownFunction(String),

    /// The expression text failed to parse.
    Parse(String),

    /// A function rejected its input. The message is rendered verbatim.
    Function(String),

    /// The function exists in the table but has no implementation on this
    /// platform.
    Unsupported(String),
}

impl fmt::Display for ElError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElError::Arity {
                function,
                expected,
                actual,
            } => write!(
                f,
                "The function '{}' requires {} arguments but was passed {}",
                function, expected, actual
            ),
            ElError::FloatConversion {
                index,
                value,
                type_name,
                operation,
            } => write!(
                f,
                "Cannot convert argument idx: '{}' with value '{}' and type '{}' to float64 for operation '{}'",
                index, value, type_name, operation
            ),
            ElError::NoRecordContext => write!(f, "record context is not set"),
            ElError::NoPipelineContext => write!(f, "pipeline context is not set"),
            ElError::NoJobContext => write!(f, "job context is not set"),
            ElError::UnknownParameter(name) => write!(f, "No parameter '{}' found", name),
            ElError::UnknownFunction(name) => write!(f, "No function '{}' found", name),
            ElError::Parse(message) => write!(f, "{}", message),
            ElError::Function(message) => write!(f, "{}", message),
            ElError::Unsupported(function) => {
                write!(f, "The function '{}' is not supported", function)
            }
        }
    }
}

impl std::error::Error for ElError {}

impl ElError {
    /// Create an arity mismatch error for a fully qualified function name.
    pub fn arity(function: impl Into<String>, expected: usize, actual: usize) -> Self {
        ElError::Arity {
            function: function.into(),
            expected,
            actual,
        }
    }

    /// Create a float conversion error for a math function argument.
    pub fn float_conversion(
        index: usize,
        value: impl Into<String>,
        type_name: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        ElError::FloatConversion {
            index,
            value: value.into(),
            type_name: type_name.into(),
            operation: operation.into(),
        }
    }

    /// Create a function error with a verbatim message.
    pub fn function(message: impl Into<String>) -> Self {
        ElError::Function(message.into())
    }

    /// Create a parse error with a verbatim message.
    pub fn parse(message: impl Into<String>) -> Self {
        ElError::Parse(message.into())
    }
}

/// A single configuration issue found during stage validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    /// Stage instance name the issue belongs to
    pub stage: String,
    /// Configuration key that failed validation
    pub config_name: String,
    /// Human-readable description of the problem
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.stage, self.config_name, self.message)
    }
}

impl ConfigIssue {
    pub fn new(
        stage: impl Into<String>,
        config_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ConfigIssue {
            stage: stage.into(),
            config_name: config_name.into(),
            message: message.into(),
        }
    }
}

/// Error type covering all pipeline-level failures.
#[derive(Debug)]
pub enum PipelineError {
    /// Configuration issues collected during `init`; pipeline startup aborts.
    Validation {
        /// The collected issues, one per failed config
        issues: Vec<ConfigIssue>,
    },

    /// Non-recoverable stage failure; terminal for the current batch.
    Stage {
        /// Stage instance name
        stage: String,
        /// Description of the failure
        message: String,
    },

    /// Per-record failure; the record is diverted to the error sink.
    Record {
        /// Source id of the offending record, when known
        source_id: Option<String>,
        /// Description of the failure
        message: String,
    },

    /// Expression evaluation failure.
    Eval(ElError),

    /// Codec parse/serialize failure.
    Codec {
        /// Data format name (`TEXT`, `JSON`, `DELIMITED`, ...)
        format: String,
        /// Description of the failure
        message: String,
    },

    /// A field path failed to parse or resolve.
    FieldPath {
        /// The path text
        path: String,
        /// Description of the failure
        message: String,
    },

    /// Underlying I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Validation { issues } => {
                write!(f, "Validation failed with {} issue(s)", issues.len())?;
                for issue in issues {
                    write!(f, "; {}", issue)?;
                }
                Ok(())
            }
            PipelineError::Stage { stage, message } => {
                write!(f, "Stage error for '{}': {}", stage, message)
            }
            PipelineError::Record { source_id, message } => {
                if let Some(id) = source_id {
                    write!(f, "Record error for '{}': {}", id, message)
                } else {
                    write!(f, "Record error: {}", message)
                }
            }
            PipelineError::Eval(err) => write!(f, "{}", err),
            PipelineError::Codec { format, message } => {
                write!(f, "Codec error for {} format: {}", format, message)
            }
            PipelineError::FieldPath { path, message } => {
                write!(f, "invalid field path '{}': {}", path, message)
            }
            PipelineError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Eval(err) => Some(err),
            PipelineError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ElError> for PipelineError {
    fn from(err: ElError) -> Self {
        PipelineError::Eval(err)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl PipelineError {
    /// Create a stage error.
    pub fn stage_error(stage: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a record error.
    pub fn record_error(source_id: Option<String>, message: impl Into<String>) -> Self {
        PipelineError::Record {
            source_id,
            message: message.into(),
        }
    }

    /// Create a codec error.
    pub fn codec_error(format: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Codec {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create a field-path error.
    pub fn field_path_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::FieldPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a validation error from collected issues.
    pub fn validation(issues: Vec<ConfigIssue>) -> Self {
        PipelineError::Validation { issues }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for expression evaluation
pub type ElResult<T> = Result<T, ElError>;
