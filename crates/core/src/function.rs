//! Serialized user functions and the trust boundary guarding them.
//!
//! A function travels either as an expression in the engine's expression
//! language or as a reference to a native symbol registered in the host
//! process. Rebuilding one from wire data can end up executing logic the
//! sender chose, so [`Function::from_spec`] takes an explicit [`Trust`]
//! value: `Untrusted` refuses to materialize either source kind. There is
//! deliberately no default.

use crate::value::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Whether wire-supplied executable payloads may be materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trust {
    /// The peer is trusted; functions may be rebuilt.
    Trusted,
    /// The peer is untrusted; function payloads are refused.
    Untrusted,
}

/// Failure to rebuild a function from its dictionary form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    /// The session is untrusted and refused the payload.
    #[error("refusing to materialize a function from an untrusted source")]
    Untrusted,
    /// The `kind` field named a source kind this factory does not know.
    #[error("unknown function source kind: {kind:?}")]
    UnknownKind {
        /// The offending kind string.
        kind: String,
    },
    /// A required field was absent or had the wrong shape.
    #[error("function spec is missing or malformed at field {field:?}")]
    InvalidField {
        /// The offending field name.
        field: &'static str,
    },
}

/// Where a function's logic comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionSource {
    /// An expression in the engine's expression language.
    Expression(String),
    /// A native symbol registered in the host process.
    Native {
        /// Module the symbol lives in.
        module: String,
        /// Symbol name within the module.
        symbol: String,
    },
}

/// A named user function in its transportable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Name the function is bound to in the dataframe.
    pub name: String,
    /// The function's logic.
    pub source: FunctionSource,
}

impl Function {
    /// A function backed by an engine expression.
    pub fn expression(name: impl Into<String>, expression: impl Into<String>) -> Function {
        Function {
            name: name.into(),
            source: FunctionSource::Expression(expression.into()),
        }
    }

    /// A function backed by a registered native symbol.
    pub fn native(
        name: impl Into<String>,
        module: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Function {
        Function {
            name: name.into(),
            source: FunctionSource::Native {
                module: module.into(),
                symbol: symbol.into(),
            },
        }
    }

    /// Export the dictionary form.
    pub fn to_spec(&self) -> Value {
        let mut obj = BTreeMap::new();
        obj.insert("name".to_string(), Value::from(self.name.clone()));
        match &self.source {
            FunctionSource::Expression(expression) => {
                obj.insert("kind".to_string(), Value::from("expression"));
                obj.insert("expression".to_string(), Value::from(expression.clone()));
            }
            FunctionSource::Native { module, symbol } => {
                obj.insert("kind".to_string(), Value::from("native"));
                obj.insert("module".to_string(), Value::from(module.clone()));
                obj.insert("symbol".to_string(), Value::from(symbol.clone()));
            }
        }
        Value::Object(obj)
    }

    /// Rebuild a function from its dictionary form.
    ///
    /// This is the single point where wire data becomes something callable;
    /// `trust` must be stated by the caller every time.
    pub fn from_spec(spec: &Value, trust: Trust) -> Result<Function, FunctionError> {
        if trust == Trust::Untrusted {
            return Err(FunctionError::Untrusted);
        }
        let field = |name: &'static str| -> Result<String, FunctionError> {
            spec.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(FunctionError::InvalidField { field: name })
        };
        let name = field("name")?;
        let kind = field("kind")?;
        match kind.as_str() {
            "expression" => Ok(Function {
                name,
                source: FunctionSource::Expression(field("expression")?),
            }),
            "native" => Ok(Function {
                name,
                source: FunctionSource::Native {
                    module: field("module")?,
                    symbol: field("symbol")?,
                },
            }),
            other => Err(FunctionError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}
