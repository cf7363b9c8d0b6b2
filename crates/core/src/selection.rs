//! Named row-filter predicates and their canonical dictionary form.
//!
//! Selections are defined and evaluated by the engine; this module only
//! carries their wire contract: `to_spec` exports the canonical dictionary,
//! `from_spec` is the dispatch factory keyed on the dictionary's `type`
//! field. Selections chain: most kinds carry the previous selection they
//! combine with.

use crate::value::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure to rebuild a selection from its dictionary form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The `type` field named a kind this factory does not know.
    #[error("unknown selection kind: {kind:?}")]
    UnknownKind {
        /// The offending kind string.
        kind: String,
    },
    /// A required field was absent or had the wrong shape.
    #[error("selection spec is missing or malformed at field {field:?}")]
    InvalidField {
        /// The offending field name.
        field: &'static str,
    },
}

fn invalid(field: &'static str) -> SelectionError {
    SelectionError::InvalidField { field }
}

/// How a selection combines with the previous one in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Discard the previous selection.
    #[default]
    Replace,
    /// Logical and with the previous selection.
    And,
    /// Logical or with the previous selection.
    Or,
    /// Logical xor with the previous selection.
    Xor,
    /// Remove the new rows from the previous selection.
    Subtract,
}

impl SelectionMode {
    /// The wire string for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Replace => "replace",
            SelectionMode::And => "and",
            SelectionMode::Or => "or",
            SelectionMode::Xor => "xor",
            SelectionMode::Subtract => "subtract",
        }
    }

    fn parse(s: &str) -> Option<SelectionMode> {
        match s {
            "replace" => Some(SelectionMode::Replace),
            "and" => Some(SelectionMode::And),
            "or" => Some(SelectionMode::Or),
            "xor" => Some(SelectionMode::Xor),
            "subtract" => Some(SelectionMode::Subtract),
            _ => None,
        }
    }
}

/// A row-filter predicate over a dataframe.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Rows matching a boolean expression.
    Expression {
        /// The boolean expression, in the engine's expression language.
        expression: String,
        /// Combination with the previous selection.
        mode: SelectionMode,
        /// The selection this one chains onto.
        previous: Option<Box<Selection>>,
    },
    /// Rows inside a closed polygon over two expressions.
    Lasso {
        /// Expression for the horizontal coordinate.
        x: String,
        /// Expression for the vertical coordinate.
        y: String,
        /// Polygon vertex x coordinates.
        xs: Vec<f64>,
        /// Polygon vertex y coordinates.
        ys: Vec<f64>,
        /// Combination with the previous selection.
        mode: SelectionMode,
        /// The selection this one chains onto.
        previous: Option<Box<Selection>>,
    },
    /// The complement of another selection.
    Inverse {
        /// The selection being inverted.
        inner: Box<Selection>,
    },
    /// Rows with no missing values in the named columns.
    DropMissing {
        /// Columns to check; empty means all columns.
        columns: Vec<String>,
    },
}

impl Selection {
    /// The kind string used in the canonical dictionary.
    pub fn kind(&self) -> &'static str {
        match self {
            Selection::Expression { .. } => "expression",
            Selection::Lasso { .. } => "lasso",
            Selection::Inverse { .. } => "inverse",
            Selection::DropMissing { .. } => "dropmissing",
        }
    }

    /// Export the canonical dictionary form.
    pub fn to_spec(&self) -> Value {
        let mut obj = BTreeMap::new();
        obj.insert("type".to_string(), Value::from(self.kind()));
        match self {
            Selection::Expression {
                expression,
                mode,
                previous,
            } => {
                obj.insert("expression".to_string(), Value::from(expression.clone()));
                obj.insert("mode".to_string(), Value::from(mode.as_str()));
                obj.insert("previous".to_string(), previous_spec(previous));
            }
            Selection::Lasso {
                x,
                y,
                xs,
                ys,
                mode,
                previous,
            } => {
                obj.insert("x".to_string(), Value::from(x.clone()));
                obj.insert("y".to_string(), Value::from(y.clone()));
                obj.insert("xs".to_string(), float_list(xs));
                obj.insert("ys".to_string(), float_list(ys));
                obj.insert("mode".to_string(), Value::from(mode.as_str()));
                obj.insert("previous".to_string(), previous_spec(previous));
            }
            Selection::Inverse { inner } => {
                obj.insert("selection".to_string(), inner.to_spec());
            }
            Selection::DropMissing { columns } => {
                obj.insert(
                    "columns".to_string(),
                    Value::Array(columns.iter().map(|c| Value::from(c.clone())).collect()),
                );
            }
        }
        Value::Object(obj)
    }

    /// Rebuild a selection from its dictionary form, dispatching on `type`.
    pub fn from_spec(spec: &Value) -> Result<Selection, SelectionError> {
        let kind = spec
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("type"))?;
        match kind {
            "expression" => Ok(Selection::Expression {
                expression: string_field(spec, "expression")?,
                mode: mode_field(spec)?,
                previous: previous_field(spec)?,
            }),
            "lasso" => Ok(Selection::Lasso {
                x: string_field(spec, "x")?,
                y: string_field(spec, "y")?,
                xs: float_field(spec, "xs")?,
                ys: float_field(spec, "ys")?,
                mode: mode_field(spec)?,
                previous: previous_field(spec)?,
            }),
            "inverse" => {
                let inner = spec.get("selection").ok_or_else(|| invalid("selection"))?;
                Ok(Selection::Inverse {
                    inner: Box::new(Selection::from_spec(inner)?),
                })
            }
            "dropmissing" => {
                let columns = spec
                    .get("columns")
                    .and_then(Value::as_array)
                    .ok_or_else(|| invalid("columns"))?
                    .iter()
                    .map(|c| c.as_str().map(str::to_string).ok_or_else(|| invalid("columns")))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Selection::DropMissing { columns })
            }
            other => Err(SelectionError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

fn previous_spec(previous: &Option<Box<Selection>>) -> Value {
    match previous {
        Some(selection) => selection.to_spec(),
        None => Value::Null,
    }
}

fn float_list(values: &[f64]) -> Value {
    Value::Array(values.iter().map(|&v| Value::Float(v)).collect())
}

fn string_field(spec: &Value, field: &'static str) -> Result<String, SelectionError> {
    spec.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid(field))
}

fn mode_field(spec: &Value) -> Result<SelectionMode, SelectionError> {
    let mode = spec
        .get("mode")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("mode"))?;
    SelectionMode::parse(mode).ok_or_else(|| invalid("mode"))
}

fn previous_field(spec: &Value) -> Result<Option<Box<Selection>>, SelectionError> {
    match spec.get("previous") {
        None | Some(Value::Null) => Ok(None),
        Some(previous) => Ok(Some(Box::new(Selection::from_spec(previous)?))),
    }
}

fn float_field(spec: &Value, field: &'static str) -> Result<Vec<f64>, SelectionError> {
    spec.get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(field))?
        .iter()
        .map(|v| v.as_number().ok_or_else(|| invalid(field)))
        .collect()
}
