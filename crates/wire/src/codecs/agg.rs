//! Codecs for aggregation binners and bin grids.

use super::{require_int, require_number, require_object, require_str};
use crate::error::{Error, Result};
use crate::registry::Codec;
use crate::session::{DecodeOptions, Session};
use std::collections::BTreeMap;
use trellis_core::{Binner, DType, Datum, Grid, Value};

const BINNER: &str = "binner";

/// `binner`: one bin-grid axis as `{type, expression, datatype, ...}`.
///
/// The `datatype` field carries the axis's element descriptor, including the
/// `>`-prefixed form for identities built against non-native byte order; the
/// constructors act as the `(kind, dtype)` factory on decode.
pub struct BinnerCodec;

impl Codec for BinnerCodec {
    fn encode(&self, _session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        let Datum::Binner(binner) = value else {
            return Err(Error::UnsupportedValue {
                tag: BINNER,
                kind: value.type_name(),
            });
        };
        let mut obj = BTreeMap::new();
        obj.insert("type".to_string(), Value::from(binner.kind().as_str()));
        obj.insert(
            "expression".to_string(),
            Value::from(binner.expression().to_string()),
        );
        obj.insert(
            "datatype".to_string(),
            Value::from(binner.dtype().descriptor(binner.order())),
        );
        obj.insert("count".to_string(), Value::Int(binner.count()));
        match binner {
            Binner::Ordinal { minimum, .. } => {
                obj.insert("minimum".to_string(), Value::Int(*minimum));
            }
            Binner::Scalar {
                minimum, maximum, ..
            } => {
                obj.insert("minimum".to_string(), Value::Float(*minimum));
                obj.insert("maximum".to_string(), Value::Float(*maximum));
            }
        }
        Ok(Value::Object(obj))
    }

    fn decode(
        &self,
        _session: &mut Session<'_>,
        spec: &Value,
        _opts: &DecodeOptions,
    ) -> Result<Datum> {
        let obj = require_object(spec, BINNER)?;
        let kind = require_str(obj, "type", BINNER)?;
        let expression = require_str(obj, "expression", BINNER)?;
        let (dtype, order) = DType::parse_descriptor(require_str(obj, "datatype", BINNER)?)?;
        let count = require_int(obj, "count", BINNER)?;
        let binner = match kind {
            "ordinal" => Binner::ordinal(
                expression,
                dtype,
                order,
                count,
                require_int(obj, "minimum", BINNER)?,
            )?,
            "scalar" => Binner::scalar(
                expression,
                dtype,
                order,
                count,
                require_number(obj, "minimum", BINNER)?,
                require_number(obj, "maximum", BINNER)?,
            )?,
            other => {
                return Err(Error::format(format!(
                    "unrecognized binner kind {other:?}"
                )))
            }
        };
        Ok(Datum::Binner(binner))
    }
}

const GRID: &str = "grid";

/// `grid`: an ordered sequence of binners; sequence order is axis order.
pub struct GridCodec;

impl Codec for GridCodec {
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        let Datum::Grid(grid) = value else {
            return Err(Error::UnsupportedValue {
                tag: GRID,
                kind: value.type_name(),
            });
        };
        let axes: Vec<Datum> = grid.binners().iter().cloned().map(Datum::Binner).collect();
        Ok(Value::Array(session.encode_list("binner", &axes)?))
    }

    fn decode(
        &self,
        session: &mut Session<'_>,
        spec: &Value,
        opts: &DecodeOptions,
    ) -> Result<Datum> {
        let specs = spec
            .as_array()
            .ok_or_else(|| Error::format("grid spec must be an array"))?;
        let binners = session
            .decode_list("binner", specs, opts)?
            .into_iter()
            .map(|datum| match datum {
                Datum::Binner(binner) => Ok(binner),
                other => Err(Error::format(format!(
                    "grid axis decoded to a {} value",
                    other.type_name()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Datum::Grid(Grid::new(binners)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use trellis_core::ByteOrder;

    #[test]
    fn test_ordinal_binner_roundtrip() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let binner = Binner::ordinal("class", DType::Int32, ByteOrder::Native, 7, 1).unwrap();
        let spec = session.encode("binner", &Datum::Binner(binner.clone())).unwrap();
        assert_eq!(spec.get("type").and_then(Value::as_str), Some("ordinal"));
        assert_eq!(spec.get("datatype").and_then(Value::as_str), Some("int32"));
        assert_eq!(spec.get("minimum").and_then(Value::as_int), Some(1));
        match session.decode("binner", &spec).unwrap() {
            Datum::Binner(decoded) => assert_eq!(decoded, binner),
            other => panic!("expected binner, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_binner_roundtrip() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let binner =
            Binner::scalar("x", DType::Float64, ByteOrder::Native, 128, -1.0, 1.0).unwrap();
        let spec = session.encode("binner", &Datum::Binner(binner.clone())).unwrap();
        assert_eq!(spec.get("maximum").and_then(Value::as_float), Some(1.0));
        match session.decode("binner", &spec).unwrap() {
            Datum::Binner(decoded) => assert_eq!(decoded, binner),
            other => panic!("expected binner, got {other:?}"),
        }
    }

    #[test]
    fn test_swapped_order_survives_roundtrip() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let binner =
            Binner::scalar("x", DType::Float64, ByteOrder::Swapped, 16, 0.0, 4.0).unwrap();
        let spec = session.encode("binner", &Datum::Binner(binner.clone())).unwrap();
        assert_eq!(spec.get("datatype").and_then(Value::as_str), Some(">f8"));
        match session.decode("binner", &spec).unwrap() {
            Datum::Binner(decoded) => {
                assert_eq!(decoded.order(), ByteOrder::Swapped);
                assert_eq!(decoded, binner);
            }
            other => panic!("expected binner, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_binner_kind_rejected() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let binner = Binner::ordinal("c", DType::Int64, ByteOrder::Native, 2, 0).unwrap();
        let spec = session.encode("binner", &Datum::Binner(binner)).unwrap();
        let mut tampered = spec.as_object().unwrap().clone();
        tampered.insert("type".to_string(), Value::from("hexagonal"));
        let err = session.decode("binner", &Value::Object(tampered)).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_grid_preserves_axis_order() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let grid = Grid::new(vec![
            Binner::ordinal("class", DType::Int32, ByteOrder::Native, 3, 0).unwrap(),
            Binner::scalar("x", DType::Float64, ByteOrder::Native, 10, 0.0, 1.0).unwrap(),
        ]);
        let spec = session.encode("grid", &Datum::Grid(grid.clone())).unwrap();
        assert_eq!(spec.as_array().unwrap().len(), 2);
        match session.decode("grid", &spec).unwrap() {
            Datum::Grid(decoded) => assert_eq!(decoded, grid),
            other => panic!("expected grid, got {other:?}"),
        }
    }
}
