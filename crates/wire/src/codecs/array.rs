//! Codecs for dense buffers, typed scalars, and dtype tags.

use super::{require_field, require_int, require_object, require_str, type_wrapper};
use crate::error::{Error, Result};
use crate::registry::Codec;
use crate::session::{DecodeOptions, Session};
use std::collections::BTreeMap;
use trellis_core::{ArrayData, DType, Datum, NdArray, Scalar, ScalarValue, Value};

/// `array`: kind-dispatching wrapper around the concrete array codecs.
///
/// Dense buffers, columnar arrays, and plain numbers each get a
/// `{type, data}` discriminant; anything else is rejected.
pub struct ArrayCodec;

const ARRAY: &str = "array";

impl Codec for ArrayCodec {
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        match value {
            Datum::Nd(_) => Ok(type_wrapper(
                "native-array",
                session.encode("native-array", value)?,
            )),
            Datum::Column(_) => Ok(type_wrapper(
                "arrow-array",
                session.encode("arrow-array", value)?,
            )),
            Datum::Json(number @ (Value::Int(_) | Value::Float(_))) => {
                Ok(type_wrapper("json", number.clone()))
            }
            other => Err(Error::UnsupportedValue {
                tag: ARRAY,
                kind: other.type_name(),
            }),
        }
    }

    fn decode(
        &self,
        session: &mut Session<'_>,
        spec: &Value,
        opts: &DecodeOptions,
    ) -> Result<Datum> {
        let obj = require_object(spec, ARRAY)?;
        let branch = require_str(obj, "type", ARRAY)?;
        let data = require_field(obj, "data", ARRAY)?;
        session.decode_with(branch, data, opts)
    }
}

/// `native-array`: dense N-dimensional buffers, optionally masked.
///
/// Fixed-width elements travel as one blob; object-typed elements travel as
/// a plain JSON list. Temporal buffers already hold their 64-bit ticks, so
/// the raw bytes go out unchanged and the dtype string alone recovers the
/// resolution on decode. A mask, when present, is a second blob.
pub struct NativeArrayCodec;

const NATIVE_ARRAY: &str = "native-array";

impl Codec for NativeArrayCodec {
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        let Datum::Nd(array) = value else {
            return Err(Error::UnsupportedValue {
                tag: NATIVE_ARRAY,
                kind: value.type_name(),
            });
        };
        let mut obj = BTreeMap::new();
        obj.insert(
            "shape".to_string(),
            Value::Array(array.shape().iter().map(|&n| Value::Int(n as i64)).collect()),
        );
        obj.insert(
            "dtype".to_string(),
            session.encode("dtype", &Datum::DType(array.dtype()))?,
        );
        match array.data() {
            ArrayData::Objects(values) => {
                obj.insert("values".to_string(), Value::Array(values.clone()));
            }
            ArrayData::Buffer(buffer) => {
                obj.insert("values".to_string(), Value::String(session.add_blob(buffer)));
            }
        }
        if let Some(mask) = array.mask() {
            obj.insert("mask".to_string(), Value::String(session.add_blob(mask)));
        }
        Ok(Value::Object(obj))
    }

    fn decode(
        &self,
        session: &mut Session<'_>,
        spec: &Value,
        opts: &DecodeOptions,
    ) -> Result<Datum> {
        let obj = require_object(spec, NATIVE_ARRAY)?;
        let dtype = decode_dtype(session, require_field(obj, "dtype", NATIVE_ARRAY)?, opts)?;
        let shape = require_field(obj, "shape", NATIVE_ARRAY)?
            .as_array()
            .ok_or_else(|| Error::format("native-array shape must be an array"))?
            .iter()
            .map(|entry| {
                entry
                    .as_int()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| {
                        Error::format("native-array shape entries must be non-negative integers")
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        let values = require_field(obj, "values", NATIVE_ARRAY)?;
        let array = if dtype == DType::Object {
            let items = values
                .as_array()
                .ok_or_else(|| Error::format("object-typed native-array values must be a list"))?;
            NdArray::of_objects(shape, items.to_vec())
                .map_err(|e| Error::format(e.to_string()))?
        } else {
            let reference = values
                .as_str()
                .ok_or_else(|| Error::format("native-array values must be a blob reference"))?;
            let buffer = session.get_blob(reference)?.to_vec();
            NdArray::from_raw(dtype, shape, buffer).map_err(|e| Error::format(e.to_string()))?
        };

        let array = match obj.get("mask") {
            Some(mask_spec) => {
                let reference = mask_spec
                    .as_str()
                    .ok_or_else(|| Error::format("native-array mask must be a blob reference"))?;
                let mask = session.get_blob(reference)?.to_vec();
                array
                    .with_mask_bytes(mask)
                    .map_err(|e| Error::format(e.to_string()))?
            }
            None => array,
        };
        Ok(Datum::Nd(array))
    }
}

/// `numeric-scalar`: a single typed value as `{value, dtype}`.
///
/// Temporal scalars travel as their integer epoch tick count.
pub struct NumericScalarCodec;

const NUMERIC_SCALAR: &str = "numeric-scalar";

impl Codec for NumericScalarCodec {
    fn encode(&self, session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        let Datum::Scalar(scalar) = value else {
            return Err(Error::UnsupportedValue {
                tag: NUMERIC_SCALAR,
                kind: value.type_name(),
            });
        };
        let encoded = match scalar.value() {
            ScalarValue::Bool(b) => Value::Bool(b),
            ScalarValue::Int(i) => Value::Int(i),
            ScalarValue::UInt(u) => {
                if u <= i64::MAX as u64 {
                    Value::Int(u as i64)
                } else {
                    return Err(Error::format(
                        "unsigned scalar exceeds the wire integer range",
                    ));
                }
            }
            ScalarValue::Float(f) => Value::Float(f),
        };
        let mut obj = BTreeMap::new();
        obj.insert("value".to_string(), encoded);
        obj.insert(
            "dtype".to_string(),
            session.encode("dtype", &Datum::DType(scalar.dtype()))?,
        );
        Ok(Value::Object(obj))
    }

    fn decode(
        &self,
        session: &mut Session<'_>,
        spec: &Value,
        opts: &DecodeOptions,
    ) -> Result<Datum> {
        let obj = require_object(spec, NUMERIC_SCALAR)?;
        let dtype = decode_dtype(session, require_field(obj, "dtype", NUMERIC_SCALAR)?, opts)?;
        let value = require_field(obj, "value", NUMERIC_SCALAR)?;
        let payload = match dtype {
            DType::Bool => ScalarValue::Bool(
                value
                    .as_bool()
                    .ok_or_else(|| Error::format("bool scalar value must be a boolean"))?,
            ),
            DType::Int8
            | DType::Int16
            | DType::Int32
            | DType::Int64
            | DType::Datetime64(_)
            | DType::Timedelta64(_) => ScalarValue::Int(
                value
                    .as_int()
                    .ok_or_else(|| Error::format("integer scalar value must be an integer"))?,
            ),
            DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64 => {
                let raw = value
                    .as_int()
                    .filter(|&n| n >= 0)
                    .ok_or_else(|| {
                        Error::format("unsigned scalar value must be a non-negative integer")
                    })?;
                ScalarValue::UInt(raw as u64)
            }
            DType::Float32 | DType::Float64 => ScalarValue::Float(
                value
                    .as_number()
                    .ok_or_else(|| Error::format("float scalar value must be a number"))?,
            ),
            DType::Utf8 | DType::LargeUtf8 | DType::TimestampMs | DType::Object => {
                return Err(Error::format(format!(
                    "numeric-scalar cannot carry dtype {dtype}"
                )))
            }
        };
        Ok(Datum::Scalar(Scalar::new(dtype, payload)))
    }
}

/// `dtype`: canonical element-type strings.
pub struct DTypeCodec;

const DTYPE: &str = "dtype";

impl Codec for DTypeCodec {
    fn encode(&self, _session: &mut Session<'_>, value: &Datum) -> Result<Value> {
        match value {
            Datum::DType(dtype) => Ok(Value::String(dtype.canonical())),
            other => Err(Error::UnsupportedValue {
                tag: DTYPE,
                kind: other.type_name(),
            }),
        }
    }

    fn decode(
        &self,
        _session: &mut Session<'_>,
        spec: &Value,
        _opts: &DecodeOptions,
    ) -> Result<Datum> {
        let descriptor = spec
            .as_str()
            .ok_or_else(|| Error::format("dtype spec must be a string"))?;
        // Parse failures propagate as-is.
        Ok(Datum::DType(DType::parse(descriptor)?))
    }
}

fn decode_dtype(
    session: &mut Session<'_>,
    spec: &Value,
    opts: &DecodeOptions,
) -> Result<DType> {
    match session.decode_with("dtype", spec, opts)? {
        Datum::DType(dtype) => Ok(dtype),
        other => Err(Error::format(format!(
            "dtype decode produced a {} value",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::Registry;
    use crate::session::Session;
    use trellis_core::{DType, Datum, NdArray, Scalar, ScalarValue, TimeUnit, Value};

    fn roundtrip_nd(array: NdArray) -> NdArray {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let spec = session.encode("array", &Datum::Nd(array)).unwrap();
        match session.decode("array", &spec).unwrap() {
            Datum::Nd(decoded) => decoded,
            other => panic!("expected dense array, got {other:?}"),
        }
    }

    #[test]
    fn test_dense_int_array_wire_shape() {
        // A dense [1, 2, 3] int64 array: shape, canonical dtype, values blob.
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let array = NdArray::from_vec(vec![1i64, 2, 3]);
        let spec = session.encode("native-array", &Datum::Nd(array.clone())).unwrap();

        assert_eq!(
            spec.get("shape").unwrap(),
            &Value::Array(vec![Value::Int(3)])
        );
        assert_eq!(spec.get("dtype").and_then(Value::as_str), Some("int64"));
        assert!(spec
            .get("values")
            .and_then(Value::as_str)
            .unwrap()
            .starts_with("blob:"));
        assert!(spec.get("mask").is_none());

        match session.decode("native-array", &spec).unwrap() {
            Datum::Nd(decoded) => assert_eq!(decoded, array),
            other => panic!("expected dense array, got {other:?}"),
        }
    }

    #[test]
    fn test_masked_array_roundtrip() {
        let array = NdArray::from_vec(vec![1.5f64, 2.5, 3.5])
            .with_mask(vec![false, true, false])
            .unwrap();

        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let spec = session.encode("native-array", &Datum::Nd(array.clone())).unwrap();
        assert!(spec.get("values").and_then(Value::as_str).is_some());
        assert!(spec.get("mask").and_then(Value::as_str).is_some());

        match session.decode("native-array", &spec).unwrap() {
            Datum::Nd(decoded) => {
                assert_eq!(decoded, array);
                assert_eq!(decoded.mask_bools().unwrap(), vec![false, true, false]);
            }
            other => panic!("expected dense array, got {other:?}"),
        }
    }

    #[test]
    fn test_bool_and_multidim_roundtrip() {
        let bools = NdArray::from_vec(vec![true, false, true, true]);
        assert_eq!(roundtrip_nd(bools.clone()), bools);

        let matrix = NdArray::from_shape_vec(vec![2, 3], vec![1i32, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(roundtrip_nd(matrix.clone()), matrix);
    }

    #[test]
    fn test_temporal_array_recovers_unit_from_dtype() {
        let ticks: Vec<i64> = vec![1_600_000_000_000_000_000, 1_700_000_000_000_000_000];
        let mut buffer = Vec::new();
        for t in &ticks {
            buffer.extend_from_slice(&t.to_ne_bytes());
        }
        let array =
            NdArray::from_raw(DType::Datetime64(TimeUnit::Ns), vec![2], buffer).unwrap();

        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let spec = session.encode("native-array", &Datum::Nd(array.clone())).unwrap();
        assert_eq!(
            spec.get("dtype").and_then(Value::as_str),
            Some("datetime64[ns]")
        );
        match session.decode("native-array", &spec).unwrap() {
            Datum::Nd(decoded) => assert_eq!(decoded, array),
            other => panic!("expected dense array, got {other:?}"),
        }
    }

    #[test]
    fn test_object_array_inlines_values() {
        let array = NdArray::of_objects(
            vec![3],
            vec![Value::from("a"), Value::Null, Value::Int(7)],
        )
        .unwrap();

        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let spec = session.encode("native-array", &Datum::Nd(array.clone())).unwrap();
        // Object elements cannot pack into a blob: they ride in the tree.
        assert!(spec.get("values").and_then(Value::as_array).is_some());
        assert_eq!(session.blob_count(), 0);

        match session.decode("native-array", &spec).unwrap() {
            Datum::Nd(decoded) => assert_eq!(decoded, array),
            other => panic!("expected dense array, got {other:?}"),
        }
    }

    #[test]
    fn test_array_dispatches_plain_numbers() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let spec = session.encode("array", &Datum::Json(Value::Float(2.5))).unwrap();
        assert_eq!(spec.get("type").and_then(Value::as_str), Some("json"));
        match session.decode("array", &spec).unwrap() {
            Datum::Json(value) => assert_eq!(value, Value::Float(2.5)),
            other => panic!("expected json, got {other:?}"),
        }
    }

    #[test]
    fn test_array_rejects_unsupported_kinds() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let err = session
            .encode("array", &Datum::Json(Value::from("not a number")))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::UnsupportedValue { tag: "array", .. }
        ));
    }

    #[test]
    fn test_scalar_roundtrip() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        for scalar in [
            Scalar::int64(-42),
            Scalar::uint64(7),
            Scalar::float64(2.5),
            Scalar::bool(true),
            Scalar::datetime(TimeUnit::Ms, 1_600_000_000_000),
        ] {
            let spec = session.encode("numeric-scalar", &Datum::Scalar(scalar)).unwrap();
            match session.decode("numeric-scalar", &spec).unwrap() {
                Datum::Scalar(decoded) => assert_eq!(decoded, scalar),
                other => panic!("expected scalar, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_temporal_scalar_encodes_epoch_int() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let scalar = Scalar::datetime(TimeUnit::Ms, 1_600_000_000_000);
        let spec = session.encode("numeric-scalar", &Datum::Scalar(scalar)).unwrap();
        assert_eq!(
            spec.get("value").and_then(Value::as_int),
            Some(1_600_000_000_000)
        );
        assert_eq!(
            spec.get("dtype").and_then(Value::as_str),
            Some("datetime64[ms]")
        );
    }

    #[test]
    fn test_scalar_nan_roundtrip() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let spec = session
            .encode("numeric-scalar", &Datum::Scalar(Scalar::float64(f64::NAN)))
            .unwrap();
        match session.decode("numeric-scalar", &spec).unwrap() {
            Datum::Scalar(decoded) => match decoded.value() {
                ScalarValue::Float(f) => assert!(f.is_nan()),
                other => panic!("expected float payload, got {other:?}"),
            },
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[test]
    fn test_dtype_codec() {
        let registry = Registry::with_defaults();
        let mut session = Session::new(&registry);
        let spec = session.encode("dtype", &Datum::DType(DType::Float32)).unwrap();
        assert_eq!(spec, Value::from("float32"));

        match session.decode("dtype", &Value::from("timestamp[ms]")).unwrap() {
            Datum::DType(dtype) => assert_eq!(dtype, DType::TimestampMs),
            other => panic!("expected dtype, got {other:?}"),
        }

        let err = session.decode("dtype", &Value::from("complex64")).unwrap_err();
        assert!(matches!(err, crate::error::Error::DType(_)));
    }
}
