//! Dense N-dimensional buffers, the in-memory form of non-columnar results.
//!
//! An [`NdArray`] owns its element bytes in native order plus an optional
//! one-byte-per-element mask (nonzero = masked). Equality is byte-exact,
//! mask included, which is exactly what the wire round-trip guarantees.
//! Object-typed arrays cannot be packed as raw bytes and carry their
//! elements as plain JSON values instead.

use crate::dtype::DType;
use crate::value::Value;
use thiserror::Error;

/// Construction or element-access failure for dense buffers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArrayError {
    /// Buffer or element list length does not match the declared shape.
    #[error("buffer holds {actual} bytes but shape {shape:?} of {dtype} needs {expected}")]
    LengthMismatch {
        /// Expected byte or element count.
        expected: usize,
        /// Actual byte or element count.
        actual: usize,
        /// Declared shape.
        shape: Vec<usize>,
        /// Declared element type.
        dtype: DType,
    },
    /// Mask length does not match the element count.
    #[error("mask holds {actual} entries but the array has {expected} elements")]
    MaskLengthMismatch {
        /// Element count of the array.
        expected: usize,
        /// Entries in the provided mask.
        actual: usize,
    },
    /// The dtype has no fixed-width dense layout.
    #[error("dtype {dtype} has no fixed-width buffer form")]
    NotFixedWidth {
        /// The offending element type.
        dtype: DType,
    },
    /// Typed read with the wrong element type.
    #[error("array holds {actual} elements, not {requested}")]
    DTypeMismatch {
        /// The array's element type.
        actual: DType,
        /// The element type requested by the caller.
        requested: DType,
    },
}

/// Element storage: raw native-order bytes, or JSON values for object dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    /// Packed fixed-width elements.
    Buffer(Vec<u8>),
    /// One JSON value per element, row-major.
    Objects(Vec<Value>),
}

/// A dense N-dimensional array with an optional element mask.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    dtype: DType,
    shape: Vec<usize>,
    data: ArrayData,
    mask: Option<Vec<u8>>,
}

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width element types that can live in an [`NdArray`] buffer.
///
/// Sealed: the set of element types is closed alongside [`DType`].
pub trait Element: sealed::Sealed + Copy {
    /// The dtype tag for this element type.
    const DTYPE: DType;
    /// Append the native-order bytes of `self`.
    fn write_to(self, out: &mut Vec<u8>);
    /// Read one element from exactly `size_of::<Self>()` bytes.
    fn read_from(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:expr),+ $(,)?) => {$(
        impl sealed::Sealed for $ty {}
        impl Element for $ty {
            const DTYPE: DType = $dtype;
            fn write_to(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_ne_bytes());
            }
            fn read_from(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_ne_bytes(raw)
            }
        }
    )+};
}

impl_element! {
    i8 => DType::Int8,
    i16 => DType::Int16,
    i32 => DType::Int32,
    i64 => DType::Int64,
    u8 => DType::UInt8,
    u16 => DType::UInt16,
    u32 => DType::UInt32,
    u64 => DType::UInt64,
    f32 => DType::Float32,
    f64 => DType::Float64,
}

impl sealed::Sealed for bool {}
impl Element for bool {
    const DTYPE: DType = DType::Bool;
    fn write_to(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }
    fn read_from(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

impl NdArray {
    /// One-dimensional array from a typed vector.
    pub fn from_vec<T: Element>(values: Vec<T>) -> NdArray {
        let shape = vec![values.len()];
        let mut buffer = Vec::with_capacity(values.len() * T::DTYPE.size().unwrap_or(0));
        for value in values {
            value.write_to(&mut buffer);
        }
        NdArray {
            dtype: T::DTYPE,
            shape,
            data: ArrayData::Buffer(buffer),
            mask: None,
        }
    }

    /// Array of the given shape from a row-major typed vector.
    pub fn from_shape_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> Result<NdArray, ArrayError> {
        let expected = element_count(&shape);
        if values.len() != expected {
            return Err(ArrayError::LengthMismatch {
                expected,
                actual: values.len(),
                shape,
                dtype: T::DTYPE,
            });
        }
        let mut buffer = Vec::with_capacity(values.len() * T::DTYPE.size().unwrap_or(0));
        for value in values {
            value.write_to(&mut buffer);
        }
        Ok(NdArray {
            dtype: T::DTYPE,
            shape,
            data: ArrayData::Buffer(buffer),
            mask: None,
        })
    }

    /// Array from a pre-packed native-order buffer.
    ///
    /// This is how temporal arrays are built: 64-bit tick buffers under a
    /// `datetime64[..]` / `timedelta64[..]` dtype.
    pub fn from_raw(dtype: DType, shape: Vec<usize>, buffer: Vec<u8>) -> Result<NdArray, ArrayError> {
        let Some(width) = dtype.size() else {
            return Err(ArrayError::NotFixedWidth { dtype });
        };
        let expected = element_count(&shape) * width;
        if buffer.len() != expected {
            return Err(ArrayError::LengthMismatch {
                expected,
                actual: buffer.len(),
                shape,
                dtype,
            });
        }
        Ok(NdArray {
            dtype,
            shape,
            data: ArrayData::Buffer(buffer),
            mask: None,
        })
    }

    /// Object-typed array from one JSON value per element.
    pub fn of_objects(shape: Vec<usize>, values: Vec<Value>) -> Result<NdArray, ArrayError> {
        let expected = element_count(&shape);
        if values.len() != expected {
            return Err(ArrayError::LengthMismatch {
                expected,
                actual: values.len(),
                shape,
                dtype: DType::Object,
            });
        }
        Ok(NdArray {
            dtype: DType::Object,
            shape,
            data: ArrayData::Objects(values),
            mask: None,
        })
    }

    /// Attach a mask, one flag per element, `true` = masked.
    pub fn with_mask(self, mask: Vec<bool>) -> Result<NdArray, ArrayError> {
        self.with_mask_bytes(mask.into_iter().map(|m| m as u8).collect())
    }

    /// Attach a mask from raw bytes, one byte per element, nonzero = masked.
    pub fn with_mask_bytes(mut self, mask: Vec<u8>) -> Result<NdArray, ArrayError> {
        let expected = self.len();
        if mask.len() != expected {
            return Err(ArrayError::MaskLengthMismatch {
                expected,
                actual: mask.len(),
            });
        }
        self.mask = Some(mask);
        Ok(self)
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Shape, row-major.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        element_count(&self.shape)
    }

    /// True when the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element storage.
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Raw mask bytes, if the array is masked.
    pub fn mask(&self) -> Option<&[u8]> {
        self.mask.as_deref()
    }

    /// Mask as booleans, if the array is masked.
    pub fn mask_bools(&self) -> Option<Vec<bool>> {
        self.mask.as_ref().map(|m| m.iter().map(|&b| b != 0).collect())
    }

    /// True when a mask is attached.
    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Read the elements back as a typed vector.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, ArrayError> {
        if self.dtype != T::DTYPE {
            return Err(ArrayError::DTypeMismatch {
                actual: self.dtype,
                requested: T::DTYPE,
            });
        }
        let ArrayData::Buffer(buffer) = &self.data else {
            return Err(ArrayError::NotFixedWidth { dtype: self.dtype });
        };
        let width = std::mem::size_of::<T>().max(1);
        Ok(buffer.chunks_exact(width).map(T::read_from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_roundtrip() {
        let array = NdArray::from_vec(vec![1i64, 2, 3]);
        assert_eq!(array.dtype(), DType::Int64);
        assert_eq!(array.shape(), &[3]);
        assert_eq!(array.to_vec::<i64>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = NdArray::from_shape_vec(vec![2, 2], vec![1i32, 2, 3]).unwrap_err();
        assert!(matches!(err, ArrayError::LengthMismatch { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn test_bool_elements() {
        let array = NdArray::from_vec(vec![true, false, true]);
        assert_eq!(array.dtype(), DType::Bool);
        assert_eq!(array.to_vec::<bool>().unwrap(), vec![true, false, true]);
    }

    #[test]
    fn test_mask_attaches() {
        let array = NdArray::from_vec(vec![1.0f64, 2.0, 3.0])
            .with_mask(vec![false, true, false])
            .unwrap();
        assert!(array.is_masked());
        assert_eq!(array.mask_bools().unwrap(), vec![false, true, false]);
    }

    #[test]
    fn test_mask_length_checked() {
        let err = NdArray::from_vec(vec![1i8, 2]).with_mask(vec![true]).unwrap_err();
        assert!(matches!(err, ArrayError::MaskLengthMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_from_raw_temporal() {
        let ticks: Vec<i64> = vec![0, 1_600_000_000_000_000_000];
        let mut buffer = Vec::new();
        for t in &ticks {
            buffer.extend_from_slice(&t.to_ne_bytes());
        }
        let array = NdArray::from_raw(
            DType::Datetime64(crate::dtype::TimeUnit::Ns),
            vec![2],
            buffer,
        )
        .unwrap();
        assert_eq!(array.len(), 2);
        assert!(array.dtype().is_temporal());
    }

    #[test]
    fn test_from_raw_rejects_bad_length() {
        let err = NdArray::from_raw(DType::Int32, vec![3], vec![0u8; 11]).unwrap_err();
        assert!(matches!(err, ArrayError::LengthMismatch { expected: 12, actual: 11, .. }));
    }

    #[test]
    fn test_object_array() {
        let values = vec![Value::from("a"), Value::Null, Value::Int(3)];
        let array = NdArray::of_objects(vec![3], values.clone()).unwrap();
        assert_eq!(array.dtype(), DType::Object);
        assert!(matches!(array.data(), ArrayData::Objects(v) if v == &values));
    }

    #[test]
    fn test_typed_read_rejects_wrong_dtype() {
        let array = NdArray::from_vec(vec![1i64, 2]);
        let err = array.to_vec::<f64>().unwrap_err();
        assert!(matches!(err, ArrayError::DTypeMismatch { .. }));
    }

    #[test]
    fn test_byte_exact_equality() {
        let a = NdArray::from_vec(vec![1u32, 2, 3]);
        let b = NdArray::from_vec(vec![1u32, 2, 3]);
        let c = NdArray::from_vec(vec![1u32, 2, 4]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
