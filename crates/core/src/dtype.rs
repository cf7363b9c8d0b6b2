//! Element-type tags for dense buffers, scalars, and binner axes.
//!
//! `DType` is a closed enumeration: every codec that branches on an element
//! type matches it exhaustively, so adding a kind is a compile-time event.
//! The wire carries the canonical string form (`"int64"`, `"datetime64[ns]"`,
//! `"string"`); byte-swapped descriptors (`">f8"`) only occur inside binner
//! identities and are parsed alongside a [`ByteOrder`] marker.

use thiserror::Error;

/// Failure to parse a dtype descriptor string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized dtype descriptor: {descriptor:?}")]
pub struct DTypeParseError {
    /// The descriptor that failed to parse.
    pub descriptor: String,
}

impl DTypeParseError {
    fn new(descriptor: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
        }
    }
}

/// Resolution of a temporal element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Seconds.
    S,
    /// Milliseconds.
    Ms,
    /// Microseconds.
    Us,
    /// Nanoseconds.
    Ns,
}

impl TimeUnit {
    /// The unit suffix used inside `datetime64[..]` / `timedelta64[..]`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::S => "s",
            TimeUnit::Ms => "ms",
            TimeUnit::Us => "us",
            TimeUnit::Ns => "ns",
        }
    }

    fn parse(s: &str) -> Option<TimeUnit> {
        match s {
            "s" => Some(TimeUnit::S),
            "ms" => Some(TimeUnit::Ms),
            "us" => Some(TimeUnit::Us),
            "ns" => Some(TimeUnit::Ns),
            _ => None,
        }
    }
}

/// Byte order of a fixed-width element buffer.
///
/// Trellis buffers are always produced in native order; `Swapped` survives
/// only inside binner identities that were built against foreign-order data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Platform-native order.
    #[default]
    Native,
    /// The opposite of platform-native order.
    Swapped,
}

/// Canonical element type of a dense buffer, scalar, or columnar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// One byte, nonzero = true.
    Bool,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// IEEE-754 single precision.
    Float32,
    /// IEEE-754 double precision.
    Float64,
    /// Point in time as 64-bit ticks since the epoch.
    Datetime64(TimeUnit),
    /// Duration as 64-bit ticks.
    Timedelta64(TimeUnit),
    /// Columnar UTF-8 string (32-bit offsets).
    Utf8,
    /// Columnar UTF-8 string (64-bit offsets).
    LargeUtf8,
    /// Columnar millisecond timestamp.
    TimestampMs,
    /// Heterogeneous elements carried as plain JSON values.
    Object,
}

impl DType {
    /// The canonical wire string for this type.
    pub fn canonical(&self) -> String {
        match self {
            DType::Bool => "bool".to_string(),
            DType::Int8 => "int8".to_string(),
            DType::Int16 => "int16".to_string(),
            DType::Int32 => "int32".to_string(),
            DType::Int64 => "int64".to_string(),
            DType::UInt8 => "uint8".to_string(),
            DType::UInt16 => "uint16".to_string(),
            DType::UInt32 => "uint32".to_string(),
            DType::UInt64 => "uint64".to_string(),
            DType::Float32 => "float32".to_string(),
            DType::Float64 => "float64".to_string(),
            DType::Datetime64(unit) => format!("datetime64[{}]", unit.as_str()),
            DType::Timedelta64(unit) => format!("timedelta64[{}]", unit.as_str()),
            DType::Utf8 => "string".to_string(),
            DType::LargeUtf8 => "large_string".to_string(),
            DType::TimestampMs => "timestamp[ms]".to_string(),
            DType::Object => "object".to_string(),
        }
    }

    /// Element width in bytes; `None` for types without a fixed dense layout.
    pub fn size(&self) -> Option<usize> {
        match self {
            DType::Bool | DType::Int8 | DType::UInt8 => Some(1),
            DType::Int16 | DType::UInt16 => Some(2),
            DType::Int32 | DType::UInt32 | DType::Float32 => Some(4),
            DType::Int64 | DType::UInt64 | DType::Float64 => Some(8),
            DType::Datetime64(_) | DType::Timedelta64(_) => Some(8),
            DType::Utf8 | DType::LargeUtf8 | DType::TimestampMs | DType::Object => None,
        }
    }

    /// True for datetime and timedelta kinds.
    pub fn is_temporal(&self) -> bool {
        matches!(self, DType::Datetime64(_) | DType::Timedelta64(_))
    }

    /// Parse a descriptor string, discarding byte-order information.
    ///
    /// The fixed strings `string`, `large_string`, and `timestamp[ms]` map to
    /// the columnar types; everything else is treated as a native element
    /// descriptor (canonical names or short codes such as `"i8"`, `">f4"`).
    pub fn parse(descriptor: &str) -> Result<DType, DTypeParseError> {
        Self::parse_descriptor(descriptor).map(|(dtype, _)| dtype)
    }

    /// Parse a descriptor string, also reporting its byte order.
    pub fn parse_descriptor(descriptor: &str) -> Result<(DType, ByteOrder), DTypeParseError> {
        if let Some(dtype) = Self::parse_named(descriptor) {
            return Ok((dtype, ByteOrder::Native));
        }
        let (order, rest) = match descriptor.as_bytes().first().copied() {
            Some(b'>') => (ByteOrder::Swapped, &descriptor[1..]),
            Some(b'<') | Some(b'=') | Some(b'|') => (ByteOrder::Native, &descriptor[1..]),
            _ => (ByteOrder::Native, descriptor),
        };
        let dtype = Self::parse_named(rest)
            .or_else(|| Self::parse_short(rest))
            .ok_or_else(|| DTypeParseError::new(descriptor))?;
        // Order is meaningless for single-byte and non-fixed-width types.
        let order = match dtype.size() {
            Some(size) if size > 1 => order,
            _ => ByteOrder::Native,
        };
        Ok((dtype, order))
    }

    /// Descriptor string for this type under the given byte order.
    ///
    /// Native order yields the canonical form; swapped order yields the
    /// `>`-prefixed short code (`">f8"`), mirroring how foreign-order binner
    /// identities spell their element type.
    pub fn descriptor(&self, order: ByteOrder) -> String {
        match order {
            ByteOrder::Native => self.canonical(),
            ByteOrder::Swapped => format!(">{}", self.short_code()),
        }
    }

    fn short_code(&self) -> String {
        match self {
            DType::Bool => "b1".to_string(),
            DType::Int8 => "i1".to_string(),
            DType::Int16 => "i2".to_string(),
            DType::Int32 => "i4".to_string(),
            DType::Int64 => "i8".to_string(),
            DType::UInt8 => "u1".to_string(),
            DType::UInt16 => "u2".to_string(),
            DType::UInt32 => "u4".to_string(),
            DType::UInt64 => "u8".to_string(),
            DType::Float32 => "f4".to_string(),
            DType::Float64 => "f8".to_string(),
            DType::Datetime64(unit) => format!("M8[{}]", unit.as_str()),
            DType::Timedelta64(unit) => format!("m8[{}]", unit.as_str()),
            DType::Utf8 => "string".to_string(),
            DType::LargeUtf8 => "large_string".to_string(),
            DType::TimestampMs => "timestamp[ms]".to_string(),
            DType::Object => "O".to_string(),
        }
    }

    fn parse_named(s: &str) -> Option<DType> {
        let dtype = match s {
            "bool" => DType::Bool,
            "int8" => DType::Int8,
            "int16" => DType::Int16,
            "int32" => DType::Int32,
            "int64" => DType::Int64,
            "uint8" => DType::UInt8,
            "uint16" => DType::UInt16,
            "uint32" => DType::UInt32,
            "uint64" => DType::UInt64,
            "float32" => DType::Float32,
            "float64" => DType::Float64,
            "string" => DType::Utf8,
            "large_string" => DType::LargeUtf8,
            "timestamp[ms]" => DType::TimestampMs,
            "object" => DType::Object,
            _ => return Self::parse_temporal(s, "datetime64", "timedelta64"),
        };
        Some(dtype)
    }

    fn parse_short(s: &str) -> Option<DType> {
        let dtype = match s {
            "b1" | "?" => DType::Bool,
            "i1" => DType::Int8,
            "i2" => DType::Int16,
            "i4" => DType::Int32,
            "i8" => DType::Int64,
            "u1" => DType::UInt8,
            "u2" => DType::UInt16,
            "u4" => DType::UInt32,
            "u8" => DType::UInt64,
            "f4" => DType::Float32,
            "f8" => DType::Float64,
            "O" => DType::Object,
            _ => return Self::parse_temporal(s, "M8", "m8"),
        };
        Some(dtype)
    }

    fn parse_temporal(s: &str, datetime_prefix: &str, timedelta_prefix: &str) -> Option<DType> {
        let unit_of = |s: &str, prefix: &str| -> Option<TimeUnit> {
            let rest = s.strip_prefix(prefix)?;
            let inner = rest.strip_prefix('[')?.strip_suffix(']')?;
            TimeUnit::parse(inner)
        };
        if let Some(unit) = unit_of(s, datetime_prefix) {
            return Some(DType::Datetime64(unit));
        }
        if let Some(unit) = unit_of(s, timedelta_prefix) {
            return Some(DType::Timedelta64(unit));
        }
        None
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}
