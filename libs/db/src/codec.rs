//! Value codec: typed scalars to and from cell bytes.
//!
//! Built-in types use their textual form, so the integer `90` is stored as the
//! bytes `"90"` and a timestamp as RFC 3339 text. `Vec<u8>` is stored raw.
//! Applications add their own value types by implementing [`CellValue`].

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A scalar that can be stored in a single cell.
pub trait CellValue: Sized + Send + Sync + 'static {
    /// Name used in error messages.
    const TYPE_NAME: &'static str;

    /// Encode to the stored byte form.
    fn to_cell_bytes(&self) -> Vec<u8>;

    /// Decode from the stored byte form.
    fn from_cell_bytes(bytes: &[u8]) -> Result<Self>;

    /// Value used when a cell is present but empty.
    fn default_value() -> Self;

    /// Decode, mapping an empty cell to [`CellValue::default_value`].
    fn decode_or_default(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            Ok(Self::default_value())
        } else {
            Self::from_cell_bytes(bytes)
        }
    }
}

fn utf8<'a>(type_name: &'static str, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| Error::codec(type_name, e))
}

impl CellValue for String {
    const TYPE_NAME: &'static str = "String";

    fn to_cell_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_cell_bytes(bytes: &[u8]) -> Result<Self> {
        utf8(Self::TYPE_NAME, bytes).map(str::to_owned)
    }

    fn default_value() -> Self {
        String::new()
    }
}

impl CellValue for Vec<u8> {
    const TYPE_NAME: &'static str = "bytes";

    fn to_cell_bytes(&self) -> Vec<u8> {
        self.clone()
    }

    fn from_cell_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }

    fn default_value() -> Self {
        Vec::new()
    }
}

impl CellValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn to_cell_bytes(&self) -> Vec<u8> {
        if *self { b"true".to_vec() } else { b"false".to_vec() }
    }

    fn from_cell_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes {
            b"true" | b"1" => Ok(true),
            b"false" | b"0" => Ok(false),
            other => Err(Error::codec(
                Self::TYPE_NAME,
                format!("'{}' is not a boolean", String::from_utf8_lossy(other)),
            )),
        }
    }

    fn default_value() -> Self {
        false
    }
}

/// Numeric types round-trip through `Display` / `FromStr`.
macro_rules! numeric_cell_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CellValue for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn to_cell_bytes(&self) -> Vec<u8> {
                    self.to_string().into_bytes()
                }

                fn from_cell_bytes(bytes: &[u8]) -> Result<Self> {
                    utf8(Self::TYPE_NAME, bytes)?
                        .trim()
                        .parse::<$ty>()
                        .map_err(|e| Error::codec(Self::TYPE_NAME, e))
                }

                fn default_value() -> Self {
                    <$ty>::default()
                }
            }
        )*
    };
}

numeric_cell_value!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64);

impl CellValue for DateTime<Utc> {
    const TYPE_NAME: &'static str = "DateTime<Utc>";

    fn to_cell_bytes(&self) -> Vec<u8> {
        self.to_rfc3339().into_bytes()
    }

    fn from_cell_bytes(bytes: &[u8]) -> Result<Self> {
        DateTime::parse_from_rfc3339(utf8(Self::TYPE_NAME, bytes)?.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::codec(Self::TYPE_NAME, e))
    }

    fn default_value() -> Self {
        DateTime::<Utc>::default()
    }
}

impl CellValue for NaiveDate {
    const TYPE_NAME: &'static str = "NaiveDate";

    fn to_cell_bytes(&self) -> Vec<u8> {
        self.format("%Y-%m-%d").to_string().into_bytes()
    }

    fn from_cell_bytes(bytes: &[u8]) -> Result<Self> {
        NaiveDate::parse_from_str(utf8(Self::TYPE_NAME, bytes)?.trim(), "%Y-%m-%d")
            .map_err(|e| Error::codec(Self::TYPE_NAME, e))
    }

    fn default_value() -> Self {
        NaiveDate::default()
    }
}

impl CellValue for Uuid {
    const TYPE_NAME: &'static str = "Uuid";

    fn to_cell_bytes(&self) -> Vec<u8> {
        self.hyphenated().to_string().into_bytes()
    }

    fn from_cell_bytes(bytes: &[u8]) -> Result<Self> {
        Uuid::parse_str(utf8(Self::TYPE_NAME, bytes)?.trim())
            .map_err(|e| Error::codec(Self::TYPE_NAME, e))
    }

    fn default_value() -> Self {
        Uuid::nil()
    }
}
