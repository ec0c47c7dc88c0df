use core::fmt;

use alloy_primitives::{Address, Bytes, B256, I256, U256};

use crate::{
    align::WORD_SIZE,
    error::{EncodingError, Result},
};

/// Schema node for a single ABI parameter.
///
/// The tree is built by the caller; this crate never parses type strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbiType {
    Bool,
    /// `uintN`, bit width in `8..=256`, step 8.
    Uint(usize),
    /// `intN`, bit width in `8..=256`, step 8.
    Int(usize),
    Address,
    /// `bytesN`, size in `1..=32`.
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[n]`
    FixedArray(Box<AbiType>, usize),
    /// `T[]`
    Array(Box<AbiType>),
    Tuple(Vec<AbiType>),
}

impl AbiType {
    pub fn array(element: AbiType) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn fixed_array(element: AbiType, len: usize) -> Self {
        Self::FixedArray(Box::new(element), len)
    }

    /// Whether values of this type are addressed through an offset.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bool | Self::Uint(_) | Self::Int(_) | Self::Address | Self::FixedBytes(_) => {
                false
            }
            Self::Bytes | Self::String | Self::Array(_) => true,
            Self::FixedArray(element, _) => element.is_dynamic(),
            Self::Tuple(fields) => fields.iter().any(Self::is_dynamic),
        }
    }

    /// Number of bytes this type occupies in its parent's head.
    ///
    /// Saturates for types that [`validate`](Self::validate) rejects.
    pub fn head_size(&self) -> usize {
        self.checked_head_size().unwrap_or(usize::MAX)
    }

    fn checked_head_size(&self) -> Option<usize> {
        if self.is_dynamic() {
            return Some(WORD_SIZE);
        }
        match self {
            Self::FixedArray(element, len) => element.checked_head_size()?.checked_mul(*len),
            Self::Tuple(fields) => fields
                .iter()
                .try_fold(0usize, |size, field| size.checked_add(field.checked_head_size()?)),
            _ => Some(WORD_SIZE),
        }
    }

    /// Checks bit widths, byte sizes, array lengths and head sizes of the whole
    /// tree.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Uint(bits) | Self::Int(bits) if *bits == 0 || *bits > 256 || bits % 8 != 0 => {
                let msg = format!("invalid bit width {bits} in {self}");
                Err(EncodingError::InvalidType(msg).into())
            }
            Self::FixedBytes(size) if *size == 0 || *size > WORD_SIZE => {
                let msg = format!("invalid byte size {size} in {self}");
                Err(EncodingError::InvalidType(msg).into())
            }
            Self::FixedArray(_, 0) => {
                Err(EncodingError::InvalidType(format!("zero-length fixed array {self}")).into())
            }
            Self::Tuple(fields) if fields.is_empty() => {
                Err(EncodingError::InvalidType("empty tuple".into()).into())
            }
            Self::Array(element) => element.validate(),
            Self::FixedArray(element, _) => {
                element.validate()?;
                self.check_head_size()
            }
            Self::Tuple(fields) => {
                fields.iter().try_for_each(Self::validate)?;
                self.check_head_size()
            }
            _ => Ok(()),
        }
    }

    fn check_head_size(&self) -> Result<()> {
        match self.checked_head_size() {
            Some(_) => Ok(()),
            None => Err(EncodingError::InvalidType(format!("head of {self} overflows")).into()),
        }
    }
}

/// Canonical type string, as used in function signatures.
impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Address => f.write_str("address"),
            Self::FixedBytes(size) => write!(f, "bytes{size}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::FixedArray(element, len) => write!(f, "{element}[{len}]"),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Runtime value mirroring an [`AbiType`].
///
/// Fixed and dynamic arrays share the `Array` variant; the schema decides how it
/// is laid out.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbiValue {
    Bool(bool),
    Uint(U256),
    Int(I256),
    Address(Address),
    /// Left-aligned bytes plus the number of significant bytes.
    FixedBytes(B256, usize),
    Bytes(Bytes),
    String(String),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Short description of the value's shape, used in error messages.
    pub fn kind(&self) -> String {
        match self {
            Self::Bool(_) => "bool".into(),
            Self::Uint(_) => "uint".into(),
            Self::Int(_) => "int".into(),
            Self::Address(_) => "address".into(),
            Self::FixedBytes(_, size) => format!("bytes{size}"),
            Self::Bytes(_) => "bytes".into(),
            Self::String(_) => "string".into(),
            Self::Array(items) => format!("array of {}", items.len()),
            Self::Tuple(items) => format!("tuple of {}", items.len()),
        }
    }

    pub fn uint(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }

    pub fn fixed_bytes(data: &[u8]) -> Self {
        let mut word = B256::ZERO;
        let len = data.len().min(32);
        word[..len].copy_from_slice(&data[..len]);
        Self::FixedBytes(word, data.len())
    }
}

impl From<bool> for AbiValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<U256> for AbiValue {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}

impl From<I256> for AbiValue {
    fn from(value: I256) -> Self {
        Self::Int(value)
    }
}

impl From<Address> for AbiValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<Bytes> for AbiValue {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<String> for AbiValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AbiValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl<T: Into<AbiValue>> From<Vec<T>> for AbiValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}
