//! Typed variable values.
//!
//! Every process variable carries a [`Value`] whose runtime variant always
//! matches the [`ValueKind`] declared at registration. Writes against a
//! [`AccessMode::ReadOnly`] variable are rejected on the external path;
//! the simulation publish path bypasses the access check but never the
//! type check.

use core::fmt;
use serde::{Deserialize, Serialize};

// ─── ValueKind ──────────────────────────────────────────────────────

/// Declared type of a process variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int32,
    UInt32,
    Float,
    Double,
    String,
    StringArray,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int32 => write!(f, "int32"),
            Self::UInt32 => write!(f, "uint32"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::String => write!(f, "string"),
            Self::StringArray => write!(f, "string[]"),
        }
    }
}

// ─── AccessMode ─────────────────────────────────────────────────────

/// External write permission of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Published by the simulation only; external writes rejected.
    ReadOnly,
    /// Accepts external writes through the dispatch path.
    ReadWrite,
}

impl AccessMode {
    /// True when external writes are allowed.
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

// ─── Value ──────────────────────────────────────────────────────────

/// Tagged union over [`ValueKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Float(f32),
    Double(f64),
    String(String),
    StringArray(Vec<String>),
}

impl Value {
    /// Kind discriminant of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int32(_) => ValueKind::Int32,
            Self::UInt32(_) => ValueKind::UInt32,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::String(_) => ValueKind::String,
            Self::StringArray(_) => ValueKind::StringArray,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_str_array(&self) -> Option<&[String]> {
        match self {
            Self::StringArray(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.2}"),
            Self::Double(v) => write!(f, "{v:.2}"),
            Self::String(v) => write!(f, "{v}"),
            Self::StringArray(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(Value::Int32(-4).kind(), ValueKind::Int32);
        assert_eq!(Value::UInt32(7).kind(), ValueKind::UInt32);
        assert_eq!(Value::Float(1.5).kind(), ValueKind::Float);
        assert_eq!(Value::Double(2.5).kind(), ValueKind::Double);
        assert_eq!(Value::String("x".into()).kind(), ValueKind::String);
        assert_eq!(Value::StringArray(vec![]).kind(), ValueKind::StringArray);
    }

    #[test]
    fn typed_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Bool(true).as_i32(), None);
        assert_eq!(Value::Int32(-4).as_i32(), Some(-4));
        assert_eq!(Value::UInt32(9).as_u32(), Some(9));
        assert_eq!(Value::Float(1.25).as_f32(), Some(1.25));
        assert_eq!(Value::Double(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::String("cola".into()).as_str(), Some("cola"));
        let arr = Value::StringArray(vec!["a".into(), "b".into()]);
        assert_eq!(arr.as_str_array().map(<[String]>::len), Some(2));
    }

    #[test]
    fn access_mode_writable() {
        assert!(AccessMode::ReadWrite.is_writable());
        assert!(!AccessMode::ReadOnly.is_writable());
    }

    #[test]
    fn kind_display() {
        assert_eq!(ValueKind::StringArray.to_string(), "string[]");
        assert_eq!(ValueKind::UInt32.to_string(), "uint32");
    }
}
