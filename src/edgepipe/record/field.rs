//! The dynamically typed field model.
//!
//! [`Field`] is a tagged value: the tag is drawn from a fixed closed set and a
//! field may carry a typed null (tag set, value absent), which is distinct from
//! a missing field. Containers hold `Field`s, never raw values.

use super::ordered_map::OrderedMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

/// The closed set of field tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Boolean,
    Byte,
    ByteArray,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Map,
    List,
    ListMap,
}

impl FieldType {
    /// Canonical tag name, as used in the SDC-JSON wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Boolean => "BOOLEAN",
            FieldType::Byte => "BYTE",
            FieldType::ByteArray => "BYTE_ARRAY",
            FieldType::Short => "SHORT",
            FieldType::Integer => "INTEGER",
            FieldType::Long => "LONG",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Decimal => "DECIMAL",
            FieldType::String => "STRING",
            FieldType::Map => "MAP",
            FieldType::List => "LIST",
            FieldType::ListMap => "LIST_MAP",
        }
    }

    /// Parse a canonical tag name back into a tag.
    pub fn parse(name: &str) -> Option<FieldType> {
        match name {
            "BOOLEAN" => Some(FieldType::Boolean),
            "BYTE" => Some(FieldType::Byte),
            "BYTE_ARRAY" => Some(FieldType::ByteArray),
            "SHORT" => Some(FieldType::Short),
            "INTEGER" => Some(FieldType::Integer),
            "LONG" => Some(FieldType::Long),
            "FLOAT" => Some(FieldType::Float),
            "DOUBLE" => Some(FieldType::Double),
            "DECIMAL" => Some(FieldType::Decimal),
            "STRING" => Some(FieldType::String),
            "MAP" => Some(FieldType::Map),
            "LIST" => Some(FieldType::List),
            "LIST_MAP" => Some(FieldType::ListMap),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value in a record field.
///
/// Each variant carries the native value for its tag, so tag and value agree
/// by construction. `TypedNull` represents a field whose tag is set but whose
/// value is absent; it survives clone and serialization without coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Boolean(bool),
    Byte(u8),
    ByteArray(Vec<u8>),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Arbitrary-precision value; equality is numeric
    Decimal(Decimal),
    String(String),
    /// Unordered mapping, iteration order unspecified
    Map(HashMap<String, Field>),
    /// Ordered sequence of fields
    List(Vec<Field>),
    /// Insertion-order-preserving mapping
    ListMap(OrderedMap),
    /// Tag set, value absent
    TypedNull(FieldType),
}

impl Field {
    /// The tag of this field.
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Boolean(_) => FieldType::Boolean,
            Field::Byte(_) => FieldType::Byte,
            Field::ByteArray(_) => FieldType::ByteArray,
            Field::Short(_) => FieldType::Short,
            Field::Integer(_) => FieldType::Integer,
            Field::Long(_) => FieldType::Long,
            Field::Float(_) => FieldType::Float,
            Field::Double(_) => FieldType::Double,
            Field::Decimal(_) => FieldType::Decimal,
            Field::String(_) => FieldType::String,
            Field::Map(_) => FieldType::Map,
            Field::List(_) => FieldType::List,
            Field::ListMap(_) => FieldType::ListMap,
            Field::TypedNull(field_type) => *field_type,
        }
    }

    /// Create a string field.
    pub fn string(value: impl Into<String>) -> Field {
        Field::String(value.into())
    }

    /// Create a long field.
    pub fn long(value: i64) -> Field {
        Field::Long(value)
    }

    /// Create a double field.
    pub fn double(value: f64) -> Field {
        Field::Double(value)
    }

    /// Create a boolean field.
    pub fn boolean(value: bool) -> Field {
        Field::Boolean(value)
    }

    /// Create a byte-array field.
    pub fn byte_array(value: impl Into<Vec<u8>>) -> Field {
        Field::ByteArray(value.into())
    }

    /// Create a typed-null field with the given tag.
    pub fn null(field_type: FieldType) -> Field {
        Field::TypedNull(field_type)
    }

    /// Create an empty map field.
    pub fn empty_map() -> Field {
        Field::Map(HashMap::new())
    }

    /// Create an empty list field.
    pub fn empty_list() -> Field {
        Field::List(Vec::new())
    }

    /// Create an empty ordered-map field.
    pub fn empty_list_map() -> Field {
        Field::ListMap(OrderedMap::new())
    }

    /// Whether this field is a typed null.
    pub fn is_null(&self) -> bool {
        matches!(self, Field::TypedNull(_))
    }

    /// The string payload, if this is a `STRING` field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The boolean payload, if this is a `BOOLEAN` field.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Field::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric payload widened to `f64`, for any numeric tag.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Field::Byte(v) => Some(*v as f64),
            Field::Short(v) => Some(*v as f64),
            Field::Integer(v) => Some(*v as f64),
            Field::Long(v) => Some(*v as f64),
            Field::Float(v) => Some(*v as f64),
            Field::Double(v) => Some(*v),
            Field::Decimal(v) => v.to_string().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Boolean(v) => write!(f, "{}", v),
            Field::Byte(v) => write!(f, "{}", v),
            Field::ByteArray(v) => write!(f, "{} bytes", v.len()),
            Field::Short(v) => write!(f, "{}", v),
            Field::Integer(v) => write!(f, "{}", v),
            Field::Long(v) => write!(f, "{}", v),
            Field::Float(v) => write!(f, "{}", v),
            Field::Double(v) => write!(f, "{}", v),
            Field::Decimal(v) => write!(f, "{}", v),
            Field::String(v) => write!(f, "{}", v),
            Field::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Field::List(list) => {
                write!(f, "[")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Field::ListMap(map) => write!(f, "{}", map),
            Field::TypedNull(_) => write!(f, "NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn typed_null_survives_clone_without_coercion() {
        let field = Field::null(FieldType::Decimal);
        let copy = field.clone();
        assert!(copy.is_null());
        assert_eq!(copy.field_type(), FieldType::Decimal);
        assert_eq!(field, copy);
    }

    #[test]
    fn decimal_equality_is_numeric() {
        let a = Field::Decimal(Decimal::from_str("1.50").unwrap());
        let b = Field::Decimal(Decimal::from_str("1.5").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn tag_and_value_agree() {
        assert_eq!(Field::string("x").field_type(), FieldType::String);
        assert_eq!(Field::long(1).field_type(), FieldType::Long);
        assert_eq!(Field::empty_list_map().field_type(), FieldType::ListMap);
        assert_eq!(
            Field::null(FieldType::ByteArray).field_type(),
            FieldType::ByteArray
        );
    }
}
