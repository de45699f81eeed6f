use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use strum::{AsRefStr, Display, EnumString};

use crate::DatabaseError;

/// Column types supported by primdb.
///
/// Type tags are written as `int`, `str` and `bool` in column specs and in the
/// catalog document. The long spellings are accepted when parsing.
///
/// # Example
///
/// ```
/// use primdb::DataType;
///
/// assert_eq!("int".parse::<DataType>().unwrap(), DataType::Integer);
/// assert_eq!("Boolean".parse::<DataType>().unwrap(), DataType::Boolean);
/// assert_eq!(DataType::Text.to_string(), "str");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum DataType {
    /// 64-bit signed integer.
    #[strum(to_string = "int", serialize = "integer")]
    Integer,

    /// UTF-8 text with no length limit.
    #[strum(to_string = "str", serialize = "text")]
    Text,

    /// Boolean true/false value.
    #[strum(to_string = "bool", serialize = "boolean")]
    Boolean,
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        DataType::from_str(&tag).map_err(|_| de::Error::custom(format!("unknown type tag `{tag}`")))
    }
}

/// A value stored in a record field.
///
/// Values are encoded in documents as plain JSON scalars, so the variant is
/// recovered from the JSON type on load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A 64-bit signed integer value.
    Integer(i64),

    /// A UTF-8 text string.
    Text(String),

    /// A boolean value (true/false).
    Boolean(bool),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl Value {
    /// The column type this value belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Text(_) => DataType::Text,
            Value::Boolean(_) => DataType::Boolean,
        }
    }

    /// Checks that this value can be stored in `column` of type `expected`.
    pub fn check_type(&self, column: &str, expected: DataType) -> Result<(), DatabaseError> {
        let found = self.data_type();
        if found == expected {
            Ok(())
        } else {
            Err(DatabaseError::TypeMismatch {
                column: column.to_owned(),
                expected,
                found,
            })
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// How boolean literals are admitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BooleanMode {
    /// Known true spellings are `true`; every other literal is `false`.
    #[default]
    Permissive,

    /// Only the known true and false spellings are accepted.
    Strict,
}

const TRUE_LITERALS: [&str; 4] = ["true", "1", "yes", "y"];
const FALSE_LITERALS: [&str; 4] = ["false", "0", "no", "n"];

/// Converts external text into a typed [`Value`].
///
/// This is the single admission point for user-supplied values. Booleans are
/// permissive: anything outside `true`, `1`, `yes`, `y` reads as `false`.
///
/// # Example
///
/// ```
/// use primdb::{DataType, Value, validate_value};
///
/// assert_eq!(validate_value("7", DataType::Integer).unwrap(), Value::Integer(7));
/// assert_eq!(validate_value("yes", DataType::Boolean).unwrap(), Value::Boolean(true));
/// assert_eq!(validate_value("maybe", DataType::Boolean).unwrap(), Value::Boolean(false));
/// assert!(validate_value("seven", DataType::Integer).is_err());
/// ```
pub fn validate_value(raw: &str, data_type: DataType) -> Result<Value, DatabaseError> {
    validate_value_with(raw, data_type, BooleanMode::Permissive)
}

/// [`validate_value`] with an explicit boolean admission mode.
pub fn validate_value_with(
    raw: &str,
    data_type: DataType,
    mode: BooleanMode,
) -> Result<Value, DatabaseError> {
    match data_type {
        DataType::Integer => {
            raw.trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| DatabaseError::InvalidValue {
                    value: raw.to_owned(),
                    data_type,
                })
        }
        DataType::Text => Ok(Value::Text(raw.to_owned())),
        DataType::Boolean => {
            let literal = raw.trim().to_ascii_lowercase();
            if TRUE_LITERALS.contains(&literal.as_str()) {
                return Ok(Value::Boolean(true));
            }

            match mode {
                BooleanMode::Permissive => Ok(Value::Boolean(false)),
                BooleanMode::Strict if FALSE_LITERALS.contains(&literal.as_str()) => {
                    Ok(Value::Boolean(false))
                }
                BooleanMode::Strict => Err(DatabaseError::InvalidValue {
                    value: raw.to_owned(),
                    data_type,
                }),
            }
        }
    }
}
