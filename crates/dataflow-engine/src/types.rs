//! Runtime data types and the values that flow along connections
//!
//! Every value travelling through a graph is a [`DataBox`]: a JSON payload
//! tagged with the [`DataKind`] it was created for. Kinds are compared by
//! identity, so two connectors are compatible only if their kinds are equal.
//!
//! The [`DataType`] trait layers static typing on top: node types use the
//! marker types ([`StringType`], [`BooleanType`], ...) to box and unbox
//! values without matching on JSON by hand.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Named data boxes, used for node inputs, outputs and settings
pub type DataMap = BTreeMap<String, DataBox>;

/// Node settings (name -> value)
pub type Settings = DataMap;

/// The kind of a runtime value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Text string
    String,
    /// Boolean value
    Boolean,
    /// Numeric value
    Number,
    /// Arbitrary JSON document
    Json,
}

impl DataKind {
    /// Check whether a raw value has the representation this kind requires
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            DataKind::String => value.is_string(),
            DataKind::Boolean => value.is_boolean(),
            DataKind::Number => value.is_number(),
            DataKind::Json => true,
        }
    }

    /// Box a raw value as this kind
    pub fn create(self, raw: serde_json::Value) -> Result<DataBox> {
        DataBox::new(self, raw)
    }

    /// Stable lowercase name, as used in serialized settings
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::String => "string",
            DataKind::Boolean => "boolean",
            DataKind::Number => "number",
            DataKind::Json => "json",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(DataKind::String),
            "boolean" => Ok(DataKind::Boolean),
            "number" => Ok(DataKind::Number),
            "json" => Ok(DataKind::Json),
            other => Err(EngineError::failed(format!("Unknown data kind '{}'", other))),
        }
    }
}

/// Statically typed view of a [`DataKind`]
pub trait DataType {
    /// Rust representation of values of this type
    type Value;

    /// The runtime kind this type boxes as
    const KIND: DataKind;

    /// Convert a Rust value to its JSON payload
    fn into_raw(value: Self::Value) -> serde_json::Value;

    /// Read a Rust value back out of a JSON payload
    fn from_raw(raw: &serde_json::Value) -> Option<Self::Value>;

    /// Box a value of this type
    fn create(value: Self::Value) -> Result<DataBox> {
        DataBox::new(Self::KIND, Self::into_raw(value))
    }
}

/// Text strings
pub struct StringType;

impl DataType for StringType {
    type Value = String;
    const KIND: DataKind = DataKind::String;

    fn into_raw(value: String) -> serde_json::Value {
        serde_json::Value::String(value)
    }

    fn from_raw(raw: &serde_json::Value) -> Option<String> {
        raw.as_str().map(str::to_string)
    }
}

/// Booleans
pub struct BooleanType;

impl DataType for BooleanType {
    type Value = bool;
    const KIND: DataKind = DataKind::Boolean;

    fn into_raw(value: bool) -> serde_json::Value {
        serde_json::Value::Bool(value)
    }

    fn from_raw(raw: &serde_json::Value) -> Option<bool> {
        raw.as_bool()
    }
}

/// Numbers (non-finite values cannot be boxed)
pub struct NumberType;

impl DataType for NumberType {
    type Value = f64;
    const KIND: DataKind = DataKind::Number;

    fn into_raw(value: f64) -> serde_json::Value {
        serde_json::Number::from_f64(value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }

    fn from_raw(raw: &serde_json::Value) -> Option<f64> {
        raw.as_f64()
    }
}

/// Arbitrary JSON
pub struct JsonType;

impl DataType for JsonType {
    type Value = serde_json::Value;
    const KIND: DataKind = DataKind::Json;

    fn into_raw(value: serde_json::Value) -> serde_json::Value {
        value
    }

    fn from_raw(raw: &serde_json::Value) -> Option<serde_json::Value> {
        Some(raw.clone())
    }
}

/// An immutable value together with its data kind
///
/// The payload always matches the kind; constructors reject anything else,
/// including deserialized boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDataBox")]
pub struct DataBox {
    data_type: DataKind,
    value: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataBox {
    data_type: DataKind,
    value: serde_json::Value,
}

impl TryFrom<RawDataBox> for DataBox {
    type Error = EngineError;

    fn try_from(raw: RawDataBox) -> Result<Self> {
        DataBox::new(raw.data_type, raw.value)
    }
}

impl DataBox {
    /// Box a raw value, failing if it does not match the kind
    pub fn new(data_type: DataKind, value: serde_json::Value) -> Result<Self> {
        if !data_type.matches(&value) {
            return Err(EngineError::type_mismatch(data_type, &value));
        }
        Ok(Self { data_type, value })
    }

    /// Box a string
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: DataKind::String,
            value: serde_json::Value::String(value.into()),
        }
    }

    /// Box a boolean
    pub fn boolean(value: bool) -> Self {
        Self {
            data_type: DataKind::Boolean,
            value: serde_json::Value::Bool(value),
        }
    }

    /// Box a number
    pub fn number(value: f64) -> Result<Self> {
        NumberType::create(value)
    }

    /// Box a whole number; always finite, so this cannot fail
    pub fn integer(value: i64) -> Self {
        Self {
            data_type: DataKind::Number,
            value: serde_json::Value::from(value),
        }
    }

    /// Box a JSON document
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            data_type: DataKind::Json,
            value,
        }
    }

    /// A new box of the same kind holding a different value
    pub fn with_value(&self, value: serde_json::Value) -> Result<Self> {
        Self::new(self.data_type, value)
    }

    /// The kind of this box
    pub fn data_type(&self) -> DataKind {
        self.data_type
    }

    /// The raw payload
    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    /// Consume the box, returning the raw payload
    pub fn into_value(self) -> serde_json::Value {
        self.value
    }

    /// Unwrap as `T` if this box is of `T`'s kind
    pub fn get<T: DataType>(&self) -> Option<T::Value> {
        if self.data_type == T::KIND {
            T::from_raw(&self.value)
        } else {
            None
        }
    }

    /// Look up a named box and return its payload only if it has the expected kind
    ///
    /// Never fails: a missing entry and an incompatible entry both read as absent.
    pub fn lookup<'a>(
        inputs: &'a DataMap,
        name: &str,
        expected: DataKind,
    ) -> Option<&'a serde_json::Value> {
        inputs
            .get(name)
            .filter(|b| b.data_type == expected)
            .map(|b| &b.value)
    }

    /// Typed variant of [`DataBox::lookup`]
    pub fn get_input<T: DataType>(inputs: &DataMap, name: &str) -> Option<T::Value> {
        inputs.get(name).and_then(|b| b.get::<T>())
    }
}
