//! Converted parameter values.
//!
//! The binder turns raw strings into [`Value`]s and collects them in
//! [`BoundValues`]; settings types read them back through [`FromValue`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::AssignError;
use crate::types::{ParameterKind, ParameterSpec};

/// Value produced by a user-registered converter.
///
/// Keeps the raw literal alongside the converted value so that bound
/// values can be compared and written back as arguments.
#[derive(Clone)]
pub struct CustomValue {
    raw: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    /// Wraps a converted value together with the literal it came from.
    pub fn new<T: Any + Send + Sync>(raw: &str, value: T) -> Self {
        Self {
            raw: raw.to_string(),
            value: Arc::new(value),
        }
    }

    /// The literal the value was converted from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the converted value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomValue").field(&self.raw).finish()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

/// A converted parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Enumeration member, stored under its declared spelling.
    Enum(String),
    Custom(CustomValue),
    /// Values of a `Multiple` arity parameter, in encounter order.
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in assignment errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
            Self::Custom(_) => "custom",
            Self::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// String contents of `String` and `Enum` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a custom converted value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(custom) => custom.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Converts into a typed field value.
    ///
    /// # Errors
    ///
    /// Returns [`AssignError::TypeMismatch`] when the variant does not fit `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_tree_core::Value;
    ///
    /// let count: i64 = Value::Integer(3).into_typed().unwrap();
    /// assert_eq!(count, 3);
    ///
    /// let names: Vec<String> = Value::List(vec![Value::String("a".into())])
    ///     .into_typed()
    ///     .unwrap();
    /// assert_eq!(names, vec!["a".to_string()]);
    ///
    /// assert!(Value::Bool(true).into_typed::<String>().is_err());
    /// ```
    pub fn into_typed<T: FromValue>(self) -> Result<T, AssignError> {
        let found = self.kind_name();
        T::from_value(self).ok_or(AssignError::TypeMismatch {
            expected: T::EXPECTED,
            found,
        })
    }

    /// Raw literals that bind back to this value.
    pub fn canonical(&self) -> Vec<String> {
        match self {
            Self::Bool(b) => vec![b.to_string()],
            Self::Integer(n) => vec![n.to_string()],
            Self::Float(n) => vec![n.to_string()],
            Self::String(s) | Self::Enum(s) => vec![s.clone()],
            Self::Custom(custom) => vec![custom.raw.clone()],
            Self::List(items) => items.iter().flat_map(Value::canonical).collect(),
        }
    }
}

/// Conversion from a bound [`Value`] into a settings field type.
pub trait FromValue: Sized {
    /// Type name reported when conversion fails.
    const EXPECTED: &'static str;

    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: Value) -> Option<Self> {
        value.as_integer()
    }
}

macro_rules! from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn from_value(value: Value) -> Option<Self> {
                    value.as_integer().and_then(|n| <$ty>::try_from(n).ok())
                }
            }
        )*
    };
}

from_value_int!(i32, u16, u32, u64, usize);

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Option<Self> {
        value.as_float()
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) | Value::Enum(s) => Some(s),
            Value::Custom(custom) => Some(custom.raw),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            single => T::from_value(single).map(|item| vec![item]),
        }
    }
}

/// Converted values keyed by parameter name.
///
/// Only parameters that were given on the command line or have a default
/// appear here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundValues {
    values: BTreeMap<String, Value>,
}

impl BoundValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub(crate) fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Writes the values back as arguments in canonical form.
    ///
    /// Options use the inline `--name=value` form, flags are written as
    /// `--name` or `--name=false`, and positionals follow a `--` marker so
    /// that no value is mistaken for an option. Binding the result against
    /// the same parameters yields equal values.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_tree_core::{BoundValues, ParameterSpec, ValueKind};
    ///
    /// let params = [
    ///     ParameterSpec::flag("force"),
    ///     ParameterSpec::required("path", ValueKind::String),
    /// ];
    /// let values = BoundValues::new();
    /// assert!(values.canonical_args(params.iter()).is_empty());
    /// ```
    pub fn canonical_args<'a, I>(&self, parameters: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a ParameterSpec>,
    {
        let mut args = Vec::new();
        let mut positionals = Vec::new();

        for spec in parameters {
            let Some(value) = self.values.get(&spec.name) else {
                continue;
            };
            let prefix = match (&spec.long, spec.short) {
                (Some(long), _) => format!("--{long}"),
                (None, Some(short)) => format!("-{short}"),
                (None, None) => continue,
            };
            match spec.kind {
                ParameterKind::Flag => match value {
                    Value::Bool(true) => args.push(prefix),
                    other => {
                        for raw in other.canonical() {
                            args.push(format!("{prefix}={raw}"));
                        }
                    }
                },
                ParameterKind::Option => {
                    for raw in value.canonical() {
                        args.push(format!("{prefix}={raw}"));
                    }
                }
                ParameterKind::Positional => positionals.extend(value.canonical()),
            }
        }

        if !positionals.is_empty() {
            args.push("--".to_string());
            args.extend(positionals);
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueKind;

    #[test]
    fn test_into_typed_narrows_integers() {
        assert_eq!(Value::Integer(8080).into_typed::<u16>(), Ok(8080));
        assert!(Value::Integer(-1).into_typed::<u16>().is_err());
    }

    #[test]
    fn test_into_typed_reports_mismatch() {
        let err = Value::String("x".into()).into_typed::<bool>().unwrap_err();
        assert_eq!(
            err,
            AssignError::TypeMismatch {
                expected: "bool",
                found: "string"
            }
        );
    }

    #[test]
    fn test_custom_values_compare_by_literal() {
        let a = Value::Custom(CustomValue::new("10s", 10_u64));
        let b = Value::Custom(CustomValue::new("10s", 10_u64));
        assert_eq!(a, b);
        assert_eq!(a.downcast_ref::<u64>(), Some(&10));
    }

    #[test]
    fn test_canonical_args_layout() {
        let params = vec![
            ParameterSpec::flag("verbose"),
            ParameterSpec::flag("color"),
            ParameterSpec::option("tag", ValueKind::String).allow_multiple(),
            ParameterSpec::optional("files", ValueKind::String).allow_multiple(),
        ];
        let mut values = BoundValues::new();
        values.insert("verbose", Value::Bool(true));
        values.insert("color", Value::Bool(false));
        values.insert(
            "tag",
            Value::List(vec![Value::String("a".into()), Value::String("-b".into())]),
        );
        values.insert("files", Value::List(vec![Value::String("--x".into())]));

        assert_eq!(
            values.canonical_args(&params),
            vec!["--verbose", "--color=false", "--tag=a", "--tag=-b", "--", "--x"]
        );
    }
}
