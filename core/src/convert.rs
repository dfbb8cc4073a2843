//! Conversion of raw argument strings into typed [`Value`]s.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::{CustomType, ValueKind};
use crate::value::{CustomValue, Value};

type ConvertFn = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// User-extensible converter registry keyed by target type.
///
/// Built-in kinds ([`ValueKind::Bool`], [`ValueKind::Integer`], ...) are
/// always available; [`ValueKind::Custom`] kinds look up a converter
/// registered with [`register`](ConverterRegistry::register).
///
/// # Examples
///
/// ```
/// use command_tree_core::{ConverterRegistry, CustomType, Value, ValueKind};
///
/// #[derive(Debug, PartialEq)]
/// struct Port(u16);
///
/// let mut converters = ConverterRegistry::new();
/// converters.register(|raw: &str| {
///     raw.parse::<u16>().map(Port).map_err(|e| e.to_string())
/// });
///
/// let kind = ValueKind::Custom(CustomType::of::<Port>());
/// let value = converters.convert(&kind, "8080").unwrap();
/// assert_eq!(value.downcast_ref::<Port>(), Some(&Port(8080)));
///
/// assert_eq!(converters.convert(&ValueKind::Integer, "-3"), Ok(Value::Integer(-3)));
/// assert!(converters.convert(&ValueKind::Integer, "three").is_err());
/// ```
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<TypeId, ConvertFn>,
    names: Vec<&'static str>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the converter for `T`, replacing any previous one.
    pub fn register<T, F>(&mut self, convert: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    {
        let ty = CustomType::of::<T>();
        let wrapped: ConvertFn = Arc::new(move |raw: &str| {
            convert(raw).map(|value| Value::Custom(CustomValue::new(raw, value)))
        });
        if self.converters.insert(ty.id, wrapped).is_none() {
            self.names.push(ty.name);
        }
        self
    }

    /// Returns `true` if a converter exists for the custom type.
    pub fn contains(&self, ty: &CustomType) -> bool {
        self.converters.contains_key(&ty.id)
    }

    /// Converts `raw` to the given kind.
    ///
    /// # Errors
    ///
    /// Returns a reason string when the literal does not parse or no
    /// converter is registered for a custom kind.
    pub fn convert(&self, kind: &ValueKind, raw: &str) -> Result<Value, String> {
        match kind {
            ValueKind::Bool => parse_bool(raw).map(Value::Bool),
            ValueKind::String => Ok(Value::String(raw.to_string())),
            ValueKind::Integer => raw
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| format!("expected an integer ({e})")),
            ValueKind::Float => raw
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("expected a number ({e})")),
            ValueKind::Enum(members) => parse_enum(members, raw).map(Value::Enum),
            ValueKind::Custom(ty) => match self.converters.get(&ty.id) {
                Some(convert) => convert(raw),
                None => Err(format!("no converter registered for '{}'", ty.name)),
            },
        }
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("types", &self.names)
            .finish()
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}

fn parse_enum(members: &[String], raw: &str) -> Result<String, String> {
    members
        .iter()
        .find(|member| member.eq_ignore_ascii_case(raw))
        .cloned()
        .ok_or_else(|| format!("expected one of: {}", members.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_spellings() {
        let converters = ConverterRegistry::new();
        for raw in ["true", "YES", "on", "1"] {
            assert_eq!(
                converters.convert(&ValueKind::Bool, raw),
                Ok(Value::Bool(true))
            );
        }
        assert_eq!(
            converters.convert(&ValueKind::Bool, "Off"),
            Ok(Value::Bool(false))
        );
        assert!(converters.convert(&ValueKind::Bool, "maybe").is_err());
    }

    #[test]
    fn test_enum_matches_case_insensitively() {
        let converters = ConverterRegistry::new();
        let kind = ValueKind::enumeration(["Json", "Yaml"]);

        assert_eq!(
            converters.convert(&kind, "yaml"),
            Ok(Value::Enum("Yaml".into()))
        );
        let err = converters.convert(&kind, "toml").unwrap_err();
        assert_eq!(err, "expected one of: Json, Yaml");
    }

    #[test]
    fn test_float_accepts_integers() {
        let converters = ConverterRegistry::new();
        assert_eq!(
            converters.convert(&ValueKind::Float, "2"),
            Ok(Value::Float(2.0))
        );
    }

    #[test]
    fn test_unregistered_custom_type() {
        struct Unknown;
        let converters = ConverterRegistry::new();
        let kind = ValueKind::Custom(CustomType::of::<Unknown>());

        assert!(!converters.contains(&CustomType::of::<Unknown>()));
        assert!(converters.convert(&kind, "x").is_err());
    }
}
