//! Settings values bound from the command line.
//!
//! A settings type declares its parameters through
//! [`Settings::parameters`] and receives converted values through
//! [`Settings::assign`]; no reflection is involved. [`SettingsType`] is the
//! constructor-function entry the binder uses to instantiate one.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::AssignError;
use crate::services::{ServiceResolver, resolve_service};
use crate::types::ParameterSpec;
use crate::value::Value;

/// Upcast to [`Any`] for trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Outcome of a validation hook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    #[default]
    Success,
    Failure(String),
}

impl ValidationResult {
    pub fn success() -> Self {
        Self::Success
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Strongly-typed settings of a command.
///
/// # Examples
///
/// ```
/// use command_tree_core::{AssignError, ParameterSpec, Settings, Value, ValueKind};
///
/// #[derive(Debug, Default)]
/// struct CopySettings {
///     source: String,
///     force: bool,
/// }
///
/// impl Settings for CopySettings {
///     fn parameters() -> Vec<ParameterSpec> {
///         vec![
///             ParameterSpec::required("source", ValueKind::String),
///             ParameterSpec::flag("force").with_short('f'),
///         ]
///     }
///
///     fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
///         match parameter {
///             "source" => self.source = value.into_typed()?,
///             "force" => self.force = value.into_typed()?,
///             other => return Err(AssignError::UnknownParameter(other.to_string())),
///         }
///         Ok(())
///     }
/// }
///
/// let mut settings = CopySettings::default();
/// settings.assign("force", Value::Bool(true)).unwrap();
/// assert!(settings.force);
/// assert!(settings.validate().is_success());
/// ```
pub trait Settings: AsAny + fmt::Debug + Send + Sync + 'static {
    /// Parameters this settings type declares.
    ///
    /// Options inherited from ancestor branches are declared there, not
    /// here, but their values still arrive through [`assign`](Settings::assign).
    fn parameters() -> Vec<ParameterSpec>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Stores a converted value in the field for `parameter`.
    fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError>;

    /// Validates the settings after binding.
    fn validate(&self) -> ValidationResult {
        ValidationResult::Success
    }
}

impl dyn Settings {
    /// Returns the settings as `T` if that is their concrete type.
    pub fn downcast_ref<T: Settings>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Settings>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn is<T: Settings>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Settings for commands without parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptySettings;

impl Settings for EmptySettings {
    fn assign(&mut self, parameter: &str, _value: Value) -> Result<(), AssignError> {
        Err(AssignError::UnknownParameter(parameter.to_string()))
    }
}

type Factory = fn(&dyn ServiceResolver) -> Option<Box<dyn Settings>>;

fn construct_or_default<S: Settings + Default>(
    resolver: &dyn ServiceResolver,
) -> Option<Box<dyn Settings>> {
    let settings = resolve_service::<S>(resolver).unwrap_or_default();
    Some(Box::new(settings))
}

fn construct_resolved<S: Settings>(resolver: &dyn ServiceResolver) -> Option<Box<dyn Settings>> {
    resolve_service::<S>(resolver).map(|settings| Box::new(settings) as Box<dyn Settings>)
}

/// Constructor entry for a settings type, keyed by its [`TypeId`].
#[derive(Clone, Copy)]
pub struct SettingsType {
    id: TypeId,
    name: &'static str,
    parameters: fn() -> Vec<ParameterSpec>,
    factory: Factory,
}

impl SettingsType {
    /// Settings resolved from services, falling back to `S::default()`.
    pub fn of<S: Settings + Default>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
            parameters: S::parameters,
            factory: construct_or_default::<S>,
        }
    }

    /// Settings that can only come from the service resolver.
    pub fn resolved<S: Settings>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
            parameters: S::parameters,
            factory: construct_resolved::<S>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Parameters declared by the settings type.
    pub fn parameters(&self) -> Vec<ParameterSpec> {
        (self.parameters)()
    }

    /// Instantiates the settings, or `None` if no instance is available.
    pub fn construct(&self, resolver: &dyn ServiceResolver) -> Option<Box<dyn Settings>> {
        (self.factory)(resolver)
    }
}

impl fmt::Debug for SettingsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsType")
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for SettingsType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{NoServices, ServiceRegistry};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Counter {
        count: i64,
    }

    impl Settings for Counter {
        fn assign(&mut self, parameter: &str, value: Value) -> Result<(), AssignError> {
            match parameter {
                "count" => self.count = value.into_typed()?,
                other => return Err(AssignError::UnknownParameter(other.to_string())),
            }
            Ok(())
        }
    }

    #[test]
    fn test_default_construction_without_services() {
        let settings = SettingsType::of::<Counter>()
            .construct(&NoServices)
            .unwrap();
        assert_eq!(settings.downcast_ref::<Counter>(), Some(&Counter::default()));
    }

    #[test]
    fn test_resolver_takes_precedence() {
        let mut services = ServiceRegistry::new();
        services.register_instance(Counter { count: 7 });

        let settings = SettingsType::of::<Counter>().construct(&services).unwrap();
        assert_eq!(settings.downcast_ref::<Counter>().unwrap().count, 7);
    }

    #[test]
    fn test_resolved_only_fails_without_registration() {
        assert!(SettingsType::resolved::<Counter>()
            .construct(&NoServices)
            .is_none());
    }

    #[test]
    fn test_downcast_through_trait_object() {
        let mut boxed: Box<dyn Settings> = Box::new(Counter::default());
        boxed.downcast_mut::<Counter>().unwrap().count = 3;

        assert!(boxed.is::<Counter>());
        assert!(!boxed.is::<EmptySettings>());
        assert_eq!(boxed.downcast_ref::<Counter>().unwrap().count, 3);
    }
}
