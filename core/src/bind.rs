//! Binding of residual tokens to the target command's parameters.
//!
//! The binder separates option occurrences from positional candidates,
//! resolves each occurrence against the effective parameters of the target
//! (its own plus the options and flags of its ancestors), fills positionals
//! in declaration order and converts every raw value.

use std::iter::Peekable;
use std::slice::Iter;

use tracing::debug;

use crate::error::{ParseError, RuntimeError};
use crate::services::ServiceResolver;
use crate::settings::{Settings, SettingsType};
use crate::tokenizer::Token;
use crate::tree::{CommandTree, NodeId};
use crate::types::{DuplicateOptionPolicy, ParameterSpec, ParserSettings, ValueArity};
use crate::value::{BoundValues, Value};

/// Values bound for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    /// Converted values keyed by parameter name.
    pub values: BoundValues,
    /// Arguments passed through unbound.
    pub remaining: Vec<String>,
}

impl Binding {
    /// Creates a settings instance and assigns the bound values to it.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::SettingsUnavailable`] when no instance can be
    /// created, or [`RuntimeError::Assignment`] when the settings type
    /// rejects a value.
    pub fn instantiate(
        &self,
        settings: &SettingsType,
        resolver: &dyn ServiceResolver,
    ) -> Result<Box<dyn Settings>, RuntimeError> {
        let mut instance =
            settings
                .construct(resolver)
                .ok_or_else(|| RuntimeError::SettingsUnavailable {
                    settings: settings.name().to_string(),
                })?;

        for (name, value) in self.values.iter() {
            instance
                .assign(name, value.clone())
                .map_err(|source| RuntimeError::Assignment {
                    parameter: name.to_string(),
                    settings: settings.name().to_string(),
                    source,
                })?;
        }
        Ok(instance)
    }
}

struct Candidate {
    value: String,
    after_marker: bool,
}

/// Binds residual tokens for a resolved command.
///
/// # Examples
///
/// ```
/// use command_tree_core::*;
///
/// let tree = TreeBuilder::new(
///     CommandBuilder::leaf("tail", ())
///         .with_parameter(ParameterSpec::option("lines", ValueKind::Integer).with_short('n'))
///         .with_parameter(ParameterSpec::flag("follow").with_short('f'))
///         .with_parameter(ParameterSpec::required("file", ValueKind::String)),
/// )
/// .build()
/// .unwrap();
///
/// let tokens = Tokenizer::new(&ParserSettings::default())
///     .tokenize(&["-fn", "20", "log.txt"])
///     .unwrap();
/// let binding = Binder::new(&tree, &ParserSettings::default())
///     .bind(tree.root(), &tokens)
///     .unwrap();
///
/// assert_eq!(binding.values.get("lines"), Some(&Value::Integer(20)));
/// assert_eq!(binding.values.get("follow"), Some(&Value::Bool(true)));
/// assert_eq!(binding.values.get("file"), Some(&Value::String("log.txt".into())));
/// ```
#[derive(Debug)]
pub struct Binder<'t, H> {
    tree: &'t CommandTree<H>,
    settings: ParserSettings,
}

impl<'t, H> Binder<'t, H> {
    pub fn new(tree: &'t CommandTree<H>, settings: &ParserSettings) -> Self {
        Self {
            tree,
            settings: *settings,
        }
    }

    /// Binds `tokens` against the parameters of `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for unknown options (strict parsing),
    /// options without values, repeated options under
    /// [`DuplicateOptionPolicy::Error`], surplus arguments (strict parsing),
    /// values that fail conversion and missing required parameters.
    pub fn bind(&self, target: NodeId, tokens: &[Token]) -> Result<Binding, ParseError> {
        let parameters = self.tree.effective_parameters(target);
        let mut occurrences: Vec<Vec<String>> = vec![Vec::new(); parameters.len()];
        let mut candidates = Vec::new();
        let mut remaining = Vec::new();

        let mut tokens = tokens.iter().peekable();
        while let Some(token) = tokens.next() {
            match token {
                Token::RemainderMarker => {}
                Token::PositionalValue(value) => candidates.push(Candidate {
                    value: value.clone(),
                    after_marker: true,
                }),
                Token::CommandWord(word) => candidates.push(Candidate {
                    value: word.clone(),
                    after_marker: false,
                }),
                Token::LongOption { name, value } => {
                    let case_sensitive = self.settings.case_sensitivity.long_options();
                    let index = parameters
                        .iter()
                        .position(|spec| !spec.is_positional() && spec.matches_long(name, case_sensitive));
                    match index {
                        Some(index) => {
                            let raw = self.option_value(parameters[index], value.clone(), &mut tokens)?;
                            self.record(parameters[index], &mut occurrences[index], raw)?;
                        }
                        None => self.unknown_option(target, token.raw(), &mut remaining)?,
                    }
                }
                Token::ShortOptionGroup { chars, value } => {
                    let declared = |c: char| {
                        parameters
                            .iter()
                            .position(|spec| !spec.is_positional() && spec.matches_short(c))
                    };
                    if let Some(number) = token.negative_number() {
                        if chars.chars().all(|c| declared(c).is_none()) {
                            candidates.push(Candidate {
                                value: number,
                                after_marker: false,
                            });
                            continue;
                        }
                    }

                    let count = chars.chars().count();
                    for (n, c) in chars.chars().enumerate() {
                        let last = n + 1 == count;
                        let Some(index) = declared(c) else {
                            let option = match value {
                                Some(value) if last => format!("-{c}={value}"),
                                _ => format!("-{c}"),
                            };
                            self.unknown_option(target, option, &mut remaining)?;
                            continue;
                        };
                        let spec = parameters[index];
                        let inline = if last { value.clone() } else { None };
                        if spec.takes_value() && !last {
                            return Err(ParseError::MissingValue {
                                option: format!("-{c}"),
                            });
                        }
                        let raw = self.option_value(spec, inline, &mut tokens)?;
                        self.record(spec, &mut occurrences[index], raw)?;
                    }
                }
            }
        }

        self.assign_positionals(target, &parameters, &mut occurrences, candidates, &mut remaining)?;
        let values = self.convert(&parameters, occurrences)?;

        debug!(
            command = %self.tree.display_path(target),
            bound = values.len(),
            remaining = remaining.len(),
            "bound arguments"
        );
        Ok(Binding { values, remaining })
    }

    fn option_value(
        &self,
        spec: &ParameterSpec,
        inline: Option<String>,
        tokens: &mut Peekable<Iter<'_, Token>>,
    ) -> Result<String, ParseError> {
        if !spec.takes_value() {
            return Ok(inline.unwrap_or_else(|| "true".to_string()));
        }
        if let Some(value) = inline {
            return Ok(value);
        }

        let next = match tokens.peek() {
            Some(Token::CommandWord(word)) => Some(word.clone()),
            Some(token) => token.negative_number(),
            None => None,
        };
        match next {
            Some(value) => {
                tokens.next();
                Ok(value)
            }
            None => Err(ParseError::MissingValue {
                option: spec.display_name(),
            }),
        }
    }

    fn record(
        &self,
        spec: &ParameterSpec,
        occurrences: &mut Vec<String>,
        raw: String,
    ) -> Result<(), ParseError> {
        if spec.arity == ValueArity::Single && !occurrences.is_empty() {
            match self.settings.duplicate_options {
                DuplicateOptionPolicy::Error => {
                    return Err(ParseError::DuplicateOption {
                        option: spec.display_name(),
                    });
                }
                DuplicateOptionPolicy::LastWins => occurrences.clear(),
            }
        }
        occurrences.push(raw);
        Ok(())
    }

    fn unknown_option(
        &self,
        target: NodeId,
        option: String,
        remaining: &mut Vec<String>,
    ) -> Result<(), ParseError> {
        if self.settings.strict_parsing {
            return Err(ParseError::UnknownOption {
                option,
                command: self.tree.display_path(target),
            });
        }
        debug!(option = %option, "passing unknown option through");
        remaining.push(option);
        Ok(())
    }

    fn assign_positionals(
        &self,
        target: NodeId,
        parameters: &[&ParameterSpec],
        occurrences: &mut [Vec<String>],
        candidates: Vec<Candidate>,
        remaining: &mut Vec<String>,
    ) -> Result<(), ParseError> {
        let mut candidates = candidates.into_iter().peekable();

        for (index, spec) in parameters.iter().enumerate() {
            if !spec.is_positional() {
                continue;
            }
            match spec.arity {
                ValueArity::Single => {
                    if let Some(candidate) = candidates.next() {
                        occurrences[index].push(candidate.value);
                    }
                }
                ValueArity::Multiple => {
                    occurrences[index].extend(candidates.by_ref().map(|c| c.value));
                }
            }
        }

        for candidate in candidates {
            if candidate.after_marker || !self.settings.strict_parsing {
                remaining.push(candidate.value);
            } else {
                return Err(ParseError::UnexpectedArgument {
                    value: candidate.value,
                    command: self.tree.display_path(target),
                });
            }
        }
        Ok(())
    }

    fn convert(
        &self,
        parameters: &[&ParameterSpec],
        occurrences: Vec<Vec<String>>,
    ) -> Result<BoundValues, ParseError> {
        let converters = self.tree.converters();
        let convert = |spec: &ParameterSpec, raw: &str| {
            converters
                .convert(&spec.value_kind, raw)
                .map_err(|reason| ParseError::InvalidValue {
                    parameter: spec.name.clone(),
                    value: raw.to_string(),
                    reason,
                })
        };

        let mut converted: Vec<Option<Value>> = Vec::with_capacity(parameters.len());
        for (spec, raws) in parameters.iter().zip(&occurrences) {
            let value = match (spec.arity, raws.as_slice()) {
                (_, []) => None,
                (ValueArity::Single, [.., last]) => Some(convert(spec, last)?),
                (ValueArity::Multiple, raws) => Some(Value::List(
                    raws.iter()
                        .map(|raw| convert(spec, raw))
                        .collect::<Result<_, _>>()?,
                )),
            };
            converted.push(value);
        }

        if let Some(missing) = parameters
            .iter()
            .zip(&converted)
            .find(|(spec, value)| spec.required && value.is_none())
        {
            return Err(ParseError::MissingRequired {
                parameter: missing.0.name.clone(),
            });
        }

        let mut values = BoundValues::new();
        for (spec, value) in parameters.iter().zip(converted) {
            let value = match (value, &spec.default_value) {
                (Some(value), _) => value,
                (None, Some(default)) => {
                    let value = convert(spec, default)?;
                    match spec.arity {
                        ValueArity::Single => value,
                        ValueArity::Multiple => Value::List(vec![value]),
                    }
                }
                (None, None) => continue,
            };
            values.insert(&spec.name, value);
        }
        Ok(values)
    }
}
