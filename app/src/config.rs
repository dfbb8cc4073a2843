//! Application-wide settings.
//!
//! [`AppSettings`] is plain serde data: build it in code or deserialize it
//! from any serde source. Missing fields take their defaults.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "application_name": "tree-demo",
//!   "application_version": "1.2.0",
//!   "case_sensitivity": "Commands",
//!   "strict_parsing": true,
//!   "duplicate_options": "Error",
//!   "propagate_exceptions": false,
//!   "validate_examples": true,
//!   "culture": "en-US"
//! }
//! ```

use command_tree_core::{CaseSensitivity, DuplicateOptionPolicy, ParserSettings};
use serde::{Deserialize, Serialize};

/// Global settings applied to every run of a
/// [`CommandApp`](crate::CommandApp).
///
/// # Examples
///
/// ```
/// use command_tree::{AppSettings, CaseSensitivity};
///
/// let settings: AppSettings =
///     serde_json::from_str(r#"{ "case_sensitivity": "None", "propagate_exceptions": true }"#)
///         .unwrap();
/// assert_eq!(settings.case_sensitivity, CaseSensitivity::None);
/// assert!(settings.propagate_exceptions);
/// assert!(settings.strict_parsing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Name reported by the version command; defaults to the root command name.
    pub application_name: Option<String>,
    /// Version reported by the version command.
    pub application_version: Option<String>,
    /// Which names are matched case-sensitively.
    pub case_sensitivity: CaseSensitivity,
    /// Reject unknown options and surplus arguments.
    pub strict_parsing: bool,
    /// Policy for repeated single-valued options.
    pub duplicate_options: DuplicateOptionPolicy,
    /// Return failures from `run` instead of handling them.
    pub propagate_exceptions: bool,
    /// Parse every declared example when the application is built.
    pub validate_examples: bool,
    /// Culture tag recorded for formatting collaborators.
    pub culture: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            application_name: None,
            application_version: None,
            case_sensitivity: CaseSensitivity::default(),
            strict_parsing: true,
            duplicate_options: DuplicateOptionPolicy::default(),
            propagate_exceptions: false,
            validate_examples: false,
            culture: None,
        }
    }
}

impl AppSettings {
    /// The parsing subset handed to the tokenizer, resolver and binder.
    pub fn parser_settings(&self) -> ParserSettings {
        ParserSettings {
            case_sensitivity: self.case_sensitivity,
            strict_parsing: self.strict_parsing,
            duplicate_options: self.duplicate_options,
        }
    }
}
