//! Declarative structural validation.
//!
//! A [`RuleTable`] lists, per field, the rules its value must satisfy. The
//! table is built once by the loader and passed by reference to
//! [`validate_structure`], which checks every field and collects every
//! violation. Within one value, checking stops at the first failing rule.
//!
//! Fields that are not set skip every rule except [`Rule::Required`].
//!
//! # Examples
//!
//! ```rust
//! use devenv_config::structural::{validate_structure, RuleTable};
//! use devenv_config::{DevEnvConfig, LoaderSettings};
//!
//! let table = RuleTable::standard(&LoaderSettings::default());
//! let result = validate_structure(&DevEnvConfig::default(), &table);
//!
//! // `name` and `image` are required.
//! assert_eq!(result.errors.len(), 2);
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::{
    dev_env_config::DevEnvConfig,
    formats::{is_cron, is_email, is_file_path, is_hostname, is_url},
    loader::LoaderSettings,
    raw_value::RawValue,
    ssh_keys::{is_valid_ssh_key, normalize_ssh_keys},
    validator::{ValidationError, ValidationErrorType, ValidationResult},
};

/// Accepted for CPU and memory in place of a quantity.
pub const UNLIMITED: &str = "unlimited";

static K8S_CPU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(\.[0-9]+)?([mM]|[eE][+-]?[0-9]+)?$").expect("CPU quantity pattern is valid")
});

static K8S_MEMORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9]+(\.[0-9]+)?\s*([kmgtpe]i?)?b?$")
        .expect("memory quantity pattern is valid")
});

/// String shapes checked by [`Rule::Format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Hostname,
    Email,
    FilePath,
    Cron,
    Url,
}

impl Format {
    fn matches(self, value: &str) -> bool {
        match self {
            Format::Hostname => is_hostname(value),
            Format::Email => is_email(value),
            Format::FilePath => is_file_path(value),
            Format::Cron => is_cron(value),
            Format::Url => is_url(value),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Format::Hostname => "a valid hostname (letters, digits and '-', 1-63 characters per label)",
            Format::Email => "a valid email address",
            Format::FilePath => "a non-empty path without control characters",
            Format::Cron => "a valid cron expression (five fields or an @ shorthand)",
            Format::Url => "an absolute URL with a host",
        }
    }
}

/// Field-specific predicates that look at the raw, pre-canonical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomCheck {
    /// Every key is `<key-type> <base64>[ comment]`.
    SshKeys,
    /// A Kubernetes CPU quantity or `unlimited`.
    K8sCpu,
    /// A Kubernetes memory quantity or `unlimited`.
    K8sMemory,
}

/// A single structural rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Range { min: i64, max: i64 },
    MaxLength(usize),
    Format(Format),
    Custom(CustomCheck),
}

/// A value extracted from a configuration for checking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Text(&'a str),
    Integer(i64),
    Raw(&'a RawValue),
}

impl FieldValue<'_> {
    fn is_missing(&self) -> bool {
        match self {
            FieldValue::Missing => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Integer(_) => false,
            FieldValue::Raw(raw) => raw.is_absent(),
        }
    }
}

/// Extracts the values of one field; list fields yield one value per entry.
pub type FieldExtractor = fn(&DevEnvConfig) -> Vec<FieldValue<'_>>;

/// The rules for one field.
///
/// A `[]` in `field_path` marks a list field; it is rendered as `[i]` in
/// errors.
#[derive(Clone)]
pub struct FieldRule {
    pub field_path: &'static str,
    pub rules: Vec<Rule>,
    values: FieldExtractor,
}

impl FieldRule {
    pub fn new(field_path: &'static str, rules: Vec<Rule>, values: FieldExtractor) -> Self {
        Self {
            field_path,
            rules,
            values,
        }
    }

    fn path_for(&self, index: usize) -> String {
        if self.field_path.contains("[]") {
            self.field_path.replacen("[]", &format!("[{}]", index), 1)
        } else {
            self.field_path.to_string()
        }
    }
}

impl std::fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule")
            .field("field_path", &self.field_path)
            .field("rules", &self.rules)
            .finish()
    }
}

/// The full set of structural rules applied to a developer configuration.
#[derive(Debug, Clone)]
pub struct RuleTable {
    fields: Vec<FieldRule>,
}

impl RuleTable {
    /// Builds a table from explicit field rules.
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    /// The rules every developer configuration must satisfy.
    pub fn standard(settings: &LoaderSettings) -> Self {
        let max_gpu = i64::from(settings.max_gpu_count);

        Self::new(vec![
            FieldRule::new(
                "name",
                vec![
                    Rule::Required,
                    Rule::Format(Format::Hostname),
                    Rule::MaxLength(63),
                ],
                |c| vec![text(&c.name)],
            ),
            FieldRule::new("image", vec![Rule::Required], |c| {
                vec![text(&c.base.image)]
            }),
            FieldRule::new(
                "uid",
                vec![Rule::Range {
                    min: 1000,
                    max: 65535,
                }],
                |c| vec![integer(c.base.uid)],
            ),
            FieldRule::new("ssh_port", vec![NODE_PORT], |c| vec![integer(c.ssh_port)]),
            FieldRule::new("http_port", vec![NODE_PORT], |c| {
                vec![integer(c.http_port)]
            }),
            FieldRule::new(
                "resources.cpu",
                vec![Rule::Custom(CustomCheck::K8sCpu)],
                |c| vec![FieldValue::Raw(&c.base.resources.cpu)],
            ),
            FieldRule::new(
                "resources.memory",
                vec![Rule::Custom(CustomCheck::K8sMemory)],
                |c| vec![FieldValue::Raw(&c.base.resources.memory)],
            ),
            FieldRule::new(
                "resources.gpu",
                vec![Rule::Range {
                    min: 0,
                    max: max_gpu,
                }],
                |c| vec![integer(c.base.resources.gpu)],
            ),
            FieldRule::new(
                "ssh_public_key",
                vec![Rule::Custom(CustomCheck::SshKeys)],
                |c| vec![FieldValue::Raw(&c.base.ssh_public_key)],
            ),
            FieldRule::new(
                "python_bin_path",
                vec![Rule::Format(Format::FilePath)],
                |c| vec![text(&c.base.python_bin_path)],
            ),
            FieldRule::new("pip_index_url", vec![Rule::Format(Format::Url)], |c| {
                vec![text(&c.base.pip_index_url)]
            }),
            FieldRule::new("git.email", vec![Rule::Format(Format::Email)], |c| {
                vec![text(&c.git.email)]
            }),
            FieldRule::new("git.name", vec![Rule::MaxLength(100)], |c| {
                vec![text(&c.git.name)]
            }),
            FieldRule::new(
                "refresh.schedule",
                vec![Rule::Format(Format::Cron)],
                |c| vec![text(&c.refresh.schedule)],
            ),
            FieldRule::new(
                "target_nodes[]",
                vec![Rule::Format(Format::Hostname)],
                |c| c.target_nodes.iter().map(|node| FieldValue::Text(node)).collect(),
            ),
            FieldRule::new(
                "volumes[].name",
                vec![Rule::Required, Rule::Format(Format::Hostname)],
                |c| {
                    c.base
                        .volumes
                        .iter()
                        .map(|volume| FieldValue::Text(&volume.name))
                        .collect()
                },
            ),
            FieldRule::new(
                "volumes[].local_path",
                vec![Rule::Required, Rule::Format(Format::FilePath)],
                |c| {
                    c.base
                        .volumes
                        .iter()
                        .map(|volume| FieldValue::Text(&volume.local_path))
                        .collect()
                },
            ),
            FieldRule::new(
                "volumes[].container_path",
                vec![Rule::Required, Rule::Format(Format::FilePath)],
                |c| {
                    c.base
                        .volumes
                        .iter()
                        .map(|volume| FieldValue::Text(&volume.container_path))
                        .collect()
                },
            ),
        ])
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }
}

/// Kubernetes NodePort range.
const NODE_PORT: Rule = Rule::Range {
    min: 30000,
    max: 32767,
};

fn text(value: &Option<String>) -> FieldValue<'_> {
    value
        .as_deref()
        .map_or(FieldValue::Missing, FieldValue::Text)
}

fn integer(value: Option<i64>) -> FieldValue<'static> {
    value.map_or(FieldValue::Missing, FieldValue::Integer)
}

/// Checks a configuration against every rule in the table.
///
/// Returns all violations found; the result is valid only when none were.
pub fn validate_structure(config: &DevEnvConfig, table: &RuleTable) -> ValidationResult {
    let mut result = ValidationResult::new();

    for field in table.fields() {
        for (index, value) in (field.values)(config).into_iter().enumerate() {
            let path = field.path_for(index);
            if let Some(error) = check_value(&path, &field.rules, value) {
                result.add_error(error);
            }
        }
    }

    result
}

/// Returns the first rule violation for a value, if any.
fn check_value(path: &str, rules: &[Rule], value: FieldValue<'_>) -> Option<ValidationError> {
    if value.is_missing() {
        return rules.contains(&Rule::Required).then(|| ValidationError {
            error_type: ValidationErrorType::RequiredFieldMissing,
            field_path: path.to_string(),
            message: format!("{} is required", path),
            suggestion: None,
        });
    }

    rules
        .iter()
        .find_map(|rule| check_rule(path, *rule, value))
}

fn check_rule(path: &str, rule: Rule, value: FieldValue<'_>) -> Option<ValidationError> {
    let error = |error_type, message: String| {
        Some(ValidationError {
            error_type,
            field_path: path.to_string(),
            message,
            suggestion: None,
        })
    };

    match (rule, value) {
        (Rule::Required, _) => None,
        (Rule::Range { min, max }, FieldValue::Integer(n)) if !(min..=max).contains(&n) => error(
            ValidationErrorType::OutOfRange,
            format!("must be between {} and {}, got {}", min, max, n),
        ),
        (Rule::MaxLength(limit), FieldValue::Text(text)) if text.chars().count() > limit => error(
            ValidationErrorType::InvalidValue,
            format!(
                "must be at most {} characters, got {}",
                limit,
                text.chars().count()
            ),
        ),
        (Rule::Format(format), FieldValue::Text(text)) if !format.matches(text) => error(
            ValidationErrorType::InvalidFormat,
            format!("must be {}, got '{}'", format.describe(), text),
        ),
        (Rule::Custom(check), FieldValue::Raw(raw)) => check_custom(path, check, raw),
        _ => None,
    }
}

fn check_custom(path: &str, check: CustomCheck, raw: &RawValue) -> Option<ValidationError> {
    let (error_type, message) = match check {
        CustomCheck::SshKeys => check_ssh_keys(raw)?,
        CustomCheck::K8sCpu => check_quantity(raw, &K8S_CPU, "CPU quantity (e.g. \"2\", \"500m\")")?,
        CustomCheck::K8sMemory => {
            check_quantity(raw, &K8S_MEMORY, "memory quantity (e.g. \"512Mi\", \"8Gi\")")?
        }
    };

    Some(ValidationError {
        error_type,
        field_path: path.to_string(),
        message,
        suggestion: match check {
            CustomCheck::SshKeys => Some(
                "Use the contents of a public key file such as ~/.ssh/id_ed25519.pub".to_string(),
            ),
            CustomCheck::K8sCpu | CustomCheck::K8sMemory => None,
        },
    })
}

fn check_ssh_keys(raw: &RawValue) -> Option<(ValidationErrorType, String)> {
    let keys = match normalize_ssh_keys(raw) {
        Ok(keys) => keys,
        Err(e) => return Some((ValidationErrorType::InvalidValue, e.to_string())),
    };

    let index = keys.iter().position(|key| !is_valid_ssh_key(key))?;
    Some((
        ValidationErrorType::InvalidFormat,
        format!(
            "entry {} is not a valid SSH public key; expected '<key-type> <base64> [comment]'",
            index
        ),
    ))
}

fn check_quantity(
    raw: &RawValue,
    pattern: &Regex,
    expected: &str,
) -> Option<(ValidationErrorType, String)> {
    let negative = || {
        Some((
            ValidationErrorType::OutOfRange,
            "must not be negative".to_string(),
        ))
    };

    match raw {
        RawValue::Absent => None,
        RawValue::Integer(n) if *n < 0 => negative(),
        RawValue::Integer(_) => None,
        RawValue::Float(f) if !f.is_finite() => Some((
            ValidationErrorType::InvalidValue,
            "must be a finite number".to_string(),
        )),
        RawValue::Float(f) if *f < 0.0 => negative(),
        RawValue::Float(_) => None,
        RawValue::Text(text) => {
            let text = text.trim();
            if text.eq_ignore_ascii_case(UNLIMITED) || pattern.is_match(text) {
                None
            } else if text.starts_with('-') {
                negative()
            } else {
                Some((
                    ValidationErrorType::InvalidFormat,
                    format!("must be a {} or '{}', got '{}'", expected, UNLIMITED, text),
                ))
            }
        }
        other => Some((
            ValidationErrorType::InvalidValue,
            format!("unsupported type {}, expected a string or a number", other.kind()),
        )),
    }
}

#[cfg(test)]
#[path = "structural_tests.rs"]
mod tests;
