use regex::Regex;
use serde_json::Value;

use crate::provider::diagnostics::{AttributePath, Diagnostics};

const DNS1123_LABEL_MAX_LENGTH: usize = 63;
const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
const QUALIFIED_NAME_MAX_LENGTH: usize = 63;
const LABEL_VALUE_MAX_LENGTH: usize = 63;
const TOTAL_ANNOTATION_SIZE_LIMIT: usize = 256 * 1024;

lazy_static::lazy_static! {
    static ref DNS1123_LABEL: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap()
    };
    static ref DNS1123_SUBDOMAIN: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
    };
    static ref QUALIFIED_NAME: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").unwrap()
    };
    static ref LABEL_VALUE: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").unwrap()
    };
}

/// A schema `pattern`, compiled when the attribute is built.
#[derive(Clone, Debug)]
pub struct MatchPattern(Regex);

impl MatchPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

impl PartialEq for MatchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Checks attached to an attribute. The Kubernetes metadata checks are fixed,
/// the rest are lifted from the CRD's OpenAPI schema.
#[derive(Clone, Debug, PartialEq)]
pub enum Validator {
    Name,
    Namespace,
    Labels,
    Annotations,
    OneOf(Vec<String>),
    Pattern(MatchPattern),
    LengthBetween(Option<i64>, Option<i64>),
    Between(Option<f64>, Option<f64>),
}

impl Validator {
    pub fn validate(&self, path: &AttributePath, value: &Value, diags: &mut Diagnostics) {
        match self {
            Validator::Name => {
                if let Some(name) = value.as_str() {
                    for problem in dns1123_subdomain(name) {
                        diags.error(path, "Invalid Kubernetes name", problem);
                    }
                }
            }
            Validator::Namespace => {
                if let Some(namespace) = value.as_str() {
                    for problem in dns1123_label(namespace) {
                        diags.error(path, "Invalid Kubernetes namespace", problem);
                    }
                }
            }
            Validator::Labels => {
                if let Some(labels) = value.as_object() {
                    for (key, label) in labels {
                        let entry = path.key(key);
                        for problem in qualified_name(key) {
                            diags.error(&entry, "Invalid label key", problem);
                        }
                        if let Some(label) = label.as_str() {
                            for problem in label_value(label) {
                                diags.error(&entry, "Invalid label value", problem);
                            }
                        }
                    }
                }
            }
            Validator::Annotations => {
                if let Some(annotations) = value.as_object() {
                    let mut total = 0;
                    for (key, annotation) in annotations {
                        for problem in qualified_name(&key.to_lowercase()) {
                            diags.error(&path.key(key), "Invalid annotation key", problem);
                        }
                        total += key.len() + annotation.as_str().map(str::len).unwrap_or(0);
                    }
                    if total > TOTAL_ANNOTATION_SIZE_LIMIT {
                        diags.error(
                            path,
                            "Annotations too large",
                            format!(
                                "may not have more than {TOTAL_ANNOTATION_SIZE_LIMIT} bytes in total, got {total}"
                            ),
                        );
                    }
                }
            }
            Validator::OneOf(allowed) => {
                if let Some(s) = value.as_str() {
                    if !allowed.iter().any(|a| a == s) {
                        diags.error(
                            path,
                            "Invalid attribute value",
                            format!("value must be one of {allowed:?}, got {s:?}"),
                        );
                    }
                }
            }
            Validator::Pattern(pattern) => {
                if let Some(s) = value.as_str() {
                    if !pattern.is_match(s) {
                        diags.error(
                            path,
                            "Invalid attribute value",
                            format!("value {s:?} must match {:?}", pattern.as_str()),
                        );
                    }
                }
            }
            Validator::LengthBetween(min, max) => {
                if let Some(s) = value.as_str() {
                    let len = s.chars().count() as i64;
                    if min.map_or(false, |m| len < m) || max.map_or(false, |m| len > m) {
                        diags.error(
                            path,
                            "Invalid attribute length",
                            format!("length must be between {min:?} and {max:?}, got {len}"),
                        );
                    }
                }
            }
            Validator::Between(min, max) => {
                if let Some(n) = value.as_f64() {
                    if min.map_or(false, |m| n < m) || max.map_or(false, |m| n > m) {
                        diags.error(
                            path,
                            "Invalid attribute value",
                            format!("value must be between {min:?} and {max:?}, got {n}"),
                        );
                    }
                }
            }
        }
    }

    /// Human readable summary used in generated docs.
    pub fn describe(&self) -> String {
        match self {
            Validator::Name => "a DNS-1123 subdomain".to_string(),
            Validator::Namespace => "a DNS-1123 label".to_string(),
            Validator::Labels => "keys are qualified names, values are valid label values".to_string(),
            Validator::Annotations => "keys are qualified names".to_string(),
            Validator::OneOf(allowed) => format!("one of {}", allowed.join(", ")),
            Validator::Pattern(pattern) => format!("matches `{}`", pattern.as_str()),
            Validator::LengthBetween(min, max) => format!("of length {}", bounds(min, max)),
            Validator::Between(min, max) => bounds(min, max),
        }
    }
}

fn bounds<T: std::fmt::Display>(min: &Option<T>, max: &Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("between {min} and {max}"),
        (Some(min), None) => format!("at least {min}"),
        (None, Some(max)) => format!("at most {max}"),
        (None, None) => "unbounded".to_string(),
    }
}

pub fn dns1123_label(value: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        problems.push(format!("must be no more than {DNS1123_LABEL_MAX_LENGTH} characters"));
    }
    if !DNS1123_LABEL.is_match(value) {
        problems.push(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    problems
}

pub fn dns1123_subdomain(value: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if value.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        problems.push(format!("must be no more than {DNS1123_SUBDOMAIN_MAX_LENGTH} characters"));
    }
    if !DNS1123_SUBDOMAIN.is_match(value) {
        problems.push(
            "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, '-' or '.', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    problems
}

/// A qualified name is an optional DNS subdomain prefix and `/`, followed by a name.
pub fn qualified_name(value: &str) -> Vec<String> {
    let mut problems = Vec::new();
    let parts: Vec<&str> = value.split('/').collect();
    let name = match parts.as_slice() {
        [name] => *name,
        [prefix, name] => {
            if prefix.is_empty() {
                problems.push("prefix part must be non-empty".to_string());
            } else {
                problems.extend(
                    dns1123_subdomain(prefix)
                        .into_iter()
                        .map(|p| format!("prefix part {p}")),
                );
            }
            *name
        }
        _ => {
            problems.push(
                "a qualified name must consist of alphanumeric characters, '-', '_' or '.', \
                 with an optional DNS subdomain prefix and '/'"
                    .to_string(),
            );
            return problems;
        }
    };
    if name.is_empty() {
        problems.push("name part must be non-empty".to_string());
    } else {
        if name.len() > QUALIFIED_NAME_MAX_LENGTH {
            problems.push(format!(
                "name part must be no more than {QUALIFIED_NAME_MAX_LENGTH} characters"
            ));
        }
        if !QUALIFIED_NAME.is_match(name) {
            problems.push(
                "name part must consist of alphanumeric characters, '-', '_' or '.', \
                 and must start and end with an alphanumeric character"
                    .to_string(),
            );
        }
    }
    problems
}

pub fn label_value(value: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        problems.push(format!("must be no more than {LABEL_VALUE_MAX_LENGTH} characters"));
    }
    if !LABEL_VALUE.is_match(value) {
        problems.push(
            "a valid label must be an empty string or consist of alphanumeric characters, \
             '-', '_' or '.', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    problems
}
