use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One step of an attribute path: an attribute name, a list index or a map key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PathStep {
    Attribute(String),
    Index(usize),
    Key(String),
}

/// Location of a value inside a resource configuration, rendered the way
/// Terraform prints it, e.g. `spec.fuse.env[0].name` or `metadata.labels["app"]`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn attribute(&self, name: &str) -> Self {
        self.with(PathStep::Attribute(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(PathStep::Index(index))
    }

    pub fn key(&self, key: &str) -> Self {
        self.with(PathStep::Key(key.to_string()))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    fn with(&self, step: PathStep) -> Self {
        let mut steps = self.0.clone();
        steps.push(step);
        Self(steps)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{name}")?,
                PathStep::Attribute(name) => write!(f, ".{name}")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
                PathStep::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(path) if !path.is_root() => write!(f, "{}: {} ({})", path, self.summary, self.detail),
            _ => write!(f, "{} ({})", self.summary, self.detail),
        }
    }
}

/// Ordered collection of diagnostics produced while validating a configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, path: &AttributePath, summary: &str, detail: impl Into<String>) {
        self.push(Severity::Error, path, summary, detail.into());
    }

    pub fn warning(&mut self, path: &AttributePath, summary: &str, detail: impl Into<String>) {
        self.push(Severity::Warning, path, summary, detail.into());
    }

    fn push(&mut self, severity: Severity, path: &AttributePath, summary: &str, detail: String) {
        self.0.push(Diagnostic {
            severity,
            summary: summary.to_string(),
            detail,
            attribute: Some(path.clone()),
        })
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0)
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_renders_like_terraform() {
        let path = AttributePath::root()
            .attribute("spec")
            .attribute("fuse")
            .attribute("env")
            .index(0)
            .attribute("name");
        assert_eq!(path.to_string(), "spec.fuse.env[0].name");

        let labels = AttributePath::root().attribute("metadata").attribute("labels").key("app");
        assert_eq!(labels.to_string(), "metadata.labels[\"app\"]");
    }

    #[test]
    fn warnings_are_not_errors() {
        let mut diags = Diagnostics::new();
        diags.warning(&AttributePath::root(), "Deprecated", "use something else");
        assert!(!diags.has_errors());
        diags.error(&AttributePath::root().attribute("spec"), "Invalid", "bad");
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 2);
        assert!(diags.to_string().contains("spec: Invalid (bad)"));
    }
}
