use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};
use log::*;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::helpers::naming::to_snake_case;
use crate::helpers::validators::{MatchPattern, Validator};

pub type Attributes = BTreeMap<String, Attribute>;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    Required,
    Optional,
    Computed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeKind {
    String,
    /// Kubernetes `IntOrString`: configured as a string, emitted as an integer
    /// whenever the value parses as one.
    IntOrString,
    Int64,
    Float64,
    Bool,
    Dynamic,
    List(Box<Attribute>),
    Map(Box<Attribute>),
    Object(Attributes),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub description: Option<String>,
    pub requirement: Requirement,
    pub kind: AttributeKind,
    /// Field name in the Kubernetes manifest.
    pub wire_name: String,
    pub validators: Vec<Validator>,
}

impl Attribute {
    pub fn new(wire_name: &str, kind: AttributeKind, requirement: Requirement) -> Self {
        Self {
            description: None,
            requirement,
            kind,
            wire_name: wire_name.to_string(),
            validators: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Builds the attribute for one node of a CRD's OpenAPI v3 schema.
    pub fn from_crd_schema(wire_name: &str, props: &JSONSchemaProps, requirement: Requirement) -> Self {
        Self {
            description: props.description.clone(),
            requirement,
            kind: kind_of(props),
            wire_name: wire_name.to_string(),
            validators: validators_of(props),
        }
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }

    pub fn is_computed(&self) -> bool {
        self.requirement == Requirement::Computed
    }

    /// Nested attributes when this attribute (or its collection element) is an object.
    pub fn nested(&self) -> Option<&Attributes> {
        match &self.kind {
            AttributeKind::Object(attributes) => Some(attributes),
            AttributeKind::List(element) | AttributeKind::Map(element) => match &element.kind {
                AttributeKind::Object(attributes) => Some(attributes),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        match (&self.kind, self.nested()) {
            (AttributeKind::Object(_), Some(attributes)) => {
                out.insert("nested_type".into(), nested_type(attributes, "single"));
            }
            (AttributeKind::List(_), Some(attributes)) => {
                out.insert("nested_type".into(), nested_type(attributes, "list"));
            }
            (AttributeKind::Map(_), Some(attributes)) => {
                out.insert("nested_type".into(), nested_type(attributes, "map"));
            }
            _ => {
                out.insert("type".into(), self.kind.cty_type());
            }
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
            out.insert("description_kind".into(), json!("markdown"));
        }
        let flag = match self.requirement {
            Requirement::Required => "required",
            Requirement::Optional => "optional",
            Requirement::Computed => "computed",
        };
        out.insert(flag.into(), json!(true));
        Value::Object(out)
    }
}

fn nested_type(attributes: &Attributes, nesting_mode: &str) -> Value {
    let attributes: serde_json::Map<String, Value> = attributes
        .iter()
        .map(|(name, attribute)| (name.clone(), attribute.to_json()))
        .collect();
    json!({ "attributes": attributes, "nesting_mode": nesting_mode })
}

impl AttributeKind {
    /// Type expression in Terraform's JSON schema notation.
    pub fn cty_type(&self) -> Value {
        match self {
            AttributeKind::String | AttributeKind::IntOrString => json!("string"),
            AttributeKind::Int64 | AttributeKind::Float64 => json!("number"),
            AttributeKind::Bool => json!("bool"),
            AttributeKind::Dynamic => json!("dynamic"),
            AttributeKind::List(element) => json!(["list", element.kind.cty_type()]),
            AttributeKind::Map(element) => json!(["map", element.kind.cty_type()]),
            AttributeKind::Object(attributes) => {
                let fields: serde_json::Map<String, Value> = attributes
                    .iter()
                    .map(|(name, attribute)| (name.clone(), attribute.kind.cty_type()))
                    .collect();
                json!(["object", fields])
            }
        }
    }

    /// Short name used in generated documentation, e.g. `List of Object`.
    pub fn label(&self) -> String {
        match self {
            AttributeKind::String | AttributeKind::IntOrString => "String".to_string(),
            AttributeKind::Int64 => "Number".to_string(),
            AttributeKind::Float64 => "Number".to_string(),
            AttributeKind::Bool => "Boolean".to_string(),
            AttributeKind::Dynamic => "Dynamic".to_string(),
            AttributeKind::List(element) => format!("List of {}", element.kind.label()),
            AttributeKind::Map(element) => format!("Map of {}", element.kind.label()),
            AttributeKind::Object(_) => "Object".to_string(),
        }
    }
}

fn kind_of(props: &JSONSchemaProps) -> AttributeKind {
    // schemars marks IntOrString with a format rather than the extension
    if props.x_kubernetes_int_or_string == Some(true)
        || props.format.as_deref() == Some("int-or-string")
    {
        return AttributeKind::IntOrString;
    }
    match props.type_.as_deref() {
        Some("string") => AttributeKind::String,
        Some("integer") => AttributeKind::Int64,
        Some("number") => AttributeKind::Float64,
        Some("boolean") => AttributeKind::Bool,
        Some("array") => {
            let item = match &props.items {
                Some(JSONSchemaPropsOrArray::Schema(item)) => Some(item.as_ref()),
                Some(JSONSchemaPropsOrArray::Schemas(items)) => items.first(),
                None => None,
            };
            let element = match item {
                Some(item) => Attribute::from_crd_schema("", item, Requirement::Optional),
                None => Attribute::new("", AttributeKind::Dynamic, Requirement::Optional),
            };
            AttributeKind::List(Box::new(element))
        }
        _ => object_kind(props),
    }
}

fn object_kind(props: &JSONSchemaProps) -> AttributeKind {
    if let Some(properties) = props.properties.as_ref().filter(|p| !p.is_empty()) {
        let required: BTreeSet<&str> = props
            .required
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        let attributes = properties
            .iter()
            .map(|(wire_name, child)| {
                let requirement = if required.contains(wire_name.as_str()) {
                    Requirement::Required
                } else {
                    Requirement::Optional
                };
                (
                    to_snake_case(wire_name),
                    Attribute::from_crd_schema(wire_name, child, requirement),
                )
            })
            .collect();
        return AttributeKind::Object(attributes);
    }
    match &props.additional_properties {
        Some(JSONSchemaPropsOrBool::Schema(element)) => AttributeKind::Map(Box::new(
            Attribute::from_crd_schema("", element, Requirement::Optional),
        )),
        Some(JSONSchemaPropsOrBool::Bool(true)) => AttributeKind::Map(Box::new(Attribute::new(
            "",
            AttributeKind::Dynamic,
            Requirement::Optional,
        ))),
        _ => AttributeKind::Dynamic,
    }
}

fn validators_of(props: &JSONSchemaProps) -> Vec<Validator> {
    let mut validators = Vec::new();
    if let Some(values) = &props.enum_ {
        let allowed: Vec<String> = values
            .iter()
            .filter_map(|v| v.0.as_str().map(str::to_string))
            .collect();
        if !allowed.is_empty() {
            validators.push(Validator::OneOf(allowed));
        }
    }
    if let Some(pattern) = &props.pattern {
        match MatchPattern::new(pattern) {
            Ok(pattern) => validators.push(Validator::Pattern(pattern)),
            Err(err) => warn!("not enforcing pattern {pattern:?}: {err}"),
        }
    }
    if props.min_length.is_some() || props.max_length.is_some() {
        validators.push(Validator::LengthBetween(props.min_length, props.max_length));
    }
    if props.minimum.is_some() || props.maximum.is_some() {
        validators.push(Validator::Between(props.minimum, props.maximum));
    }
    if props.type_.as_deref() == Some("integer") && props.format.as_deref() == Some("int32") {
        validators.push(Validator::Between(
            Some(f64::from(i32::MIN)),
            Some(f64::from(i32::MAX)),
        ));
    }
    validators
}

/// Schema of a single Terraform resource type.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    pub attributes: Attributes,
}

impl Schema {
    /// The layout shared by every manifest resource: computed bookkeeping
    /// fields, Kubernetes metadata and the kind's `spec`.
    pub fn manifest(description: &str, spec: Attribute) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(
            "id".to_string(),
            Attribute::new("id", AttributeKind::Int64, Requirement::Computed)
                .with_description("Time-based identifier of the rendered manifest."),
        );
        attributes.insert(
            "api_version".to_string(),
            Attribute::new("apiVersion", AttributeKind::String, Requirement::Computed)
                .with_description("The API group and version of the manifest."),
        );
        attributes.insert(
            "kind".to_string(),
            Attribute::new("kind", AttributeKind::String, Requirement::Computed)
                .with_description("The Kubernetes kind of the manifest."),
        );
        attributes.insert(
            "yaml".to_string(),
            Attribute::new("yaml", AttributeKind::String, Requirement::Computed)
                .with_description("The rendered manifest in YAML format."),
        );
        attributes.insert("metadata".to_string(), metadata_attribute());
        attributes.insert("spec".to_string(), spec);
        Self {
            version: 0,
            description: description.to_string(),
            attributes,
        }
    }

    /// Schema with no attributes, used for the provider block.
    pub fn empty(description: &str) -> Self {
        Self {
            version: 0,
            description: description.to_string(),
            attributes: Attributes::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        let attributes: serde_json::Map<String, Value> = self
            .attributes
            .iter()
            .map(|(name, attribute)| (name.clone(), attribute.to_json()))
            .collect();
        let mut block = json!({
            "description": self.description,
            "description_kind": "markdown",
        });
        if !attributes.is_empty() {
            block["attributes"] = Value::Object(attributes);
        }
        json!({ "version": self.version, "block": block })
    }

    /// Every attribute with its dotted path, depth first.
    pub fn flatten(&self) -> Vec<(String, &Attribute)> {
        let mut out = Vec::new();
        flatten_into("", &self.attributes, &mut out);
        out
    }
}

fn flatten_into<'a>(prefix: &str, attributes: &'a Attributes, out: &mut Vec<(String, &'a Attribute)>) {
    for (name, attribute) in attributes {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        out.push((path.clone(), attribute));
        if let Some(nested) = attribute.nested() {
            flatten_into(&path, nested, out);
        }
    }
}

fn metadata_attribute() -> Attribute {
    let string_map = || {
        AttributeKind::Map(Box::new(Attribute::new(
            "",
            AttributeKind::String,
            Requirement::Optional,
        )))
    };
    let mut attributes = Attributes::new();
    attributes.insert(
        "name".to_string(),
        Attribute::new("name", AttributeKind::String, Requirement::Required)
            .with_description("Unique name of the object within its namespace.")
            .with_validator(Validator::Name),
    );
    attributes.insert(
        "namespace".to_string(),
        Attribute::new("namespace", AttributeKind::String, Requirement::Optional)
            .with_description("Namespace the object belongs to.")
            .with_validator(Validator::Namespace),
    );
    attributes.insert(
        "labels".to_string(),
        Attribute::new("labels", string_map(), Requirement::Optional)
            .with_description("Map of string keys and values used to organize and select objects.")
            .with_validator(Validator::Labels),
    );
    attributes.insert(
        "annotations".to_string(),
        Attribute::new("annotations", string_map(), Requirement::Optional)
            .with_description("Unstructured key value map stored with the object.")
            .with_validator(Validator::Annotations),
    );
    Attribute::new("metadata", AttributeKind::Object(attributes), Requirement::Required)
        .with_description("Data that helps uniquely identify the object.")
}

/// The `spec` attribute of a CRD's served version. It is required as soon as
/// the `spec` object has required fields.
pub fn spec_attribute(crd: &CustomResourceDefinition) -> Result<Attribute> {
    let name = crd.metadata.name.clone().unwrap_or_default();
    let spec = crd
        .spec
        .versions
        .iter()
        .find(|version| version.served)
        .and_then(|version| version.schema.as_ref())
        .and_then(|validation| validation.open_api_v3_schema.as_ref())
        .and_then(|root| root.properties.as_ref())
        .and_then(|properties| properties.get("spec"))
        .ok_or_else(|| Error::MissingSchema(name))?;
    let requirement = if spec.required.as_ref().map_or(false, |r| !r.is_empty()) {
        Requirement::Required
    } else {
        Requirement::Optional
    };
    Ok(Attribute::from_crd_schema("spec", spec, requirement))
}
