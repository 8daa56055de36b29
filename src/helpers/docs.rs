use std::fs;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use log::*;
use serde::Serialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::provider::schema::{Attribute, AttributeKind, Attributes, Requirement, Schema};
use crate::provider::{Provider, PROVIDER_TYPE_NAME};

const RESOURCE_TEMPLATE: &str = r#"---
page_title: "{{type_name}} Resource - terraform-provider-k8s"
subcategory: "{{kind}}"
description: |-
  {{description}}
---

# {{type_name}} (Resource)

{{description}}

## Example Usage

```terraform
{{example}}
```

## Schema

| Attribute | Type | Requirement | Description |
|-----------|------|-------------|-------------|
{{#each rows}}
| `{{path}}` | {{type}} | {{requirement}} | {{description}} |
{{/each}}
"#;

const INDEX_TEMPLATE: &str = r#"---
page_title: "k8s Provider"
description: |-
  Renders Kubernetes custom resources as YAML manifests.
---

# k8s Provider

Renders Kubernetes custom resources as YAML manifests and keeps them in
Terraform state. The provider never contacts a cluster and takes no
configuration.

## Resources

{{#each resources}}
- [{{this}}](resources/{{this}}.md)
{{/each}}
"#;

#[derive(Serialize)]
struct Row {
    path: String,
    #[serde(rename = "type")]
    type_: String,
    requirement: Requirement,
    description: String,
}

/// Writes `index.md` and one page per resource under `dir`. Returns the
/// files written.
pub fn generate_docs(provider: &Provider, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reg = Handlebars::new();
    reg.register_escape_fn(handlebars::no_escape);
    reg.register_template_string("resource", RESOURCE_TEMPLATE)
        .map_err(|err| Error::TemplateError(err.into()))?;
    reg.register_template_string("index", INDEX_TEMPLATE)
        .map_err(|err| Error::TemplateError(err.into()))?;

    let resources_dir = dir.join("resources");
    fs::create_dir_all(&resources_dir)?;

    let mut written = Vec::new();
    let mut pages = Vec::new();
    for resource in provider.resources() {
        let page = page_name(resource.type_name());
        let rendered = render_resource(&reg, resource.type_name(), resource.schema())?;
        let path = resources_dir.join(format!("{page}.md"));
        fs::write(&path, rendered)?;
        debug!("wrote {}", path.display());
        written.push(path);
        pages.push(page);
    }

    let index = reg
        .render("index", &json!({ "resources": pages }))
        .map_err(Error::TemplateError)?;
    let index_path = dir.join("index.md");
    fs::write(&index_path, index)?;
    written.push(index_path);
    Ok(written)
}

fn page_name(type_name: &str) -> String {
    type_name
        .strip_prefix(&format!("{PROVIDER_TYPE_NAME}_"))
        .unwrap_or(type_name)
        .to_string()
}

fn render_resource(reg: &Handlebars, type_name: &str, schema: &Schema) -> Result<String> {
    let rows: Vec<Row> = schema
        .flatten()
        .into_iter()
        .map(|(path, attribute)| Row {
            path,
            type_: attribute.kind.label(),
            requirement: attribute.requirement,
            description: describe(attribute),
        })
        .collect();
    let kind = schema
        .description
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();
    reg.render(
        "resource",
        &json!({
            "type_name": type_name,
            "kind": kind,
            "description": schema.description,
            "example": example(type_name, schema),
            "rows": rows,
        }),
    )
    .map_err(Error::TemplateError)
}

/// Single line, table safe description with the attribute's constraints.
fn describe(attribute: &Attribute) -> String {
    let mut text = attribute
        .description
        .clone()
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|");
    for validator in &attribute.validators {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&format!("Must be {}.", validator.describe()));
    }
    text
}

/// HCL for the smallest valid configuration: every required attribute, recursively.
fn example(type_name: &str, schema: &Schema) -> String {
    let mut out = format!("resource \"{type_name}\" \"example\" {{\n");
    write_required(&schema.attributes, 1, &mut out);
    out.push('}');
    out
}

fn write_required(attributes: &Attributes, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for (name, attribute) in attributes.iter().filter(|(_, a)| a.is_required()) {
        out.push_str(&format!("{indent}{name} = "));
        write_value(attribute, depth, out);
        out.push('\n');
    }
}

fn write_value(attribute: &Attribute, depth: usize, out: &mut String) {
    match &attribute.kind {
        AttributeKind::Object(nested) => {
            out.push_str("{\n");
            write_required(nested, depth + 1, out);
            out.push_str(&format!("{}}}", "  ".repeat(depth)));
        }
        AttributeKind::List(element) => {
            out.push('[');
            write_value(element, depth, out);
            out.push(']');
        }
        AttributeKind::Map(_) | AttributeKind::Dynamic => out.push_str("{}"),
        AttributeKind::Int64 | AttributeKind::Float64 => out.push('1'),
        AttributeKind::Bool => out.push_str("true"),
        AttributeKind::String | AttributeKind::IntOrString => {
            let sample = attribute
                .validators
                .iter()
                .find_map(|v| match v {
                    crate::helpers::validators::Validator::OneOf(allowed) => allowed.first().cloned(),
                    _ => None,
                })
                .unwrap_or_else(|| "example".to_string());
            out.push_str(&format!("{sample:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_page_per_resource() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Provider::new().unwrap();
        let written = generate_docs(&provider, dir.path()).unwrap();
        assert_eq!(written.len(), 3);

        let mapping = fs::read_to_string(dir.path().join("resources/getambassador_io_mapping_v2.md")).unwrap();
        assert!(mapping.contains("# k8s_getambassador_io_mapping_v2 (Resource)"));
        assert!(mapping.contains("| `spec.prefix` | String | required |"));
        assert!(mapping.contains("| `yaml` | String | computed |"));
        assert!(mapping.contains("Must be a DNS-1123 subdomain."));

        let index = fs::read_to_string(dir.path().join("index.md")).unwrap();
        assert!(index.contains("resources/data_fluid_io_thin_runtime_v1alpha1.md"));
    }

    #[test]
    fn example_contains_required_attributes_only() {
        let provider = Provider::new().unwrap();
        let resource = provider.resource("k8s_getambassador_io_mapping_v2").unwrap();
        let hcl = example(resource.type_name(), resource.schema());
        assert!(hcl.starts_with("resource \"k8s_getambassador_io_mapping_v2\" \"example\" {"));
        assert!(hcl.contains("    name = \"example\""));
        assert!(hcl.contains("    prefix = \"example\""));
        assert!(hcl.contains("    service = \"example\""));
        assert!(!hcl.contains("namespace"));
        assert!(!hcl.contains("yaml"));
    }
}
