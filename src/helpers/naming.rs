/// Converts a Kubernetes wire name (`imagePullPolicy`, `hostIP`) into a
/// Terraform attribute name (`image_pull_policy`, `host_ip`). Names that are
/// already snake_case come back unchanged.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '.' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map_or(false, |n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Terraform resource type name for a CRD, e.g.
/// `k8s_data_fluid_io_thin_runtime_v1alpha1` for `data.fluid.io/v1alpha1 ThinRuntime`.
pub fn resource_type_name(provider: &str, group: &str, kind: &str, version: &str) -> String {
    format!(
        "{}_{}_{}_{}",
        provider,
        to_snake_case(group),
        to_snake_case(kind),
        version
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_becomes_snake_case() {
        assert_eq!(to_snake_case("imagePullPolicy"), "image_pull_policy");
        assert_eq!(to_snake_case("runAs"), "run_as");
        assert_eq!(to_snake_case("tieredstore"), "tieredstore");
        assert_eq!(to_snake_case("hostIP"), "host_ip");
        assert_eq!(to_snake_case("HTTPGet"), "http_get");
        assert_eq!(to_snake_case("timeout_ms"), "timeout_ms");
        assert_eq!(to_snake_case("enable_ipv4"), "enable_ipv4");
    }

    #[test]
    fn resource_type_names() {
        assert_eq!(
            resource_type_name("k8s", "data.fluid.io", "ThinRuntime", "v1alpha1"),
            "k8s_data_fluid_io_thin_runtime_v1alpha1"
        );
        assert_eq!(
            resource_type_name("k8s", "getambassador.io", "Mapping", "v2"),
            "k8s_getambassador_io_mapping_v2"
        );
    }
}
