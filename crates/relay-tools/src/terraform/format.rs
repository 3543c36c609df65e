//! Rendering JSON values as Terraform (HCL) syntax.
//!
//! Deterministic: object keys are emitted in sorted order and the same input
//! always produces the same text.

use serde_json::{Map, Value};

/// Prefixes of expressions that are emitted without quotes.
const REFERENCE_PREFIXES: &[&str] = &["var.", "local.", "module.", "${", "terraform."];

/// Arguments that are maps in every provider and must not become blocks.
const MAP_ARGUMENTS: &[&str] = &["tags", "labels", "annotations"];

const INDENT: usize = 2;

/// Whether a string is a Terraform expression rather than a literal.
pub fn is_reference(s: &str) -> bool {
    REFERENCE_PREFIXES.iter().any(|prefix| s.starts_with(prefix))
}

/// Quote a string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn map_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

fn sorted(object: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = object.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Render a value as a Terraform expression.
///
/// `indent` is the column the enclosing line starts at; multi-line maps are
/// indented relative to it.
///
/// ```
/// use relay_tools::format_terraform_value;
/// use serde_json::json;
///
/// assert_eq!(format_terraform_value(&json!("var.region"), 0), "var.region");
/// assert_eq!(format_terraform_value(&json!("eu"), 0), "\"eu\"");
/// assert_eq!(format_terraform_value(&json!([1, true, null]), 0), "[1, true, null]");
/// ```
pub fn format_terraform_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if is_reference(s) => s.clone(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items
                .iter()
                .map(|item| format_terraform_value(item, indent))
                .collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(object) if object.is_empty() => "{}".to_string(),
        Value::Object(object) => {
            let pad = " ".repeat(indent);
            let inner = " ".repeat(indent + INDENT);
            let mut out = String::from("{\n");
            for (key, value) in sorted(object) {
                out.push_str(&format!(
                    "{}{} = {}\n",
                    inner,
                    map_key(key),
                    format_terraform_value(value, indent + INDENT)
                ));
            }
            out.push_str(&pad);
            out.push('}');
            out
        }
    }
}

/// Find the first attribute name that cannot appear in a block body.
///
/// Keys inside map arguments and map-valued expressions are quoted on output
/// and are not checked. Returns the dotted path of the offending key.
pub fn invalid_attribute_name(attributes: &Map<String, Value>) -> Option<String> {
    for (key, value) in sorted(attributes) {
        if !is_identifier(key) {
            return Some(key.clone());
        }
        if MAP_ARGUMENTS.contains(&key.as_str()) {
            continue;
        }
        let nested: Vec<&Map<String, Value>> = match value {
            Value::Object(nested) => vec![nested],
            Value::Array(items) if is_block_list(value) => {
                items.iter().filter_map(Value::as_object).collect()
            }
            _ => Vec::new(),
        };
        for body in nested {
            if let Some(inner) = invalid_attribute_name(body) {
                return Some(format!("{}.{}", key, inner));
            }
        }
    }
    None
}

fn is_block_list(value: &Value) -> bool {
    matches!(value, Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object))
}

fn write_body(out: &mut String, attributes: &Map<String, Value>, indent: usize) {
    let pad = " ".repeat(indent);
    for (key, value) in sorted(attributes) {
        let as_block = !MAP_ARGUMENTS.contains(&key.as_str());
        match value {
            Value::Object(nested) if as_block => {
                out.push_str(&format!("{}{} {{\n", pad, key));
                write_body(out, nested, indent + INDENT);
                out.push_str(&format!("{}}}\n", pad));
            }
            Value::Array(items) if as_block && is_block_list(value) => {
                for item in items {
                    if let Value::Object(nested) = item {
                        out.push_str(&format!("{}{} {{\n", pad, key));
                        write_body(out, nested, indent + INDENT);
                        out.push_str(&format!("{}}}\n", pad));
                    }
                }
            }
            _ => {
                out.push_str(&format!(
                    "{}{} = {}\n",
                    pad,
                    map_key(key),
                    format_terraform_value(value, indent)
                ));
            }
        }
    }
}

/// Render a complete `resource` block.
///
/// Object-valued attributes become nested blocks and lists of objects become
/// repeated blocks, except for `tags`, `labels` and `annotations`, which stay
/// map arguments.
pub fn format_resource_block(
    resource_type: &str,
    resource_name: &str,
    attributes: &Map<String, Value>,
) -> String {
    let mut out = format!("resource {} {} {{\n", quote(resource_type), quote(resource_name));
    write_body(&mut out, attributes, INDENT);
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_scalars() {
        assert_eq!(format_terraform_value(&Value::Null, 0), "null");
        assert_eq!(format_terraform_value(&json!(true), 0), "true");
        assert_eq!(format_terraform_value(&json!(false), 0), "false");
        assert_eq!(format_terraform_value(&json!(42), 0), "42");
        assert_eq!(format_terraform_value(&json!(1.5), 0), "1.5");
    }

    #[test]
    fn test_reference_strings_are_unquoted() {
        for s in [
            "var.project",
            "local.name",
            "module.net.id",
            "${var.a}-x",
            "terraform.workspace",
        ] {
            assert_eq!(format_terraform_value(&json!(s), 0), s);
        }
        assert_eq!(format_terraform_value(&json!("variable"), 0), "\"variable\"");
        assert_eq!(format_terraform_value(&json!("my var.x"), 0), "\"my var.x\"");
    }

    #[test]
    fn test_control_characters_are_escaped() {
        assert_eq!(
            format_terraform_value(&json!("a\r\tb\u{7}"), 0),
            r#""a\r\tb\u0007""#
        );
    }

    #[test]
    fn test_invalid_attribute_names() {
        let ok = attrs(json!({
            "name": "x",
            "tags": { "cost center": "ops" },
            "lifecycle": { "prevent_destroy": true }
        }));
        assert_eq!(invalid_attribute_name(&ok), None);

        let bad = attrs(json!({ "display name": "x" }));
        assert_eq!(invalid_attribute_name(&bad), Some("display name".to_string()));

        let nested = attrs(json!({ "ingress": [{ "from port": 80 }] }));
        assert_eq!(invalid_attribute_name(&nested), Some("ingress.from port".to_string()));
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(
            format_terraform_value(&json!("say \"hi\"\\\nbye"), 0),
            r#""say \"hi\"\\\nbye""#
        );
    }

    #[test]
    fn test_lists_and_maps() {
        assert_eq!(
            format_terraform_value(&json!(["a", "var.b", 3]), 0),
            r#"["a", var.b, 3]"#
        );
        assert_eq!(format_terraform_value(&json!([]), 0), "[]");
        assert_eq!(format_terraform_value(&json!({}), 0), "{}");
        assert_eq!(
            format_terraform_value(&json!({ "b": 1, "a": { "x": null }, "with space": "v" }), 0),
            "{\n  a = {\n    x = null\n  }\n  b = 1\n  \"with space\" = \"v\"\n}"
        );
    }

    #[test]
    fn test_resource_block() {
        let block = format_resource_block(
            "google_project",
            "my_project",
            &attrs(json!({
                "name": "My Project",
                "billing_account": "var.billing_account",
            })),
        );
        assert_eq!(
            block,
            "resource \"google_project\" \"my_project\" {\n  billing_account = var.billing_account\n  name = \"My Project\"\n}\n"
        );
    }

    #[test]
    fn test_nested_blocks_and_map_arguments() {
        let block = format_resource_block(
            "aws_instance",
            "web",
            &attrs(json!({
                "ami": "ami-123",
                "root_block_device": { "volume_size": 20 },
                "ebs_block_device": [
                    { "device_name": "/dev/sdb" },
                    { "device_name": "/dev/sdc" }
                ],
                "tags": { "Name": "web" },
                "security_groups": ["sg-1"]
            })),
        );
        let expected = "\
resource \"aws_instance\" \"web\" {
  ami = \"ami-123\"
  ebs_block_device {
    device_name = \"/dev/sdb\"
  }
  ebs_block_device {
    device_name = \"/dev/sdc\"
  }
  root_block_device {
    volume_size = 20
  }
  security_groups = [\"sg-1\"]
  tags = {
    Name = \"web\"
  }
}
";
        assert_eq!(block, expected);
    }
}
