//! Cypher script export.
//!
//! The script is replayed against another database, so nothing from the
//! graph reaches it unchecked: property keys, labels, and relationship types
//! must be plain identifiers, and every value is rendered as a literal with
//! its quotes and control characters escaped.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use scaledown_core::{Properties, PropertyMap};

use crate::graph::ResourceGraph;

pub const FALLBACK_LABEL: &str = "GenericResource";
pub const MAX_IDENTIFIER_LEN: usize = 100;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Whether `s` may appear unquoted as a key, label, or relationship type.
pub fn is_safe_identifier(s: &str) -> bool {
    s.len() <= MAX_IDENTIFIER_LEN && IDENTIFIER_RE.is_match(s)
}

/// Escape a string for use inside a double-quoted Cypher literal.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Render a property value as a Cypher literal. `None` for nulls.
pub fn literal(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(format!("\"{}\"", escape_string(s))),
        Value::Array(_) | Value::Object(_) => {
            Some(format!("\"{}\"", escape_string(&value.to_string())))
        }
    }
}

/// Node label: the last `/` segment of the `type` property.
pub fn label_for(node_id: &str, properties: Option<&Properties>) -> String {
    let Some(kind) = properties
        .and_then(|p| p.get("type"))
        .and_then(Value::as_str)
    else {
        return FALLBACK_LABEL.to_string();
    };
    let label = kind.rsplit('/').next().unwrap_or(kind);
    if is_safe_identifier(label) {
        label.to_string()
    } else {
        tracing::warn!(node_id, label, "Unsafe label, using fallback");
        FALLBACK_LABEL.to_string()
    }
}

fn node_statement(id: &str, properties: Option<&Properties>) -> String {
    let mut fields = vec![format!("id: \"{}\"", escape_string(id))];
    if let Some(props) = properties {
        let mut keys: Vec<&String> = props.keys().collect();
        keys.sort();
        for key in keys {
            if key == "id" {
                continue;
            }
            if !is_safe_identifier(key) {
                tracing::warn!(node_id = id, key = %key, "Dropping property with unsafe key");
                continue;
            }
            if let Some(value) = literal(&props[key]) {
                fields.push(format!("{key}: {value}"));
            }
        }
    }
    format!(
        "CREATE (:{}:Resource {{{}}});",
        label_for(id, properties),
        fields.join(", ")
    )
}

/// Render the full script.
pub fn render(
    node_ids: &BTreeSet<String>,
    properties: &PropertyMap,
    subgraph: &ResourceGraph,
    generated_at: DateTime<Utc>,
) -> String {
    let mut relationships: Vec<(&str, &str, &str)> = subgraph
        .edges()
        .map(|(src, edge)| {
            (
                subgraph.id(src),
                subgraph.id(edge.target_index),
                edge.rel_type.as_str(),
            )
        })
        .collect();
    relationships.sort();

    let mut lines = vec![
        "// Scale-down sample export".to_string(),
        format!("// Generated: {}", generated_at.to_rfc3339()),
        format!("// Nodes: {}", node_ids.len()),
        format!("// Relationships: {}", relationships.len()),
        String::new(),
    ];

    for id in node_ids {
        lines.push(node_statement(id, properties.get(id)));
    }

    for (source, target, rel_type) in relationships {
        if !is_safe_identifier(rel_type) {
            tracing::warn!(source, target, rel_type, "Skipping relationship with unsafe type");
            continue;
        }
        lines.push(format!(
            "MATCH (a:Resource{{id:\"{}\"}}),(b:Resource{{id:\"{}\"}}) CREATE (a)-[:{rel_type}]->(b);",
            escape_string(source),
            escape_string(target),
        ));
    }

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(pairs: &[(&str, Value)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_safe_identifier() {
        assert!(is_safe_identifier("virtualMachines"));
        assert!(is_safe_identifier("_x1"));
        assert!(!is_safe_identifier("bad name!"));
        assert!(!is_safe_identifier("1abc"));
        assert!(!is_safe_identifier("a`b"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier(&"a".repeat(101)));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_string("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
        assert_eq!(literal(&json!(true)).unwrap(), "true");
        assert_eq!(literal(&json!(3.5)).unwrap(), "3.5");
        assert_eq!(literal(&json!(null)), None);
        assert_eq!(literal(&json!(["x"])).unwrap(), "\"[\\\"x\\\"]\"");
    }

    #[test]
    fn test_label_from_type() {
        let p = props(&[("type", json!("Microsoft.Compute/virtualMachines"))]);
        assert_eq!(label_for("n", Some(&p)), "virtualMachines");
        assert_eq!(label_for("n", None), FALLBACK_LABEL);

        let hostile = props(&[("type", json!("x/Foo) DETACH DELETE (n"))]);
        assert_eq!(label_for("n", Some(&hostile)), FALLBACK_LABEL);
    }

    #[test]
    fn test_unsafe_key_dropped_node_kept() {
        let mut properties = PropertyMap::new();
        properties.insert(
            "vm-1".to_string(),
            props(&[
                ("bad name!", json!("x")),
                ("name", json!("web")),
                ("type", json!("Microsoft.Compute/virtualMachines")),
            ]),
        );
        let ids = BTreeSet::from(["vm-1".to_string()]);
        let graph = ResourceGraph::from_edge_list(["vm-1"], std::iter::empty());

        let script = render(&ids, &properties, &graph, Utc::now());
        assert!(script.contains(
            "CREATE (:virtualMachines:Resource {id: \"vm-1\", name: \"web\", type: \"Microsoft.Compute/virtualMachines\"});"
        ));
        assert!(!script.contains("bad name"));
    }

    #[test]
    fn test_script_layout() {
        let graph = ResourceGraph::from_edge_list(
            ["a", "b"],
            [("a", "b", "DEPENDS_ON"), ("b", "a", "bad-type")],
        );
        let ids: BTreeSet<String> = graph.ids().iter().cloned().collect();
        let script = render(&ids, &PropertyMap::new(), &graph, Utc::now());
        let lines: Vec<&str> = script.lines().collect();

        assert_eq!(lines[0], "// Scale-down sample export");
        assert!(lines[1].starts_with("// Generated: "));
        assert_eq!(lines[2], "// Nodes: 2");
        assert_eq!(lines[3], "// Relationships: 2");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "CREATE (:GenericResource:Resource {id: \"a\"});");
        assert_eq!(
            lines[7],
            "MATCH (a:Resource{id:\"a\"}),(b:Resource{id:\"b\"}) CREATE (a)-[:DEPENDS_ON]->(b);"
        );
        assert_eq!(lines.len(), 8);
    }
}
