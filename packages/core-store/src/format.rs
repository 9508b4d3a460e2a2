//! Rendering node state for people and machines.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use serde::Serialize;

use crate::{Error, Node, Properties, Transport};

/// Output format selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!("unsupported output format: '{}'", other)),
        }
    }
}

/// Serialize any value in one of the structured formats.
///
/// Text has no generic encoding and is reported as unsupported.
pub fn encode<S: Serialize + ?Sized>(value: &S, format: OutputFormat) -> Result<String, Error> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        OutputFormat::Text => Err(Error::Unsupported {
            operation: "text encoding",
        }),
    }
}

/// Fresh snapshot of the node as pretty JSON.
pub fn to_json<T: Transport + ?Sized>(node: &Node<'_, T>) -> Result<String, Error> {
    encode(&node.state()?, OutputFormat::Json)
}

/// Fresh snapshot of the node as YAML.
pub fn to_yaml<T: Transport + ?Sized>(node: &Node<'_, T>) -> Result<String, Error> {
    encode(&node.state()?, OutputFormat::Yaml)
}

/// Fresh snapshot of the node as text. Never fails.
///
/// A read failure degrades to a `state cannot be read` line.
pub fn to_text<T: Transport + ?Sized>(node: &Node<'_, T>) -> String {
    let state = match node.state() {
        Ok(state) => state,
        Err(e) => {
            tracing::debug!(path = %node.path(), error = %e, "cannot read node state for text output");
            return format!("path '{}' state cannot be read\n", node.path());
        }
    };
    match state.properties {
        Some(props) if state.exists => {
            format!("path '{}'\n{}\n", node.path(), props_table(&props))
        }
        _ => format!("path '{}' does not exist\n", node.path()),
    }
}

/// Render in the requested format.
pub fn render<T: Transport + ?Sized>(
    node: &Node<'_, T>,
    format: OutputFormat,
) -> Result<String, Error> {
    match format {
        OutputFormat::Text => Ok(to_text(node)),
        OutputFormat::Json => to_json(node),
        OutputFormat::Yaml => to_yaml(node),
    }
}

/// Two-column table of property names and values.
pub fn props_table(props: &Properties) -> Table {
    let mut table = Table::new();
    let _ = table.load_preset(UTF8_FULL);
    let _ = table.set_header(vec![
        Cell::new("Name").fg(Color::Blue),
        Cell::new("Value").fg(Color::Blue),
    ]);
    for (name, value) in props {
        let _ = table.add_row(vec![name.clone(), value.to_string()]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::RecordingTransport;
    use crate::Value;
    use collection_literals::btree;

    #[test]
    fn text_of_absent_node() {
        let transport = RecordingTransport::default();
        let node = Node::parse(&transport, "/content/missing").unwrap();
        assert_eq!(to_text(&node), "path '/content/missing' does not exist\n");
    }

    #[test]
    fn text_of_present_node_lists_properties() {
        let transport = RecordingTransport::default();
        transport.insert(
            "/content/a",
            btree! {
                "title".into() => Value::from("Hello"),
                "tags".into() => Value::from(vec!["x", "y"]),
            },
        );
        let node = Node::parse(&transport, "/content/a").unwrap();
        let text = to_text(&node);
        assert!(text.starts_with("path '/content/a'\n"));
        assert!(text.contains("title"));
        assert!(text.contains("Hello"));
        assert!(text.contains("[x, y]"));
    }

    #[test]
    fn text_degrades_on_read_failure() {
        let transport = RecordingTransport {
            fail_reads: true,
            ..Default::default()
        };
        transport.insert("/content/a", Properties::new());
        let node = Node::parse(&transport, "/content/a").unwrap();
        assert_eq!(to_text(&node), "path '/content/a' state cannot be read\n");
        assert!(to_json(&node).is_err());
    }

    #[test]
    fn json_snapshot() {
        let transport = RecordingTransport::default();
        transport.insert("/content/a", btree! { "title".into() => Value::from("Hello") });
        let node = Node::parse(&transport, "/content/a").unwrap();
        let json: serde_json::Value = serde_json::from_str(&to_json(&node).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"path": "/content/a", "exists": true, "properties": {"title": "Hello"}})
        );
    }

    #[test]
    fn yaml_snapshot() {
        let transport = RecordingTransport::default();
        transport.insert("/content/a", btree! { "title".into() => Value::from("Hello") });
        let node = Node::parse(&transport, "/content/a").unwrap();
        let yaml = render(&node, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("path: /content/a"));
        assert!(yaml.contains("exists: true"));
        assert!(yaml.contains("title: Hello"));
    }

    #[test]
    fn text_is_not_a_structured_encoding() {
        assert!(matches!(
            encode(&1, OutputFormat::Text),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("yml".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
