//! JSON and YAML parsers

use super::Parser;
use crate::error::ParseError;
use crate::node::Node;

/// Guess a content type from a URI's extension.
pub fn content_type_for(uri: &str) -> Option<&'static str> {
    let path = uri.split(['#', '?']).next().unwrap_or(uri);
    let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
    match extension.as_str() {
        "json" => Some("application/json"),
        "yaml" | "yml" => Some("application/yaml"),
        _ => None,
    }
}

/// Strict JSON parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, raw: &str, _content_type: Option<&str>) -> Result<Node, ParseError> {
        serde_json::from_str::<serde_json::Value>(raw)
            .map(Node::from)
            .map_err(|e| ParseError::new(format!("JSON: {}", e)).with_location(e.line(), e.column()))
    }
}

/// YAML parser (YAML 1.2 via `serde_yaml`).
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl Parser for YamlParser {
    fn parse(&self, raw: &str, _content_type: Option<&str>) -> Result<Node, ParseError> {
        serde_yaml::from_str::<serde_json::Value>(raw)
            .map(Node::from)
            .map_err(|e| {
                let err = ParseError::new(format!("YAML: {}", e));
                match e.location() {
                    Some(location) => err.with_location(location.line(), location.column()),
                    None => err,
                }
            })
    }
}

/// Picks JSON or YAML from the content type.
///
/// Without a usable content type it tries JSON first, then YAML (JSON is a
/// subset of YAML, so the YAML error is the one reported).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl Parser for DefaultParser {
    fn parse(&self, raw: &str, content_type: Option<&str>) -> Result<Node, ParseError> {
        match content_type {
            Some(ct) if ct.contains("json") => JsonParser.parse(raw, content_type),
            Some(ct) if ct.contains("yaml") => YamlParser.parse(raw, content_type),
            _ => JsonParser
                .parse(raw, content_type)
                .or_else(|_| YamlParser.parse(raw, content_type)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a/b.json"), Some("application/json"));
        assert_eq!(content_type_for("b.YML#/x"), Some("application/yaml"));
        assert_eq!(content_type_for("https://x.io/api.yaml?v=2"), Some("application/yaml"));
        assert_eq!(content_type_for("https://x.io/api"), None);
    }

    #[test]
    fn test_json_parser() {
        let node = JsonParser.parse(r##"{"a": {"$ref": "#/b"}}"##, None).unwrap();
        assert_eq!(node.to_json(), json!({"a": {"$ref": "#/b"}}));
        assert!(node.get("a").unwrap().is_reference());
    }

    #[test]
    fn test_json_parser_reports_location() {
        let err = JsonParser.parse("{\n  \"a\": }", None).unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.message.starts_with("JSON"));
    }

    #[test]
    fn test_yaml_parser() {
        let raw = "components:\n  schemas:\n    Pet:\n      $ref: 'pet.yaml#/Pet'\n";
        let node = YamlParser.parse(raw, None).unwrap();
        let pet = node
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get("Pet"))
            .unwrap();
        assert_eq!(pet, &Node::reference("pet.yaml#/Pet"));
    }

    #[test]
    fn test_default_parser_uses_content_type() {
        assert!(DefaultParser.parse("a: 1", Some("application/json")).is_err());
        assert!(DefaultParser.parse("a: 1", Some("application/yaml")).is_ok());
    }

    #[test]
    fn test_default_parser_falls_back_to_yaml() {
        let node = DefaultParser.parse("a: 1", None).unwrap();
        assert_eq!(node.to_json(), json!({"a": 1}));
    }
}
