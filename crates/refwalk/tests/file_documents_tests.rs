//! Dereferencing documents on disk

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use refwalk::*;
use serde_json::json;
use tempfile::TempDir;

fn scratch() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("common")).unwrap();
    dir
}

async fn write(dir: &Path, path: &str, contents: &str) {
    tokio::fs::write(dir.join(path), contents).await.unwrap();
}

const ROOT_YAML: &str = r#"
openapi: 3.1.0
paths:
  /pets:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: common/schemas.yaml#/Pet
"#;

const SCHEMAS_YAML: &str = r##"
Pet:
  type: object
  properties:
    id:
      $ref: ../shared.json#/Id
    tags:
      type: array
      items:
        $ref: "#/Tag"
Tag:
  type: string
"##;

const SHARED_JSON: &str = r#"{"Id": {"type": "integer", "format": "int64"}}"#;

#[tokio::test]
async fn test_yaml_documents_with_relative_references() {
    let scratch = scratch();
    write(scratch.path(), "root.yaml", ROOT_YAML).await;
    write(scratch.path(), "common/schemas.yaml", SCHEMAS_YAML).await;
    write(scratch.path(), "shared.json", SHARED_JSON).await;

    let resolver = Arc::new(FileResolver::with_base_dir(scratch.path()));
    let result = DereferenceStrategy::new(DereferenceOptions::default())
        .with_resolver(resolver)
        .dereference_uri("root.yaml")
        .await
        .unwrap();

    assert!(result.is_clean(), "unexpected errors: {:?}", result.errors);
    let schema = &result.root.to_json()["paths"]["/pets"]["get"]["responses"]["200"]["content"]
        ["application/json"]["schema"];
    assert_eq!(
        *schema,
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer", "format": "int64"},
                "tags": {"type": "array", "items": {"type": "string"}}
            }
        })
    );
}

#[tokio::test]
async fn test_default_resolver_reads_file_uris() {
    let scratch = scratch();
    write(scratch.path(), "shared.json", SHARED_JSON).await;
    let shared = url::Url::from_file_path(scratch.path().join("shared.json")).unwrap();

    let document = Document::new(
        "root.json",
        Node::from(json!({"id": {"$ref": format!("{}#/Id", shared)}})),
    );
    let result = DereferenceStrategy::default().dereference(document).await.unwrap();

    assert!(result.is_clean());
    assert_eq!(
        result.root,
        Node::from(json!({"id": {"type": "integer", "format": "int64"}}))
    );
}

#[tokio::test]
async fn test_missing_file_is_reported() {
    let scratch = scratch();
    let resolver = Arc::new(FileResolver::with_base_dir(scratch.path()));
    let result = DereferenceStrategy::default()
        .with_resolver(resolver)
        .dereference(Document::new(
            "root.json",
            Node::from(json!({"id": {"$ref": "nope.yaml#/Id"}})),
        ))
        .await
        .unwrap();

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, DereferenceErrorKind::UnresolvableReference);
    assert_eq!(result.errors[0].target, "nope.yaml#/Id");
}
