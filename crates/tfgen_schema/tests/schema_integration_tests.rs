//! Integration tests for the schema registry.

use std::fs;

use tfgen_schema::{
    EntityKind, ProviderDocument, RenderMarker, SchemaNode, SchemaRegistry, SchemaShape,
};
use tempfile::tempdir;

const NETWORK_PROVIDER: &str = r#"
provider: net
resources:
  net_firewall:
    kind: record
    required:
      name: { kind: string }
    optional:
      enabled: { kind: boolean }
      rule:
        kind: list
        element:
          kind: record
          name: BlockSchema
          required:
            port: { kind: number }
      labels:
        kind: dictionary
        value: { kind: string }
      target:
        kind: union
        alternatives:
          - { kind: string }
          - kind: record
            required:
              id: { kind: string }
data_sources:
  net_zone:
    kind: record
    marker: resource
    required:
      name: { kind: string }
"#;

#[test]
fn test_registry_from_yaml_document() {
    let registry = SchemaRegistry::from_yaml_str(NETWORK_PROVIDER).unwrap();

    let firewall = registry.resource("net_firewall").unwrap();
    assert_eq!(firewall.marker(), RenderMarker::Resource);

    let SchemaShape::Record(fields) = firewall.shape() else {
        panic!("firewall must be a record");
    };
    assert!(fields.is_required("name"));
    assert!(!fields.is_required("enabled"));

    let (rule, repeated) = fields.get("rule").unwrap().block_schema().unwrap();
    assert!(repeated);
    assert_eq!(rule.name(), Some("BlockSchema"));

    let SchemaShape::Union(alternatives) = fields.get("target").unwrap().shape() else {
        panic!("target must be a union");
    };
    assert_eq!(alternatives.len(), 2);

    assert!(registry.data_source("net_zone").is_some());
    assert_eq!(registry.types(EntityKind::Resource).count(), 1);
}

#[test]
fn test_registry_merges_providers() {
    let dir = tempdir().unwrap();
    let providers = dir.path().join("providers");
    fs::create_dir_all(providers.join("net")).unwrap();
    fs::write(providers.join("net").join("schema.yaml"), NETWORK_PROVIDER).unwrap();
    fs::write(
        providers.join("store.yml"),
        "provider: store\nresources:\n  store_bucket:\n    kind: record\n    optional:\n      size: { kind: number }\n",
    )
    .unwrap();

    let registry = SchemaRegistry::load(&providers).unwrap();
    assert_eq!(registry.len(), 3);
    assert_eq!(
        registry.provider_of(EntityKind::Resource, "store_bucket"),
        Some("store")
    );
    assert_eq!(
        registry.provider_of(EntityKind::Resource, "net_firewall"),
        Some("net")
    );
}

#[test]
fn test_registry_rejects_conflicting_providers() {
    let first: ProviderDocument = serde_yaml::from_str(NETWORK_PROVIDER).unwrap();
    let mut second = first.clone();
    second.provider = "net_fork".to_string();

    let mut registry = SchemaRegistry::new();
    registry.register_provider(first).unwrap();
    let err = registry.register_provider(second).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("net_firewall"));
    assert!(message.contains("net_fork"));
}

#[test]
fn test_registry_is_shareable_between_threads() {
    let registry = SchemaRegistry::from_yaml_str(NETWORK_PROVIDER).unwrap();
    std::thread::scope(|scope| {
        let handle = scope.spawn(|| registry.resource("net_firewall").cloned());
        let schema: Option<SchemaNode> = handle.join().unwrap();
        assert!(schema.is_some());
    });
}
