//! Integration tests for project compilation.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::tempdir;

use tfgen_codegen::{
    ArtifactStatus, ArtifactWriter, CodegenError, CodegenResult, CollisionPolicy, ModuleCompiler,
    ModuleConfig, ModuleLoader, ProjectConfig, ProviderResolver, Renderer, Resolution,
    ResolverChain, StructuralResolver, DEFAULT_CONFIG_FILE,
};
use tfgen_schema::{SchemaNode, SchemaRegistry};

const NET_PROVIDER: &str = r#"
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
      target:
        kind: union
        name: target
        alternatives:
          - { kind: string }
data_sources:
  net_zone:
    kind: record
    required:
      name: { kind: string }
"#;

const NETWORK_MODULE: &str = r#"
name: network
prefix: dev_
resources:
  net_firewall:
    edge:
      name: edge-fw
      enabled: true
      rule:
        - port: 80
        - port: 443
      target: { "$expr": "net_zone.main.id" }
data_sources:
  net_zone:
    main:
      name: example.com
"#;

const EDGE_FIREWALL: &str = "resource \"net_firewall\" \"dev_edge\" {
  name    = \"edge-fw\"
  enabled = true

  rule {
    port = 80
  }

  rule {
    port = 443
  }

  target  = net_zone.main.id
}
";

/// Turns plain zone names into lookups backed by a companion data source.
struct ZoneLookupResolver;

impl ProviderResolver for ZoneLookupResolver {
    fn resolve(
        &self,
        resource_type: &str,
        node: &SchemaNode,
        value: &Value,
        companions: &mut Vec<String>,
    ) -> CodegenResult<Resolution> {
        match value.as_str() {
            Some(zone) => {
                companions.push(format!(
                    "data \"net_zone\" \"{zone}\" {{\n  name = \"{zone}\"\n}}"
                ));
                Ok(Resolution::Direct(format!("data.net_zone.{zone}.id")))
            }
            None => StructuralResolver::new().resolve(resource_type, node, value, companions),
        }
    }
}

fn write_project(root: &Path, modules: &[(&str, &str)]) -> ProjectConfig {
    fs::create_dir_all(root.join("schemas")).unwrap();
    fs::create_dir_all(root.join("modules")).unwrap();
    fs::write(root.join("schemas").join("net.yaml"), NET_PROVIDER).unwrap();
    for (file, content) in modules {
        fs::write(root.join("modules").join(file), content).unwrap();
    }
    fs::write(root.join(DEFAULT_CONFIG_FILE), "schemas: schemas\nmodules: modules\n").unwrap();
    ProjectConfig::load(root.join(DEFAULT_CONFIG_FILE)).unwrap()
}

fn compiler<'r>(registry: &'r SchemaRegistry, config: &ProjectConfig) -> ModuleCompiler<'r> {
    let renderer =
        Renderer::new(Arc::new(ResolverChain::default())).with_options(config.render_options());
    ModuleCompiler::new(registry, renderer)
}

#[tokio::test]
async fn test_generate_project() {
    let dir = tempdir().unwrap();
    let config = write_project(dir.path(), &[("network.yaml", NETWORK_MODULE)]);

    let registry = SchemaRegistry::load(&config.schemas).unwrap();
    let modules = ModuleLoader::load(&config.modules).unwrap();
    let output = config
        .aggregator()
        .aggregate(&compiler(&registry, &config), &modules)
        .unwrap();

    assert_eq!(output.resources_text, EDGE_FIREWALL);
    assert_eq!(
        output.data_sources_text,
        "data \"net_zone\" \"dev_main\" {\n  name = \"example.com\"\n}\n"
    );
    assert_eq!(
        output.resources_manifest["net_firewall"]["dev_edge"]["rule"],
        json!([{"port": 80}, {"port": 443}])
    );

    let writer = ArtifactWriter::new(&config.output);
    let report = writer.write(&output).await.unwrap();
    assert_eq!(report.changed().len(), 4);
    assert_eq!(config.output, dir.path().join("tf_out"));
    assert_eq!(
        fs::read_to_string(config.output.join("resources.tf")).unwrap(),
        EDGE_FIREWALL
    );

    let manifest: Value =
        serde_json::from_str(&fs::read_to_string(config.output.join("data_sources.json")).unwrap())
            .unwrap();
    assert_eq!(manifest, json!({"net_zone": {"dev_main": {"name": "example.com"}}}));

    let again = writer.write(&output).await.unwrap();
    assert_eq!(again.status("resources.tf"), Some(ArtifactStatus::Unchanged));
    assert!(writer.check(&output).await.unwrap().is_up_to_date());
}

#[test]
fn test_provider_resolver_adds_companions() {
    let dir = tempdir().unwrap();
    let module = NETWORK_MODULE.replace(r#"{ "$expr": "net_zone.main.id" }"#, "corp");
    let config = write_project(dir.path(), &[("network.yaml", &module)]);

    let registry = SchemaRegistry::load(&config.schemas).unwrap();
    let modules = ModuleLoader::load(&config.modules).unwrap();
    let chain = ResolverChain::default().with_provider("net", Arc::new(ZoneLookupResolver));
    let compiler = ModuleCompiler::new(&registry, Renderer::new(Arc::new(chain)));

    let output = config.aggregator().aggregate(&compiler, &modules).unwrap();
    assert!(output
        .resources_text
        .contains("target  = data.net_zone.corp.id\n"));
    assert_eq!(
        output.data_sources_text,
        "data \"net_zone\" \"dev_main\" {\n  name = \"example.com\"\n}\n\n\
         data \"net_zone\" \"corp\" {\n  name = \"corp\"\n}\n"
    );
    // Companions are text only.
    assert_eq!(output.data_sources_manifest["net_zone"].len(), 1);
}

#[test]
fn test_modules_keep_file_order() {
    let dir = tempdir().unwrap();
    let config = write_project(
        dir.path(),
        &[
            (
                "20-b.yaml",
                "prefix: b_\nresources:\n  net_firewall:\n    fw: { name: b }\n",
            ),
            (
                "10-a.yaml",
                "- prefix: a1_\n  resources:\n    net_firewall:\n      fw: { name: a1 }\n\
                 - prefix: a2_\n  resources:\n    net_firewall:\n      fw: { name: a2 }\n",
            ),
        ],
    );

    let registry = SchemaRegistry::load(&config.schemas).unwrap();
    let modules = ModuleLoader::load(&config.modules).unwrap();
    let output = config
        .aggregator()
        .aggregate(&compiler(&registry, &config), &modules)
        .unwrap();

    let names: Vec<&str> = output.resources_manifest["net_firewall"]
        .keys()
        .map(|k| k.as_str())
        .collect();
    assert_eq!(names, vec!["a1_fw", "a2_fw", "b_fw"]);
    let a2 = output.resources_text.find("\"a2_fw\"").unwrap();
    let b = output.resources_text.find("\"b_fw\"").unwrap();
    assert!(a2 < b);
}

#[test]
fn test_reject_policy_from_project_file() {
    let dir = tempdir().unwrap();
    let module = "prefix: dev_\nresources:\n  net_firewall:\n    edge: { name: x }\n";
    let config = write_project(dir.path(), &[("a.yaml", module), ("b.yaml", module)])
        .with_collision_policy(CollisionPolicy::Reject);

    let registry = SchemaRegistry::load(&config.schemas).unwrap();
    let modules = ModuleLoader::load(&config.modules).unwrap();
    let err = config
        .aggregator()
        .aggregate(&compiler(&registry, &config), &modules)
        .unwrap_err();

    match err {
        CodegenError::NameCollision { first, second, .. } => {
            assert!(first.ends_with("a.yaml"));
            assert!(second.ends_with("b.yaml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_module_config_round_trips_through_loader() {
    let dir = tempdir().unwrap();
    let module = ModuleConfig::new()
        .with_name("json")
        .with_prefix("j_")
        .with_resource("net_firewall", "fw", json!({"name": "j"}));
    let file = dir.path().join("module.json");
    fs::write(&file, serde_json::to_string(&module).unwrap()).unwrap();

    assert_eq!(ModuleLoader::load(&file).unwrap(), vec![module]);
}
