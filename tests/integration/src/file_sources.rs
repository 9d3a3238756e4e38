//! End-to-end resolution against file-backed sources
//!
//! Fixture documents live in `test-fixtures/config` at the workspace root.

use layerconf::{
    Config, ConfigResolver, Error, FileSource, LayeredSource, MemorySource, SourceError,
    StructValidation, ValidationError,
};
use layerconf_test_utils::{ConfigDir, env_map};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Config)]
#[serde(default)]
struct DigitalOcean {
    #[config(key = "region", validate = "required,oneof=us-east-1 us-west-1 eu-west-1")]
    region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Config)]
#[serde(default)]
struct ProviderCredentials {
    #[config(key = "token", validate = "required,min=8")]
    token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Config)]
struct Stack {
    #[config(key = "digital_ocean", override_namespace = "pulumi_esc", validate = "required")]
    digital_ocean: DigitalOcean,
    #[config(key = "provider_credentials", namespace = "provider", validate = "required")]
    provider_credentials: ProviderCredentials,
    #[config(key = "labels", override_namespace = "pulumi_esc")]
    labels: BTreeMap<String, String>,
    #[config(key = "org_id", validate = "min=1")]
    org_id: i64,
    #[config(key = "enabled")]
    enabled: bool,
    #[config(key = "name", validate = "env=DEPLOYMENT_NAME")]
    name: String,
    #[config(key = "replicas", validate = "default=3,max=10")]
    replicas: u8,
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/config")
        .join(name)
}

fn load(name: &str) -> FileSource {
    layerconf::logging::init_for_tests();
    FileSource::load(fixture(name))
        .unwrap_or_else(|e| panic!("failed to load fixture {name}: {e}"))
}

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn toml_document_resolves_every_field() {
    let source = load("stack.toml");

    let stack: Stack = ConfigResolver::new(&source, "project")
        .with_environment(env_map(&[("DEPLOYMENT_NAME", "from-env")]))
        .resolve(Vec::new())
        .unwrap();

    assert_eq!(
        stack,
        Stack {
            digital_ocean: DigitalOcean {
                region: "us-east-1".into(),
            },
            provider_credentials: ProviderCredentials {
                token: "token123".into(),
            },
            labels: labels(&[("team", "platform")]),
            org_id: 123,
            enabled: true,
            name: "DeploymentName".into(),
            replicas: 3,
        }
    );
}

#[test]
fn layered_override_document_wins_and_maps_merge() {
    let source = LayeredSource::new()
        .with(load("esc.yaml"))
        .with(load("stack.toml"));

    let stack: Stack = ConfigResolver::new(&source, "project")
        .with_environment(env_map(&[]))
        .resolve(Vec::new())
        .unwrap();

    assert_eq!(stack.digital_ocean.region, "us-west-1");
    assert_eq!(
        stack.labels,
        labels(&[("team", "platform"), ("tier", "gold")])
    );
}

#[test]
fn invalid_override_region_fails_validation() {
    let source = LayeredSource::new()
        .with(load("invalid-region.json"))
        .with(load("stack.toml"));
    let resolver = ConfigResolver::new(&source, "project").with_environment(env_map(&[]));
    let mut stack = Stack::default();

    let err = resolver.resolve_into(&mut stack, Vec::new()).unwrap_err();

    let violations = err.violations().expect("validation failure");
    assert!(violations.contains("digital_ocean.region", "oneof"), "got: {err}");
    assert_eq!(stack.digital_ocean.region, "invalid-region");
}

#[rstest]
#[case::short_token(
    "[project]\norg_id = 1\n\n[project.digital_ocean]\nregion = \"eu-west-1\"\n\n[provider.provider_credentials]\ntoken = \"short\"\n",
    &[("provider_credentials.token", "min")]
)]
#[case::too_many_replicas(
    "[project]\nreplicas = 12\norg_id = 1\n\n[project.digital_ocean]\nregion = \"eu-west-1\"\n\n[provider.provider_credentials]\ntoken = \"long-enough\"\n",
    &[("replicas", "max")]
)]
#[case::both(
    "[project]\nreplicas = 12\n\n[project.digital_ocean]\nregion = \"eu-west-1\"\n\n[provider.provider_credentials]\ntoken = \"short\"\n",
    &[("provider_credentials.token", "min"), ("org_id", "min"), ("replicas", "max")]
)]
fn violations_are_aggregated(#[case] document: &str, #[case] expected: &[(&str, &str)]) {
    let dir = ConfigDir::new();
    let source = dir.source("stack.toml", document);
    let resolver = ConfigResolver::new(&source, "project").with_environment(env_map(&[]));

    let err = resolver.resolve::<Stack>(Vec::new()).unwrap_err();

    let violations = err.violations().expect("validation failure");
    let found: Vec<(&str, &str)> = violations.iter().map(|v| (v.field(), v.rule())).collect();
    assert_eq!(found, expected.to_vec());
}

#[test]
fn missing_required_namespace_fails_fast() {
    let dir = ConfigDir::new();
    let source = dir.source("partial.yaml", "project:\n  org_id: 5\n");

    let err = ConfigResolver::new(&source, "project")
        .resolve::<Stack>(Vec::new())
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RequiredFieldMissing { ref key, .. } if key == "digital_ocean"
    ));
}

#[test]
fn memory_layer_overrides_file_layer() {
    let source = LayeredSource::new()
        .with(MemorySource::new().with("project:org_id", "77"))
        .with(load("stack.toml"));

    let stack: Stack = ConfigResolver::new(&source, "project")
        .with_environment(env_map(&[]))
        .resolve(Vec::new())
        .unwrap();

    assert_eq!(stack.org_id, 77);
    assert_eq!(stack.name, "DeploymentName");
}

#[test]
fn unsupported_and_malformed_documents_are_rejected() {
    let dir = ConfigDir::new();

    let path = dir.write("stack.ini", "[project]\n");
    assert!(matches!(
        FileSource::load(&path),
        Err(SourceError::UnsupportedFormat { .. })
    ));

    let path = dir.write("broken.json", "{\"project\": ");
    assert!(matches!(
        FileSource::load(&path),
        Err(SourceError::Parse { .. })
    ));

    assert!(matches!(
        FileSource::load(dir.root().join("absent.toml")),
        Err(SourceError::Io { .. })
    ));
}

#[test]
fn struct_rule_on_nested_credentials_uses_dotted_path() {
    let source = load("stack.toml");
    let placeholder = StructValidation::new("no_placeholder", |credentials: &ProviderCredentials| {
        if credentials.token.starts_with("token") {
            vec![ValidationError::new("token", "no_placeholder", "looks like a placeholder")]
        } else {
            Vec::new()
        }
    });

    let err = ConfigResolver::new(&source, "project")
        .with_environment(env_map(&[]))
        .resolve::<Stack>(vec![placeholder.into()])
        .unwrap_err();

    let violations = err.violations().expect("validation failure");
    assert_eq!(violations.fields(), vec!["provider_credentials.token"]);
}
