//! End-to-end tests of the load flow across all three tiers.
//!
//! These complement the unit tests in each module by running real YAML
//! through decoding, merging and both validation passes.

use crate::*;

const KEY_1: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8g";
const KEY_2: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGRlZmdoaWprbG1ub3BxcnN0dXZ3eHl6e3x9fn+AgYKD";
const RSA_KEY: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAAAQAABAgMEBQYHCAkKCwwNDg8QERITFBUWFxgZGhscHR4fICEiIyQlJicoKSorLC0uLzAxMjM0NTY3ODk6Ozw9Pj8=";

fn organization_yaml() -> String {
    format!(
        r#"
image: ghcr.io/example/devenv:2024.06
resources:
  cpu: 4
  memory: 16Gi
  storage: 100Gi
packages:
  apt: [curl, git]
  python: [requests]
volumes:
  - name: datasets
    local_path: /mnt/datasets
    container_path: /data
  - name: cache
    local_path: /var/cache/devenv
    container_path: /cache
ssh_public_key: {}
pip_index_url: https://pypi.internal.example.com/simple
"#,
        RSA_KEY
    )
}

fn load(global: &str, developer: &str) -> ConfigurationResult<DevEnvConfig> {
    let loader = ConfigLoader::default();
    let base = loader.load_global_config(Some(global.as_bytes()))?;
    loader.load_developer_config(developer.as_bytes(), &base)
}

/// Test a realistic organization and developer pair end to end.
#[test]
fn test_full_load_flow() {
    let developer = format!(
        r#"
name: alice
ssh_port: 30022
http_port: 30080
git:
  name: Alice Example
  email: alice@example.com
refresh:
  enabled: true
  schedule: "0 3 * * 1-5"
resources:
  cpu: 8
  gpu: 1
packages:
  apt: [git, vim]
volumes:
  - name: cache
    local_path: /home/alice/cache
    container_path: /cache
ssh_public_key:
  - {}
  - {} alice@laptop
"#,
        KEY_1, KEY_2
    );

    let config = load(&organization_yaml(), &developer).expect("Load should succeed");

    assert_eq!(config.image(), Some("ghcr.io/example/devenv:2024.06"));
    assert_eq!(config.cpu_request().as_deref(), Some("8000m"));
    assert_eq!(config.memory_request().as_deref(), Some("16Gi"));
    assert_eq!(config.storage(), Some("100Gi"));
    assert_eq!(config.gpu_count(), 1);
    assert_eq!(config.apt_packages(), ["curl", "git", "vim"]);
    assert_eq!(config.python_packages(), ["requests"]);
    assert_eq!(
        config.ssh_keys(),
        [
            RSA_KEY.to_string(),
            KEY_1.to_string(),
            format!("{} alice@laptop", KEY_2)
        ]
    );

    let volumes = config.volumes();
    assert_eq!(volumes.len(), 2);
    assert_eq!(volumes[0].name, "datasets");
    assert_eq!(volumes[1].local_path, "/home/alice/cache");

    let trace = config.source_trace();
    assert_eq!(
        trace.get_source("resources.cpu"),
        Some(ConfigurationSource::Developer)
    );
    assert_eq!(
        trace.get_source("resources.memory"),
        Some(ConfigurationSource::Global)
    );
    assert_eq!(
        trace.get_source("uid"),
        Some(ConfigurationSource::SystemDefaults)
    );
    assert!(config.warnings().is_empty());
}

/// Test the documented override example: global 4 cores, developer unset or 8.
#[test]
fn test_cpu_override_scenarios() {
    let global = "resources:\n  cpu: 4\n";
    let minimal = format!("name: alice\nssh_public_key: {}\n", KEY_1);

    let unset = load(global, &minimal).expect("Load should succeed");
    assert_eq!(unset.cpu_request().as_deref(), Some("4000m"));

    let set = load(global, &format!("{}resources:\n  cpu: 8\n", minimal))
        .expect("Load should succeed");
    assert_eq!(set.cpu_request().as_deref(), Some("8000m"));
}

/// Test the documented SSH merge example: global [K1] + developer [K1, K2].
#[test]
fn test_ssh_key_merge_scenario() {
    let global = format!("ssh_public_key: [\"{}\"]\n", KEY_1);
    let developer = format!(
        "name: alice\nssh_public_key: [\"{}\", \"{}\"]\n",
        KEY_1, KEY_2
    );

    let config = load(&global, &developer).expect("Load should succeed");
    assert_eq!(config.ssh_keys(), [KEY_1, KEY_2]);
    assert_eq!(config.ssh_keys_joined(), format!("{}\n{}", KEY_1, KEY_2));
}

/// Test that global keys alone satisfy the SSH key requirement.
#[test]
fn test_global_keys_satisfy_requirement() {
    let config = load(&organization_yaml(), "name: bob\n").expect("Load should succeed");

    assert_eq!(config.ssh_keys(), [RSA_KEY]);
}

/// Test that a broken global key list warns and the developer key still loads.
#[test]
fn test_broken_global_keys_downgraded() {
    let developer = format!("name: alice\nssh_public_key: {}\n", KEY_1);
    let config =
        load("ssh_public_key: [42]\n", &developer).expect("Load should succeed");

    assert_eq!(config.ssh_keys(), [KEY_1]);
    assert_eq!(config.warnings().len(), 1);
    assert!(config.warnings()[0].message.contains("ssh_public_key[0]"));
}

/// Test that the same failure on the developer tier is fatal.
#[test]
fn test_broken_developer_keys_fatal() {
    let result = load(&organization_yaml(), "name: alice\nssh_public_key: [42]\n");

    assert!(matches!(
        result,
        Err(ConfigurationError::InvalidSshKeys { .. })
    ));
}

/// Test that several structural problems are reported together, with paths.
#[test]
fn test_structural_report_lists_everything() {
    let developer = format!(
        r#"
name: alice
ssh_public_key: {}
ssh_port: 2222
git:
  email: alice-at-example
refresh:
  schedule: "61 * * * *"
target_nodes: [node_1]
"#,
        KEY_1
    );

    let error = load("{}", &developer).expect_err("Load should fail");
    let message = error.to_string();

    assert!(message.starts_with("Configuration validation failed with 4 error(s):"));
    assert!(message.contains("[OutOfRange] ssh_port"));
    assert!(message.contains("[InvalidFormat] git.email"));
    assert!(message.contains("[InvalidFormat] refresh.schedule"));
    assert!(message.contains("[InvalidFormat] target_nodes[0]"));
}

/// Test that callers can prefix errors with the file they read.
#[test]
fn test_error_prefixed_with_path() {
    let error = load("{}", "name: [not, a, string]\n")
        .map_err(|e| e.in_file("/home/devenv/developers/alice/devenv-config.yaml"))
        .expect_err("Load should fail");

    assert!(error
        .to_string()
        .starts_with("/home/devenv/developers/alice/devenv-config.yaml: Failed to parse configuration"));
}

/// Test the free functions agree with a default loader.
#[test]
fn test_free_functions_use_default_loader() {
    let developer = format!("name: alice\nssh_public_key: {}\n", KEY_1);

    let base = load_global_config(None).expect("Global load should succeed");
    assert_eq!(base, load_system_defaults());

    let config = load_developer_config(developer.as_bytes(), &base)
        .expect("Developer load should succeed");
    assert_eq!(
        config,
        ConfigLoader::default()
            .load_developer_config(developer.as_bytes(), &base)
            .expect("Developer load should succeed")
    );
}

/// Test the template JSON for a merged configuration.
#[test]
fn test_template_json_from_load() {
    let developer = format!(
        "name: alice\nssh_public_key: {}\nresources:\n  memory: 500M\n",
        KEY_1
    );
    let config = load(&organization_yaml(), &developer).expect("Load should succeed");

    let json = config.to_template_json();
    assert_eq!(json["resources"]["cpu"], "4000m");
    assert_eq!(json["resources"]["memory"], "477Mi");
    assert_eq!(json["packages"]["apt"][1], "git");
    assert_eq!(json["volumes"][0]["name"], "datasets");
    assert_eq!(json["pip_index_url"], "https://pypi.internal.example.com/simple");
    assert_eq!(json["developer_dir"], "/home/devenv/developers/alice");
}

/// Test that loads share nothing: the same inputs give equal results.
#[test]
fn test_loads_are_independent() {
    let developer = format!("name: alice\nssh_public_key: {}\n", KEY_1);

    let first = load(&organization_yaml(), &developer).expect("Load should succeed");
    let second = load(&organization_yaml(), &developer).expect("Load should succeed");

    assert_eq!(first, second);
}

/// Test the caller-side file flow: read from a developer directory, load, and
/// prefix failures with the path.
#[test]
fn test_load_from_developer_directory() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let global_path = temp_dir.path().join("global-config.yaml");
    let developer_path = temp_dir.path().join("alice").join("devenv-config.yaml");
    std::fs::create_dir_all(developer_path.parent().unwrap()).unwrap();

    std::fs::write(&global_path, organization_yaml()).unwrap();
    std::fs::write(
        &developer_path,
        format!("name: alice\nssh_public_key: {}\nresources:\n  cpu: \"-1\"\n", KEY_1),
    )
    .unwrap();

    let loader = ConfigLoader::new(LoaderSettings {
        developers_root: temp_dir.path().to_path_buf(),
        ..Default::default()
    });
    let global_bytes = std::fs::read(&global_path).unwrap();
    let base = loader
        .load_global_config(Some(global_bytes.as_slice()))
        .map_err(|e| e.in_file(&global_path))
        .expect("Global load should succeed");

    let developer_bytes = std::fs::read(&developer_path).unwrap();
    let error = loader
        .load_developer_config(&developer_bytes, &base)
        .map_err(|e| e.in_file(&developer_path))
        .expect_err("Developer load should fail");

    let message = error.to_string();
    assert!(message.starts_with(&developer_path.display().to_string()));
    assert!(message.contains("Invalid quantity for resources.cpu"));

    std::fs::write(&developer_path, format!("name: alice\nssh_public_key: {}\n", KEY_1)).unwrap();
    let developer_bytes = std::fs::read(&developer_path).unwrap();
    let config = loader
        .load_developer_config(&developer_bytes, &base)
        .expect("Developer load should succeed");

    assert_eq!(config.developer_dir(), developer_path.parent());
}
