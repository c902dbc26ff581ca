//! Device construction tests
//!
//! Without the `vde` feature the constructor is a stub that always fails.
//! With it, construction against an unreachable switch must fail cleanly.

use std::path::Path;

use vde_net::vde::{self, VdeConfig};
use vde_net::Error;

#[cfg(not(feature = "vde"))]
#[test]
fn test_create_unsupported() {
    let err = vde::create(&VdeConfig::new()).err().unwrap();
    assert!(matches!(err, Error::Unsupported));
    assert!(err.to_string().contains("Please rebuild with VDE enabled"));
}

#[cfg(not(feature = "vde"))]
#[test]
fn test_create_or_report_unsupported() {
    assert!(vde::create_or_report(Some(Path::new("/tmp/myvde"))).is_none());
    assert!(vde::create_or_report(None).is_none());
}

#[cfg(feature = "vde")]
#[test]
fn test_create_unreachable_switch() {
    let dir = tempfile::tempdir().unwrap();
    let config = VdeConfig::new().switch_path(dir.path().join("no-switch-here"));

    let err = vde::create(&config).err().unwrap();
    assert!(matches!(err, Error::Connection { .. }));
    let missing = dir.path().join("no-switch-here");
    assert!(vde::create_or_report(Some(missing.as_path())).is_none());
}

#[cfg(feature = "vde")]
#[test]
fn test_create_rejects_nul_in_path() {
    let config = VdeConfig::new().switch_path("/tmp/my\0vde");
    let err = vde::create(&config).err().unwrap();
    assert!(matches!(err, Error::InvalidPath(_)));
}

/// Test loading open parameters from a YAML file
#[test]
fn test_config_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vde.yaml");
    std::fs::write(
        &path,
        "switch_path: /tmp/myvde\ndescription: guest0\ngroup: kvm\n",
    )
    .unwrap();

    let config = VdeConfig::from_yaml_file(&path).unwrap();
    assert_eq!(config.switch_path.as_deref(), Some(Path::new("/tmp/myvde")));
    assert_eq!(config.description, "guest0");
    assert_eq!(config.group.as_deref(), Some("kvm"));
    assert_eq!(config.port, 0);
    assert_eq!(config.mode, 0o700);
}

/// Test that an invalid config file is a configuration error
#[test]
fn test_config_from_yaml_file_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vde.yaml");
    std::fs::write(&path, "port: -3\n").unwrap();

    let err = VdeConfig::from_yaml_file(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let missing = VdeConfig::from_yaml_file(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(missing, Error::Config(_)));
}
