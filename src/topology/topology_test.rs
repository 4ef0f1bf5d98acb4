use std::collections::BTreeMap;
use std::collections::BTreeSet;

use super::*;
use crate::Error;

const DOC: &str = r#"
roles:
  namenode:
    units: [namenode/0, namenode/1]
    version: "2.7.2"
  slave:
    units: [slave/0, slave/1, slave/2]
    version: "2.7.2"
  client:
    units: [client/0]
"#;

#[test]
fn test_load_preserves_unit_order_and_versions() {
    let topology = Topology::load(DOC).expect("document should parse");

    assert_eq!(
        topology.unit_names("slave").unwrap(),
        vec!["slave/0", "slave/1", "slave/2"]
    );
    assert_eq!(topology.version("namenode"), Some(&Version::new("2.7.2")));
    assert_eq!(topology.version("client"), None);
    assert_eq!(topology.first_unit("client").unwrap().role(), "client");
}

#[test]
fn test_missing_role_is_reported() {
    let topology = Topology::load(DOC).unwrap();

    match topology.units("resourcemanager") {
        Err(Error::Topology(TopologyError::MissingRole(role))) => {
            assert_eq!(role, "resourcemanager")
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_empty_role_is_rejected_at_load() {
    let result = Topology::load("roles:\n  plugin:\n    units: []\n");

    assert!(matches!(
        result,
        Err(Error::Topology(TopologyError::EmptyRole(_)))
    ));
}

#[test]
fn test_invalid_document_is_rejected() {
    let result = Topology::load("roles: [not, a, map]");

    assert!(matches!(
        result,
        Err(Error::Topology(TopologyError::InvalidDocument(_)))
    ));
}

#[test]
fn test_from_file_reads_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("topology.yaml");
    std::fs::write(&path, DOC).unwrap();

    let topology = Topology::from_file(&path).unwrap();
    assert_eq!(topology.unit_names("slave").unwrap().len(), 3);

    let missing = Topology::from_file(&dir.path().join("absent.yaml"));
    assert!(matches!(
        missing,
        Err(Error::Topology(TopologyError::Unreadable { .. }))
    ));
}

#[test]
fn test_require_roles_checks_every_configured_role() {
    let topology = Topology::load(DOC).unwrap();

    assert!(topology.require_roles(&crate::RoleNames::default()).is_err());

    let full = Topology::from_document(
        &TopologyDocument::default()
            .with_role("namenode", 2, Some("2.7.2"))
            .with_role("resourcemanager", 1, Some("2.7.2"))
            .with_role("slave", 3, Some("2.7.2"))
            .with_role("plugin", 1, Some("2.7.2"))
            .with_role("client", 1, None),
    )
    .unwrap();
    assert!(full.require_roles(&crate::RoleNames::default()).is_ok());
}

#[test]
fn test_record_status_overwrites_and_clears_missing_units() {
    let mut topology = Topology::load(DOC).unwrap();

    let mut observed = BTreeMap::new();
    observed.insert("slave/0".to_string(), "Ready (DataNode & NodeManager)".to_string());
    observed.insert("slave/1".to_string(), "Waiting for NameNode".to_string());
    topology.record_status("slave", &observed);

    assert_eq!(
        topology.unit("slave/0").unwrap().status(),
        Some("Ready (DataNode & NodeManager)")
    );
    assert_eq!(topology.unit("slave/2").unwrap().status(), None);

    observed.remove("slave/1");
    topology.record_status("slave", &observed);
    assert_eq!(topology.unit("slave/1").unwrap().status(), None);
}

#[test]
fn test_record_processes_on_unknown_unit_fails() {
    let mut topology = Topology::load(DOC).unwrap();

    let processes: BTreeSet<String> = ["DataNode".to_string()].into_iter().collect();
    assert!(topology.record_processes("slave/1", processes.clone()).is_ok());
    assert!(topology.unit("slave/1").unwrap().processes().contains("DataNode"));

    assert!(topology.record_processes("slave/9", processes).is_err());
}

#[test]
fn test_declared_version_is_intent_only() {
    let mut topology = Topology::load(DOC).unwrap();

    topology.declare_version("slave", Version::new("2.7.1"));

    assert_eq!(topology.version("slave"), Some(&Version::new("2.7.1")));
    assert_ne!(topology.version("slave"), topology.version("namenode"));
}
