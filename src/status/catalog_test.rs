use super::*;
use crate::Version;

#[test]
fn test_namenode_wording_embeds_worker_count() {
    let catalog = StatusCatalog::new(3, "hadoop");

    assert_eq!(
        catalog.namenode(HaReport::Active),
        "Ready (3 DataNodes, HA active, with automatic fail-over)"
    );
    assert_eq!(
        catalog.namenode(HaReport::DegradedDown),
        "Ready (3 DataNodes, HA degraded down (missing: standby), with automatic fail-over)"
    );
    assert_eq!(catalog.resourcemanager_ready(), "Ready (3 NodeManagers)");
}

#[test]
fn test_classify_prefers_degraded_states() {
    let catalog = StatusCatalog::new(3, "hadoop");

    for report in [
        HaReport::Active,
        HaReport::Standby,
        HaReport::DegradedActive,
        HaReport::DegradedDown,
    ] {
        assert_eq!(HaReport::classify(&catalog.namenode(report)), Some(report));
    }
    assert_eq!(HaReport::classify("Waiting for DataNodes"), None);
}

#[test]
fn test_spec_mismatch_pattern_matches_generated_message() {
    let catalog = StatusCatalog::new(3, "hadoop");
    let (old, new) = (Version::new("2.7.2"), Version::new("2.7.1"));

    let pattern = catalog.spec_mismatch(&old, &new).unwrap();

    let message = catalog.spec_mismatch_message(SpecPeer::NameNode, &old, &new);
    assert_eq!(
        message,
        "Spec mismatch with NameNode: {'hadoop': '2.7.2'} != {'hadoop': '2.7.1'}"
    );
    assert!(pattern.accepts(&message));
    assert!(pattern.accepts(&catalog.spec_mismatch_message(SpecPeer::ResourceManager, &old, &new)));

    // reversed pair and unrelated versions are not accepted
    assert!(!pattern.accepts(&catalog.spec_mismatch_message(SpecPeer::NameNode, &new, &old)));
    assert!(!pattern.accepts("Spec mismatch with NameNode: {'hadoop': '2x7x2'} != {'hadoop': '2.7.1'}"));
}

#[test]
fn test_ha_expectations_are_one_per_unit() {
    let catalog = StatusCatalog::new(2, "hadoop");

    let steady = catalog.ha_steady();
    assert!(role_matches(
        &[
            catalog.namenode(HaReport::Standby).as_str(),
            catalog.namenode(HaReport::Active).as_str()
        ],
        &steady
    ));

    let degraded = catalog.ha_degraded_missing_standby();
    assert!(role_matches(
        &[
            catalog.namenode(HaReport::DegradedActive).as_str(),
            catalog.namenode(HaReport::DegradedDown).as_str()
        ],
        &degraded
    ));
    assert!(!role_matches(
        &[
            catalog.namenode(HaReport::Active).as_str(),
            catalog.namenode(HaReport::DegradedDown).as_str()
        ],
        &degraded
    ));
}
