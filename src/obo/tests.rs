use super::*;

const ROOT: &str = r#"format-version: 1.2
import: http://example.org/obo/child.obo

[Term]
id: TST:0000001
name: root local
is_a: CHD:0000001 ! imported parent

[Term]
id: TST:0000002
name: grandchild
is_a: TST:0000001 ! root local
relationship: has_units CHD:0000009 ! imported unit
is_a: TST:9999999 ! does not exist

[Term]
not-an-id: broken
name: dropped

[Typedef]
id: part_of
name: part_of
"#;

const CHILD: &str = r#"format-version: 1.2

[Term]
id: CHD:0000001
name: imported parent

[Term]
id: CHD:0000002
name: imported part
relationship: part_of CHD:0000001 ! imported parent

[Term]
id: CHD:0000009
name: imported unit
"#;

fn resolver() -> MapResolver {
    MapResolver::new()
        .with_source("root.obo", ROOT)
        .with_source("child.obo", CHILD)
}

#[test]
fn test_lookup_local_then_imports() {
    let ontology = Ontology::load("root.obo", &resolver()).unwrap();

    assert_eq!(ontology.len(), 2);
    assert_eq!(ontology.total_terms(), 5);
    assert_eq!(ontology.imports().len(), 1);

    assert_eq!(ontology.term("TST:0000001").unwrap().name(), "root local");
    // only defined in the import
    assert_eq!(ontology.term("CHD:0000002").unwrap().name(), "imported part");
    // unknown ids are absent, not errors
    assert!(ontology.term("XYZ:0000000").is_none());
}

#[test]
fn test_edges_resolve_across_imports() {
    let ontology = Ontology::load("root.obo", &resolver()).unwrap();

    let grandchild = ontology.term("TST:0000002").unwrap();
    // the dangling is_a is reported and dropped
    assert_eq!(grandchild.parents(), &["TST:0000001".to_string()]);
    assert_eq!(grandchild.unit(), Some("CHD:0000009"));

    let children: Vec<_> = ontology
        .children_of("CHD:0000001")
        .iter()
        .map(|t| t.id().to_string())
        .collect();
    assert!(children.contains(&"TST:0000001".to_string()));
    assert!(children.contains(&"CHD:0000002".to_string()));

    assert!(ontology.is_descendant_of("TST:0000002", "CHD:0000001"));
    assert!(!ontology.is_descendant_of("CHD:0000001", "TST:0000002"));
    assert!(!ontology.is_descendant_of("TST:0000002", "TST:0000002"));
}

#[test]
fn test_malformed_stanza_is_skipped() {
    let ontology = Ontology::load("root.obo", &resolver()).unwrap();
    assert!(ontology.term("broken").is_none());
    assert!(ontology.term("part_of").is_none());
}

#[test]
fn test_missing_source_is_fatal() {
    let err = Ontology::load("nowhere.obo", &resolver()).unwrap_err();
    assert!(matches!(err, OboError::SourceNotFound { .. }));

    let only_root = MapResolver::new().with_source("root.obo", ROOT);
    let err = Ontology::load("root.obo", &only_root).unwrap_err();
    match err {
        OboError::SourceNotFound { name } => assert!(name.ends_with("child.obo")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_circular_import_terminates() {
    let resolver = MapResolver::new()
        .with_source("a.obo", "import: b.obo\n\n[Term]\nid: A:1\nname: a\n")
        .with_source("b.obo", "import: a.obo\n\n[Term]\nid: B:1\nname: b\nis_a: A:1\n");

    let ontology = Ontology::load("a.obo", &resolver).unwrap();
    assert!(ontology.term("B:1").is_some());
    // A:1 lives in the outer graph, which the inner graph cannot see while loading
    assert!(ontology.term("B:1").unwrap().parents().is_empty());
}

#[test]
fn test_shared_instance_is_reused() {
    let first = Ontology::shared().unwrap();
    let second = Ontology::shared().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.source(), DEFAULT_ONTOLOGY);
}

#[test]
fn test_bundled_closure() {
    let ontology = Ontology::shared().unwrap();

    let tic = ontology.term("MS:1000285").unwrap();
    assert_eq!(tic.value_type(), Some(ValueType::Double));
    assert_eq!(tic.unit(), Some("MS:1000131"));

    // m/z (PSI-MS) is a UO unit
    assert!(ontology.is_descendant_of("MS:1000040", "UO:0000000"));
    assert!(ontology.is_descendant_of("IMS:1000031", "IMS:1000003"));
    assert_eq!(
        ontology.term("IMS:1000042").unwrap().value_type(),
        Some(ValueType::Integer)
    );
    assert!(BundledResolver::names().any(|n| n == "uo.obo"));
}

#[test]
fn test_bundled_common_acquisition_terms() {
    let ontology = Ontology::shared().unwrap();

    for accession in ["MS:1000294", "MS:1000031", "MS:1000075", "MS:1000084", "IMS:1000047"] {
        assert!(ontology.term(accession).is_some(), "{} not bundled", accession);
    }

    // MS1 spectrum reaches data file content through mass spectrum
    let ms1 = ontology.term("MS:1000579").unwrap();
    assert_eq!(ms1.parents(), &["MS:1000294".to_string()]);
    assert!(ontology.is_descendant_of("MS:1000579", "MS:1000524"));
    assert!(ontology.is_descendant_of("MS:1000579", "MS:1000559"));

    assert!(ontology.is_descendant_of("MS:1000121", "MS:1000463"));
    assert!(ontology.is_descendant_of("MS:1000075", "MS:1000008"));
    assert!(ontology.is_descendant_of("IMS:1000491", "IMS:1000004"));
    assert_eq!(ontology.term("MS:1000588").unwrap().value_type(), Some(ValueType::String));
    assert_eq!(ontology.term("UO:0000221").unwrap().parents(), &["UO:0000002".to_string()]);
}

#[test]
fn test_term_inclusion_rules() {
    let ontology = Ontology::shared().unwrap();

    let binary_type = OboTermInclusion::new("IMS:1000003", true, true, false);
    assert!(binary_type.matches(&ontology, "IMS:1000003"));
    assert!(binary_type.matches(&ontology, "IMS:1000030"));
    assert!(!binary_type.matches(&ontology, "MS:1000285"));
    assert!(binary_type.accepts_count(1));
    assert!(!binary_type.accepts_count(2));

    let exact = OboTermInclusion::new("IMS:1000003", false, false, true);
    assert!(!exact.matches(&ontology, "IMS:1000030"));
    assert!(exact.accepts_count(5));
    assert!(exact.repeatable());
}

#[test]
fn test_directory_resolver() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("root.obo"), ROOT).unwrap();
    std::fs::write(dir.path().join("child.obo"), CHILD).unwrap();

    let ontology = Ontology::load("root.obo", &DirectoryResolver::new(dir.path())).unwrap();
    assert!(ontology.term("CHD:0000009").is_some());
}

#[test]
fn test_source_file_name() {
    assert_eq!(source_file_name("http://purl.obolibrary.org/obo/uo.obo"), "uo.obo");
    assert_eq!(source_file_name("psi-ms.obo"), "psi-ms.obo");
    assert_eq!(source_file_name(r"C:\obo\uo.obo"), "uo.obo");
}
