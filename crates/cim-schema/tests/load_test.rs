//! Integration tests for loading, merging and resolving profile documents

use std::path::{Path, PathBuf};

use cim_schema::{Error, ResolveConfig, SchemaLoader, Specification, ValueKind};

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

fn data_pattern() -> String {
    format!("{}/*.rdf", data_dir().display())
}

/// Load the three synthetic profiles with default settings
fn load_profiles() -> Specification {
    SchemaLoader::default().load_pattern(&data_pattern()).unwrap()
}

#[test]
fn test_profiles_are_ranked() {
    let spec = load_profiles();

    assert_eq!(spec.profile_order, vec!["EQ", "SSH", "TP"]);
    assert_eq!(spec.ontologies["EQ"].priority, 1);
    assert_eq!(spec.ontologies["EQ"].title, "Core Equipment Vocabulary");
    assert_eq!(spec.ontologies["SSH"].version_info, "3.0.0");
    assert_eq!(spec.ontologies["TP"].priority, 3);
}

#[test]
fn test_redeclared_class_merges_attributes() {
    let spec = load_profiles();
    let switch = &spec.types["Switch"];

    let ids: Vec<&str> = switch.attributes.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["Switch.locked", "Switch.normalOpen", "Switch.open", "Switch.ratedCurrent"]
    );
    assert_eq!(switch.origins, vec!["EQ", "SSH"]);
    assert_eq!(switch.attribute("Switch.normalOpen").unwrap().origins, vec!["EQ", "SSH"]);
    // Comment only declared by the later document
    assert!(switch.comment.starts_with("A generic device"));
}

#[test]
fn test_canonical_origin_tie_prefers_base_profile() {
    let spec = load_profiles();
    let breaker = &spec.types["Breaker"];

    assert_eq!(breaker.origins, vec!["EQ", "SSH", "TP"]);
    assert_eq!(breaker.origin, "EQ");

    let config = ResolveConfig::default().with_base_profile("SSH");
    let spec = SchemaLoader::new(config).load_pattern(&data_pattern()).unwrap();
    assert_eq!(spec.types["Breaker"].origin, "SSH");
    assert_eq!(spec.profile_order, vec!["SSH", "EQ", "TP"]);
}

#[test]
fn test_identity_injection() {
    let spec = load_profiles();

    let location = &spec.types["Location"];
    let identities: Vec<_> = location.attributes.iter().filter(|a| a.is_identity).collect();
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].label, "mRID");
    assert_eq!(identities[0].domain, "Location");

    for id in ["Switch", "Breaker", "Terminal", "IdentifiedObject"] {
        assert!(
            spec.types[id].attributes.iter().all(|a| !a.is_identity),
            "{id} must not gain an identity attribute"
        );
    }
}

#[test]
fn test_value_kinds_and_defaults() {
    let spec = load_profiles();

    let rated = spec.types["Switch"].attribute("Switch.ratedCurrent").unwrap();
    assert_eq!(rated.value_kind, ValueKind::Datatype);
    assert_eq!(rated.default_value, "0.0");

    let open = spec.types["Switch"].attribute("Switch.open").unwrap();
    assert_eq!(open.value_kind, ValueKind::Primitive);
    assert_eq!(open.default_value, "false");

    let phases = spec.types["Terminal"].attribute("Terminal.phases").unwrap();
    assert_eq!(phases.value_kind, ValueKind::Enum);
    assert_eq!(phases.default_value, "A");

    let unit = spec.datatypes["CurrentFlow"]
        .attributes
        .iter()
        .find(|a| a.id == "CurrentFlow.unit")
        .unwrap();
    assert!(unit.is_fixed);
    assert_eq!(unit.default_value, "A");
}

#[test]
fn test_associations_and_inverse_roles() {
    let spec = load_profiles();

    let terminals = spec.types["ConductingEquipment"]
        .attribute("ConductingEquipment.Terminals")
        .unwrap();
    assert!(terminals.is_list);
    assert!(!terminals.is_used);
    let link = terminals.inverse.as_ref().unwrap();
    assert_eq!(link.attribute, "Terminal.ConductingEquipment");
    assert!(!link.is_list);

    let equipment = spec.types["Terminal"]
        .attribute("Terminal.ConductingEquipment")
        .unwrap();
    assert!(equipment.is_used);
    assert!(equipment.inverse.as_ref().unwrap().is_list);

    let node_terminals = spec.types["TopologicalNode"]
        .attribute("TopologicalNode.Terminal")
        .unwrap();
    assert!(!node_terminals.is_used);
}

#[test]
fn test_orphans_are_dropped() {
    let spec = load_profiles();

    assert!(!spec.types.contains_key("Orphan"));
    assert!(spec.types.values().all(|t| t.attribute("Orphan.attribute").is_none()));

    let values: Vec<&str> = spec.enums["PhaseCode"].values.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(values, vec!["PhaseCode.A", "PhaseCode.B"]);
}

#[test]
fn test_hierarchy_and_naming_conflicts() {
    let spec = load_profiles();

    assert_eq!(
        spec.types["Breaker"].super_types,
        vec!["Switch", "ConductingEquipment", "Equipment", "IdentifiedObject"]
    );
    assert!(spec.types["IdentifiedObject"].sub_classes.contains(&"Breaker".to_string()));

    let renamed = spec.types["DiagramObject"]
        .attribute("DiagramObject.IdentifiedObject")
        .unwrap();
    assert_eq!(renamed.label, "DiagramObjectIdentifiedObject");
}

#[test]
fn test_namespaces() {
    let spec = load_profiles();

    assert_eq!(spec.namespaces["base"], "http://iec.ch/TC57/CIM100#");
    assert_eq!(spec.types["Switch"].namespace, "http://iec.ch/TC57/CIM100#");
    assert_eq!(
        spec.types["Switch"].attribute("Switch.locked").unwrap().namespace,
        "http://iec.ch/TC57/CIM100-European#"
    );
    for prefix in ["cim", "eu", "md", "rdf"] {
        assert!(spec.used_namespaces.contains_key(prefix), "missing {prefix}");
    }
    assert!(!spec.used_namespaces.contains_key("owl"));

    let all_attributes = spec.types.values().flat_map(|t| t.attributes.iter());
    for attr in all_attributes {
        assert!(attr.namespace.ends_with('#'), "{} has {}", attr.id, attr.namespace);
    }
}

#[test]
fn test_load_is_deterministic() {
    let mut paths = SchemaLoader::discover(&data_pattern()).unwrap();
    let first = SchemaLoader::default().load_files(&paths).unwrap();
    paths.reverse();
    let second = SchemaLoader::default().load_files(&paths).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_json_pretty().unwrap(), second.to_json_pretty().unwrap());
}

#[test]
fn test_structural_error_carries_path() {
    let pattern = format!("{}/broken/*.rdf", data_dir().display());
    let err = SchemaLoader::default().load_pattern(&pattern).unwrap_err();

    match &err {
        Error::Structural { path, .. } => assert!(path.ends_with("Broken.rdf")),
        other => panic!("expected structural error, got {other:?}"),
    }
    assert!(err.to_string().contains("Broken.rdf"));
}

#[test]
fn test_dump_round_trip() {
    let spec = load_profiles();
    let dir = tempfile::tempdir().unwrap();

    let json_path = dir.path().join("schema.json");
    spec.write_dump(&json_path).unwrap();
    let back: Specification =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(back, spec);

    let yaml_path = dir.path().join("schema.yml");
    spec.write_dump(&yaml_path).unwrap();
    let yaml = std::fs::read_to_string(&yaml_path).unwrap();
    assert!(yaml.contains("profile_order:"));
}

const PROFILE_A: &str = r##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about="http://example.com/A#Ontology">
    <rdf:type rdf:resource="http://www.w3.org/2002/07/owl#Ontology"/>
    <dcat:keyword>A</dcat:keyword>
  </rdf:Description>
  <rdf:Description rdf:about="#Breaker">
    <rdf:type rdf:resource="http://www.w3.org/2000/01/rdf-schema#Class"/>
    <rdfs:comment>declared by A</rdfs:comment>
  </rdf:Description>
  <rdf:Description rdf:about="#Breaker.ratedCurrent">
    <rdf:type rdf:resource="http://www.w3.org/1999/02/22-rdf-syntax-ns#Property"/>
    <rdfs:domain rdf:resource="#Breaker"/>
    <cims:dataType rdf:resource="#Float"/>
  </rdf:Description>
  <rdf:Description rdf:about="#Breaker.open">
    <rdf:type rdf:resource="http://www.w3.org/1999/02/22-rdf-syntax-ns#Property"/>
    <rdfs:domain rdf:resource="#Breaker"/>
    <cims:dataType rdf:resource="#Boolean"/>
  </rdf:Description>
</rdf:RDF>"##;

const PROFILE_B: &str = r##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about="http://example.com/B#Ontology">
    <rdf:type rdf:resource="http://www.w3.org/2002/07/owl#Ontology"/>
    <dcat:keyword>B</dcat:keyword>
  </rdf:Description>
  <rdf:Description rdf:about="#Breaker">
    <rdf:type rdf:resource="http://www.w3.org/2000/01/rdf-schema#Class"/>
    <rdfs:comment>declared by B</rdfs:comment>
  </rdf:Description>
  <rdf:Description rdf:about="#Breaker.inTransitTime">
    <rdf:type rdf:resource="http://www.w3.org/1999/02/22-rdf-syntax-ns#Property"/>
    <rdfs:domain rdf:resource="#Breaker"/>
    <cims:dataType rdf:resource="#Float"/>
  </rdf:Description>
</rdf:RDF>"##;

#[test]
fn test_disjoint_declarations_merge_into_one_class() {
    let spec = SchemaLoader::default()
        .load_from_strs(&[("b.rdf", PROFILE_B), ("a.rdf", PROFILE_A)])
        .unwrap();

    assert_eq!(spec.types.len(), 1);
    let breaker = &spec.types["Breaker"];
    let declared = breaker.attributes.iter().filter(|a| !a.is_identity).count();
    assert_eq!(declared, 3);
    assert_eq!(breaker.origins, vec!["A", "B"]);
    // Documents merge in name order, so B's comment wins
    assert_eq!(breaker.comment, "declared by B");
}

#[test]
fn test_merge_order_is_fixed_by_name() {
    let loader = SchemaLoader::default();
    let forward = loader
        .load_from_strs(&[("a.rdf", PROFILE_A), ("b.rdf", PROFILE_B)])
        .unwrap();
    let backward = loader
        .load_from_strs(&[("b.rdf", PROFILE_B), ("a.rdf", PROFILE_A)])
        .unwrap();
    assert_eq!(forward, backward);

    // Swapping the names swaps the scalar winner but not the attribute set
    let swapped = loader
        .load_from_strs(&[("a.rdf", PROFILE_B), ("b.rdf", PROFILE_A)])
        .unwrap();
    assert_eq!(swapped.types["Breaker"].comment, "declared by A");
    let ids = |spec: &Specification| -> Vec<String> {
        spec.types["Breaker"].attributes.iter().map(|a| a.id.clone()).collect()
    };
    assert_eq!(ids(&forward), ids(&swapped));
}

const EXTENSION_DECLARATION: &str = r##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about="http://example.com/EQ#Ontology">
    <rdf:type rdf:resource="http://www.w3.org/2002/07/owl#Ontology"/>
    <dcat:keyword>EQ</dcat:keyword>
  </rdf:Description>
  <rdf:Description rdf:about="http://iec.ch/TC57/CIM100-European#BoundaryPoint">
    <rdf:type rdf:resource="http://www.w3.org/2000/01/rdf-schema#Class"/>
  </rdf:Description>
</rdf:RDF>"##;

const LOCAL_REDECLARATION: &str = r##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about="http://example.com/SSH#Ontology">
    <rdf:type rdf:resource="http://www.w3.org/2002/07/owl#Ontology"/>
    <dcat:keyword>SSH</dcat:keyword>
  </rdf:Description>
  <rdf:Description rdf:about="#BoundaryPoint">
    <rdf:type rdf:resource="http://www.w3.org/2000/01/rdf-schema#Class"/>
  </rdf:Description>
</rdf:RDF>"##;

#[test]
fn test_local_redeclaration_keeps_extension_namespace() {
    let spec = SchemaLoader::default()
        .load_from_strs(&[("EQ.rdf", EXTENSION_DECLARATION), ("SSH.rdf", LOCAL_REDECLARATION)])
        .unwrap();

    let boundary = &spec.types["BoundaryPoint"];
    assert_eq!(boundary.namespace, "http://iec.ch/TC57/CIM100-European#");
    assert_eq!(boundary.origins, vec!["EQ", "SSH"]);
}
