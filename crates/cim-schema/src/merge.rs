//! Cross-document merge
//!
//! Folds one document's drafts into the accumulating specification, keyed by
//! Id. Scalar metadata is last-write-wins when the incoming value is
//! non-empty, so documents must be merged in a fixed order.

use std::collections::BTreeMap;
use tracing::{debug, info, trace};

use crate::fragment::DocumentDraft;
use crate::model::{CimAttribute, CimDatatype, CimEnum, CimPrimitive, CimType};
use crate::specification::Specification;

fn overwrite(target: &mut String, incoming: String) {
    if !incoming.is_empty() {
        *target = incoming;
    }
}

/// A bare `#` from a local `rdf:about="#X"` reference carries no namespace
fn overwrite_namespace(target: &mut String, incoming: String) {
    if incoming != "#" {
        overwrite(target, incoming);
    }
}

/// Merge an incoming attribute list into an existing one, deduplicating by Id
fn merge_attributes(existing: &mut Vec<CimAttribute>, incoming: Vec<CimAttribute>) {
    for attr in incoming {
        match existing.iter_mut().find(|current| current.id == attr.id) {
            Some(current) => {
                current.origins.extend(attr.origins);
                current.categories.extend(attr.categories);
            }
            None => existing.push(attr),
        }
    }
}

/// Merge a class declaration into an existing one
pub fn merge_type(existing: &mut CimType, incoming: CimType) {
    overwrite(&mut existing.super_type, incoming.super_type);
    overwrite(&mut existing.stereotype, incoming.stereotype);
    overwrite(&mut existing.label, incoming.label);
    overwrite(&mut existing.comment, incoming.comment);
    overwrite_namespace(&mut existing.namespace, incoming.namespace);
    existing.categories.extend(incoming.categories);
    existing.origins.extend(incoming.origins);
    merge_attributes(&mut existing.attributes, incoming.attributes);
}

/// Merge an enumeration into an existing one; values are deduplicated by Id
pub fn merge_enum(existing: &mut CimEnum, incoming: CimEnum) {
    overwrite(&mut existing.stereotype, incoming.stereotype);
    overwrite(&mut existing.label, incoming.label);
    overwrite(&mut existing.comment, incoming.comment);
    overwrite_namespace(&mut existing.namespace, incoming.namespace);
    existing.origins.extend(incoming.origins);

    for value in incoming.values {
        if !existing.values.iter().any(|current| current.id == value.id) {
            existing.values.push(value);
        }
    }
}

/// Merge a datatype into an existing one
pub fn merge_datatype(existing: &mut CimDatatype, incoming: CimDatatype) {
    overwrite(&mut existing.stereotype, incoming.stereotype);
    overwrite(&mut existing.label, incoming.label);
    overwrite(&mut existing.comment, incoming.comment);
    overwrite_namespace(&mut existing.namespace, incoming.namespace);
    existing.categories.extend(incoming.categories);
    existing.origins.extend(incoming.origins);

    // The wrapped attributes are taken from the first document that declares them.
    if existing.attributes.is_empty() {
        existing.attributes = incoming.attributes;
    }
}

/// Merge a primitive into an existing one
pub fn merge_primitive(existing: &mut CimPrimitive, incoming: CimPrimitive) {
    overwrite(&mut existing.stereotype, incoming.stereotype);
    overwrite(&mut existing.label, incoming.label);
    overwrite(&mut existing.comment, incoming.comment);
    overwrite_namespace(&mut existing.namespace, incoming.namespace);
    existing.origins.extend(incoming.origins);
}

fn fold<T>(target: &mut BTreeMap<String, T>, incoming: BTreeMap<String, T>, merge: fn(&mut T, T)) {
    for (id, entity) in incoming {
        match target.get_mut(&id) {
            Some(existing) => {
                trace!(%id, "merging redeclared entity");
                merge(existing, entity);
            }
            None => {
                target.insert(id, entity);
            }
        }
    }
}

impl Specification {
    /// Fold one document's drafts into the specification.
    pub fn merge_document(&mut self, draft: DocumentDraft) {
        let DocumentDraft {
            keyword,
            ontology,
            types,
            enums,
            datatypes,
            primitives,
            namespaces,
            dropped_properties,
            dropped_values,
        } = draft;

        info!(
            profile = %keyword,
            types = types.len(),
            enums = enums.len(),
            datatypes = datatypes.len(),
            primitives = primitives.len(),
            "merging document"
        );
        if dropped_properties + dropped_values > 0 {
            debug!(
                profile = %keyword,
                dropped_properties,
                dropped_values,
                "records without an owner were dropped"
            );
        }

        fold(&mut self.types, types, merge_type);
        fold(&mut self.enums, enums, merge_enum);
        fold(&mut self.datatypes, datatypes, merge_datatype);
        fold(&mut self.primitives, primitives, merge_primitive);

        if let Some(ontology) = ontology {
            self.ontologies.insert(ontology.keyword.clone(), ontology);
        }
        self.namespaces.extend(namespaces);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CimEnumValue, CimOntology};

    fn attr(id: &str, origin: &str) -> CimAttribute {
        CimAttribute {
            id: id.into(),
            origins: vec![origin.into()],
            categories: vec![format!("Package_{origin}")],
            ..CimAttribute::default()
        }
    }

    fn class(id: &str, origin: &str, attributes: Vec<CimAttribute>) -> CimType {
        CimType {
            id: id.into(),
            origins: vec![origin.into()],
            attributes,
            ..CimType::default()
        }
    }

    fn draft(keyword: &str, types: Vec<CimType>) -> DocumentDraft {
        DocumentDraft {
            keyword: keyword.into(),
            ontology: Some(CimOntology {
                keyword: keyword.into(),
                ..CimOntology::default()
            }),
            types: types.into_iter().map(|t| (t.id.clone(), t)).collect(),
            ..DocumentDraft::default()
        }
    }

    #[test]
    fn test_new_entity_is_inserted() {
        let mut spec = Specification::new();
        spec.merge_document(draft(
            "EQ",
            vec![class("Switch", "EQ", vec![attr("Switch.open", "EQ")])],
        ));
        assert_eq!(spec.types["Switch"].attributes.len(), 1);
        assert!(spec.ontologies.contains_key("EQ"));
    }

    #[test]
    fn test_attributes_dedup_by_id() {
        let mut spec = Specification::new();
        spec.merge_document(draft(
            "EQ",
            vec![class("Switch", "EQ", vec![attr("Switch.open", "EQ")])],
        ));
        spec.merge_document(draft(
            "SSH",
            vec![class(
                "Switch",
                "SSH",
                vec![attr("Switch.open", "SSH"), attr("Switch.locked", "SSH")],
            )],
        ));

        let switch = &spec.types["Switch"];
        assert_eq!(switch.attributes.len(), 2);
        assert_eq!(switch.origins, vec!["EQ", "SSH"]);
        let open = switch.attribute("Switch.open").unwrap();
        assert_eq!(open.origins, vec!["EQ", "SSH"]);
        assert_eq!(open.categories, vec!["Package_EQ", "Package_SSH"]);
    }

    #[test]
    fn test_scalar_metadata_last_write_wins() {
        let mut first = class("Switch", "EQ", Vec::new());
        first.stereotype = "concrete".into();
        first.super_type = "ConductingEquipment".into();
        let mut second = class("Switch", "SSH", Vec::new());
        second.super_type = "Equipment".into();

        let mut spec = Specification::new();
        spec.merge_document(draft("EQ", vec![first]));
        spec.merge_document(draft("SSH", vec![second]));

        let switch = &spec.types["Switch"];
        assert_eq!(switch.super_type, "Equipment");
        // An empty incoming value never clears existing metadata
        assert_eq!(switch.stereotype, "concrete");
    }

    #[test]
    fn test_local_reference_keeps_declared_namespace() {
        let mut first = class("BoundaryPoint", "EQ", Vec::new());
        first.namespace = "http://iec.ch/TC57/CIM100-European#".into();
        let mut second = class("BoundaryPoint", "SSH", Vec::new());
        second.namespace = "#".into();

        let mut spec = Specification::new();
        spec.merge_document(draft("EQ", vec![first]));
        spec.merge_document(draft("SSH", vec![second]));
        assert_eq!(
            spec.types["BoundaryPoint"].namespace,
            "http://iec.ch/TC57/CIM100-European#"
        );

        let mut existing = CimPrimitive {
            namespace: "http://iec.ch/TC57/CIM100#".into(),
            ..CimPrimitive::default()
        };
        merge_primitive(
            &mut existing,
            CimPrimitive {
                namespace: "#".into(),
                ..CimPrimitive::default()
            },
        );
        assert_eq!(existing.namespace, "http://iec.ch/TC57/CIM100#");
    }

    #[test]
    fn test_enum_values_dedup_by_id() {
        let value = |id: &str| CimEnumValue {
            id: id.into(),
            ..CimEnumValue::default()
        };
        let mut existing = CimEnum {
            id: "PhaseCode".into(),
            values: vec![value("PhaseCode.A")],
            origins: vec!["EQ".into()],
            ..CimEnum::default()
        };
        merge_enum(
            &mut existing,
            CimEnum {
                id: "PhaseCode".into(),
                values: vec![value("PhaseCode.A"), value("PhaseCode.B")],
                origins: vec!["SSH".into()],
                ..CimEnum::default()
            },
        );
        assert_eq!(existing.values.len(), 2);
        assert_eq!(existing.origins, vec!["EQ", "SSH"]);
    }

    #[test]
    fn test_datatype_keeps_first_attributes() {
        let mut existing = CimDatatype {
            id: "Voltage".into(),
            attributes: vec![attr("Voltage.value", "EQ")],
            ..CimDatatype::default()
        };
        merge_datatype(
            &mut existing,
            CimDatatype {
                id: "Voltage".into(),
                attributes: vec![attr("Voltage.value", "SSH"), attr("Voltage.unit", "SSH")],
                origins: vec!["SSH".into()],
                ..CimDatatype::default()
            },
        );
        assert_eq!(existing.attributes.len(), 1);
        assert_eq!(existing.origins, vec!["SSH"]);
    }

    #[test]
    fn test_merge_order_changes_only_scalar_winner() {
        let a = || {
            let mut t = class("Breaker", "A", vec![attr("Breaker.x", "A")]);
            t.comment = "from A".into();
            draft("A", vec![t])
        };
        let b = || {
            let mut t = class("Breaker", "B", vec![attr("Breaker.y", "B")]);
            t.comment = "from B".into();
            draft("B", vec![t])
        };

        let mut ab = Specification::new();
        ab.merge_document(a());
        ab.merge_document(b());
        let mut ba = Specification::new();
        ba.merge_document(b());
        ba.merge_document(a());

        let ids = |spec: &Specification| {
            let mut ids: Vec<String> =
                spec.types["Breaker"].attributes.iter().map(|a| a.id.clone()).collect();
            ids.sort();
            ids
        };
        assert_eq!(ids(&ab), ids(&ba));
        assert_eq!(ab.types["Breaker"].comment, "from B");
        assert_eq!(ba.types["Breaker"].comment, "from A");
    }
}
