//! Resolution pipeline
//!
//! An ordered sequence of passes over the merged specification. Every pass
//! is total: a reference that does not resolve stops a walk or leaves a
//! field at its fallback, it never fails the run.
//!
//! The order is load-bearing. Value kinds must be known before unused
//! associations are marked, origins must be ranked before the canonical
//! origin is voted, and sorting comes last.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, trace};

use crate::config::ResolveConfig;
use crate::inheritance::{lineage, link_hierarchy};
use crate::model::{CimAttribute, CimType, InverseLink, ScalarKind, ValueKind};
use crate::specification::Specification;
use crate::vocabulary::{
    BASE_NAMESPACE_KEY, CIM_PREFIX, MODEL_DESCRIPTION_NAMESPACE, RDF_NAMESPACE, Stereotype,
};

/// One step of the resolution pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    ClassifyValueKinds,
    RollUpOrigins,
    AssignProfilePriorities,
    SelectCanonicalOrigins,
    InjectIdentityAttributes,
    MarkUnusedAssociations,
    LinkInverseRoles,
    LinkHierarchy,
    ResolveNamingConflicts,
    DefaultNamespaces,
    SortDeclarations,
}

impl Pass {
    /// The fixed execution order
    pub const ORDER: [Pass; 11] = [
        Pass::ClassifyValueKinds,
        Pass::RollUpOrigins,
        Pass::AssignProfilePriorities,
        Pass::SelectCanonicalOrigins,
        Pass::InjectIdentityAttributes,
        Pass::MarkUnusedAssociations,
        Pass::LinkInverseRoles,
        Pass::LinkHierarchy,
        Pass::ResolveNamingConflicts,
        Pass::DefaultNamespaces,
        Pass::SortDeclarations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::ClassifyValueKinds => "classify-value-kinds",
            Pass::RollUpOrigins => "roll-up-origins",
            Pass::AssignProfilePriorities => "assign-profile-priorities",
            Pass::SelectCanonicalOrigins => "select-canonical-origins",
            Pass::InjectIdentityAttributes => "inject-identity-attributes",
            Pass::MarkUnusedAssociations => "mark-unused-associations",
            Pass::LinkInverseRoles => "link-inverse-roles",
            Pass::LinkHierarchy => "link-hierarchy",
            Pass::ResolveNamingConflicts => "resolve-naming-conflicts",
            Pass::DefaultNamespaces => "default-namespaces",
            Pass::SortDeclarations => "sort-declarations",
        }
    }

    /// Apply this pass to the specification
    pub fn apply(self, spec: &mut Specification, config: &ResolveConfig) {
        match self {
            Pass::ClassifyValueKinds => classify_value_kinds(spec),
            Pass::RollUpOrigins => roll_up_origins(spec),
            Pass::AssignProfilePriorities => assign_profile_priorities(spec, config),
            Pass::SelectCanonicalOrigins => select_canonical_origins(spec, config),
            Pass::InjectIdentityAttributes => inject_identity_attributes(spec, config),
            Pass::MarkUnusedAssociations => mark_unused_associations(spec),
            Pass::LinkInverseRoles => link_inverse_roles(spec),
            Pass::LinkHierarchy => link_hierarchy(&mut spec.types),
            Pass::ResolveNamingConflicts => resolve_naming_conflicts(spec, config),
            Pass::DefaultNamespaces => default_namespaces(spec, config),
            Pass::SortDeclarations => sort_declarations(spec),
        }
    }
}

/// Run every pass in order
pub fn run(spec: &mut Specification, config: &ResolveConfig) {
    for pass in Pass::ORDER {
        debug!(pass = pass.name(), "running resolution pass");
        pass.apply(spec, config);
    }

    let stats = spec.stats();
    info!(
        types = stats.types,
        enums = stats.enums,
        datatypes = stats.datatypes,
        primitives = stats.primitives,
        ontologies = stats.ontologies,
        attributes = stats.attributes,
        "specification resolved"
    );
}

/// Every attribute owned by a type or a datatype
fn all_attributes_mut(spec: &mut Specification) -> impl Iterator<Item = &mut CimAttribute> {
    spec.types
        .values_mut()
        .flat_map(|class| class.attributes.iter_mut())
        .chain(
            spec.datatypes
                .values_mut()
                .flat_map(|datatype| datatype.attributes.iter_mut()),
        )
}

/// Lookup tables for value-kind classification
struct KindLookup {
    primitives: BTreeMap<String, ScalarKind>,
    datatypes: BTreeMap<String, ScalarKind>,
    /// Enumeration id → default literal label
    enums: BTreeMap<String, Option<String>>,
}

impl KindLookup {
    fn primitive(&self, name: &str) -> Option<ScalarKind> {
        ScalarKind::from_name(name).or_else(|| self.primitives.get(name).copied())
    }

    fn classify(&self, attr: &mut CimAttribute) {
        let declared = attr.declared_type().to_string();
        let stereotype = Stereotype::parse(&attr.stereotype);

        let (kind, scalar) = if let Some(scalar) = self.primitive(&declared) {
            (ValueKind::Primitive, scalar)
        } else if stereotype == Some(Stereotype::Primitive) {
            (ValueKind::Primitive, ScalarKind::String)
        } else if let Some(scalar) = self.datatypes.get(&declared) {
            (ValueKind::Datatype, *scalar)
        } else if stereotype == Some(Stereotype::CimDatatype) {
            (ValueKind::Datatype, ScalarKind::Float)
        } else if self.enums.contains_key(&declared) {
            (ValueKind::Enum, ScalarKind::String)
        } else {
            (ValueKind::Object, ScalarKind::Object)
        };

        attr.value_kind = kind;
        attr.scalar_kind = scalar;
        attr.is_primitive = kind == ValueKind::Primitive;
        attr.default_value = match &attr.fixed_value {
            Some(fixed) => fixed.clone(),
            None if attr.is_list => "[]".to_string(),
            None if kind == ValueKind::Enum => self
                .enums
                .get(&declared)
                .cloned()
                .flatten()
                .unwrap_or_else(|| ScalarKind::Object.default_token().to_string()),
            None => scalar.default_token().to_string(),
        };

        trace!(attribute = %attr.id, declared = %declared, ?kind, ?scalar, "classified attribute");
    }
}

/// Classify every attribute as primitive, datatype, enumeration or object reference.
///
/// Datatypes are resolved first: the declared type of their `value`
/// attribute becomes their underlying primitive, falling back to `Float`.
fn classify_value_kinds(spec: &mut Specification) {
    let primitives: BTreeMap<String, ScalarKind> = spec
        .primitives
        .iter()
        .map(|(id, primitive)| (id.clone(), primitive.scalar_kind))
        .collect();

    let mut lookup = KindLookup {
        primitives,
        datatypes: BTreeMap::new(),
        enums: spec
            .enums
            .iter()
            .map(|(id, enumeration)| {
                let first = enumeration
                    .values
                    .iter()
                    .min_by(|a, b| a.id.cmp(&b.id))
                    .map(|value| value.label.clone());
                (id.clone(), first)
            })
            .collect(),
    };

    for datatype in spec.datatypes.values_mut() {
        let underlying = datatype
            .attributes
            .iter()
            .find(|attr| attr.label == "value" || attr.id.ends_with(".value"))
            .and_then(|attr| lookup.primitive(attr.declared_type()));

        datatype.primitive = underlying.unwrap_or_else(|| {
            debug!(datatype = %datatype.id, "no primitive value attribute, assuming Float");
            ScalarKind::Float
        });
        lookup.datatypes.insert(datatype.id.clone(), datatype.primitive);
    }

    for attr in all_attributes_mut(spec) {
        lookup.classify(attr);
    }
}

fn dedup_sorted(origins: &mut Vec<String>) {
    origins.sort();
    origins.dedup();
}

/// Union each type's origins with its attributes' origins
fn roll_up_origins(spec: &mut Specification) {
    for class in spec.types.values_mut() {
        let mut union: BTreeSet<String> = class.origins.drain(..).collect();
        for attr in &mut class.attributes {
            dedup_sorted(&mut attr.origins);
            union.extend(attr.origins.iter().cloned());
        }
        class.origins = union.into_iter().collect();
    }

    for datatype in spec.datatypes.values_mut() {
        dedup_sorted(&mut datatype.origins);
        for attr in &mut datatype.attributes {
            dedup_sorted(&mut attr.origins);
        }
    }
    for enumeration in spec.enums.values_mut() {
        dedup_sorted(&mut enumeration.origins);
    }
    for primitive in spec.primitives.values_mut() {
        dedup_sorted(&mut primitive.origins);
    }
}

/// Rank profiles (base first, others alphabetically) and order every origin list by rank
fn assign_profile_priorities(spec: &mut Specification, config: &ResolveConfig) {
    let mut order: Vec<String> = spec
        .ontologies
        .keys()
        .filter(|keyword| **keyword != config.base_profile)
        .cloned()
        .collect();
    if spec.ontologies.contains_key(&config.base_profile) {
        order.insert(0, config.base_profile.clone());
    }

    let mut ranks: BTreeMap<String, u32> = BTreeMap::new();
    for (rank, keyword) in (1u32..).zip(&order) {
        ranks.insert(keyword.clone(), rank);
        if let Some(ontology) = spec.ontologies.get_mut(keyword) {
            ontology.priority = rank;
        }
    }
    debug!(order = ?order, "profile priorities assigned");
    spec.profile_order = order;

    let by_rank = |origins: &mut Vec<String>| {
        origins.sort_by(|a, b| {
            let rank = |o: &String| ranks.get(o).copied().unwrap_or(u32::MAX);
            rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
        });
    };

    for class in spec.types.values_mut() {
        by_rank(&mut class.origins);
        for attr in &mut class.attributes {
            by_rank(&mut attr.origins);
        }
    }
    for datatype in spec.datatypes.values_mut() {
        by_rank(&mut datatype.origins);
        for attr in &mut datatype.attributes {
            by_rank(&mut attr.origins);
        }
    }
    for enumeration in spec.enums.values_mut() {
        by_rank(&mut enumeration.origins);
    }
    for primitive in spec.primitives.values_mut() {
        by_rank(&mut primitive.origins);
    }
}

/// Vote the owning profile of a type across its lineage.
///
/// Only attributes declared in more than one profile vote, and only for
/// profiles the type itself appears in. The highest tally wins; among the
/// leaders (or all of the type's origins when nobody voted) the base profile
/// is preferred, else the alphabetically first.
pub fn canonical_origin(
    types: &BTreeMap<String, CimType>,
    class: &CimType,
    base_profile: &str,
) -> String {
    let mut tally: BTreeMap<&str, usize> = BTreeMap::new();
    for ancestor in lineage(types, &class.id) {
        for attr in ancestor.attributes.iter().filter(|attr| attr.origins.len() > 1) {
            for origin in &attr.origins {
                if class.origins.contains(origin) {
                    *tally.entry(origin.as_str()).or_default() += 1;
                }
            }
        }
    }

    let candidates: Vec<&str> = match tally.values().max() {
        Some(&max) => tally
            .iter()
            .filter(|(_, count)| **count == max)
            .map(|(origin, _)| *origin)
            .collect(),
        None => class.origins.iter().map(String::as_str).collect(),
    };

    if candidates.contains(&base_profile) {
        base_profile.to_string()
    } else {
        candidates.into_iter().min().unwrap_or_default().to_string()
    }
}

fn select_canonical_origins(spec: &mut Specification, config: &ResolveConfig) {
    let selected: Vec<(String, String)> = spec
        .types
        .values()
        .map(|class| {
            (
                class.id.clone(),
                canonical_origin(&spec.types, class, &config.base_profile),
            )
        })
        .collect();

    for (id, origin) in selected {
        if let Some(class) = spec.types.get_mut(&id) {
            class.origin = origin;
        }
    }
}

fn identity_attribute(config: &ResolveConfig) -> CimAttribute {
    let template = &config.identity_attribute;
    CimAttribute {
        id: template.id.clone(),
        label: template.label.clone(),
        comment: template.comment.clone(),
        stereotype: "attribute".to_string(),
        rdf_type: "Property".to_string(),
        data_type: "String".to_string(),
        value_kind: ValueKind::Primitive,
        scalar_kind: ScalarKind::String,
        default_value: ScalarKind::String.default_token().to_string(),
        is_identity: true,
        is_primitive: true,
        ..CimAttribute::default()
    }
}

/// Give every concrete top-level class other than the identity root an identity attribute
fn inject_identity_attributes(spec: &mut Specification, config: &ResolveConfig) {
    let template = identity_attribute(config);

    for class in spec.types.values_mut() {
        let concrete =
            class.stereotype.is_empty() || class.stereotype == Stereotype::Concrete.name();
        if !concrete || !class.super_type.is_empty() || class.id == config.identity_root {
            continue;
        }
        if class
            .attributes
            .iter()
            .any(|attr| attr.id == template.id || attr.label == template.label)
        {
            continue;
        }

        debug!(class = %class.id, "adding identity attribute");
        let mut attr = template.clone();
        attr.domain.clone_from(&class.id);
        class.attributes.push(attr);
    }
}

/// Associations flagged informational-only: list ends are unused, others are coerced to scalars
fn mark_unused_associations(spec: &mut Specification) {
    for class in spec.types.values_mut() {
        for attr in &mut class.attributes {
            attr.is_used = true;
            if attr.association_used || attr.is_identity {
                continue;
            }
            if attr.value_kind == ValueKind::Object {
                if attr.is_list {
                    attr.is_used = false;
                    debug!(
                        class = %class.id,
                        attribute = %attr.id,
                        "marked unused list association"
                    );
                }
            } else {
                attr.is_primitive = true;
            }
        }
    }
    for attr in spec
        .datatypes
        .values_mut()
        .flat_map(|datatype| datatype.attributes.iter_mut())
    {
        attr.is_used = true;
    }
}

/// Find the counterpart of an inverse role `Class.attribute` through the class lineage
fn find_inverse(types: &BTreeMap<String, CimType>, role: &str) -> Option<InverseLink> {
    let (class_id, label) = role.rsplit_once('.')?;
    lineage(types, class_id).into_iter().find_map(|class| {
        class
            .attributes
            .iter()
            .find(|attr| attr.id == role || attr.label == label)
            .map(|attr| InverseLink {
                class: class.id.clone(),
                attribute: attr.id.clone(),
                is_list: attr.is_list,
            })
    })
}

fn link_inverse_roles(spec: &mut Specification) {
    let mut links: Vec<(String, String, InverseLink)> = Vec::new();
    for class in spec.types.values() {
        for attr in class.attributes.iter().filter(|attr| !attr.inverse_role.is_empty()) {
            match find_inverse(&spec.types, &attr.inverse_role) {
                Some(link) => links.push((class.id.clone(), attr.id.clone(), link)),
                None => debug!(
                    class = %class.id,
                    attribute = %attr.id,
                    role = %attr.inverse_role,
                    "inverse role does not resolve"
                ),
            }
        }
    }

    for (class_id, attr_id, link) in links {
        if let Some(attr) = spec
            .types
            .get_mut(&class_id)
            .and_then(|class| class.attributes.iter_mut().find(|attr| attr.id == attr_id))
        {
            attr.inverse = Some(link);
        }
    }
}

/// Rename attributes labelled after the identity root to a type-qualified label
fn resolve_naming_conflicts(spec: &mut Specification, config: &ResolveConfig) {
    for class in spec.types.values_mut() {
        for attr in &mut class.attributes {
            if attr.label == config.identity_root {
                attr.label = format!("{}{}", class.label, config.identity_root);
                debug!(class = %class.id, label = %attr.label, "renamed conflicting attribute");
            }
        }
    }
}

fn with_separator(mut namespace: String) -> String {
    if !namespace.ends_with('#') {
        namespace.push('#');
    }
    namespace
}

/// Default empty namespaces to the base namespace and record which prefixes are referenced
fn default_namespaces(spec: &mut Specification, config: &ResolveConfig) {
    let base = match spec.namespaces.get(CIM_PREFIX) {
        Some(declared) if !config.force_base_namespace => declared.clone(),
        _ => config.base_namespace.clone(),
    };
    let base = with_separator(base);
    spec.namespaces
        .insert(BASE_NAMESPACE_KEY.to_string(), base.clone());

    let fix = |namespace: &mut String| {
        if namespace.is_empty() || namespace.as_str() == "#" {
            namespace.clone_from(&base);
        } else if !namespace.ends_with('#') {
            namespace.push('#');
        }
    };

    for class in spec.types.values_mut() {
        fix(&mut class.namespace);
        for attr in &mut class.attributes {
            fix(&mut attr.namespace);
        }
    }
    for datatype in spec.datatypes.values_mut() {
        fix(&mut datatype.namespace);
        for attr in &mut datatype.attributes {
            fix(&mut attr.namespace);
        }
    }
    for enumeration in spec.enums.values_mut() {
        fix(&mut enumeration.namespace);
        for value in &mut enumeration.values {
            fix(&mut value.namespace);
        }
    }
    for primitive in spec.primitives.values_mut() {
        fix(&mut primitive.namespace);
    }

    let mut prefixes: BTreeMap<&str, &str> = BTreeMap::new();
    for (prefix, uri) in &spec.namespaces {
        if prefix != BASE_NAMESPACE_KEY {
            prefixes.entry(uri.as_str()).or_insert(prefix.as_str());
        }
    }

    let referenced = spec
        .types
        .values()
        .flat_map(|class| {
            std::iter::once(&class.namespace)
                .chain(class.attributes.iter().map(|attr| &attr.namespace))
        })
        .chain(spec.enums.values().map(|enumeration| &enumeration.namespace))
        .chain(spec.datatypes.values().map(|datatype| &datatype.namespace))
        .chain(spec.primitives.values().map(|primitive| &primitive.namespace));

    let mut used: BTreeMap<String, String> = BTreeMap::new();
    for namespace in referenced {
        if let Some(prefix) = prefixes.get(namespace.as_str()) {
            used.insert((*prefix).to_string(), namespace.clone());
        }
    }

    for (prefix, uri) in [("md", MODEL_DESCRIPTION_NAMESPACE), ("rdf", RDF_NAMESPACE)] {
        if !used.contains_key(prefix) {
            spec.namespaces.insert(prefix.to_string(), uri.to_string());
            used.insert(prefix.to_string(), uri.to_string());
        }
    }

    spec.used_namespaces = used;
}

/// Fix the final iteration order of owned collections
fn sort_declarations(spec: &mut Specification) {
    for class in spec.types.values_mut() {
        class.attributes.sort_by(|a, b| a.id.cmp(&b.id));
    }
    for datatype in spec.datatypes.values_mut() {
        datatype.attributes.sort_by(|a, b| a.id.cmp(&b.id));
    }
    for enumeration in spec.enums.values_mut() {
        enumeration.values.sort_by(|a, b| a.id.cmp(&b.id));
    }
}
