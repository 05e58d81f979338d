//! Fragment classification and attribute binding
//!
//! Each top-level record of a decoded profile document is routed by its
//! declared type URI into one draft record. Properties are then bound to the
//! class or datatype named by their domain, and enumeration literals to the
//! enumeration named by their type. Records that cannot be bound are dropped.

use cim_ir::value::attribute;
use cim_ir::{ATTRIBUTE_PREFIX, Cursor, Item, Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::model::{
    CimAttribute, CimDatatype, CimEnum, CimEnumValue, CimOntology, CimPrimitive, CimType,
    Multiplicity, ScalarKind,
};
use crate::vocabulary::{
    CATEGORY_URI, CLASS_URI, ONTOLOGY_URI, PROPERTY_URI, Stereotype, keys, normalize_text, uri_end,
    uri_namespace,
};

/// Classification of one description record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Class,
    Enumeration,
    Primitive,
    Datatype,
    Property,
    Ontology,
    /// Package marker, ignored
    Category,
    /// Anything else: the lowest-specificity fallback
    EnumValue,
}

/// One record of a decoded document
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// Element tag the record was declared with
    pub tag: &'a str,
    pub fields: &'a Map,
    /// Declared type URI (from `rdf:type` or a typed element tag)
    pub type_uri: &'a str,
}

// Accessors tolerate a missing key, a single value, or a list (first wins).

fn items<'a>(record: &'a Map, key: &str) -> Vec<Item<'a>> {
    record.get(key).map(Value::items).unwrap_or_default()
}

/// First `rdf:resource` reference under `key`
pub fn resource<'a>(record: &'a Map, key: &str) -> &'a str {
    items(record, key)
        .into_iter()
        .find_map(|item| match item {
            Item::Map(map) => attribute(map, keys::RESOURCE),
            Item::Text(_) => None,
        })
        .unwrap_or_default()
}

/// All `rdf:resource` references under `key`
pub fn resources<'a>(record: &'a Map, key: &str) -> Vec<&'a str> {
    items(record, key)
        .into_iter()
        .filter_map(|item| match item {
            Item::Map(map) => attribute(map, keys::RESOURCE),
            Item::Text(_) => None,
        })
        .collect()
}

/// First text content under `key`
pub fn text<'a>(record: &'a Map, key: &str) -> &'a str {
    items(record, key)
        .into_iter()
        .find_map(|item| item.text())
        .unwrap_or_default()
}

/// First resource under `key`, else its first text
pub fn text_or_resource<'a>(record: &'a Map, key: &str) -> &'a str {
    match resource(record, key) {
        "" => text(record, key),
        found => found,
    }
}

/// Identifier of the record (`rdf:about`, or `rdf:ID` as a local reference)
pub fn about(record: &Map) -> String {
    if let Some(uri) = attribute(record, keys::ABOUT) {
        return uri.to_string();
    }
    attribute(record, keys::ID)
        .map(|id| format!("#{id}"))
        .unwrap_or_default()
}

fn fixed_value(record: &Map) -> Option<String> {
    items(record, keys::IS_FIXED).into_iter().find_map(|item| match item {
        Item::Text(text) => Some(text.to_string()),
        Item::Map(map) => item
            .text()
            .or_else(|| attribute(map, keys::LITERAL))
            .map(str::to_string)
            .or_else(|| attribute(map, keys::RESOURCE).map(|uri| uri_end(uri).to_string())),
    })
}

fn stereotypes(record: &Map) -> Vec<&str> {
    items(record, keys::STEREOTYPE)
        .into_iter()
        .filter_map(|item| match item {
            Item::Map(map) => attribute(map, keys::RESOURCE).or_else(|| item.text()),
            Item::Text(text) => Some(text),
        })
        .collect()
}

fn has_stereotype(record: &Map, marker: Stereotype) -> bool {
    stereotypes(record)
        .into_iter()
        .any(|reference| Stereotype::parse(reference) == Some(marker))
}

/// Route a record by its declared type URI.
pub fn classify(record: &Record<'_>) -> FragmentKind {
    let type_uri = record.type_uri;

    if type_uri.contains(CLASS_URI) {
        if has_stereotype(record.fields, Stereotype::Enumeration) {
            FragmentKind::Enumeration
        } else if has_stereotype(record.fields, Stereotype::Primitive) {
            FragmentKind::Primitive
        } else if has_stereotype(record.fields, Stereotype::CimDatatype) {
            FragmentKind::Datatype
        } else {
            FragmentKind::Class
        }
    } else if type_uri.contains(PROPERTY_URI) {
        FragmentKind::Property
    } else if type_uri.contains(CATEGORY_URI) {
        FragmentKind::Category
    } else if type_uri.contains(ONTOLOGY_URI) {
        FragmentKind::Ontology
    } else {
        FragmentKind::EnumValue
    }
}

/// Common header fields of every declaration
struct Header {
    id: String,
    label: String,
    namespace: String,
    comment: String,
    stereotype: String,
}

impl Header {
    fn read(record: &Map) -> Self {
        let uri = about(record);
        Self {
            id: uri_end(&uri).to_string(),
            namespace: uri_namespace(&uri),
            label: text(record, keys::LABEL).to_string(),
            comment: normalize_text(text(record, keys::COMMENT)),
            stereotype: uri_end(text_or_resource(record, keys::STEREOTYPE)).to_string(),
        }
    }
}

fn categories(record: &Map) -> Vec<String> {
    resources(record, keys::CATEGORY)
        .into_iter()
        .map(|uri| uri_end(uri).to_string())
        .collect()
}

fn origins(keyword: &str) -> Vec<String> {
    if keyword.is_empty() {
        Vec::new()
    } else {
        vec![keyword.to_string()]
    }
}

fn read_class(record: &Map, keyword: &str) -> CimType {
    let header = Header::read(record);
    CimType {
        id: header.id,
        label: header.label,
        namespace: header.namespace,
        comment: header.comment,
        stereotype: header.stereotype,
        super_type: uri_end(resource(record, keys::SUB_CLASS_OF)).to_string(),
        rdf_type: uri_end(resource(record, keys::TYPE)).to_string(),
        categories: categories(record),
        origins: origins(keyword),
        ..CimType::default()
    }
}

fn read_enum(record: &Map, keyword: &str) -> CimEnum {
    let header = Header::read(record);
    CimEnum {
        id: header.id,
        label: header.label,
        namespace: header.namespace,
        comment: header.comment,
        stereotype: header.stereotype,
        rdf_type: uri_end(resource(record, keys::TYPE)).to_string(),
        origins: origins(keyword),
        values: Vec::new(),
    }
}

fn read_datatype(record: &Map, keyword: &str) -> CimDatatype {
    let header = Header::read(record);
    CimDatatype {
        id: header.id,
        label: header.label,
        namespace: header.namespace,
        comment: header.comment,
        stereotype: header.stereotype,
        categories: categories(record),
        origins: origins(keyword),
        attributes: Vec::new(),
        primitive: ScalarKind::Unknown,
    }
}

fn read_primitive(record: &Map, keyword: &str) -> CimPrimitive {
    let header = Header::read(record);
    let scalar_kind = ScalarKind::from_name(&header.id).unwrap_or(ScalarKind::String);
    CimPrimitive {
        id: header.id,
        label: header.label,
        namespace: header.namespace,
        comment: header.comment,
        stereotype: header.stereotype,
        origins: origins(keyword),
        scalar_kind,
    }
}

fn read_property(record: &Map, keyword: &str) -> CimAttribute {
    let header = Header::read(record);
    let multiplicity = match resource(record, keys::MULTIPLICITY) {
        "" => Multiplicity::default(),
        marker => Multiplicity::parse(marker),
    };
    let fixed_value = fixed_value(record);

    CimAttribute {
        id: header.id,
        label: header.label,
        namespace: header.namespace,
        comment: header.comment,
        stereotype: header.stereotype,
        rdf_type: uri_end(resource(record, keys::TYPE)).to_string(),
        domain: uri_end(resource(record, keys::DOMAIN)).to_string(),
        range: uri_end(resource(record, keys::RANGE)).to_string(),
        data_type: uri_end(resource(record, keys::DATA_TYPE)).to_string(),
        multiplicity,
        is_list: multiplicity.is_list(),
        association_used: uri_end(text_or_resource(record, keys::ASSOCIATION_USED)) == "Yes",
        inverse_role: uri_end(resource(record, keys::INVERSE_ROLE)).to_string(),
        is_fixed: fixed_value.is_some(),
        fixed_value,
        origins: origins(keyword),
        ..CimAttribute::default()
    }
}

fn read_enum_value(record: &Map) -> CimEnumValue {
    let header = Header::read(record);
    CimEnumValue {
        id: header.id,
        label: header.label,
        namespace: header.namespace,
        comment: header.comment,
        stereotype: header.stereotype,
        rdf_type: uri_end(resource(record, keys::TYPE)).to_string(),
    }
}

fn read_ontology(record: &Map) -> CimOntology {
    let uri = about(record);
    CimOntology {
        id: uri_end(&uri).to_string(),
        namespace: uri_namespace(&uri),
        keyword: text(record, keys::KEYWORD).trim().to_string(),
        title: normalize_text(text(record, keys::TITLE)),
        version_iri: resource(record, keys::VERSION_IRI).to_string(),
        version_info: text(record, keys::VERSION_INFO).trim().to_string(),
        priority: 0,
    }
}

/// Classified and bound content of one document
#[derive(Debug, Clone, Default)]
pub struct DocumentDraft {
    /// Profile keyword every record of the document is tagged with
    pub keyword: String,
    pub ontology: Option<CimOntology>,
    pub types: BTreeMap<String, CimType>,
    pub enums: BTreeMap<String, CimEnum>,
    pub datatypes: BTreeMap<String, CimDatatype>,
    pub primitives: BTreeMap<String, CimPrimitive>,
    /// `xmlns:*` declarations of the document root
    pub namespaces: BTreeMap<String, String>,
    pub dropped_properties: usize,
    pub dropped_values: usize,
}

/// Locate the root element's map: `rdf:RDF` if present, else the only top-level entry
fn root_element(document: &Value) -> Option<&Map> {
    let cursor = Cursor::new(document);
    if let Ok(root) = cursor.child("rdf:RDF") {
        return root.map();
    }
    document.as_map()?.values().next()?.as_map()
}

fn collect_namespaces(root: &Map) -> BTreeMap<String, String> {
    root.iter()
        .filter_map(|(key, value)| {
            let name = key.strip_prefix(ATTRIBUTE_PREFIX)?;
            let prefix = name.strip_prefix(keys::XMLNS_PREFIX)?;
            Some((prefix.to_string(), value.as_text()?.to_string()))
        })
        .collect()
}

/// Type URI of a record: `rdf:type`, or the expanded tag of a typed node element
fn type_uri(tag: &str, fields: &Map, namespaces: &BTreeMap<String, String>) -> String {
    let declared = resource(fields, keys::TYPE);
    if !declared.is_empty() || tag == keys::DESCRIPTION {
        return declared.to_string();
    }
    match tag.split_once(':') {
        Some((prefix, local)) => match namespaces.get(prefix) {
            Some(namespace) => format!("{namespace}{local}"),
            None => tag.to_string(),
        },
        None => tag.to_string(),
    }
}

impl DocumentDraft {
    /// Classify and bind the records of one decoded document.
    ///
    /// `fallback_keyword` tags the records when the document carries no
    /// ontology header (or one without a keyword).
    pub fn from_document(document: &Value, fallback_keyword: &str) -> Self {
        let mut draft = DocumentDraft::default();
        let Some(root) = root_element(document) else {
            debug!("document has no structured root element");
            draft.keyword = fallback_keyword.to_string();
            return draft;
        };

        draft.namespaces = collect_namespaces(root);

        let entries: Vec<(String, &Map)> = root
            .iter()
            .filter(|(key, _)| !key.starts_with(ATTRIBUTE_PREFIX))
            .flat_map(|(key, value)| {
                value.maps().into_iter().map(move |fields| (key.clone(), fields))
            })
            .collect();
        let type_uris: Vec<String> = entries
            .iter()
            .map(|(tag, fields)| type_uri(tag, fields, &draft.namespaces))
            .collect();
        let records: Vec<Record<'_>> = entries
            .iter()
            .zip(&type_uris)
            .map(|((tag, fields), type_uri)| Record {
                tag,
                fields,
                type_uri,
            })
            .collect();

        // The profile keyword tags every other record, so read the header first.
        draft.ontology = records
            .iter()
            .find(|record| classify(record) == FragmentKind::Ontology)
            .map(|record| read_ontology(record.fields));
        draft.keyword = match &draft.ontology {
            Some(ontology) if !ontology.keyword.is_empty() => ontology.keyword.clone(),
            _ => fallback_keyword.to_string(),
        };
        if let Some(ontology) = draft.ontology.as_mut() {
            ontology.keyword.clone_from(&draft.keyword);
        }

        let keyword = draft.keyword.clone();
        let mut properties = Vec::new();
        let mut values = Vec::new();

        for record in &records {
            let kind = classify(record);
            trace!(tag = record.tag, about = %about(record.fields), ?kind, "classified record");

            match kind {
                FragmentKind::Class => {
                    let class = read_class(record.fields, &keyword);
                    draft.types.insert(class.id.clone(), class);
                }
                FragmentKind::Enumeration => {
                    let enumeration = read_enum(record.fields, &keyword);
                    draft.enums.insert(enumeration.id.clone(), enumeration);
                }
                FragmentKind::Datatype => {
                    let datatype = read_datatype(record.fields, &keyword);
                    draft.datatypes.insert(datatype.id.clone(), datatype);
                }
                FragmentKind::Primitive => {
                    let primitive = read_primitive(record.fields, &keyword);
                    draft.primitives.insert(primitive.id.clone(), primitive);
                }
                FragmentKind::Property => properties.push(read_property(record.fields, &keyword)),
                FragmentKind::EnumValue => values.push(read_enum_value(record.fields)),
                FragmentKind::Ontology | FragmentKind::Category => {}
            }
        }

        draft.bind_properties(properties);
        draft.bind_values(values);
        draft
    }

    fn bind_properties(&mut self, properties: Vec<CimAttribute>) {
        for mut property in properties {
            if let Some(class) = self.types.get_mut(&property.domain) {
                property.categories.clone_from(&class.categories);
                class.attributes.push(property);
            } else if let Some(datatype) = self.datatypes.get_mut(&property.domain) {
                property.categories.clone_from(&datatype.categories);
                datatype.attributes.push(property);
            } else {
                debug!(
                    property = %property.id,
                    domain = %property.domain,
                    "dropping property without a matching domain in this document"
                );
                self.dropped_properties += 1;
            }
        }
    }

    fn bind_values(&mut self, values: Vec<CimEnumValue>) {
        for value in values {
            if let Some(enumeration) = self.enums.get_mut(&value.rdf_type) {
                enumeration.values.push(value);
            } else {
                debug!(
                    value = %value.id,
                    rdf_type = %value.rdf_type,
                    "dropping record without a matching enumeration in this document"
                );
                self.dropped_values += 1;
            }
        }
    }
}
