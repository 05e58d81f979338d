//! Fixed vocabulary of the CIM RDFS profile documents
//!
//! Record type URIs, stereotype markers, the markup keys read from each
//! record and the helpers that split a URI into namespace and local id.

/// `rdf:type` of class declarations
pub const CLASS_URI: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
/// `rdf:type` of property declarations
pub const PROPERTY_URI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property";
/// `rdf:type` of package/category markers
pub const CATEGORY_URI: &str = "http://iec.ch/TC57/1999/rdf-schema-extensions-19990926#ClassCategory";
/// `rdf:type` of the profile header record
pub const ONTOLOGY_URI: &str = "http://www.w3.org/2002/07/owl#Ontology";

/// Model description namespace, always exported
pub const MODEL_DESCRIPTION_NAMESPACE: &str = "http://iec.ch/TC57/61970-552/ModelDescription/1#";
/// Core RDF namespace, always exported
pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Namespace table key holding the resolved base namespace
pub const BASE_NAMESPACE_KEY: &str = "base";
/// Namespace prefix that overrides the configured base namespace
pub const CIM_PREFIX: &str = "cim";

/// Markup keys read from description records
pub mod keys {
    pub const ABOUT: &str = "rdf:about";
    pub const ID: &str = "rdf:ID";
    pub const RESOURCE: &str = "rdf:resource";
    pub const LITERAL: &str = "rdfs:Literal";
    pub const DESCRIPTION: &str = "rdf:Description";
    pub const TYPE: &str = "rdf:type";
    pub const LABEL: &str = "rdfs:label";
    pub const COMMENT: &str = "rdfs:comment";
    pub const SUB_CLASS_OF: &str = "rdfs:subClassOf";
    pub const DOMAIN: &str = "rdfs:domain";
    pub const RANGE: &str = "rdfs:range";
    pub const STEREOTYPE: &str = "cims:stereotype";
    pub const CATEGORY: &str = "cims:belongsToCategory";
    pub const DATA_TYPE: &str = "cims:dataType";
    pub const MULTIPLICITY: &str = "cims:multiplicity";
    pub const INVERSE_ROLE: &str = "cims:inverseRoleName";
    pub const ASSOCIATION_USED: &str = "cims:AssociationUsed";
    pub const IS_FIXED: &str = "cims:isFixed";
    pub const KEYWORD: &str = "dcat:keyword";
    pub const TITLE: &str = "dct:title";
    pub const VERSION_IRI: &str = "owl:versionIRI";
    pub const VERSION_INFO: &str = "owl:versionInfo";
    pub const XMLNS_PREFIX: &str = "xmlns:";
}

/// Stereotype markers that change how a class record is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stereotype {
    Enumeration,
    Primitive,
    CimDatatype,
    Concrete,
}

impl Stereotype {
    /// Local name the marker carries after the URI fragment separator
    pub fn name(self) -> &'static str {
        match self {
            Stereotype::Enumeration => "enumeration",
            Stereotype::Primitive => "Primitive",
            Stereotype::CimDatatype => "CIMDatatype",
            Stereotype::Concrete => "concrete",
        }
    }

    /// Match a stereotype reference (URI or literal text) against the markers
    pub fn parse(reference: &str) -> Option<Self> {
        match uri_end(reference) {
            "enumeration" => Some(Stereotype::Enumeration),
            "Primitive" => Some(Stereotype::Primitive),
            "CIMDatatype" => Some(Stereotype::CimDatatype),
            "concrete" => Some(Stereotype::Concrete),
            _ => None,
        }
    }
}

/// Local id of a URI: the part after the last `#`, or the whole string.
pub fn uri_end(uri: &str) -> &str {
    uri.rsplit('#').next().unwrap_or(uri)
}

/// Namespace of a URI including the trailing `#`, or empty when there is none.
pub fn uri_namespace(uri: &str) -> String {
    match uri.rsplit_once('#') {
        Some((namespace, _)) => format!("{namespace}#"),
        None => String::new(),
    }
}

/// Collapse runs of whitespace in free text to single spaces.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
