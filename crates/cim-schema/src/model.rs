//! Schema model definitions

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vocabulary::uri_end;

/// Resolved kind of the value an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Not yet classified by the resolution pipeline
    #[default]
    Unresolved,
    Primitive,
    Datatype,
    Enum,
    Object,
}

/// Language-neutral scalar kind of a resolved attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScalarKind {
    String,
    Integer,
    Boolean,
    Float,
    Decimal,
    Date,
    Time,
    DateTime,
    Duration,
    MonthDay,
    Binary,
    Object,
    #[default]
    Unknown,
}

impl ScalarKind {
    /// Match a primitive type name from the schema vocabulary
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(ScalarKind::String),
            "Integer" => Some(ScalarKind::Integer),
            "Boolean" => Some(ScalarKind::Boolean),
            "Float" => Some(ScalarKind::Float),
            "Decimal" => Some(ScalarKind::Decimal),
            "Date" => Some(ScalarKind::Date),
            "Time" => Some(ScalarKind::Time),
            "DateTime" => Some(ScalarKind::DateTime),
            "Duration" => Some(ScalarKind::Duration),
            "MonthDay" => Some(ScalarKind::MonthDay),
            "Binary" => Some(ScalarKind::Binary),
            _ => None,
        }
    }

    /// Default-value token emitters render for a singular attribute of this kind
    pub fn default_token(self) -> &'static str {
        match self {
            ScalarKind::Integer => "0",
            ScalarKind::Float | ScalarKind::Decimal => "0.0",
            ScalarKind::Boolean => "false",
            ScalarKind::String
            | ScalarKind::Date
            | ScalarKind::Time
            | ScalarKind::DateTime
            | ScalarKind::Duration
            | ScalarKind::MonthDay
            | ScalarKind::Binary => "\"\"",
            ScalarKind::Object | ScalarKind::Unknown => "null",
        }
    }
}

/// Cardinality bounds parsed from a `cims:multiplicity` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplicity {
    pub lower: u32,
    /// `None` means unbounded
    pub upper: Option<u32>,
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self {
            lower: 0,
            upper: Some(1),
        }
    }
}

impl Multiplicity {
    /// Parse `M:0..1`, `M:1`, `M:0..n`, `M:2..n` and friends, with or without a URI prefix.
    ///
    /// Unreadable markers fall back to `0..1`.
    pub fn parse(marker: &str) -> Self {
        let local = uri_end(marker);
        let bounds = local.strip_prefix("M:").unwrap_or(local);

        let parsed = match bounds.split_once("..") {
            Some((lower, upper)) => Self::bound(lower).zip(Self::upper_bound(upper)),
            None => Self::bound(bounds).map(|n| (n, Some(n))),
        };

        match parsed {
            Some((lower, upper)) => Self { lower, upper },
            None => {
                debug!(marker, "unreadable multiplicity, using 0..1");
                Self::default()
            }
        }
    }

    fn bound(text: &str) -> Option<u32> {
        text.trim().parse().ok()
    }

    fn upper_bound(text: &str) -> Option<Option<u32>> {
        match text.trim() {
            "n" | "N" | "*" => Some(None),
            other => other.parse().ok().map(Some),
        }
    }

    /// True if more than one value may be present
    pub fn is_list(self) -> bool {
        self.upper.is_none_or(|upper| upper > 1)
    }
}

/// Resolved counterpart of an association end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverseLink {
    /// Type that declares the counterpart attribute
    pub class: String,
    /// Id of the counterpart attribute
    pub attribute: String,
    pub is_list: bool,
}

/// A property bound to a class or datatype
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CimAttribute {
    pub id: String,
    pub label: String,
    pub namespace: String,
    pub comment: String,
    pub stereotype: String,
    pub rdf_type: String,
    /// Declared owner (local id)
    pub domain: String,
    pub range: String,
    pub data_type: String,
    pub multiplicity: Multiplicity,
    pub is_list: bool,
    pub association_used: bool,
    /// Declared inverse role (`Class.attribute`)
    pub inverse_role: String,
    /// Value from `cims:isFixed`
    pub fixed_value: Option<String>,
    pub categories: Vec<String>,
    pub origins: Vec<String>,

    // Derived by the resolution pipeline
    pub value_kind: ValueKind,
    pub scalar_kind: ScalarKind,
    pub default_value: String,
    pub is_fixed: bool,
    pub is_identity: bool,
    pub is_used: bool,
    pub is_primitive: bool,
    pub inverse: Option<InverseLink>,
}

impl CimAttribute {
    /// Type reference the attribute declares: `cims:dataType` first, then `rdfs:range`
    pub fn declared_type(&self) -> &str {
        if self.data_type.is_empty() {
            &self.range
        } else {
            &self.data_type
        }
    }
}

/// A class declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CimType {
    pub id: String,
    pub label: String,
    pub namespace: String,
    pub comment: String,
    pub super_type: String,
    pub stereotype: String,
    pub rdf_type: String,
    pub categories: Vec<String>,
    pub origins: Vec<String>,
    /// Canonical owning profile
    pub origin: String,
    pub attributes: Vec<CimAttribute>,
    /// Ancestor chain, nearest first
    pub super_types: Vec<String>,
    /// Transitive subclasses, sorted
    pub sub_classes: Vec<String>,
}

impl CimType {
    /// Find an owned attribute by id
    pub fn attribute(&self, id: &str) -> Option<&CimAttribute> {
        self.attributes.iter().find(|attr| attr.id == id)
    }
}

/// An enumeration class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CimEnum {
    pub id: String,
    pub label: String,
    pub namespace: String,
    pub comment: String,
    pub stereotype: String,
    pub rdf_type: String,
    pub origins: Vec<String>,
    pub values: Vec<CimEnumValue>,
}

/// One literal of an enumeration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CimEnumValue {
    pub id: String,
    pub label: String,
    pub namespace: String,
    pub comment: String,
    pub stereotype: String,
    /// Owning enumeration (local id)
    pub rdf_type: String,
}

/// A physical-unit datatype (`value`, `unit`, `multiplier`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CimDatatype {
    pub id: String,
    pub label: String,
    pub namespace: String,
    pub comment: String,
    pub stereotype: String,
    pub categories: Vec<String>,
    pub origins: Vec<String>,
    pub attributes: Vec<CimAttribute>,
    /// Underlying primitive of the wrapped `value` attribute
    pub primitive: ScalarKind,
}

/// A primitive type declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CimPrimitive {
    pub id: String,
    pub label: String,
    pub namespace: String,
    pub comment: String,
    pub stereotype: String,
    pub origins: Vec<String>,
    pub scalar_kind: ScalarKind,
}

/// Profile header of one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CimOntology {
    pub id: String,
    pub namespace: String,
    pub keyword: String,
    pub title: String,
    pub version_iri: String,
    pub version_info: String,
    /// Rank among all profiles, 1 is first
    pub priority: u32,
}
