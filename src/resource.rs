//! What the explorer shows about RDF resources.
use serde::Serialize;

/// A resource whose label matched a search term.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub uri: String,
    /// rdfs:label in the requested language, the URI if there is none
    pub label: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub uri: String,
    pub label: String,
}

/// Triple (center, predicate, object) with an IRI object.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingRelation {
    pub predicate: String,
    pub predicate_label: String,
    pub object: String,
    pub object_label: String,
}

/// Triple (subject, predicate, center) with an IRI subject.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRelation {
    pub subject: String,
    pub subject_label: String,
    pub predicate: String,
    pub predicate_label: String,
}

/// Result of the details query: label and comment of the first row, types of all rows.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDetails {
    pub label: Option<String>,
    pub comment: Option<String>,
    pub types: Vec<TypeRef>,
}

/// Everything shown for one selected resource. Built fresh for every request.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EntityView {
    pub uri: String,
    pub label: String,
    /// empty if there is no comment in the requested language
    pub comment: String,
    pub types: Vec<TypeRef>,
    pub outgoing: Vec<OutgoingRelation>,
    pub incoming: Vec<IncomingRelation>,
}
