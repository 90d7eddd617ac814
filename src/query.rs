//! Build the SPARQL queries behind the browsing operations.
//! SPARQL has no prepared statements, so every user supplied value passes through one of the checks in this module before it is interpolated:
//! string literals are escaped, IRIs are validated and language tags are restricted to their grammar.
use crate::error::{Error, Result};
use sophia::iri::Iri;

const PREFIXES: &str = "PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>";

/// Escapes a value for embedding between double quotes, see STRING_LITERAL2 and ECHAR in the SPARQL 1.1 grammar.
pub fn escape_literal(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{8}' => escaped.push_str("\\b"),
            '\u{c}' => escaped.push_str("\\f"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Returns the IRI in angle brackets if it is an absolute IRI that cannot terminate the IRIREF early.
pub fn iri_ref(uri: &str) -> Result<String> {
    // IRIREF ::= '<' ([^<>"{}|^`\]-[#x00-#x20])* '>'
    let forbidden = |c: char| matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') || c <= ' ';
    if uri.is_empty() || uri.contains(forbidden) {
        return Err(Error::InvalidIri(uri.to_owned()));
    }
    Iri::new(uri).map_err(|_| Error::InvalidIri(uri.to_owned()))?;
    Ok(format!("<{uri}>"))
}

/// Accepts "*" or BCP 47 style tags such as "en" and "de-AT".
fn lang_tag(lang: &str) -> Result<&str> {
    let valid = lang == "*" || (!lang.is_empty() && lang.split('-').all(|sub| !sub.is_empty() && sub.len() <= 8 && sub.chars().all(|c| c.is_ascii_alphanumeric())));
    if valid { Ok(lang) } else { Err(Error::Validation(format!("invalid language tag '{lang}'"))) }
}

fn limit(limit: usize) -> Result<usize> {
    if limit == 0 { Err(Error::Validation("limit must be positive".to_owned())) } else { Ok(limit) }
}

/// Resources with an rdfs:label in the given language containing `term`, ignoring case. Selects ?uri ?label.
pub fn search(term: &str, lang: &str, max: usize) -> Result<String> {
    let (lang, max) = (lang_tag(lang)?, limit(max)?);
    let term = escape_literal(term);
    Ok(format!(
        "{PREFIXES}
SELECT ?uri ?label WHERE {{
  ?uri rdfs:label ?label .
  FILTER(langMatches(lang(?label), \"{lang}\"))
  FILTER(CONTAINS(LCASE(STR(?label)), LCASE(\"{term}\")))
}} LIMIT {max}"
    ))
}

/// Label, comment and types of a resource. Selects ?label ?comment ?type ?typeLabel, one row per type.
pub fn details(uri: &str, lang: &str, max: usize) -> Result<String> {
    let (iri, lang, max) = (iri_ref(uri)?, lang_tag(lang)?, limit(max)?);
    Ok(format!(
        "{PREFIXES}
SELECT ?label ?comment ?type ?typeLabel WHERE {{
  OPTIONAL {{ {iri} rdfs:label ?label FILTER(langMatches(lang(?label), \"{lang}\")) }}
  OPTIONAL {{ {iri} rdfs:comment ?comment FILTER(langMatches(lang(?comment), \"{lang}\")) }}
  OPTIONAL {{ {iri} rdf:type ?type .
    OPTIONAL {{ ?type rdfs:label ?typeLabel FILTER(langMatches(lang(?typeLabel), \"{lang}\")) }} }}
}} LIMIT {max}"
    ))
}

/// Triples (uri, p, o) where o is an IRI. Selects ?p ?pLabel ?o ?oLabel.
pub fn outgoing(uri: &str, lang: &str, max: usize) -> Result<String> {
    let (iri, lang, max) = (iri_ref(uri)?, lang_tag(lang)?, limit(max)?);
    Ok(format!(
        "{PREFIXES}
SELECT ?p ?pLabel ?o ?oLabel WHERE {{
  {iri} ?p ?o .
  FILTER(isIRI(?o))
  OPTIONAL {{ ?p rdfs:label ?pLabel FILTER(langMatches(lang(?pLabel), \"{lang}\")) }}
  OPTIONAL {{ ?o rdfs:label ?oLabel FILTER(langMatches(lang(?oLabel), \"{lang}\")) }}
}} LIMIT {max}"
    ))
}

/// Triples (s, p, uri) where s is an IRI. Selects ?s ?sLabel ?p ?pLabel.
pub fn incoming(uri: &str, lang: &str, max: usize) -> Result<String> {
    let (iri, lang, max) = (iri_ref(uri)?, lang_tag(lang)?, limit(max)?);
    Ok(format!(
        "{PREFIXES}
SELECT ?s ?sLabel ?p ?pLabel WHERE {{
  ?s ?p {iri} .
  FILTER(isIRI(?s))
  OPTIONAL {{ ?p rdfs:label ?pLabel FILTER(langMatches(lang(?pLabel), \"{lang}\")) }}
  OPTIONAL {{ ?s rdfs:label ?sLabel FILTER(langMatches(lang(?sLabel), \"{lang}\")) }}
}} LIMIT {max}"
    ))
}
