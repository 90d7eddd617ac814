//! Turn raw result rows into the resource model.
//! Unbound variables are normal for OPTIONAL clauses and never an error here.
use crate::resource::{EntityDetails, EntityView, IncomingRelation, OutgoingRelation, SearchHit, TypeRef};
use crate::sparql::{Binding, QueryResults};
use serde::Serialize;
use std::collections::BTreeMap;

/// A row restricted to the expected variables.
pub type Row = BTreeMap<String, Option<String>>;

/// Value of the variable in the row, `None` if unbound.
pub fn value_of<'a>(row: &'a Binding, var: &str) -> Option<&'a str> {
    row.get(var).map(|term| term.value.as_str())
}

/// Projects each binding onto the given variables.
pub fn project(bindings: &[Binding], vars: &[String]) -> Vec<Row> {
    bindings.iter().map(|b| vars.iter().map(|v| (v.clone(), value_of(b, v).map(str::to_owned))).collect()).collect()
}

/// Result rows as a table with one column per variable of `head.vars`, unbound cells are `None`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub vars: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl From<&QueryResults> for Table {
    fn from(results: &QueryResults) -> Self {
        if let Some(b) = results.boolean {
            return Table { vars: vec!["boolean".to_owned()], rows: vec![vec![Some(b.to_string())]] };
        }
        let rows: Vec<Vec<Option<String>>> = project(&results.bindings, &results.vars).into_iter().map(|row| results.vars.iter().map(|v| row.get(v).cloned().flatten()).collect()).collect();
        Table { vars: results.vars.clone(), rows }
    }
}

/// The label if bound and non-empty, otherwise the given IRI.
fn label_or(row: &Binding, label_var: &str, iri: &str) -> String {
    value_of(row, label_var).filter(|l| !l.is_empty()).unwrap_or(iri).to_owned()
}

/// Rows from the search query. Rows without ?uri are skipped.
pub fn search_hits(rows: &[Binding], limit: usize) -> Vec<SearchHit> {
    rows.iter()
        .filter_map(|r| {
            let uri = value_of(r, "uri")?;
            Some(SearchHit { uri: uri.to_owned(), label: label_or(r, "label", uri) })
        })
        .take(limit)
        .collect()
}

/// Rows from the details query. Only the first row counts for label and comment, all rows are scanned for types.
/// Types are not deduplicated.
pub fn details(rows: &[Binding]) -> EntityDetails {
    let first = rows.first();
    let bound = |var: &str| first.and_then(|r| value_of(r, var)).filter(|v| !v.is_empty()).map(str::to_owned);
    let types = rows
        .iter()
        .filter_map(|r| {
            let uri = value_of(r, "type")?;
            Some(TypeRef { uri: uri.to_owned(), label: label_or(r, "typeLabel", uri) })
        })
        .collect();
    EntityDetails { label: bound("label"), comment: bound("comment"), types }
}

/// Rows from the outgoing query. Multiplicity is kept as returned, rows without ?p or ?o are skipped.
pub fn outgoing(rows: &[Binding], limit: usize) -> Vec<OutgoingRelation> {
    rows.iter()
        .filter_map(|r| {
            let (p, o) = (value_of(r, "p")?, value_of(r, "o")?);
            Some(OutgoingRelation { predicate: p.to_owned(), predicate_label: label_or(r, "pLabel", p), object: o.to_owned(), object_label: label_or(r, "oLabel", o) })
        })
        .take(limit)
        .collect()
}

/// Rows from the incoming query, see [outgoing].
pub fn incoming(rows: &[Binding], limit: usize) -> Vec<IncomingRelation> {
    rows.iter()
        .filter_map(|r| {
            let (s, p) = (value_of(r, "s")?, value_of(r, "p")?);
            Some(IncomingRelation { subject: s.to_owned(), subject_label: label_or(r, "sLabel", s), predicate: p.to_owned(), predicate_label: label_or(r, "pLabel", p) })
        })
        .take(limit)
        .collect()
}

/// Combines the three sub-results into the view of `uri`.
pub fn entity_view(uri: &str, details: EntityDetails, outgoing: Vec<OutgoingRelation>, incoming: Vec<IncomingRelation>) -> EntityView {
    EntityView {
        uri: uri.to_owned(),
        label: details.label.unwrap_or_else(|| uri.to_owned()),
        comment: details.comment.unwrap_or_default(),
        types: details.types,
        outgoing,
        incoming,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sparql::RdfTerm;

    /// Builds a row from (variable, value) pairs. Values starting with "http" become IRIs, everything else literals.
    pub(crate) fn row(pairs: &[(&str, &str)]) -> Binding {
        pairs
            .iter()
            .map(|(var, value)| {
                let kind = if value.starts_with("http") { "uri" } else { "literal" };
                (var.to_string(), RdfTerm { kind: kind.to_owned(), value: value.to_string(), lang: None, datatype: None })
            })
            .collect()
    }

    #[test]
    fn unbound_is_none() {
        let r = row(&[("s", "http://x/s")]);
        assert_eq!(value_of(&r, "s"), Some("http://x/s"));
        assert_eq!(value_of(&r, "label"), None);
    }

    #[test]
    fn projection() {
        let rows = project(&[row(&[("a", "1")]), row(&[("b", "2"), ("c", "3")])], &["a".to_owned(), "b".to_owned()]);
        assert_eq!(rows[0]["a"].as_deref(), Some("1"));
        assert_eq!(rows[0]["b"], None);
        assert_eq!(rows[1]["b"].as_deref(), Some("2"));
        assert!(!rows[1].contains_key("c"));
    }

    #[test]
    fn table_keeps_column_order() {
        let results = QueryResults { vars: vec!["z".into(), "a".into()], bindings: vec![row(&[("a", "1"), ("z", "2")]), row(&[("a", "3")])], boolean: None };
        let table = Table::from(&results);
        assert_eq!(table.vars, ["z", "a"]);
        assert_eq!(table.rows, vec![vec![Some("2".to_owned()), Some("1".to_owned())], vec![None, Some("3".to_owned())]]);
        let ask = Table::from(&QueryResults { boolean: Some(false), ..QueryResults::default() });
        assert_eq!(ask.rows, vec![vec![Some("false".to_owned())]]);
    }

    #[test]
    fn search_label_fallback() {
        let hits = search_hits(&[row(&[("uri", "http://x/a"), ("label", "A")]), row(&[("uri", "http://x/b")]), row(&[("label", "orphan")])], 10);
        assert_eq!(hits, vec![SearchHit { uri: "http://x/a".into(), label: "A".into() }, SearchHit { uri: "http://x/b".into(), label: "http://x/b".into() }]);
    }

    #[test]
    fn first_row_only_for_label_and_comment() {
        let rows = [
            row(&[("type", "http://x/Player"), ("typeLabel", "Player")]),
            row(&[("label", "Late label"), ("comment", "Late comment"), ("type", "http://x/Person")]),
        ];
        let d = details(&rows);
        assert_eq!(d.label, None);
        assert_eq!(d.comment, None);
        assert_eq!(d.types, vec![TypeRef { uri: "http://x/Player".into(), label: "Player".into() }, TypeRef { uri: "http://x/Person".into(), label: "http://x/Person".into() }]);
    }

    #[test]
    fn view_falls_back_to_uri() {
        let view = entity_view("http://x/e", details(&[row(&[("comment", "c")])]), vec![], vec![]);
        assert_eq!(view.label, "http://x/e");
        assert_eq!(view.comment, "c");
        let view = entity_view("http://x/e", details(&[]), vec![], vec![]);
        assert_eq!(view.label, "http://x/e");
        assert_eq!(view.comment, "");
        let view = entity_view("http://x/e", details(&[row(&[("label", "")])]), vec![], vec![]);
        assert_eq!(view.label, "http://x/e");
    }

    #[test]
    fn relations() {
        let out = outgoing(&[row(&[("p", "http://x/p"), ("o", "http://x/o"), ("oLabel", "O")]), row(&[("p", "http://x/p")])], 10);
        assert_eq!(out, vec![OutgoingRelation { predicate: "http://x/p".into(), predicate_label: "http://x/p".into(), object: "http://x/o".into(), object_label: "O".into() }]);
        let inc = incoming(&[row(&[("s", "http://x/s"), ("sLabel", "S"), ("p", "http://x/p"), ("pLabel", "plays for")])], 10);
        assert_eq!(inc[0].subject_label, "S");
        assert_eq!(inc[0].predicate_label, "plays for");
    }

    #[test]
    fn duplicates_kept_and_limit_enforced() {
        let dup = row(&[("p", "http://x/p"), ("o", "http://x/o"), ("oLabel", "O")]);
        assert_eq!(outgoing(&[dup.clone(), dup.clone()], 10).len(), 2);
        assert_eq!(outgoing(&vec![dup; 8], 5).len(), 5);
    }
}
