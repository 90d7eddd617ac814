//! Graphviz DOT description of the neighbourhood of a resource, see <https://graphviz.org/doc/info/lang.html>.
use crate::resource::{IncomingRelation, OutgoingRelation};
use std::fmt::Write;

/// Escapes text for a double quoted DOT ID.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace("\r\n", "\\n").replace(['\n', '\r'], "\\n")
}

/// Directed graph with the center node, one edge per relation and one node declaration per neighbour occurrence.
/// Node declarations are not deduplicated, later ones just repeat the attributes.
pub fn dot(center_uri: &str, center_label: &str, outgoing: &[OutgoingRelation], incoming: &[IncomingRelation]) -> String {
    let center = escape(center_uri);
    let mut s = String::from("digraph G {\n  rankdir=LR;\n  node [shape=ellipse, style=filled, color=\"#0f62fe22\", fontname=\"Arial\"];\n");
    // writing to a String cannot fail
    let _ = writeln!(s, "  \"{center}\" [label=\"{}\", fillcolor=\"#0f62fe55\", style=\"filled,bold\"];", escape(center_label));
    for r in outgoing {
        let object = escape(&r.object);
        let _ = writeln!(s, "  \"{center}\" -> \"{object}\" [label=\"{}\"];", escape(&r.predicate_label));
        let _ = writeln!(s, "  \"{object}\" [label=\"{}\"];", escape(&r.object_label));
    }
    for r in incoming {
        let subject = escape(&r.subject);
        let _ = writeln!(s, "  \"{subject}\" -> \"{center}\" [label=\"{}\"];", escape(&r.predicate_label));
        let _ = writeln!(s, "  \"{subject}\" [label=\"{}\"];", escape(&r.subject_label));
    }
    s.push('}');
    s
}
