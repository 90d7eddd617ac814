//! HTML pages of the web interface, rendered with tinytemplate from the templates in data/.
use crate::config::ExampleQuery;
use crate::normalize::Table;
use crate::resource::{EntityView, SearchHit, TypeRef};
use multimap::MultiMap;
use serde::Serialize;
use tinytemplate::TinyTemplate;
use url::form_urlencoded;

static HEADER: &str = std::include_str!("../data/header.html");
static INDEX: &str = std::include_str!("../data/index.html");
static ENTITY: &str = std::include_str!("../data/entity.html");
static CONSOLE: &str = std::include_str!("../data/console.html");

/// Relative link to a route of this application with the given URI as `uri` query parameter.
fn href(route: &str, uri: &str) -> String {
    format!("{route}?{}", form_urlencoded::Serializer::new(String::new()).append_pair("uri", uri).finish())
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct Link {
    pub uri: String,
    pub label: String,
    pub href: String,
}

impl Link {
    fn new(uri: &str, label: &str) -> Self {
        Link { uri: uri.to_owned(), label: label.to_owned(), href: href("entity", uri) }
    }
}

impl From<&TypeRef> for Link {
    fn from(t: &TypeRef) -> Self {
        Link::new(&t.uri, &t.label)
    }
}

/// All neighbours connected through the same predicate.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct Group {
    pub predicate: Link,
    pub links: Vec<Link>,
}

/// Groups (predicate, predicate label, neighbour) by predicate, sorted by label. Neighbours keep their order.
fn group<'a>(relations: impl Iterator<Item = (&'a str, &'a str, Link)>) -> Vec<Group> {
    let mut map: MultiMap<(&str, &str), Link> = MultiMap::new();
    for (predicate, label, link) in relations {
        map.insert((predicate, label), link);
    }
    let mut groups: Vec<Group> = map.into_iter().map(|((p, label), links)| Group { predicate: Link::new(p, label), links }).collect();
    groups.sort_by(|a, b| (&a.predicate.label, &a.predicate.uri).cmp(&(&b.predicate.label, &b.predicate.uri)));
    groups
}

/// Shared by all pages, rendered by the "header" template.
#[derive(Serialize, Clone, Copy)]
pub struct Header<'a> {
    pub title: &'a str,
    pub css: &'a str,
}

#[derive(Serialize)]
pub struct SearchPage<'a> {
    pub header: Header<'a>,
    pub q: &'a str,
    pub searched: bool,
    pub hits: Vec<Link>,
}

impl<'a> SearchPage<'a> {
    pub fn new(header: Header<'a>, q: &'a str, hits: &[SearchHit]) -> Self {
        SearchPage { header, q, searched: !q.trim().is_empty(), hits: hits.iter().map(|h| Link::new(&h.uri, &h.label)).collect() }
    }
}

#[derive(Serialize)]
pub struct EntityPage<'a> {
    pub header: Header<'a>,
    pub uri: &'a str,
    pub label: &'a str,
    pub comment: &'a str,
    pub types: Vec<Link>,
    pub outgoing: Vec<Group>,
    pub incoming: Vec<Group>,
    pub dot: &'a str,
    pub graph_href: String,
}

impl<'a> EntityPage<'a> {
    pub fn new(header: Header<'a>, view: &'a EntityView, dot: &'a str) -> Self {
        EntityPage {
            header,
            uri: &view.uri,
            label: &view.label,
            comment: &view.comment,
            types: view.types.iter().map(Link::from).collect(),
            outgoing: group(view.outgoing.iter().map(|r| (r.predicate.as_str(), r.predicate_label.as_str(), Link::new(&r.object, &r.object_label)))),
            incoming: group(view.incoming.iter().map(|r| (r.predicate.as_str(), r.predicate_label.as_str(), Link::new(&r.subject, &r.subject_label)))),
            dot,
            graph_href: href("graph", &view.uri),
        }
    }
}

#[derive(Serialize)]
pub struct ConsolePage<'a> {
    pub header: Header<'a>,
    pub query: &'a str,
    pub examples: &'a [ExampleQuery],
    pub table: Option<Table>,
    pub error: Option<String>,
    pub elapsed: Option<String>,
}

fn template() -> Result<TinyTemplate<'static>, tinytemplate::error::Error> {
    let mut tt = TinyTemplate::new();
    tt.add_template("header", HEADER)?;
    tt.add_template("index", INDEX)?;
    tt.add_template("entity", ENTITY)?;
    tt.add_template("console", CONSOLE)?;
    Ok(tt)
}

/// Renders the template with the given name ("index", "entity" or "console").
pub fn render(name: &str, context: &impl Serialize) -> Result<String, tinytemplate::error::Error> {
    template()?.render(name, context)
}
