//! Execute SPARQL queries against a remote endpoint over HTTP and parse the JSON results.
//! See <https://www.w3.org/TR/sparql11-protocol/> and <https://www.w3.org/TR/sparql11-results-json/>.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Read};
use std::{collections::HashMap, time::Duration, time::Instant};

/// One RDF term of a result row, for example `{"type": "uri", "value": "http://example.com/x"}`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RdfTerm {
    /// "uri", "literal", "bnode" or "triple"
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

/// One result row. Variables left unbound by an OPTIONAL clause are simply absent.
pub type Binding = HashMap<String, RdfTerm>;

#[derive(Deserialize, Default)]
struct Head {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Deserialize)]
struct ResultRows {
    bindings: Vec<Binding>,
}

#[derive(Deserialize)]
struct ResultsDocument {
    #[serde(default)]
    head: Head,
    results: Option<ResultRows>,
    boolean: Option<bool>,
}

/// Parsed SPARQL results document. SELECT queries fill `vars` and `bindings`, ASK queries set `boolean`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResults {
    pub vars: Vec<String>,
    pub bindings: Vec<Binding>,
    pub boolean: Option<bool>,
}

impl QueryResults {
    /// Parses a SPARQL 1.1 JSON results document. `head.vars` is not checked against the bindings.
    pub fn from_json(body: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(body).map_err(|e| Error::MalformedResponse(e.to_string()))?)
    }

    /// Like [QueryResults::from_json] but streams the document without a size limit.
    /// Failing to read is a transport error, only unparseable content is malformed.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let doc = serde_json::from_reader(BufReader::new(reader))
            .map_err(|e| if e.is_io() { Error::Transport(e.to_string()) } else { Error::MalformedResponse(e.to_string()) })?;
        Self::from_document(doc)
    }

    fn from_document(doc: ResultsDocument) -> Result<Self> {
        match (doc.results, doc.boolean) {
            (Some(results), boolean) => Ok(QueryResults { vars: doc.head.vars, bindings: results.bindings, boolean }),
            (None, Some(boolean)) => Ok(QueryResults { vars: doc.head.vars, bindings: Vec::new(), boolean: Some(boolean) }),
            (None, None) => Err(Error::MalformedResponse("neither results.bindings nor boolean present".to_owned())),
        }
    }
}

/// How the query is put into the POST request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Query text as the request body, used by the explorer.
    RawQuery,
    /// URL-encoded `query` form field, used by the console.
    Form,
}

/// Anything that can answer a SELECT query with result rows.
/// Shared between the three concurrent sub-queries of an entity, hence `Sync`.
pub trait Transport: Sync {
    fn select(&self, query: &str) -> Result<Vec<Binding>>;
}

impl<F> Transport for F
where
    F: Fn(&str) -> Result<Vec<Binding>> + Sync,
{
    fn select(&self, query: &str) -> Result<Vec<Binding>> {
        self(query)
    }
}

/// Blocking HTTP client for a single SPARQL endpoint. One attempt per query, bounded by the timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        HttpTransport { endpoint: endpoint.to_owned(), agent }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POSTs the query and parses the response body as SPARQL JSON results.
    pub fn execute(&self, query: &str, mode: RequestMode) -> Result<QueryResults> {
        let start = Instant::now();
        let request = self.agent.post(&self.endpoint);
        let sent = match mode {
            RequestMode::RawQuery => request
                .set("Accept", "application/sparql-results+json")
                .set("Content-Type", "application/sparql-query; charset=utf-8")
                .send_string(query),
            RequestMode::Form => request
                .set("Accept", "application/json")
                .set("Content-Type", "application/x-www-form-urlencoded")
                .send_form(&[("query", query)]),
        };
        let response = match sent {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(Error::Endpoint { status, body });
            }
            Err(ureq::Error::Transport(t)) => return Err(Error::Transport(t.to_string())),
        };
        let status = response.status();
        if !(200..300).contains(&status) {
            let body = response.into_string().unwrap_or_default();
            return Err(Error::Endpoint { status, body });
        }
        // into_string() refuses bodies over 10 MB, large result sets are streamed instead
        let results = QueryResults::from_reader(response.into_reader())?;
        log::debug!("{} rows from {} in {:?}", results.bindings.len(), self.endpoint, start.elapsed());
        Ok(results)
    }
}

impl Transport for HttpTransport {
    fn select(&self, query: &str) -> Result<Vec<Binding>> {
        log::trace!("{query}");
        Ok(self.execute(query, RequestMode::RawQuery)?.bindings)
    }
}
