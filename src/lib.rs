//! Explore an RDF knowledge graph behind a SPARQL endpoint without writing SPARQL:
//! search resources by label, inspect their types and relations and get a DOT graph of their neighbourhood.
//! The binary wraps this in a small web application.
pub mod about;
pub mod config;
pub mod error;
pub mod explorer;
pub mod graph;
pub mod normalize;
pub mod page;
pub mod query;
pub mod resource;
pub mod sequence;
pub mod sparql;

pub use error::{Error, Result};
pub use explorer::Explorer;
pub use sparql::{HttpTransport, RequestMode, Transport};
