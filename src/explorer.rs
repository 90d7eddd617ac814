//! Browsing operations on a SPARQL endpoint: search by label and inspect a resource with its neighbours.
//! Every call is independent; the explorer keeps no state besides its transport.
use crate::error::Result;
use crate::normalize;
use crate::query;
use crate::resource::{EntityDetails, EntityView, IncomingRelation, OutgoingRelation, SearchHit};
use crate::sparql::Transport;
use std::thread;
use std::time::Instant;

pub struct Explorer<T> {
    transport: T,
}

impl<T: Transport> Explorer<T> {
    pub const fn new(transport: T) -> Self {
        Explorer { transport }
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Resources whose label in `lang` contains `term`. A blank term yields no hits without querying.
    pub fn search(&self, term: &str, lang: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.transport.select(&query::search(term, lang, limit)?)?;
        Ok(normalize::search_hits(&rows, limit))
    }

    pub fn details(&self, uri: &str, lang: &str, limit: usize) -> Result<EntityDetails> {
        let rows = self.transport.select(&query::details(uri, lang, limit)?)?;
        Ok(normalize::details(&rows))
    }

    pub fn outgoing(&self, uri: &str, lang: &str, limit: usize) -> Result<Vec<OutgoingRelation>> {
        let rows = self.transport.select(&query::outgoing(uri, lang, limit)?)?;
        Ok(normalize::outgoing(&rows, limit))
    }

    pub fn incoming(&self, uri: &str, lang: &str, limit: usize) -> Result<Vec<IncomingRelation>> {
        let rows = self.transport.select(&query::incoming(uri, lang, limit)?)?;
        Ok(normalize::incoming(&rows, limit))
    }

    /// Fetches details, outgoing and incoming relations concurrently and joins them.
    /// Fails as a whole if any of the three fails, a partial view is never returned.
    pub fn entity(&self, uri: &str, lang: &str, limit: usize) -> Result<EntityView> {
        // validate before spawning anything so that bad input never reaches the network
        query::details(uri, lang, limit)?;
        let start = Instant::now();
        let (details, outgoing, incoming) = thread::scope(|s| {
            let details = s.spawn(|| self.details(uri, lang, limit));
            let outgoing = s.spawn(|| self.outgoing(uri, lang, limit));
            let incoming = s.spawn(|| self.incoming(uri, lang, limit));
            (join(details), join(outgoing), join(incoming))
        });
        let view = normalize::entity_view(uri, details?, outgoing?, incoming?);
        log::debug!("{uri}: {} types, {} outgoing, {} incoming in {:?}", view.types.len(), view.outgoing.len(), view.incoming.len(), start.elapsed());
        Ok(view)
    }
}

/// Propagates a panic of a sub-query thread to the caller.
fn join<R>(handle: thread::ScopedJoinHandle<'_, R>) -> R {
    handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e))
}
