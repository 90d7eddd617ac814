//! Latest request wins: results of requests that were overtaken by a newer one are discarded on arrival.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Identifies one issued request of a [Sequencer].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Hands out monotonically increasing tickets and remembers the newest one.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

impl Sequencer {
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Registers a ticket numbered by the client. Returns `None` if a newer one was already seen.
    pub fn observe(&self, seq: u64) -> Option<Ticket> {
        let previous = self.latest.fetch_max(seq, Ordering::SeqCst);
        (seq >= previous).then_some(Ticket(seq))
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Passes the value through only if no newer ticket has been issued in the meantime.
    pub fn settle<T>(&self, ticket: Ticket, value: T) -> Option<T> {
        self.is_latest(ticket).then_some(value)
    }
}

/// One [Sequencer] per client id, for servers shared by many independent users.
#[derive(Debug)]
pub struct Sequencers {
    capacity: usize,
    by_client: Mutex<HashMap<String, Arc<Sequencer>>>,
}

impl Sequencers {
    /// When `capacity` clients are tracked, each new one replaces a client without a request in flight.
    /// Clients with requests in flight are never forgotten, so the map may exceed `capacity` while all of them are busy.
    pub fn new(capacity: usize) -> Self {
        Sequencers { capacity, by_client: Mutex::new(HashMap::new()) }
    }

    pub fn client(&self, id: &str) -> Arc<Sequencer> {
        let mut map = self.by_client.lock().unwrap_or_else(PoisonError::into_inner);
        if map.len() >= self.capacity && !map.contains_key(id) {
            // handles are only cloned under the lock, so a count of 1 stays idle until the removal
            let idle = map.iter().find(|(_, s)| Arc::strong_count(s) == 1).map(|(k, _)| k.clone());
            match idle {
                Some(k) => {
                    map.remove(&k);
                }
                None => log::debug!("all {} tracked clients have requests in flight", map.len()),
            }
        }
        Arc::clone(map.entry(id.to_owned()).or_default())
    }
}
