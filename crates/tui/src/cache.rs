//! Query results keyed by resource and period.
//!
//! Every fetch is issued a [`Ticket`] carrying a sequence number. Only the
//! latest ticket for a key may write into it, so a slow response for a
//! superseded request is dropped instead of overwriting newer data.
use std::collections::HashMap;

use api_types::{period::Period, summary::Summary, transaction::Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Summary,
    Transactions,
    Categories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: Resource,
    pub period: Option<Period>,
}

impl QueryKey {
    pub fn summary(period: Period) -> Self {
        Self {
            resource: Resource::Summary,
            period: Some(period),
        }
    }

    pub fn transactions(period: Period) -> Self {
        Self {
            resource: Resource::Transactions,
            period: Some(period),
        }
    }

    pub fn categories() -> Self {
        Self {
            resource: Resource::Categories,
            period: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Summary(Summary),
    Transactions(Vec<Transaction>),
    Categories(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    key: QueryKey,
    seq: u64,
}

impl Ticket {
    pub fn key(&self) -> QueryKey {
        self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
struct Entry {
    data: Option<QueryData>,
    error: Option<String>,
    stale: bool,
    pending: bool,
    latest: u64,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, Entry>,
    next_seq: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new fetch for `key`; any older in-flight ticket for the
    /// same key becomes obsolete.
    pub fn begin(&mut self, key: QueryKey) -> Ticket {
        self.next_seq += 1;
        let seq = self.next_seq;
        let entry = self.entries.entry(key).or_default();
        entry.latest = seq;
        entry.pending = true;
        entry.stale = false;
        Ticket { key, seq }
    }

    /// Applies a fetch result. Returns `false` when the ticket was
    /// superseded and the result was discarded.
    pub fn complete(&mut self, ticket: Ticket, result: Result<QueryData, String>) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            tracing::debug!(seq = ticket.seq, "dropping result for cleared key");
            return false;
        };
        if entry.latest != ticket.seq {
            tracing::debug!(
                seq = ticket.seq,
                latest = entry.latest,
                "dropping superseded result"
            );
            return false;
        }

        entry.pending = false;
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
            }
            Err(message) => entry.error = Some(message),
        }
        true
    }

    pub fn invalidate(&mut self, key: QueryKey) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.stale = true;
        }
    }

    /// Marks the period's summary and transaction list stale.
    pub fn invalidate_period(&mut self, period: Period) {
        self.invalidate(QueryKey::summary(period));
        self.invalidate(QueryKey::transactions(period));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn needs_fetch(&self, key: QueryKey) -> bool {
        match self.entries.get(&key) {
            None => true,
            Some(entry) => {
                entry.stale || (!entry.pending && entry.data.is_none() && entry.error.is_none())
            }
        }
    }

    pub fn is_stale(&self, key: QueryKey) -> bool {
        self.entries.get(&key).is_some_and(|e| e.stale)
    }

    pub fn is_pending(&self, key: QueryKey) -> bool {
        self.entries.get(&key).is_some_and(|e| e.pending)
    }

    /// True while nothing has been received yet for the key.
    pub fn is_loading(&self, key: QueryKey) -> bool {
        self.entries
            .get(&key)
            .is_none_or(|e| e.data.is_none() && e.error.is_none())
    }

    pub fn error(&self, key: QueryKey) -> Option<&str> {
        self.entries.get(&key).and_then(|e| e.error.as_deref())
    }

    fn data(&self, key: QueryKey) -> Option<&QueryData> {
        self.entries.get(&key).and_then(|e| e.data.as_ref())
    }

    pub fn summary(&self, period: Period) -> Option<&Summary> {
        match self.data(QueryKey::summary(period)) {
            Some(QueryData::Summary(summary)) => Some(summary),
            _ => None,
        }
    }

    pub fn transactions(&self, period: Period) -> Option<&[Transaction]> {
        match self.data(QueryKey::transactions(period)) {
            Some(QueryData::Transactions(items)) => Some(items),
            _ => None,
        }
    }

    pub fn categories(&self) -> Option<&[String]> {
        match self.data(QueryKey::categories()) {
            Some(QueryData::Categories(items)) => Some(items),
            _ => None,
        }
    }
}
