use dns_wire::ResourceRecord;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CacheError {
    /// The 1-based index does not point at a cache entry.
    #[error("no cache entry at index {0}")]
    InvalidIndex(usize),
}

/// A terminal resolution outcome, as remembered for a domain name.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheEntry {
    /// The records the name resolved to.
    Records(Vec<ResourceRecord>),

    /// The name authoritatively does not exist.
    NonExistent,
}

impl CacheEntry {
    /// The one-line form shown by the shell's `.list`.
    pub fn summary(&self) -> String {
        match self {
            CacheEntry::Records(records) => format!("{} result(s)", records.len()),
            CacheEntry::NonExistent => "Domain does not exist".to_string(),
        }
    }
}

/// Resolved names in insertion order. Keys are the exact strings handed
/// to resolution - `Example.com` and `example.com` are separate entries.
/// Entries live until removed; record TTLs are not honored.
#[derive(Debug, Default)]
pub struct ResolveCache {
    entries: Vec<(String, CacheEntry)>,
}

impl ResolveCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&CacheEntry> {
        self.entries
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, entry)| entry)
    }

    /// Stores `entry` under `name`. An already-cached name is overwritten
    /// in place so listing positions stay stable.
    pub fn store(&mut self, name: &str, entry: CacheEntry) {
        match self.entries.iter_mut().find(|(key, _)| key.as_str() == name) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((name.to_string(), entry)),
        }
    }

    /// Entries in insertion order with their 1-based indices.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str, &CacheEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, (name, entry))| (i + 1, name.as_str(), entry))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Removes the entry at a 1-based position. Out-of-range indices
    /// fail and leave the cache unchanged.
    pub fn remove(&mut self, index: usize) -> Result<(), CacheError> {
        if index == 0 || index > self.entries.len() {
            return Err(CacheError::InvalidIndex(index));
        }
        self.entries.remove(index - 1);
        Ok(())
    }
}
