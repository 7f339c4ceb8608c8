//! Saved companies, persisted as a JSON array of strings under one key.
//!
//! Entries are company urls. Older versions stored the numeric display id
//! instead; `migrate_legacy_keys` rewrites those once a dataset is loaded.
//!
//! The store owns an in-memory mirror of the set and writes the whole set
//! through to storage on every mutation. The mirror only changes after the
//! write succeeded.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::company::Company;
use crate::error::StorageError;
use crate::storage::KeyValueStorage;

pub const BOOKMARKS_KEY: &str = "savedJobs";
pub const NOTICE_KEY: &str = "savedJobsNoticeDismissed";

fn url_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://").unwrap())
}

/// Entries without an http(s) scheme predate the url-keyed format.
pub fn is_legacy_key(key: &str) -> bool {
    !url_scheme().is_match(key)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: usize,
    pub unmatched: Vec<String>,
}

pub struct BookmarkStore<S> {
    storage: S,
    saved: BTreeSet<String>,
}

impl<S: KeyValueStorage> BookmarkStore<S> {
    /// Read the persisted set. Unreadable or malformed data counts as empty.
    pub fn open(storage: S) -> Self {
        let saved = read_set(&storage);
        Self { storage, saved }
    }

    pub fn list(&self) -> &BTreeSet<String> {
        &self.saved
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.saved.contains(key)
    }

    /// Returns true when the key was not saved before.
    pub fn add(&mut self, key: &str) -> Result<bool, StorageError> {
        if self.saved.contains(key) {
            return Ok(false);
        }
        let mut next = self.saved.clone();
        next.insert(key.to_string());
        self.persist(next)?;
        Ok(true)
    }

    /// Returns true when the key was saved before.
    pub fn remove(&mut self, key: &str) -> Result<bool, StorageError> {
        if !self.saved.contains(key) {
            return Ok(false);
        }
        let mut next = self.saved.clone();
        next.remove(key);
        self.persist(next)?;
        Ok(true)
    }

    /// Flip the saved status; returns the new status.
    pub fn toggle(&mut self, key: &str) -> Result<bool, StorageError> {
        if self.contains(key) {
            self.remove(key)?;
            Ok(false)
        } else {
            self.add(key)?;
            Ok(true)
        }
    }

    pub fn needs_migration(&self) -> bool {
        self.saved.iter().any(|k| is_legacy_key(k))
    }

    /// Replace numeric-id entries with the matching company's url.
    ///
    /// Entries with no matching company stay as they are. Nothing is written
    /// when the set would not change, so repeated calls are no-ops.
    pub fn migrate_legacy_keys(
        &mut self,
        companies: &[Company],
    ) -> Result<MigrationReport, StorageError> {
        let mut report = MigrationReport::default();
        if !self.needs_migration() {
            return Ok(report);
        }

        let mut next = BTreeSet::new();
        for key in &self.saved {
            if !is_legacy_key(key) {
                next.insert(key.clone());
                continue;
            }
            let company = key
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(|id| companies.iter().find(|c| c.id == id));
            match company {
                Some(c) => {
                    next.insert(c.url.clone());
                    report.migrated += 1;
                }
                None => {
                    next.insert(key.clone());
                    report.unmatched.push(key.clone());
                }
            }
        }

        if next != self.saved {
            self.persist(next)?;
            info!(
                "Migrated {} legacy bookmarks ({} unmatched)",
                report.migrated,
                report.unmatched.len()
            );
        }
        Ok(report)
    }

    /// Loaded companies that are bookmarked, in dataset order.
    pub fn saved_companies<'a>(&self, companies: &'a [Company]) -> Vec<&'a Company> {
        companies
            .iter()
            .filter(|c| self.saved.contains(&c.url))
            .collect()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&mut self, next: BTreeSet<String>) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&next)?;
        self.storage.set(BOOKMARKS_KEY, &encoded)?;
        self.saved = next;
        Ok(())
    }
}

fn read_set(storage: &impl KeyValueStorage) -> BTreeSet<String> {
    let raw = match storage.get(BOOKMARKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return BTreeSet::new(),
        Err(e) => {
            warn!("Bookmark storage unavailable, starting empty: {}", e);
            return BTreeSet::new();
        }
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(keys) => keys.into_iter().collect(),
        Err(e) => {
            warn!("Malformed bookmark data, starting empty: {}", e);
            BTreeSet::new()
        }
    }
}

/// The one-time notice about saved jobs, dismissed for good once closed.
pub struct NoticeFlag;

impl NoticeFlag {
    pub fn is_dismissed(storage: &impl KeyValueStorage) -> bool {
        match storage.get(NOTICE_KEY) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                warn!("Could not read notice flag: {}", e);
                false
            }
        }
    }

    pub fn dismiss(storage: &mut impl KeyValueStorage) -> Result<(), StorageError> {
        storage.set(NOTICE_KEY, "true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Sqlite(rusqlite::Error::InvalidQuery))
        }
    }

    fn company(id: u32, url: &str) -> Company {
        Company {
            name: format!("Company {}", id),
            url: url.into(),
            blog: None,
            id,
        }
    }

    fn stored(store: &BookmarkStore<MemoryStorage>) -> Vec<String> {
        let raw = store.storage().get(BOOKMARKS_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn add_contains_remove() {
        let mut store = BookmarkStore::open(MemoryStorage::new());
        assert!(store.add("https://a").unwrap());
        assert!(store.contains("https://a"));
        assert!(store.remove("https://a").unwrap());
        assert!(!store.contains("https://a"));
        assert_eq!(stored(&store), Vec::<String>::new());
    }

    #[test]
    fn add_is_idempotent() {
        let mut store = BookmarkStore::open(MemoryStorage::new());
        store.add("https://a").unwrap();
        let before = store.len();
        store.add("https://b").unwrap();
        assert!(!store.add("https://b").unwrap());
        assert_eq!(store.len(), before + 1);
        assert_eq!(store.storage().writes(), 2);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut store = BookmarkStore::open(MemoryStorage::new());
        assert!(!store.remove("https://a").unwrap());
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn toggle_flips() {
        let mut store = BookmarkStore::open(MemoryStorage::new());
        assert!(store.toggle("https://a").unwrap());
        assert!(store.contains("https://a"));
        assert!(!store.toggle("https://a").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn reads_existing_set() {
        let storage = MemoryStorage::with_entry(BOOKMARKS_KEY, r#"["https://a","https://b"]"#);
        let store = BookmarkStore::open(storage);
        assert_eq!(store.len(), 2);
        assert!(store.contains("https://b"));
    }

    #[test]
    fn malformed_data_reads_as_empty() {
        let storage = MemoryStorage::with_entry(BOOKMARKS_KEY, "{oops");
        let mut store = BookmarkStore::open(storage);
        assert!(store.is_empty());
        store.add("https://a").unwrap();
        assert_eq!(stored(&store), vec!["https://a".to_string()]);
    }

    #[test]
    fn unavailable_storage_reads_as_empty_and_write_errors_propagate() {
        let mut store = BookmarkStore::open(BrokenStorage);
        assert!(store.is_empty());
        assert!(store.add("https://a").is_err());
        assert!(!store.contains("https://a"));
        assert!(!NoticeFlag::is_dismissed(store.storage()));
    }

    #[test]
    fn migrates_legacy_ids() {
        let storage = MemoryStorage::with_entry(BOOKMARKS_KEY, r#"["1","2"]"#);
        let mut store = BookmarkStore::open(storage);
        let companies = vec![company(1, "https://a"), company(2, "https://b")];

        let report = store.migrate_legacy_keys(&companies).unwrap();
        assert_eq!(report.migrated, 2);
        assert!(report.unmatched.is_empty());
        assert_eq!(stored(&store), vec!["https://a".to_string(), "https://b".to_string()]);
        assert_eq!(store.storage().writes(), 1);

        let again = store.migrate_legacy_keys(&companies).unwrap();
        assert_eq!(again, MigrationReport::default());
        assert_eq!(store.storage().writes(), 1);
    }

    #[test]
    fn unmatched_legacy_id_is_kept() {
        let storage = MemoryStorage::with_entry(BOOKMARKS_KEY, r#"["1","99","https://c"]"#);
        let mut store = BookmarkStore::open(storage);
        let companies = vec![company(1, "https://a")];

        let report = store.migrate_legacy_keys(&companies).unwrap();
        assert_eq!(report.migrated, 1);
        assert_eq!(report.unmatched, vec!["99".to_string()]);
        assert!(store.contains("99"));
        assert!(store.contains("https://a"));
        assert!(store.contains("https://c"));
        assert!(!store.contains("1"));

        // only unmatched leftovers: nothing to rewrite
        let writes = store.storage().writes();
        store.migrate_legacy_keys(&companies).unwrap();
        assert_eq!(store.storage().writes(), writes);
    }

    #[test]
    fn migration_follows_accent_aware_ids() {
        let named = |name: &str, url: &str| Company {
            name: name.into(),
            url: url.into(),
            blog: None,
            id: 0,
        };
        let companies = crate::loader::prepare(vec![
            named("Zeta", "https://z"),
            named("\u{c9}clair", "https://e"),
            named("Apple", "https://a"),
        ]);

        let storage = MemoryStorage::with_entry(BOOKMARKS_KEY, r#"["2"]"#);
        let mut store = BookmarkStore::open(storage);
        store.migrate_legacy_keys(&companies).unwrap();
        assert_eq!(stored(&store), vec!["https://e".to_string()]);
    }

    #[test]
    fn migration_merges_duplicates() {
        let storage = MemoryStorage::with_entry(BOOKMARKS_KEY, r#"["1","https://a"]"#);
        let mut store = BookmarkStore::open(storage);
        store.migrate_legacy_keys(&[company(1, "https://a")]).unwrap();
        assert_eq!(stored(&store), vec!["https://a".to_string()]);
    }

    #[test]
    fn saved_companies_in_dataset_order() {
        let mut store = BookmarkStore::open(MemoryStorage::new());
        let companies = vec![company(1, "https://a"), company(2, "https://b"), company(3, "https://c")];
        store.add("https://c").unwrap();
        store.add("https://a").unwrap();
        let ids: Vec<u32> = store.saved_companies(&companies).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn legacy_detection() {
        assert!(is_legacy_key("12"));
        assert!(is_legacy_key("acme.example/jobs"));
        assert!(!is_legacy_key("https://acme.example/jobs"));
        assert!(!is_legacy_key("http://acme.example"));
    }

    #[test]
    fn notice_flag() {
        let mut storage = MemoryStorage::new();
        assert!(!NoticeFlag::is_dismissed(&storage));
        NoticeFlag::dismiss(&mut storage).unwrap();
        assert!(NoticeFlag::is_dismissed(&storage));
        assert_eq!(storage.get(NOTICE_KEY).unwrap().as_deref(), Some("true"));
    }
}
