use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use cot_ingestor::models::price::PriceBar;

use crate::prices::PriceData;

/// Source of "now" for expiry checks.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub const DEFAULT_TTL_HOURS: i64 = 23;

struct Entry {
    bars: Vec<PriceBar>,
    stored_at: DateTime<Utc>,
}

/// In-memory price bars keyed by market code, each entry valid for `ttl`.
pub struct PriceCache {
    ttl: Duration,
    clock: Clock,
    entries: RwLock<HashMap<String, Entry>>,
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_TTL_HOURS))
    }
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(Utc::now))
    }

    pub fn with_clock(ttl: Duration, clock: Clock) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn is_fresh(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now - entry.stored_at < self.ttl
    }

    /// Fresh bars for `code`.
    pub fn get(&self, code: &str) -> Option<Vec<PriceBar>> {
        let now = (self.clock)();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(code)
            .filter(|e| self.is_fresh(e, now))
            .map(|e| e.bars.clone())
    }

    /// Fresh entries for the given codes; missing or expired codes are left out.
    pub fn get_many<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> PriceData {
        let now = (self.clock)();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        codes
            .into_iter()
            .filter_map(|code| {
                let entry = entries.get(code).filter(|e| self.is_fresh(e, now))?;
                Some((code.to_string(), entry.bars.clone()))
            })
            .collect()
    }

    /// Current time on the cache's clock.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn put(&self, code: impl Into<String>, bars: Vec<PriceBar>) {
        self.put_at(code, bars, (self.clock)());
    }

    /// Stores bars fetched at `stored_at`, e.g. when restoring persisted prices.
    pub fn put_at(&self, code: impl Into<String>, bars: Vec<PriceBar>, stored_at: DateTime<Utc>) {
        let entry = Entry { bars, stored_at };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(code.into(), entry);
    }

    pub fn invalidate(&self, code: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(code);
    }

    pub fn invalidate_all(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 10,
        }
    }

    fn manual_clock() -> (Arc<Mutex<DateTime<Utc>>>, Clock) {
        let now = Arc::new(Mutex::new(Utc::now()));
        let handle = Arc::clone(&now);
        (now, Arc::new(move || *handle.lock().unwrap()))
    }

    #[test]
    fn entries_expire_after_ttl() {
        let (now, clock) = manual_clock();
        let cache = PriceCache::with_clock(Duration::hours(23), clock);
        cache.put("088691", vec![bar()]);
        assert_eq!(cache.get("088691").map(|b| b.len()), Some(1));

        *now.lock().unwrap() += Duration::hours(23);
        assert!(cache.get("088691").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn get_many_skips_missing_and_stale() {
        let (now, clock) = manual_clock();
        let cache = PriceCache::with_clock(Duration::hours(1), clock);
        cache.put("old", vec![bar()]);
        *now.lock().unwrap() += Duration::minutes(90);
        cache.put("new", vec![bar()]);

        let found = cache.get_many(["old", "new", "none"]);
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["new"]);
    }

    #[test]
    fn restored_entries_age_from_their_fetch_time() {
        let (now, clock) = manual_clock();
        let cache = PriceCache::with_clock(Duration::hours(23), clock);
        let start = cache.now();
        cache.put_at("recent", vec![bar()], start - Duration::hours(2));
        cache.put_at("old", vec![bar()], start - Duration::hours(30));
        assert!(cache.get("recent").is_some());
        assert!(cache.get("old").is_none());

        *now.lock().unwrap() += Duration::hours(21);
        assert!(cache.get("recent").is_none());
    }

    #[test]
    fn invalidation_removes_entries() {
        let cache = PriceCache::default();
        cache.put("a", vec![bar()]);
        cache.put("b", vec![bar()]);
        cache.invalidate("a");
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
