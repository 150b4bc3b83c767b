//! Memoized resolution results for one run.
use std::collections::HashMap;

/// Resolution results keyed by decoded symbol, then by component.
///
/// The same symbol text can resolve differently per component because each
/// component registers its own tagfiles and using-namespaces, hence the
/// second level. `None` is stored for symbols known to be unresolved.
#[derive(Debug, Default)]
pub struct ResultCache {
    /// symbol -> component (`None` = global) -> link.
    entries: HashMap<String, HashMap<Option<String>, Option<String>>>,
    /// Lookups answered from the cache.
    hits: u64,
    /// Lookups that found nothing cached.
    misses: u64,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached (symbol, component) pairs.
    pub entries: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing cached.
    pub misses: u64,
}

impl ResultCache {
    /// Cached result for a symbol in a component.
    ///
    /// The outer `Option` is cache presence; the inner one is the link, with
    /// `None` meaning the symbol was already found to be unresolved.
    pub fn get(&mut self, symbol: &str, component: Option<&str>) -> Option<Option<String>> {
        let found = self
            .entries
            .get(symbol)
            .and_then(|by_component| return by_component.get(&component.map(str::to_string)))
            .cloned();
        if found.is_some() {
            self.hits = self.hits.saturating_add(1);
        } else {
            self.misses = self.misses.saturating_add(1);
        }
        return found;
    }

    /// Whether a result is cached for a symbol in a component.
    #[cfg(test)]
    pub fn has(&self, symbol: &str, component: Option<&str>) -> bool {
        return self
            .entries
            .get(symbol)
            .is_some_and(|by_component| return by_component.contains_key(&component.map(str::to_string)));
    }

    /// Record the result of resolving a symbol in a component.
    pub fn set(&mut self, symbol: &str, component: Option<&str>, link: Option<String>) {
        self.entries
            .entry(symbol.to_string())
            .or_default()
            .insert(component.map(str::to_string), link);
        return;
    }

    /// Hit, miss and size counters.
    pub fn stats(&self) -> CacheStats {
        return CacheStats {
            entries: self.entries.values().map(HashMap::len).sum(),
            hits: self.hits,
            misses: self.misses,
        };
    }
}
