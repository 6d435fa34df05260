//! Cache usage statistics

use std::fmt;

/// Point-in-time counters for one cache kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Get cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits: {} | misses: {} | hit rate: {:.1}% | entries: {}",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.entries
        )
    }
}

/// Statistics across every cache kind
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheReport {
    pub documents: CacheStats,
    pub media: CacheStats,
    pub ai: CacheStats,
    pub embeddings: CacheStats,
}

impl fmt::Display for CacheReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache statistics:")?;
        writeln!(f, "  documents:  {}", self.documents)?;
        writeln!(f, "  media:      {}", self.media)?;
        writeln!(f, "  ai:         {}", self.ai)?;
        writeln!(f, "  embeddings: {}", self.embeddings)?;
        Ok(())
    }
}
