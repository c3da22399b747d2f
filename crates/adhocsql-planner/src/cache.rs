use std::num::NonZeroUsize;
use std::sync::Arc;

use adhocsql_sql::ParsedToken;
use lru::LruCache;
use parking_lot::Mutex;

use crate::error::{PlannerError, PlannerResult};
use crate::statement::{AdHocPlannedStatement, CorePlan};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanCacheStats {
    pub sql_entries: usize,
    pub token_entries: usize,
    pub sql_hits: u64,
    pub sql_misses: u64,
    pub token_hits: u64,
    pub token_misses: u64,
}

struct Tiers {
    by_sql: LruCache<String, AdHocPlannedStatement>,
    by_token: LruCache<ParsedToken, Arc<CorePlan>>,
    stats: PlanCacheStats,
}

/// Two-tier plan cache for one catalog version.
///
/// `by_sql` maps exact statement text to a finished statement; `by_token`
/// maps a parsed token to the plan shared by every statement that differs
/// only in literal values. Each tier is LRU bounded on its own. Both sit
/// behind one lock, so an insert is seen in both tiers or in neither.
pub struct PlanCache {
    catalog_version: u64,
    tiers: Mutex<Tiers>,
}

impl PlanCache {
    pub fn new(catalog_version: u64, capacity: NonZeroUsize) -> Self {
        Self {
            catalog_version,
            tiers: Mutex::new(Tiers {
                by_sql: LruCache::new(capacity),
                by_token: LruCache::new(capacity),
                stats: PlanCacheStats::default(),
            }),
        }
    }

    pub fn catalog_version(&self) -> u64 {
        self.catalog_version
    }

    pub fn lookup_by_sql(&self, sql: &str) -> Option<AdHocPlannedStatement> {
        let mut tiers = self.tiers.lock();
        let found = tiers.by_sql.get(sql).cloned();
        match found {
            Some(_) => tiers.stats.sql_hits += 1,
            None => tiers.stats.sql_misses += 1,
        }
        found
    }

    pub fn lookup_by_token(&self, token: &ParsedToken) -> Option<Arc<CorePlan>> {
        let mut tiers = self.tiers.lock();
        let found = tiers.by_token.get(token).cloned();
        match found {
            Some(_) => tiers.stats.token_hits += 1,
            None => tiers.stats.token_misses += 1,
        }
        found
    }

    /// Stores `statement` under its text and its core plan under `token`.
    pub fn insert(
        &self,
        sql: &str,
        token: ParsedToken,
        statement: AdHocPlannedStatement,
    ) -> PlannerResult<()> {
        for actual in [statement.catalog_version, statement.core.catalog_version] {
            if actual != self.catalog_version {
                return Err(PlannerError::CatalogVersionMismatch {
                    expected: self.catalog_version,
                    actual,
                });
            }
        }

        let mut tiers = self.tiers.lock();
        tiers.by_token.put(token, Arc::clone(&statement.core));
        tiers.by_sql.put(sql.to_string(), statement);
        Ok(())
    }

    pub fn stats(&self) -> PlanCacheStats {
        let tiers = self.tiers.lock();
        PlanCacheStats {
            sql_entries: tiers.by_sql.len(),
            token_entries: tiers.by_token.len(),
            ..tiers.stats
        }
    }

    pub fn is_empty(&self) -> bool {
        let tiers = self.tiers.lock();
        tiers.by_sql.is_empty() && tiers.by_token.is_empty()
    }

    pub fn clear(&self) {
        let mut tiers = self.tiers.lock();
        tiers.by_sql.clear();
        tiers.by_token.clear();
    }
}

impl std::fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCache")
            .field("catalog_version", &self.catalog_version)
            .field("stats", &self.stats())
            .finish()
    }
}
