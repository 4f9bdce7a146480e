//! Repository Layer - Core Traits
//!
//! Repositories borrow a connection (or an open transaction) so that a
//! service can compose several of them inside one atomic unit.

use crate::domain::{DomainResult, Entity};

/// Lookup by primary key
///
/// Absence is `Ok(None)`; turning it into a domain error is the caller's job.
pub trait Repository<T: Entity> {
    fn find_by_id(&self, id: i64) -> DomainResult<Option<T>>;

    /// Resolve several ids, skipping the ones that do not exist
    fn find_many(&self, ids: &[i64]) -> DomainResult<Vec<T>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.find_by_id(*id)? {
                out.push(entity);
            }
        }
        Ok(out)
    }
}

/// Extension for repositories that support text search
pub trait SearchableRepository<T: Entity>: Repository<T> {
    /// Case-insensitive substring search
    fn search(&self, query: &str) -> DomainResult<Vec<T>>;
}

/// `%query%` with LIKE wildcards in the query escaped by `\`
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
