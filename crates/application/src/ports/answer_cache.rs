use httpdns_domain::{QueryType, ResolveResult};

/// Answer cache as seen by the resolve task. All values cross this boundary
/// as clones.
pub trait AnswerCache: Send + Sync {
    /// Live entry for `key` holding what `query_type` asks for (see the
    /// implementation for partial-entry rules).
    fn lookup(&self, key: &str, query_type: QueryType) -> Option<ResolveResult>;

    /// Advance the stored entry's address order by one.
    fn rotate(&self, key: &str);

    /// Insert or gap-fill merge.
    fn store(&self, entry: &ResolveResult);
}
