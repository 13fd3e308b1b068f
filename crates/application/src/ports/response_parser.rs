use httpdns_domain::{ResolveAnswer, ScheduleAnswer};

/// Wire payload parser port.
///
/// Malformed or empty bodies yield empty answers, never errors.
pub trait ResponseParser: Send + Sync {
    fn parse_schedule(&self, body: &str) -> ScheduleAnswer;

    fn parse_single(&self, body: &str) -> Option<ResolveAnswer>;

    fn parse_multi(&self, body: &str) -> Vec<ResolveAnswer>;
}
