use httpdns_domain::ResolveResult;

/// Collapse answers that share a host.
///
/// Results are sorted by host (stable, so arrival order decides which
/// duplicate comes first). The first duplicate is kept; later ones only fill
/// its empty address families and raise its TTLs.
pub fn merge_results(mut results: Vec<ResolveResult>) -> Vec<ResolveResult> {
    results.sort_by(|a, b| a.host.cmp(&b.host));

    let mut merged: Vec<ResolveResult> = Vec::with_capacity(results.len());
    for result in results {
        match merged.last_mut() {
            Some(last) if last.host == result.host => last.absorb_duplicate(&result),
            _ => merged.push(result),
        }
    }
    merged
}
