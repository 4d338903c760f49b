use std::time::Duration;

use pawmarket_core::AddressSuggestion;

use crate::ports::AddressSuggester;

/// Queries shorter than this are not worth a geocoder round-trip.
pub const MIN_QUERY_CHARS: usize = 3;

/// Address suggestions for a free-text query scoped to a region and comuna.
///
/// Never fails: short queries, service errors and timeouts all yield an
/// empty list, which the caller shows as "no suggestions".
pub async fn suggest_addresses<A: AddressSuggester>(
    service: &A,
    query: &str,
    region: Option<&str>,
    comuna: Option<&str>,
    deadline: Duration,
) -> Vec<AddressSuggestion> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }

    match tokio::time::timeout(deadline, service.suggest_addresses(query, region, comuna)).await {
        Ok(Ok(suggestions)) => suggestions,
        Ok(Err(err)) => {
            tracing::warn!(query, error = %err, "address suggestion lookup failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(query, "address suggestion lookup timed out");
            Vec::new()
        }
    }
}
