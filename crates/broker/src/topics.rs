//! Route to topic mapping.
//!
//! Routes are slash-separated (`errors/golang`, `external/sentry`); Kafka
//! topic names may not contain `/`, so separators become dots.

pub fn topic_for_route(prefix: &str, route: &str) -> String {
    let name = route.trim_matches('/').replace('/', ".");
    if prefix.is_empty() {
        name
    } else {
        format!("{}.{}", prefix.trim_end_matches('.'), name)
    }
}
