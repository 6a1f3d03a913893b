//! Client-side search over the fetched secret list

use crate::models::SecretSummary;

/// Secrets whose name contains `query`, case-insensitively, in list order
///
/// An empty query matches everything. Never triggers a backend call.
pub fn filter_secrets<'a>(secrets: &'a [SecretSummary], query: &str) -> Vec<&'a SecretSummary> {
    let needle = query.to_lowercase();
    secrets
        .iter()
        .filter(|secret| secret.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets(names: &[&str]) -> Vec<SecretSummary> {
        names.iter().map(|n| SecretSummary::new(*n, true)).collect()
    }

    #[test]
    fn test_case_insensitive_substring() {
        let list = secrets(&["Database-Password", "api-key", "db-user"]);
        let names: Vec<&str> = filter_secrets(&list, "DB")
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["db-user"]);

        let names: Vec<&str> = filter_secrets(&list, "pass")
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Database-Password"]);
    }

    #[test]
    fn test_empty_query_matches_all() {
        let list = secrets(&["a", "b"]);
        assert_eq!(filter_secrets(&list, "").len(), 2);
    }

    #[test]
    fn test_no_match() {
        let list = secrets(&["a", "b"]);
        assert!(filter_secrets(&list, "zzz").is_empty());
    }
}
