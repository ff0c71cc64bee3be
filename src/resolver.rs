//! Model name resolution against the daemon's live catalog.
//!
//! Daemon-reported names usually carry a version tag (`llama2:latest`), so a
//! bare request (`llama2`) must still match. Resolution is a three-clause
//! rule over the catalog in daemon order: exact match, requested name is a
//! substring of the entry, or the entry is a prefix of the requested name.
//! The first entry satisfying any clause wins.

/// Resolve a requested model name to a catalog entry.
///
/// Returns the first matching catalog entry in daemon order, or `None` if
/// nothing matches. An empty requested name never matches (it is a substring
/// of every entry and must not spuriously validate), and empty catalog
/// entries are skipped for the mirror-image reason.
pub fn resolve<'a>(requested: &str, catalog: &'a [String]) -> Option<&'a str> {
    if requested.is_empty() {
        return None;
    }
    catalog
        .iter()
        .map(String::as_str)
        .filter(|entry| !entry.is_empty())
        .find(|entry| {
            *entry == requested || entry.contains(requested) || requested.starts_with(entry)
        })
}

/// Whether the requested model is satisfiable against the catalog.
pub fn is_available(requested: &str, catalog: &[String]) -> bool {
    resolve(requested, catalog).is_some()
}

/// Intersection of configured and daemon-reported models, in configured order.
///
/// Membership here is exact: a supported-models list names full daemon names,
/// not shorthands.
pub fn probe_models(supported: &[String], available: &[String]) -> Vec<String> {
    supported
        .iter()
        .filter(|model| available.contains(model))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_catalog_never_matches() {
        assert!(!is_available("llama2", &[]));
        assert!(!is_available("", &[]));
    }

    #[test]
    fn test_exact_match() {
        let c = catalog(&["llama2:latest", "mistral:7b"]);
        assert_eq!(resolve("mistral:7b", &c), Some("mistral:7b"));
    }

    #[test]
    fn test_requested_substring_of_entry() {
        let c = catalog(&["llama2:latest"]);
        assert_eq!(resolve("llama2", &c), Some("llama2:latest"));
    }

    #[test]
    fn test_entry_prefix_of_requested() {
        let c = catalog(&["llama2"]);
        assert_eq!(resolve("llama2:latest", &c), Some("llama2"));
    }

    #[test]
    fn test_no_match() {
        let c = catalog(&["llama2:latest", "mistral:7b"]);
        assert_eq!(resolve("gemma", &c), None);
        assert!(!is_available("gemma", &c));
    }

    #[test]
    fn test_empty_requested_never_matches_nonempty_catalog() {
        let c = catalog(&["llama2:latest", "mistral:7b"]);
        assert_eq!(resolve("", &c), None);
        assert!(!is_available("", &c));
    }

    #[test]
    fn test_first_catalog_entry_wins() {
        let c = catalog(&["llama2:13b", "llama2:7b"]);
        assert_eq!(resolve("llama2", &c), Some("llama2:13b"));
    }

    #[test]
    fn test_empty_catalog_entry_is_skipped() {
        let c = catalog(&["", "llama2:latest"]);
        assert_eq!(resolve("mistral", &c), None);
        assert_eq!(resolve("llama2", &c), Some("llama2:latest"));
    }

    #[test]
    fn test_probe_models_intersection() {
        let supported = catalog(&["llama2", "codellama"]);
        let available = catalog(&["llama2", "mistral", "random-model"]);
        assert_eq!(probe_models(&supported, &available), vec!["llama2"]);
    }

    #[test]
    fn test_probe_models_is_exact() {
        let supported = catalog(&["llama2"]);
        let available = catalog(&["llama2:latest"]);
        assert!(probe_models(&supported, &available).is_empty());
    }
}
