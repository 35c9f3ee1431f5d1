//! Operation-type filter carried in a URL query string

use once_cell::sync::Lazy;
use regex::Regex;

/// Query-string key holding the operation type filter.
pub const FILTER_PARAM: &str = "opTypeFilter";

static FILTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"opTypeFilter=([a-z_]*)").expect("valid filter regex"));

/// Extract the type filter from a query string such as
/// `?account=G...&opTypeFilter=manage_data`.
///
/// Only lowercase ASCII letters and underscores are taken; anything after
/// them ends the value. An empty value is no filter.
pub fn type_filter_from_query(query: &str) -> Option<String> {
    FILTER_RE
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Query string selecting `op_type`; an empty type clears the filter.
pub fn filter_for(op_type: &str) -> String {
    if op_type.is_empty() {
        String::new()
    } else {
        format!("?{}={}", FILTER_PARAM, op_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_filter() {
        assert_eq!(
            type_filter_from_query("?opTypeFilter=payment"),
            Some("payment".to_string())
        );
        assert_eq!(
            type_filter_from_query("account=GABC&opTypeFilter=manage_data&limit=5"),
            Some("manage_data".to_string())
        );
    }

    #[test]
    fn test_value_stops_at_disallowed_chars() {
        assert_eq!(
            type_filter_from_query("opTypeFilter=Payment"),
            None
        );
        assert_eq!(
            type_filter_from_query("opTypeFilter=set_options2"),
            Some("set_options".to_string())
        );
    }

    #[test]
    fn test_absent_or_empty() {
        assert_eq!(type_filter_from_query(""), None);
        assert_eq!(type_filter_from_query("?limit=10"), None);
        assert_eq!(type_filter_from_query("?opTypeFilter=&limit=10"), None);
    }

    #[test]
    fn test_filter_for() {
        assert_eq!(filter_for("payment"), "?opTypeFilter=payment");
        assert_eq!(filter_for(""), "");
        assert_eq!(
            type_filter_from_query(&filter_for("change_trust")),
            Some("change_trust".to_string())
        );
    }
}
