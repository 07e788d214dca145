//! Hostname normalization and validation

/// Strip the scheme, a leading `www.` and anything after the first slash,
/// leaving the bare hostname
///
/// ```
/// # use dms::validate::strip_prefixes;
/// assert_eq!("example.com", strip_prefixes("https://www.example.com/path"));
/// ```
pub fn strip_prefixes(domain: &str) -> &str {
    let host = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.split('/').next().unwrap_or(host)
}

/// Whether `domain`, after prefix stripping, matches the registry's hostname
/// grammar: dot-separated labels of 1 to 63 alphanumeric or hyphen
/// characters, no leading or trailing hyphen, ending in an alphabetic
/// top-level label of at least two characters
///
/// ```
/// # use dms::validate::is_valid_domain;
/// assert!(is_valid_domain("example.com"));
/// assert!(!is_valid_domain("example123"));
/// ```
pub fn is_valid_domain(domain: &str) -> bool {
    let host = strip_prefixes(domain);
    let labels: Vec<&str> = host.split('.').collect();
    let (tld, labels) = match labels.split_last() {
        Some((tld, labels)) if !labels.is_empty() => (tld, labels),
        _ => return false,
    };
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
