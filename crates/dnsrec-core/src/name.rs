//! Zone and record name helpers
//!
//! Provider APIs speak fully-qualified names (`_acme-challenge.example.com.`),
//! callers speak names relative to the zone (`_acme-challenge`, `@` for the
//! apex). Comparison is ASCII case-insensitive and ignores the trailing dot.

/// Name used for the zone apex in relative form
pub const APEX: &str = "@";

/// Lower-case a name and strip its trailing dot
pub fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Fully-qualified form of a zone name, with the trailing dot
pub fn zone_fqdn(zone: &str) -> String {
    format!("{}.", normalize(zone))
}

/// Compare two names the way DNS does
pub fn names_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Expand a caller-supplied name into a fully-qualified name within `zone`
///
/// `""` and `"@"` mean the apex. A name ending with `.` is taken as already
/// absolute.
pub fn absolute_name(name: &str, zone: &str) -> String {
    let zone = zone_fqdn(zone);
    if name.is_empty() || name == APEX {
        return zone;
    }
    if name.ends_with('.') {
        return name.to_string();
    }
    format!("{}.{}", name, zone)
}

/// Convert a fully-qualified name into a name relative to `zone`
///
/// Names outside the zone are returned in their absolute form.
pub fn relative_name(fqdn: &str, zone: &str) -> String {
    let name = fqdn.trim_end_matches('.');
    let zone = zone.trim_end_matches('.');

    if name.eq_ignore_ascii_case(zone) {
        return APEX.to_string();
    }

    let suffix_len = zone.len() + 1;
    if name.len() > suffix_len {
        let split = name.len() - suffix_len;
        if name.is_char_boundary(split) {
            let (head, tail) = name.split_at(split);
            if tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(zone) {
                return head.to_string();
            }
        }
    }

    format!("{}.", name)
}
