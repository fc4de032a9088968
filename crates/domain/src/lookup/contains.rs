//! The per-stored-value containment oracle.
//!
//! Decides whether a classified query lies inside one stored canonical
//! token, honoring the column's negate flag and the configurable
//! cross-type behavior for FQDN/geography values.

use regex::Regex;

use crate::ip::{v4, v6};
use crate::token::{self, ValueKind};

use super::classify::QueryAddr;

/// Evaluate one stored token against a query.
///
/// `negate` is the row column's negate flag: a negated column matches when
/// the address does NOT lie in the stored value. `fqdn_geo_match_all`
/// controls whether an FQDN/geo stored value non-trivially matches an IP
/// query (and vice versa, including cross-family IP comparisons).
pub fn value_matches(
    stored: &str,
    query: &QueryAddr,
    negate: bool,
    fqdn_geo_match_all: bool,
) -> bool {
    let kind = token::classify(stored);

    // Family-all fast path: `0.0.0.0/0` / `::/0` queries hit any stored
    // value of the matching family.
    if query.is_family_all() {
        let same_family = match query {
            QueryAddr::V4 { .. } => matches!(
                kind,
                ValueKind::CidrV4 | ValueKind::RangeV4 | ValueKind::WildcardV4
            ),
            QueryAddr::V6 { .. } => matches!(kind, ValueKind::CidrV6 | ValueKind::RangeV6),
            _ => false,
        };
        if same_family {
            return !negate;
        }
    }

    let hit = match query {
        QueryAddr::Geo(code) => match kind {
            ValueKind::Geo => stored.strip_prefix("geo:") == Some(code.as_str()),
            _ => fqdn_geo_match_all,
        },
        QueryAddr::Fqdn(name) => match kind {
            ValueKind::Fqdn => stored
                .strip_prefix("fqdn:")
                .is_some_and(|pattern| fqdn_glob_matches(pattern, name)),
            _ => fqdn_geo_match_all,
        },
        QueryAddr::V4 { addr, prefix } => match kind {
            ValueKind::CidrV4 => v4::prefix_in_cidr(*addr, *prefix, stored),
            ValueKind::RangeV4 => v4::prefix_in_range(*addr, *prefix, stored),
            ValueKind::WildcardV4 => v4::prefix_in_wildcard(*addr, *prefix, stored),
            ValueKind::Fqdn | ValueKind::Geo | ValueKind::CidrV6 | ValueKind::RangeV6 => {
                fqdn_geo_match_all
            }
            ValueKind::Undefined | ValueKind::PassThrough => false,
        },
        QueryAddr::V6 { addr, prefix } => match kind {
            ValueKind::CidrV6 => v6::prefix_in_cidr(addr, *prefix, stored),
            ValueKind::RangeV6 => v6::prefix_in_range(addr, *prefix, stored),
            ValueKind::Fqdn
            | ValueKind::Geo
            | ValueKind::CidrV4
            | ValueKind::RangeV4
            | ValueKind::WildcardV4 => fqdn_geo_match_all,
            ValueKind::Undefined | ValueKind::PassThrough => false,
        },
    };
    negate ^ hit
}

/// FQDN glob: `*` matches one label segment (a run without dots), the
/// pattern is anchored, and matching is case-insensitive.
pub fn fqdn_glob_matches(pattern: &str, name: &str) -> bool {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for (i, segment) in pattern.to_lowercase().split('*').enumerate() {
        if i > 0 {
            re.push_str("[^.]*");
        }
        re.push_str(&regex::escape(segment));
    }
    re.push('$');
    Regex::new(&re)
        .map(|re| re.is_match(&name.to_lowercase()))
        .unwrap_or(false)
}
