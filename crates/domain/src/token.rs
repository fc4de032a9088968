//! Canonical token forms exchanged between pipeline stages.
//!
//! The pipeline trades fully-normalized strings rather than typed values:
//! the final output is CSV and every downstream comparison is textual.
//! This module owns the token constants, the stored-value classifier used
//! by the flattener and the containment oracle, and the FortiGate quoting
//! helpers.

use crate::ip::{v4, v6};

/// Inert token emitted for anything unparseable.
pub const UNDEFINED: &str = "undefined";

/// The IPv4 family-wide "all" address.
pub const ALL_V4: &str = "0.0.0.0/0";

/// The IPv6 family-wide "all" address, in canonical expanded form.
pub const ALL_V6: &str = "0000:0000:0000:0000:0000:0000:0000:0000/0";

/// Shape of a stored canonical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    CidrV4,
    RangeV4,
    WildcardV4,
    CidrV6,
    RangeV6,
    Fqdn,
    Geo,
    Undefined,
    /// Anything else: unresolved names, unsupported service tokens.
    PassThrough,
}

/// Classify a stored token by shape, validating the address parts so that
/// object names containing `-`, `/`, or `.` do not masquerade as tokens.
pub fn classify(value: &str) -> ValueKind {
    if value.is_empty() || value == UNDEFINED {
        return ValueKind::Undefined;
    }
    if value.starts_with("fqdn:") {
        return ValueKind::Fqdn;
    }
    if value.starts_with("geo:") {
        return ValueKind::Geo;
    }
    if value.contains(':') {
        if let Some((start, end)) = value.split_once('-') {
            if v6::parse(start).is_some() && v6::parse(end).is_some() {
                return ValueKind::RangeV6;
            }
        } else if v6::parse_prefix(value).is_some() {
            return ValueKind::CidrV6;
        }
        return ValueKind::PassThrough;
    }
    if let Some((start, end)) = value.split_once('-') {
        if v4::parse(start).is_some() && v4::parse(end).is_some() {
            return ValueKind::RangeV4;
        }
        return ValueKind::PassThrough;
    }
    if let Some((addr, mask)) = value.split_once('/') {
        if v4::parse(addr).is_some() {
            if mask.contains('.') && v4::parse(mask).is_some() {
                return ValueKind::WildcardV4;
            }
            if mask.parse::<u8>().is_ok_and(|p| p <= 32) {
                return ValueKind::CidrV4;
            }
        }
        return ValueKind::PassThrough;
    }
    if v4::parse(value).is_some() {
        // Bare host, implied /32.
        return ValueKind::CidrV4;
    }
    ValueKind::PassThrough
}

// ── FortiGate quoting ───────────────────────────────────────────────

/// Strip at most one pair of matching `"` or `'` quotes.
pub fn dequote(s: &str) -> &str {
    let s = s.trim();
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Split a member-list value into names.
///
/// FortiGate dumps quote every member (`"OBJ ONE" "OBJ TWO"`), so after
/// stripping the outer quote pair the names are separated by the literal
/// `" "` sequence. This preserves embedded spaces inside names. An empty
/// value yields a single empty element so Cartesian products stay non-empty.
pub fn split_quoted_list(s: &str) -> Vec<String> {
    let inner = dequote(s);
    if inner.is_empty() {
        return vec![String::new()];
    }
    inner.split("\" \"").map(str::to_string).collect()
}
