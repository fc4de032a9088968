//! Lookup-list parsing and query classification.
//!
//! Each non-blank, non-comment line is `SRC,DST[,comment]`. Either side may
//! be empty for a one-sided lookup; a malformed address silently skips the
//! whole line.

use std::sync::OnceLock;

use regex::Regex;

use crate::ip::{v4, v6};

/// A classified query address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAddr {
    V4 { addr: u32, prefix: u8 },
    V6 { addr: [u16; 8], prefix: u8 },
    Fqdn(String),
    Geo(String),
}

impl QueryAddr {
    /// The family-wide "all" fast path applies only to IP queries.
    pub fn is_family_all(&self) -> bool {
        match self {
            Self::V4 { addr: 0, prefix: 0 } => true,
            Self::V6 { addr, prefix: 0 } => *addr == [0u16; 8],
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub addr: QueryAddr,
    /// Canonical display form used in the synthetic result column;
    /// `fqdn:`/`geo:` prefixes are retained.
    pub display: String,
}

/// One lookup request: source, destination, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupLine {
    pub src: Option<Query>,
    pub dst: Option<Query>,
}

fn v4_query_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+(/\d+)?$").unwrap())
}

fn hostname_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9A-Za-z*.\-_]+$").unwrap())
}

/// Classify one address string. `None` means unusable: the caller drops the
/// containing line.
pub fn classify(raw: &str) -> Option<Query> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(code) = raw.strip_prefix("geo:") {
        return Some(Query {
            addr: QueryAddr::Geo(code.to_string()),
            display: raw.to_string(),
        });
    }
    if let Some(pattern) = raw.strip_prefix("fqdn:") {
        return Some(Query {
            addr: QueryAddr::Fqdn(pattern.to_string()),
            display: raw.to_string(),
        });
    }
    if v4_query_re().is_match(raw) {
        let (addr, prefix) = v4::parse_prefix(raw)?;
        return Some(Query {
            addr: QueryAddr::V4 { addr, prefix },
            display: format!("{}/{prefix}", v4::format(addr)),
        });
    }
    if raw.contains(':') {
        let (addr, prefix) = v6::parse_prefix(raw)?;
        return Some(Query {
            addr: QueryAddr::V6 { addr, prefix },
            display: format!("{}/{prefix}", v6::format(&addr)),
        });
    }
    if hostname_re().is_match(raw) {
        return Some(Query {
            addr: QueryAddr::Fqdn(raw.to_string()),
            display: format!("fqdn:{raw}"),
        });
    }
    None
}

/// Parse a lookup-list blob. Blank lines and `#`/`!` comments are ignored;
/// a third field is a comment.
pub fn parse_lookup_list(text: &str) -> Vec<LookupLine> {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let mut fields = line.splitn(3, ',');
        let src_raw = fields.next().unwrap_or("").trim();
        let dst_raw = fields.next().unwrap_or("").trim();
        if src_raw.is_empty() && dst_raw.is_empty() {
            continue;
        }
        let src = match src_raw {
            "" => None,
            raw => match classify(raw) {
                Some(q) => Some(q),
                None => continue,
            },
        };
        let dst = match dst_raw {
            "" => None,
            raw => match classify(raw) {
                Some(q) => Some(q),
                None => continue,
            },
        };
        out.push(LookupLine { src, dst });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_host_gets_slash_32() {
        let q = classify("192.168.0.1").unwrap();
        assert_eq!(
            q.addr,
            QueryAddr::V4 {
                addr: 0xC0A8_0001,
                prefix: 32
            }
        );
        assert_eq!(q.display, "192.168.0.1/32");
    }

    #[test]
    fn v4_prefix_kept() {
        let q = classify("10.0.0.0/8").unwrap();
        assert_eq!(
            q.addr,
            QueryAddr::V4 {
                addr: 0x0A00_0000,
                prefix: 8
            }
        );
    }

    #[test]
    fn v4_invalid_octet_or_prefix_is_rejected() {
        assert!(classify("10.0.0.256").is_none());
        assert!(classify("10.0.0.0/33").is_none());
    }

    #[test]
    fn v6_any_syntactic_form() {
        let q = classify("2001:db8::1").unwrap();
        assert_eq!(q.display, "2001:0db8:0000:0000:0000:0000:0000:0001/128");

        let q = classify("::/0").unwrap();
        assert!(q.addr.is_family_all());

        assert!(classify("2001::db8::1").is_none());
    }

    #[test]
    fn fqdn_explicit_and_bare_hostnames() {
        let q = classify("fqdn:*.example.com").unwrap();
        assert_eq!(q.addr, QueryAddr::Fqdn("*.example.com".to_string()));
        assert_eq!(q.display, "fqdn:*.example.com");

        let q = classify("www.example.com").unwrap();
        assert_eq!(q.addr, QueryAddr::Fqdn("www.example.com".to_string()));
        assert_eq!(q.display, "fqdn:www.example.com");

        // leading-dot queries stay classifiable
        let q = classify(".example.com").unwrap();
        assert_eq!(q.addr, QueryAddr::Fqdn(".example.com".to_string()));
    }

    #[test]
    fn geo_explicit_prefix_only() {
        let q = classify("geo:US").unwrap();
        assert_eq!(q.addr, QueryAddr::Geo("US".to_string()));
        assert_eq!(q.display, "geo:US");
    }

    #[test]
    fn garbage_is_unclassifiable() {
        assert!(classify("").is_none());
        assert!(classify("a b c").is_none());
        assert!(classify("%%%").is_none());
    }

    #[test]
    fn family_all_detection() {
        assert!(classify("0.0.0.0/0").unwrap().addr.is_family_all());
        assert!(!classify("0.0.0.0").unwrap().addr.is_family_all());
        assert!(!classify("10.0.0.0/8").unwrap().addr.is_family_all());
    }

    // ── list parsing ───────────────────────────────────────────────

    #[test]
    fn list_lines_src_dst_both() {
        let lines = parse_lookup_list(
            "# comment\n\
             ! also a comment\n\
             \n\
             10.0.0.1,\n\
             ,10.0.0.2\n\
             10.0.0.1,10.0.0.2,ticket 1234\n",
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[0].src.is_some() && lines[0].dst.is_none());
        assert!(lines[1].src.is_none() && lines[1].dst.is_some());
        assert!(lines[2].src.is_some() && lines[2].dst.is_some());
    }

    #[test]
    fn line_without_comma_is_source_only() {
        let lines = parse_lookup_list("10.0.0.1\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].src.is_some() && lines[0].dst.is_none());
    }

    #[test]
    fn malformed_address_skips_the_whole_line() {
        let lines = parse_lookup_list(
            "10.0.0.999,10.0.0.1\n\
             10.0.0.1,%%%\n\
             10.0.0.1,10.0.0.2\n",
        );
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn crlf_lines_accepted() {
        let lines = parse_lookup_list("10.0.0.1,10.0.0.2\r\n10.0.0.3,\r\n");
        assert_eq!(lines.len(), 2);
    }
}
