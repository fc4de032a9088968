//! CSV output assembly. All user-visible multi-line outputs are CRLF-joined.

use crate::common::entity::TypeMode;
use crate::policy::entity::PolicyRow;
use crate::store::{ObjectTable, Store};

pub const CRLF: &str = "\r\n";

/// One listing line per stored value: `<vdom>,<tag>,<name>,<value>,<comment>`.
fn listing_lines(out: &mut Vec<String>, vdom: &str, tag: &str, table: &ObjectTable) {
    for (name, set) in table.iter() {
        for value in &set.values {
            out.push(format!("{vdom},{tag},{name},{value},{}", set.comment));
        }
    }
}

/// Address-object listing across all domains.
pub fn address_listing(store: &Store) -> String {
    let mut lines = Vec::new();
    for (vdom, vd) in store.iter() {
        listing_lines(&mut lines, vdom, "address4", &vd.addr4);
        listing_lines(&mut lines, vdom, "multicastaddress4", &vd.mcast4);
        listing_lines(&mut lines, vdom, "addrgrp4", &vd.grp4);
        listing_lines(&mut lines, vdom, "address6", &vd.addr6);
        listing_lines(&mut lines, vdom, "multicastaddress6", &vd.mcast6);
        listing_lines(&mut lines, vdom, "addrgrp6", &vd.grp6);
    }
    lines.join(CRLF)
}

/// Service-object listing across all domains.
pub fn service_listing(store: &Store) -> String {
    let mut lines = Vec::new();
    for (vdom, vd) in store.iter() {
        listing_lines(&mut lines, vdom, "service_custom", &vd.services);
        listing_lines(&mut lines, vdom, "service_group", &vd.service_groups);
    }
    lines.join(CRLF)
}

/// Normalized policy rows across all domains, in domain → type-mode order.
pub fn policy_text(store: &Store) -> String {
    let mut lines = Vec::new();
    for (_, vd) in store.iter() {
        for mode in TypeMode::ALL {
            lines.extend(vd.policies(mode).iter().map(PolicyRow::to_csv));
        }
    }
    lines.join(CRLF)
}

/// Render an already-flattened row list.
pub fn rows_text(rows: &[PolicyRow]) -> String {
    rows.iter()
        .map(PolicyRow::to_csv)
        .collect::<Vec<_>>()
        .join(CRLF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse;

    const CFG: &str = "config firewall address\n\
        edit \"A\"\nset subnet 10.0.0.0 255.255.255.0\nset comment \"lan\"\nnext\nend\n\
        config firewall addrgrp\n\
        edit \"G\"\nset member \"A\"\nnext\nend\n\
        config firewall address6\n\
        edit \"A6\"\nset ip6 2001:db8::/32\nnext\nend\n\
        config firewall service custom\n\
        edit \"HTTP\"\nset tcp-portrange 80\nnext\nend\n\
        config firewall service group\n\
        edit \"WEB\"\nset member \"HTTP\"\nnext\nend\n";

    #[test]
    fn address_listing_tags_and_order() {
        let store = parse(CFG);
        let text = address_listing(&store);
        let lines: Vec<&str> = text.split(CRLF).collect();
        assert_eq!(
            lines,
            vec![
                ",address4,A,10.0.0.0/24,lan",
                ",addrgrp4,G,10.0.0.0/24,",
                ",address6,A6,2001:0db8:0000:0000:0000:0000:0000:0000/32,",
            ]
        );
    }

    #[test]
    fn service_listing_tags() {
        let store = parse(CFG);
        let text = service_listing(&store);
        let lines: Vec<&str> = text.split(CRLF).collect();
        assert_eq!(
            lines,
            vec![
                ",service_custom,HTTP,6/eq/any/eq/80;0/0,",
                ",service_group,WEB,6/eq/any/eq/80;0/0,",
            ]
        );
    }

    #[test]
    fn empty_store_gives_empty_listings() {
        let store = parse("");
        assert!(address_listing(&store).is_empty());
        assert!(service_listing(&store).is_empty());
        assert!(policy_text(&store).is_empty());
    }

    #[test]
    fn policy_text_uses_crlf() {
        let cfg = "config firewall policy\n\
            edit 1\nset srcintf \"p\"\nset dstintf \"q\"\nset srcaddr \"a\" \"b\"\n\
            set dstaddr \"c\"\nset service \"S\"\nnext\nend\n";
        let store = parse(cfg);
        let text = policy_text(&store);
        assert_eq!(text.matches(CRLF).count(), 1);
        assert_eq!(text.split(CRLF).count(), 2);
    }
}
