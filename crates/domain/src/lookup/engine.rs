//! Lookup driver: walks flattened rows per query line, applies the
//! containment oracle with negation and service-destination narrowing, and
//! produces two views: all matches, and matches with rows shadowed by an
//! earlier catch-all deny removed.

use std::collections::HashSet;

use crate::common::entity::TypeMode;
use crate::policy::entity::PolicyRow;
use crate::token::{ALL_V4, ALL_V6};

use super::classify::LookupLine;
use super::contains::value_matches;

#[derive(Debug, Clone, Copy, Default)]
pub struct LookupOptions {
    pub fqdn_geo_match_all: bool,
}

/// Matched rows as prefixed CSV lines.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LookupMatches {
    /// Every match, in row order per query line.
    pub all: Vec<String>,
    /// Matches with ineffectual rows suppressed.
    pub effective: Vec<String>,
}

/// Run every query line against the flattened rows.
pub fn run_lookup(
    rows: &[PolicyRow],
    lines: &[LookupLine],
    options: LookupOptions,
) -> LookupMatches {
    let mut result = LookupMatches::default();
    for line in lines {
        let tag = match (&line.src, &line.dst) {
            (Some(src), None) => format!("from_{}", src.display),
            (None, Some(dst)) => format!("to_{}", dst.display),
            (Some(src), Some(dst)) => format!("from_{}_to_{}", src.display, dst.display),
            (None, None) => continue,
        };
        let dst_only = line.src.is_none();

        // Scope keys that have seen a catch-all deny; later rows in the
        // same (DOM, POLTYPE, SINTF, DINTF) scope are ineffectual.
        let mut dead_scopes: HashSet<(String, TypeMode, String, String)> = HashSet::new();

        for row in rows {
            if !row_matches(row, line, options) {
                continue;
            }
            let key = (
                row.dom.clone(),
                row.poltype,
                row.sintf.clone(),
                row.dintf.clone(),
            );
            let text = format!("{tag},{}", row.to_csv());
            let shadowed = dead_scopes.contains(&key);
            result.all.push(text.clone());
            if !shadowed {
                result.effective.push(text);
            }
            if is_catchall_deny(row, dst_only) {
                dead_scopes.insert(key);
            }
        }
    }
    result
}

fn row_matches(row: &PolicyRow, line: &LookupLine, options: LookupOptions) -> bool {
    if let Some(src) = &line.src {
        let negate = row.saneg == "true";
        if !value_matches(&row.saddr, &src.addr, negate, options.fqdn_geo_match_all) {
            return false;
        }
    }
    if let Some(dst) = &line.dst {
        let negate = row.daneg == "true";
        if !value_matches(&row.daddr, &dst.addr, negate, options.fqdn_geo_match_all) {
            return false;
        }
        // A constrained service destination additionally narrows the
        // destination; this is an AND, not a replacement.
        if row.sdaddr != "0/0" && row.sdaddr != "-" {
            let negate = row.svneg == "true";
            if !value_matches(&row.sdaddr, &dst.addr, negate, options.fqdn_geo_match_all) {
                return false;
            }
        }
    }
    true
}

/// A domain/interface-scoped IP deny covering the whole address family.
/// For destination-only queries a family-wide destination is enough.
fn is_catchall_deny(row: &PolicyRow, dst_only: bool) -> bool {
    if row.action != "deny" || row.status != "enable" || row.prot != "ip" {
        return false;
    }
    if dst_only {
        match row.poltype {
            TypeMode::FourToFour | TypeMode::SixToFour => row.daddr == ALL_V4,
            TypeMode::SixToSix | TypeMode::FourToSix => row.daddr == ALL_V6,
            _ => false,
        }
    } else {
        match row.poltype {
            TypeMode::FourToFour => row.saddr == ALL_V4 && row.daddr == ALL_V4,
            TypeMode::SixToSix => row.saddr == ALL_V6 && row.daddr == ALL_V6,
            TypeMode::FourToSix => row.saddr == ALL_V4 && row.daddr == ALL_V6,
            TypeMode::SixToFour => row.saddr == ALL_V6 && row.daddr == ALL_V4,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::classify::parse_lookup_list;

    fn make_row(polline: usize, saddr: &str, daddr: &str, action: &str) -> PolicyRow {
        PolicyRow {
            dom: "D".to_string(),
            sintf: "any".to_string(),
            dintf: "any".to_string(),
            poltype: TypeMode::FourToFour,
            polid: polline.to_string(),
            polname: String::new(),
            polline,
            action: action.to_string(),
            prot: "ip".to_string(),
            saddr: saddr.to_string(),
            sport: "-/-".to_string(),
            daddr: daddr.to_string(),
            dport: "-/-".to_string(),
            sdaddr: "-".to_string(),
            itpcd: "-/-".to_string(),
            saneg: "false".to_string(),
            daneg: "false".to_string(),
            svneg: "false".to_string(),
            status: "enable".to_string(),
            log: "-".to_string(),
            schedule: "always".to_string(),
            comment: String::new(),
        }
    }

    #[test]
    fn source_query_matches_source_column() {
        let rows = vec![
            make_row(1, "10.0.0.0/8", "192.168.0.0/16", "accept"),
            make_row(2, "172.16.0.0/12", "192.168.0.0/16", "accept"),
        ];
        let lines = parse_lookup_list("10.1.2.3,\n");
        let result = run_lookup(&rows, &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 1);
        assert!(result.all[0].starts_with("from_10.1.2.3/32,"));
        assert!(result.all[0].contains(",10.0.0.0/8,"));
    }

    #[test]
    fn both_sides_must_match() {
        let rows = vec![make_row(1, "10.0.0.0/8", "192.168.0.0/16", "accept")];
        let lines = parse_lookup_list("10.1.2.3,192.168.5.5\n10.1.2.3,172.16.0.1\n");
        let result = run_lookup(&rows, &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 1);
        assert!(
            result.all[0].starts_with("from_10.1.2.3/32_to_192.168.5.5/32,")
        );
    }

    #[test]
    fn destination_query_prefix_tag() {
        let rows = vec![make_row(1, "10.0.0.0/8", "192.168.0.0/16", "accept")];
        let lines = parse_lookup_list(",192.168.5.5\n");
        let result = run_lookup(&rows, &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 1);
        assert!(result.all[0].starts_with("to_192.168.5.5/32,"));
    }

    #[test]
    fn negated_source_column_inverts() {
        let mut row = make_row(1, "10.0.0.0/8", "192.168.0.0/16", "accept");
        row.saneg = "true".to_string();
        let lines = parse_lookup_list("10.1.2.3,\n172.16.0.1,\n");
        let result = run_lookup(&[row], &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 1);
        assert!(result.all[0].starts_with("from_172.16.0.1/32,"));
    }

    #[test]
    fn service_destination_narrows_destination_matches() {
        let mut row = make_row(1, "10.0.0.0/8", "192.168.0.0/16", "accept");
        row.sdaddr = "192.168.5.0/24".to_string();
        let lines = parse_lookup_list(",192.168.5.5\n,192.168.6.6\n");
        let result = run_lookup(&[row], &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 1);
        assert!(result.all[0].starts_with("to_192.168.5.5/32,"));
    }

    #[test]
    fn unconstrained_service_destination_does_not_narrow() {
        let mut row = make_row(1, "10.0.0.0/8", "192.168.0.0/16", "accept");
        row.sdaddr = "0/0".to_string();
        let lines = parse_lookup_list(",192.168.6.6\n");
        let result = run_lookup(&[row], &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 1);
    }

    // ── ineffectual suppression ────────────────────────────────────

    #[test]
    fn catchall_deny_shadows_later_rows_in_scope() {
        let rows = vec![
            make_row(1, "10.0.0.0/8", ALL_V4, "accept"),
            make_row(2, ALL_V4, ALL_V4, "deny"),
            make_row(3, "10.0.0.0/8", ALL_V4, "accept"),
        ];
        let lines = parse_lookup_list("10.1.2.3,\n");
        let result = run_lookup(&rows, &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 3);
        // The deny row itself stays in both views; only what follows it
        // in the same scope is suppressed.
        assert_eq!(result.effective.len(), 2);
        assert!(result.effective[1].contains(",2,"));
        assert!(!result.effective.iter().any(|l| l.contains(",3,")));
    }

    #[test]
    fn suppression_is_scoped_to_the_interface_pair() {
        let mut other_intf = make_row(3, "10.0.0.0/8", ALL_V4, "accept");
        other_intf.sintf = "dmz".to_string();
        let rows = vec![
            make_row(2, ALL_V4, ALL_V4, "deny"),
            other_intf,
            make_row(4, "10.0.0.0/8", ALL_V4, "accept"),
        ];
        let lines = parse_lookup_list("10.1.2.3,\n");
        let result = run_lookup(&rows, &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 3);
        // The dmz row has a different (SINTF, DINTF) key and survives.
        assert_eq!(result.effective.len(), 2);
        assert!(result.effective.iter().any(|l| l.contains(",dmz,")));
        assert!(!result.effective.iter().any(|l| l.contains(",4,")));
    }

    #[test]
    fn disabled_or_non_ip_deny_does_not_trigger() {
        let mut disabled = make_row(1, ALL_V4, ALL_V4, "deny");
        disabled.status = "disable".to_string();
        let mut tcp_deny = make_row(2, ALL_V4, ALL_V4, "deny");
        tcp_deny.prot = "6".to_string();
        let rows = vec![
            disabled,
            tcp_deny,
            make_row(3, "10.0.0.0/8", ALL_V4, "accept"),
        ];
        let lines = parse_lookup_list("10.1.2.3,\n");
        let result = run_lookup(&rows, &lines, LookupOptions::default());
        // The disabled row still matches textually but nothing is shadowed.
        assert_eq!(result.all.len(), 3);
        assert_eq!(result.effective.len(), 3);
    }

    #[test]
    fn dst_only_query_triggers_on_destination_catchall() {
        let rows = vec![
            make_row(1, "10.0.0.0/8", ALL_V4, "deny"),
            make_row(2, "172.16.0.0/12", ALL_V4, "accept"),
        ];
        let lines = parse_lookup_list(",192.168.5.5\n");
        let result = run_lookup(&rows, &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 2);
        assert_eq!(result.effective.len(), 1);
    }

    #[test]
    fn full_query_does_not_trigger_on_destination_only_catchall() {
        let rows = vec![
            make_row(1, "10.0.0.0/8", ALL_V4, "deny"),
            make_row(2, "10.0.0.0/8", ALL_V4, "accept"),
        ];
        let lines = parse_lookup_list("10.1.2.3,192.168.5.5\n");
        let result = run_lookup(&rows, &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 2);
        assert_eq!(result.effective.len(), 2);
    }

    #[test]
    fn scopes_reset_between_query_lines() {
        let rows = vec![
            make_row(1, ALL_V4, ALL_V4, "deny"),
            make_row(2, "10.0.0.0/8", ALL_V4, "accept"),
        ];
        let lines = parse_lookup_list("10.1.2.3,\n10.2.3.4,\n");
        let result = run_lookup(&rows, &lines, LookupOptions::default());
        assert_eq!(result.all.len(), 4);
        // Each query line sees its own suppression pass.
        assert_eq!(result.effective.len(), 2);
    }
}
