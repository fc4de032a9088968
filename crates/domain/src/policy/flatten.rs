//! Policy flattening: rewrite normalized rows by substituting named
//! address columns with their leaf values and/or the named service column
//! with per-leaf protocol/port/type-code tokens.
//!
//! The two toggles are independent; row counts multiply. Unknown names
//! pass through unchanged so nothing is lost.

use crate::common::entity::TypeMode;
use crate::store::{Store, Vdom};

use super::entity::PolicyRow;

/// Flatten every policy row in the store, in domain → type-mode → row order.
pub fn flatten_store(
    store: &Store,
    flatten_addresses: bool,
    flatten_services: bool,
) -> Vec<PolicyRow> {
    let mut out = Vec::new();
    for (_, vd) in store.iter() {
        for mode in TypeMode::ALL {
            for row in vd.policies(mode) {
                flatten_row(vd, row, flatten_addresses, flatten_services, &mut out);
            }
        }
    }
    out
}

fn flatten_row(
    vd: &Vdom,
    row: &PolicyRow,
    flatten_addresses: bool,
    flatten_services: bool,
    out: &mut Vec<PolicyRow>,
) {
    let src_values = if flatten_addresses {
        address_values(vd, row.poltype, false, &row.saddr)
    } else {
        vec![row.saddr.clone()]
    };
    let dst_values = if flatten_addresses {
        address_values(vd, row.poltype, true, &row.daddr)
    } else {
        vec![row.daddr.clone()]
    };

    for saddr in &src_values {
        for daddr in &dst_values {
            let mut base = row.clone();
            base.saddr = saddr.clone();
            base.daddr = daddr.clone();
            if flatten_services {
                expand_service(vd, &base, out);
            } else {
                out.push(base);
            }
        }
    }
}

/// Resolve a named address column against the family tables selected by
/// the row's type-mode. Multicast destinations use the multicast tables.
fn address_values(vd: &Vdom, mode: TypeMode, dst: bool, name: &str) -> Vec<String> {
    let is_v6 = if dst { mode.dst_is_v6() } else { mode.src_is_v6() };
    let entry = if dst && mode.is_multicast() {
        let table = if is_v6 { &vd.mcast6 } else { &vd.mcast4 };
        table.get(name)
    } else if is_v6 {
        vd.addr6.get(name).or_else(|| vd.grp6.get(name))
    } else {
        vd.addr4.get(name).or_else(|| vd.grp4.get(name))
    };
    match entry {
        Some(entry) => entry.values.clone(),
        None => vec![name.to_string()],
    }
}

/// Replace the named service column by one row per stored service token.
fn expand_service(vd: &Vdom, base: &PolicyRow, out: &mut Vec<PolicyRow>) {
    let entry = vd
        .services
        .get(&base.prot)
        .or_else(|| vd.service_groups.get(&base.prot));
    match entry {
        Some(entry) => {
            for token in &entry.values {
                out.push(apply_service_token(base, token));
            }
        }
        None => out.push(base.clone()),
    }
}

/// Fill the protocol columns from one canonical service token.
fn apply_service_token(base: &PolicyRow, token: &str) -> PolicyRow {
    let (left, sda) = token.split_once(';').unwrap_or((token, ""));
    let sda = if sda.is_empty() { "-" } else { sda };
    let parts: Vec<&str> = left.split('/').collect();
    let mut row = base.clone();
    match parts.as_slice() {
        [number, icmp_type, icmp_code] if *number == "1" || *number == "58" => {
            row.prot = (*number).to_string();
            row.sport = "-/-".to_string();
            row.dport = "-/-".to_string();
            row.sdaddr = "-".to_string();
            row.itpcd = format!("{icmp_type}/{icmp_code}");
        }
        [number, src_kind, src_value, dst_kind, dst_value] => {
            row.prot = (*number).to_string();
            row.sport = format!("{src_kind}/{src_value}");
            row.dport = format!("{dst_kind}/{dst_value}");
            row.sdaddr = sda.to_string();
            row.itpcd = "-/-".to_string();
        }
        [number] if *number == "ip" || number.parse::<u32>().is_ok() => {
            row.prot = (*number).to_string();
            row.sport = "-/-".to_string();
            row.dport = "-/-".to_string();
            row.sdaddr = "-".to_string();
            row.itpcd = "-/-".to_string();
        }
        _ => {
            // Unsupported pass-through token: surfaces verbatim.
            row.prot = left.to_string();
            row.sport = left.to_string();
            row.dport = left.to_string();
            row.sdaddr = sda.to_string();
            row.itpcd = left.to_string();
        }
    }
    row
}
