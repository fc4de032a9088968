//! Policy normalization: one accumulated policy record expands into one
//! `PolicyRow` per element of the Cartesian product of its interface,
//! address, and service lists (interfaces × addresses only for multicast,
//! whose protocol column is a scalar).

use crate::common::entity::{CLASS_ICMP, CLASS_TCP_UDP_SCTP, CLASS_UNSUPPORTED, TypeMode};
use crate::store::ObjectTable;
use crate::token::split_quoted_list;

use super::entity::PolicyRow;

/// Raw field values accumulated from one `edit … next` block.
#[derive(Debug, Default)]
pub struct PolicyRecord {
    pub id: String,
    pub name: String,
    pub srcintf: String,
    pub dstintf: String,
    pub srcaddr: String,
    pub dstaddr: String,
    pub service: String,
    pub action: String,
    pub status: String,
    pub schedule: String,
    pub comments: String,
    pub srcaddr_negate: String,
    pub dstaddr_negate: String,
    pub service_negate: String,
    /// Multicast only: scalar protocol number and port bounds.
    pub protocol: String,
    pub start_port: String,
    pub end_port: String,
}

/// Expand one policy into its normalized rows.
///
/// `line` is the 1-based order number of the policy within its type-mode
/// list; `services`/`service_groups` resolve the protocol-class mask for
/// the per-service column fill.
pub fn expand_policy(
    record: &PolicyRecord,
    mode: TypeMode,
    vdom: &str,
    line: usize,
    services: &ObjectTable,
    service_groups: &ObjectTable,
) -> Vec<PolicyRow> {
    let multicast = mode.is_multicast();

    let action = if record.action.is_empty() {
        if multicast { "accept" } else { "deny" }
    } else {
        record.action.as_str()
    };
    let status = if record.status.is_empty() {
        "enable"
    } else {
        record.status.as_str()
    };
    let (name, saneg, daneg, svneg) = match mode {
        TypeMode::FourToFour | TypeMode::SixToSix => (
            record.name.clone(),
            negate_flag(&record.srcaddr_negate),
            negate_flag(&record.dstaddr_negate),
            negate_flag(&record.service_negate),
        ),
        _ => (
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
        ),
    };

    let srcintfs = split_quoted_list(&record.srcintf);
    let dstintfs = split_quoted_list(&record.dstintf);
    let srcaddrs = split_quoted_list(&record.srcaddr);
    let dstaddrs = split_quoted_list(&record.dstaddr);
    let service_names = if multicast {
        vec![String::new()]
    } else {
        split_quoted_list(&record.service)
    };

    let mut rows = Vec::new();
    for sintf in &srcintfs {
        for dintf in &dstintfs {
            for saddr in &srcaddrs {
                for daddr in &dstaddrs {
                    for service in &service_names {
                        let columns = if multicast {
                            multicast_columns(record)
                        } else {
                            service_columns(service, services, service_groups)
                        };
                        rows.push(PolicyRow {
                            dom: vdom.to_string(),
                            sintf: sintf.clone(),
                            dintf: dintf.clone(),
                            poltype: mode,
                            polid: record.id.clone(),
                            polname: name.clone(),
                            polline: line,
                            action: action.to_string(),
                            prot: columns.prot,
                            saddr: saddr.clone(),
                            sport: columns.sport,
                            daddr: daddr.clone(),
                            dport: columns.dport,
                            sdaddr: columns.sdaddr,
                            itpcd: columns.itpcd,
                            saneg: saneg.clone(),
                            daneg: daneg.clone(),
                            svneg: svneg.clone(),
                            status: status.to_string(),
                            log: "-".to_string(),
                            schedule: record.schedule.clone(),
                            comment: record.comments.clone(),
                        });
                    }
                }
            }
        }
    }
    rows
}

fn negate_flag(value: &str) -> String {
    let flag = if value == "enable" { "true" } else { "false" };
    flag.to_string()
}

struct ServiceColumns {
    prot: String,
    sport: String,
    dport: String,
    sdaddr: String,
    itpcd: String,
}

/// Column fill for a named service. The protocol-class mask decides whether
/// the service name lands in the port columns, the type/code column, or
/// both; an unknown service passes through verbatim everywhere.
fn service_columns(
    name: &str,
    services: &ObjectTable,
    service_groups: &ObjectTable,
) -> ServiceColumns {
    let entry = services.get(name).or_else(|| service_groups.get(name));
    let Some(entry) = entry else {
        return ServiceColumns {
            prot: name.to_string(),
            sport: name.to_string(),
            dport: name.to_string(),
            sdaddr: name.to_string(),
            itpcd: name.to_string(),
        };
    };
    let itpcd = if entry.class & (CLASS_ICMP | CLASS_UNSUPPORTED) != 0 {
        name.to_string()
    } else {
        "-/-".to_string()
    };
    let (sport, dport, sdaddr) = if entry.class & (CLASS_TCP_UDP_SCTP | CLASS_UNSUPPORTED) != 0 {
        (name.to_string(), name.to_string(), name.to_string())
    } else {
        ("-/-".to_string(), "-/-".to_string(), "-".to_string())
    };
    ServiceColumns {
        prot: name.to_string(),
        sport,
        dport,
        sdaddr,
        itpcd,
    }
}

/// Multicast policies carry a literal protocol number instead of a service
/// list; interpret it directly.
fn multicast_columns(record: &PolicyRecord) -> ServiceColumns {
    let protocol = record.protocol.trim();
    match protocol {
        "" | "0" => ServiceColumns {
            prot: "ip".to_string(),
            sport: "-/-".to_string(),
            dport: "-/-".to_string(),
            sdaddr: "-".to_string(),
            itpcd: "-/-".to_string(),
        },
        "1" | "58" => ServiceColumns {
            prot: protocol.to_string(),
            sport: "-/-".to_string(),
            dport: "-/-".to_string(),
            sdaddr: "-".to_string(),
            itpcd: "any/any".to_string(),
        },
        "6" | "17" | "132" => {
            let dport = if record.start_port.is_empty() {
                "eq/any".to_string()
            } else if record.end_port.is_empty() {
                format!("eq/{}", record.start_port)
            } else {
                format!("range/{}-{}", record.start_port, record.end_port)
            };
            ServiceColumns {
                prot: protocol.to_string(),
                sport: "eq/any".to_string(),
                dport,
                sdaddr: "0/0".to_string(),
                itpcd: "-/-".to_string(),
            }
        }
        other if other.parse::<u32>().is_ok() => ServiceColumns {
            prot: other.to_string(),
            sport: "-/-".to_string(),
            dport: "-/-".to_string(),
            sdaddr: "-".to_string(),
            itpcd: "-/-".to_string(),
        },
        other => ServiceColumns {
            prot: other.to_string(),
            sport: other.to_string(),
            dport: other.to_string(),
            sdaddr: "-".to_string(),
            itpcd: other.to_string(),
        },
    }
}
