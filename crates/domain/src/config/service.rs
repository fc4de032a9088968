//! Service stanza handlers: `firewall service custom` and
//! `firewall service group`.
//!
//! Custom services normalize to `PROTO[/…];SDA` tokens: `ip;-`, `47;-`,
//! `1/type/code;-`, `58/type/code;-`, or one `PN/src-op/dst-op;SDA` token
//! per port-range element. Every value set carries a protocol-class mask
//! driving the policy expander's column fill.

use crate::common::entity::{CLASS_ICMP, CLASS_IP, CLASS_TCP_UDP_SCTP, CLASS_UNSUPPORTED};
use crate::ip::v4;
use crate::store::{Store, TokenSet};
use crate::token::{dequote, split_quoted_list};

use super::handler::StanzaHandler;

// ── firewall service custom ─────────────────────────────────────────

#[derive(Debug, Default)]
struct ServiceEdit {
    name: String,
    /// `None` = key never seen (defaults to TCP/UDP/SCTP); `Some("")` =
    /// explicitly unset.
    protocol: Option<String>,
    protocol_number: String,
    icmp_type: String,
    icmp_code: String,
    tcp_portrange: String,
    udp_portrange: String,
    sctp_portrange: String,
    iprange: String,
    fqdn: String,
    comment: String,
}

#[derive(Debug, Default)]
pub(super) struct ServiceHandler {
    current: Option<ServiceEdit>,
}

impl StanzaHandler for ServiceHandler {
    fn begin(&mut self, name: &str) {
        self.current = Some(ServiceEdit {
            name: name.to_string(),
            ..ServiceEdit::default()
        });
    }

    fn set(&mut self, key: &str, value: &str) {
        let Some(edit) = self.current.as_mut() else {
            return;
        };
        let value = dequote(value).to_string();
        match key {
            "protocol" => edit.protocol = Some(value),
            "protocol-number" => edit.protocol_number = value,
            "icmptype" => edit.icmp_type = value,
            "icmpcode" => edit.icmp_code = value,
            "tcp-portrange" => edit.tcp_portrange = value,
            "udp-portrange" => edit.udp_portrange = value,
            "sctp-portrange" => edit.sctp_portrange = value,
            "iprange" => edit.iprange = value,
            "fqdn" => edit.fqdn = value,
            "comment" => edit.comment = value,
            _ => {}
        }
    }

    fn finish(&mut self, store: &mut Store, vdom: &str) {
        let Some(edit) = self.current.take() else {
            return;
        };
        let mut set = TokenSet::new(edit.comment.clone());
        for token in normalize_service(&edit) {
            set.push_unique(token);
        }
        set.class = class_of_values(&set.values);
        store.vdom_mut(vdom).services.insert(edit.name, set);
    }
}

fn normalize_service(edit: &ServiceEdit) -> Vec<String> {
    let protocol = match &edit.protocol {
        None => "TCP/UDP/SCTP",
        Some(p) if p.is_empty() => return vec!["undefined;-".to_string()],
        Some(p) => p.as_str(),
    };
    match protocol {
        "IP" => {
            let number = edit.protocol_number.trim();
            if number.is_empty() || number == "0" {
                vec!["ip;-".to_string()]
            } else {
                vec![format!("{number};-")]
            }
        }
        "ICMP" => vec![icmp_token("1", &edit.icmp_type, &edit.icmp_code)],
        "ICMP6" => vec![icmp_token("58", &edit.icmp_type, &edit.icmp_code)],
        "TCP/UDP/SCTP" => {
            let sda = service_destination(edit);
            let mut out = Vec::new();
            for (number, ranges) in [
                ("6", &edit.tcp_portrange),
                ("17", &edit.udp_portrange),
                ("132", &edit.sctp_portrange),
            ] {
                if ranges.is_empty() {
                    continue;
                }
                let mut seen = Vec::new();
                for element in ranges.split_whitespace() {
                    if seen.iter().any(|s| *s == element) {
                        continue;
                    }
                    seen.push(element);
                    out.push(port_token(number, element, &sda));
                }
            }
            out
        }
        other => vec![format!("{other};{other}")],
    }
}

fn icmp_token(number: &str, icmp_type: &str, icmp_code: &str) -> String {
    let t = if icmp_type.is_empty() { "any" } else { icmp_type };
    let c = if icmp_code.is_empty() { "any" } else { icmp_code };
    format!("{number}/{t}/{c};-")
}

/// One port-range element `<dst>[:<src>]` → `PN/<src-op>/<dst-op>;SDA`.
fn port_token(number: &str, element: &str, sda: &str) -> String {
    let (dst, src) = match element.split_once(':') {
        Some((dst, src)) => (dst, Some(src)),
        None => (element, None),
    };
    let src_op = match src {
        Some(src) => port_op(src),
        None => "eq/any".to_string(),
    };
    format!("{number}/{src_op}/{};{sda}", port_op(dst))
}

/// `N` → `eq/N`; `N-M` → `range/N-M`; anything unparseable degrades but
/// never fails.
fn port_op(spec: &str) -> String {
    match spec.split_once('-') {
        Some((start, end)) => {
            if start.parse::<u32>().is_ok() && end.parse::<u32>().is_ok() {
                format!("range/{start}-{end}")
            } else {
                "range/undefined-undefined".to_string()
            }
        }
        None => {
            if spec.parse::<u32>().is_ok() {
                format!("eq/{spec}")
            } else {
                "eq/undefined".to_string()
            }
        }
    }
}

/// The SDA qualifier: `fqdn:<name>`, `<ip>/32`, `start-end`, or `0/0`.
fn service_destination(edit: &ServiceEdit) -> String {
    if !edit.fqdn.is_empty() {
        return format!("fqdn:{}", edit.fqdn);
    }
    let iprange = edit.iprange.trim();
    if iprange.is_empty() || iprange == "0.0.0.0" {
        return "0/0".to_string();
    }
    if let Some((start, end)) = iprange.split_once('-') {
        if let (Some(start), Some(end)) = (v4::parse(start), v4::parse(end)) {
            return format!("{}-{}", v4::format(start), v4::format(end));
        }
    } else if let Some(addr) = v4::parse(iprange) {
        return format!("{}/32", v4::format(addr));
    }
    iprange.to_string()
}

/// Scan each value's leading protocol token and OR the class bits.
pub(super) fn class_of_values(values: &[String]) -> u8 {
    let mut class = 0u8;
    for value in values {
        let end = value.find(['/', ';']).unwrap_or(value.len());
        class |= match &value[..end] {
            "1" | "58" => CLASS_ICMP,
            "6" | "17" | "132" => CLASS_TCP_UDP_SCTP,
            "ip" => CLASS_IP,
            lead if lead.parse::<u32>().is_ok() => CLASS_IP,
            _ => CLASS_UNSUPPORTED,
        };
    }
    class
}

// ── firewall service group ──────────────────────────────────────────

#[derive(Debug, Default)]
struct ServiceGroupEdit {
    name: String,
    member: String,
    comment: String,
}

#[derive(Debug, Default)]
pub(super) struct ServiceGroupHandler {
    current: Option<ServiceGroupEdit>,
}

impl StanzaHandler for ServiceGroupHandler {
    fn begin(&mut self, name: &str) {
        self.current = Some(ServiceGroupEdit {
            name: name.to_string(),
            ..ServiceGroupEdit::default()
        });
    }

    fn set(&mut self, key: &str, value: &str) {
        let Some(edit) = self.current.as_mut() else {
            return;
        };
        match key {
            "member" => edit.member = value.to_string(),
            "comment" => edit.comment = dequote(value).to_string(),
            _ => {}
        }
    }

    fn finish(&mut self, store: &mut Store, vdom: &str) {
        let Some(edit) = self.current.take() else {
            return;
        };
        let vd = store.vdom_mut(vdom);
        let mut set = TokenSet::new(edit.comment.clone());
        for member in split_quoted_list(&edit.member) {
            let entry = vd
                .services
                .get(&member)
                .or_else(|| vd.service_groups.get(&member));
            if let Some(entry) = entry {
                set.extend_unique(&entry.values);
                set.class |= entry.class;
            }
        }
        vd.service_groups.insert(edit.name, set);
    }
}
