//! Address-family stanza handlers: `firewall address[6]`,
//! `firewall multicast-address[6]`, `firewall addrgrp[6]`.
//!
//! Each handler accumulates raw `set` values and normalizes them into
//! canonical tokens on `next`. Unparseable values degrade to `undefined`;
//! nothing fails.

use crate::ip::{v4, v6};
use crate::store::{Store, TokenSet};
use crate::token::{UNDEFINED, dequote, split_quoted_list};

use super::handler::StanzaHandler;

// ── firewall address (IPv4) ─────────────────────────────────────────

#[derive(Debug, Default)]
struct AddressEdit {
    name: String,
    addr_type: String,
    subnet: String,
    start_ip: String,
    end_ip: String,
    wildcard: String,
    fqdn: String,
    country: String,
    comment: String,
}

#[derive(Debug, Default)]
pub(super) struct AddressHandler {
    current: Option<AddressEdit>,
}

impl StanzaHandler for AddressHandler {
    fn begin(&mut self, name: &str) {
        self.current = Some(AddressEdit {
            name: name.to_string(),
            ..AddressEdit::default()
        });
    }

    fn set(&mut self, key: &str, value: &str) {
        let Some(edit) = self.current.as_mut() else {
            return;
        };
        let value = dequote(value).to_string();
        match key {
            "type" => edit.addr_type = value,
            "subnet" => edit.subnet = value,
            "start-ip" => edit.start_ip = value,
            "end-ip" => edit.end_ip = value,
            "wildcard" => edit.wildcard = value,
            "fqdn" => edit.fqdn = value,
            "country" => edit.country = value,
            "comment" => edit.comment = value,
            _ => {}
        }
    }

    fn finish(&mut self, store: &mut Store, vdom: &str) {
        let Some(edit) = self.current.take() else {
            return;
        };
        let mut set = TokenSet::new(edit.comment.clone());
        set.push_unique(normalize_address4(&edit));
        store.vdom_mut(vdom).addr4.insert(edit.name, set);
    }
}

fn normalize_address4(edit: &AddressEdit) -> String {
    let addr_type = if edit.addr_type.is_empty() {
        "ipmask"
    } else {
        edit.addr_type.as_str()
    };
    match addr_type {
        "ipmask" => subnet_token(&edit.subnet),
        "iprange" => range_token_v4(&edit.start_ip, &edit.end_ip),
        "wildcard" => wildcard_token(&edit.wildcard),
        "fqdn" | "wildcard-fqdn" => tagged_token("fqdn", &edit.fqdn),
        "geography" => tagged_token("geo", &edit.country),
        _ => UNDEFINED.to_string(),
    }
}

/// `A M` / `A/M` / `A/p` → `A/p`. Empty endpoints default to `0.0.0.0`.
fn subnet_token(subnet: &str) -> String {
    let (addr, mask) = split_addr_mask(subnet);
    let Some(addr) = v4::parse(&addr) else {
        return UNDEFINED.to_string();
    };
    let prefix = if let Some(mask) = v4::parse(&mask) {
        v4::mask_to_prefix(mask)
    } else {
        mask.parse::<u8>().ok().filter(|p| *p <= 32)
    };
    match prefix {
        Some(p) => format!("{}/{p}", v4::format(addr)),
        None => UNDEFINED.to_string(),
    }
}

fn range_token_v4(start: &str, end: &str) -> String {
    let start = if start.is_empty() { "0.0.0.0" } else { start };
    let end = if end.is_empty() { "0.0.0.0" } else { end };
    let (Some(mut start), Some(mut end)) = (v4::parse(start), v4::parse(end)) else {
        return UNDEFINED.to_string();
    };
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    format!("{}-{}", v4::format(start), v4::format(end))
}

/// Wildcard form is stored verbatim as `A/M` (match mask, not a prefix).
fn wildcard_token(wildcard: &str) -> String {
    let (addr, mask) = split_addr_mask(wildcard);
    match (v4::parse(&addr), v4::parse(&mask)) {
        (Some(addr), Some(mask)) => format!("{}/{}", v4::format(addr), v4::format(mask)),
        _ => UNDEFINED.to_string(),
    }
}

fn tagged_token(tag: &str, value: &str) -> String {
    if value.is_empty() {
        UNDEFINED.to_string()
    } else {
        format!("{tag}:{value}")
    }
}

/// Split `A M`, `A/M`, or `A/p` into address and mask parts, defaulting
/// empty parts to `0.0.0.0`.
fn split_addr_mask(value: &str) -> (String, String) {
    let mut parts = value.split_whitespace();
    let first = parts.next().unwrap_or("");
    let second = parts.next().unwrap_or("");
    let (addr, mask) = if second.is_empty() {
        match first.split_once('/') {
            Some((a, m)) => (a, m),
            None => (first, ""),
        }
    } else {
        (first, second)
    };
    let addr = if addr.is_empty() { "0.0.0.0" } else { addr };
    let mask = if mask.is_empty() { "0.0.0.0" } else { mask };
    (addr.to_string(), mask.to_string())
}

// ── firewall address6 ───────────────────────────────────────────────

#[derive(Debug, Default)]
struct Address6Edit {
    name: String,
    addr_type: String,
    ip6: String,
    start_ip: String,
    end_ip: String,
    fqdn: String,
    comment: String,
}

#[derive(Debug, Default)]
pub(super) struct Address6Handler {
    current: Option<Address6Edit>,
}

impl StanzaHandler for Address6Handler {
    fn begin(&mut self, name: &str) {
        self.current = Some(Address6Edit {
            name: name.to_string(),
            ..Address6Edit::default()
        });
    }

    fn set(&mut self, key: &str, value: &str) {
        let Some(edit) = self.current.as_mut() else {
            return;
        };
        let value = dequote(value).to_string();
        match key {
            "type" => edit.addr_type = value,
            "ip6" => edit.ip6 = value,
            "start-ip" => edit.start_ip = value,
            "end-ip" => edit.end_ip = value,
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
        set.push_unique(normalize_address6(&edit));
        store.vdom_mut(vdom).addr6.insert(edit.name, set);
    }
}

fn normalize_address6(edit: &Address6Edit) -> String {
    let addr_type = if edit.addr_type.is_empty() {
        "ipprefix"
    } else {
        edit.addr_type.as_str()
    };
    match addr_type {
        "ipprefix" => prefix_token_v6(&edit.ip6),
        "iprange" => range_token_v6(&edit.start_ip, &edit.end_ip),
        "fqdn" => tagged_token("fqdn", &edit.fqdn),
        _ => UNDEFINED.to_string(),
    }
}

/// `addr/p` (or bare addr, implied `/128`) → `expanded/p`, default `::/0`.
fn prefix_token_v6(raw: &str) -> String {
    let raw = if raw.is_empty() { "::/0" } else { raw };
    match v6::parse_prefix(raw) {
        Some((addr, prefix)) => format!("{}/{prefix}", v6::format(&addr)),
        None => UNDEFINED.to_string(),
    }
}

fn range_token_v6(start: &str, end: &str) -> String {
    let start = if start.is_empty() { "::" } else { start };
    let end = if end.is_empty() { "::" } else { end };
    match (v6::expand(start), v6::expand(end)) {
        (Some(start), Some(end)) => format!("{start}-{end}"),
        _ => UNDEFINED.to_string(),
    }
}

// ── firewall multicast-address (IPv4) ───────────────────────────────

#[derive(Debug, Default)]
struct MulticastAddressEdit {
    name: String,
    addr_type: String,
    subnet: String,
    start_ip: String,
    end_ip: String,
    comment: String,
}

#[derive(Debug, Default)]
pub(super) struct MulticastAddressHandler {
    current: Option<MulticastAddressEdit>,
}

impl StanzaHandler for MulticastAddressHandler {
    fn begin(&mut self, name: &str) {
        self.current = Some(MulticastAddressEdit {
            name: name.to_string(),
            ..MulticastAddressEdit::default()
        });
    }

    fn set(&mut self, key: &str, value: &str) {
        let Some(edit) = self.current.as_mut() else {
            return;
        };
        let value = dequote(value).to_string();
        match key {
            "type" => edit.addr_type = value,
            "subnet" => edit.subnet = value,
            "start-ip" => edit.start_ip = value,
            "end-ip" => edit.end_ip = value,
            "comment" => edit.comment = value,
            _ => {}
        }
    }

    fn finish(&mut self, store: &mut Store, vdom: &str) {
        let Some(edit) = self.current.take() else {
            return;
        };
        let addr_type = if edit.addr_type.is_empty() {
            "multicastrange"
        } else {
            edit.addr_type.as_str()
        };
        let token = match addr_type {
            "multicastrange" => range_token_v4(&edit.start_ip, &edit.end_ip),
            "broadcastmask" => subnet_token(&edit.subnet),
            _ => UNDEFINED.to_string(),
        };
        let mut set = TokenSet::new(edit.comment.clone());
        set.push_unique(token);
        store.vdom_mut(vdom).mcast4.insert(edit.name, set);
    }
}

// ── firewall multicast-address6 ─────────────────────────────────────

#[derive(Debug, Default)]
struct MulticastAddress6Edit {
    name: String,
    ip6: String,
    comment: String,
}

#[derive(Debug, Default)]
pub(super) struct MulticastAddress6Handler {
    current: Option<MulticastAddress6Edit>,
}

impl StanzaHandler for MulticastAddress6Handler {
    fn begin(&mut self, name: &str) {
        self.current = Some(MulticastAddress6Edit {
            name: name.to_string(),
            ..MulticastAddress6Edit::default()
        });
    }

    fn set(&mut self, key: &str, value: &str) {
        let Some(edit) = self.current.as_mut() else {
            return;
        };
        match key {
            "ip6" => edit.ip6 = dequote(value).to_string(),
            "comment" => edit.comment = dequote(value).to_string(),
            _ => {}
        }
    }

    fn finish(&mut self, store: &mut Store, vdom: &str) {
        let Some(edit) = self.current.take() else {
            return;
        };
        let mut set = TokenSet::new(edit.comment.clone());
        set.push_unique(prefix_token_v6(&edit.ip6));
        store.vdom_mut(vdom).mcast6.insert(edit.name, set);
    }
}

// ── firewall addrgrp / addrgrp6 ─────────────────────────────────────

#[derive(Debug, Default)]
struct GroupEdit {
    name: String,
    member: String,
    comment: String,
}

/// Shared handler for both address-group families.
#[derive(Debug)]
pub(super) struct AddrGrpHandler {
    v6: bool,
    current: Option<GroupEdit>,
}

impl AddrGrpHandler {
    pub(super) fn v4() -> Self {
        Self {
            v6: false,
            current: None,
        }
    }

    pub(super) fn v6() -> Self {
        Self {
            v6: true,
            current: None,
        }
    }
}

impl StanzaHandler for AddrGrpHandler {
    fn begin(&mut self, name: &str) {
        self.current = Some(GroupEdit {
            name: name.to_string(),
            ..GroupEdit::default()
        });
    }

    fn set(&mut self, key: &str, value: &str) {
        let Some(edit) = self.current.as_mut() else {
            return;
        };
        match key {
            // Kept raw: member lists are split on the quoted separator.
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
        {
            let (addrs, groups) = if self.v6 {
                (&vd.addr6, &vd.grp6)
            } else {
                (&vd.addr4, &vd.grp4)
            };
            // Groups are stored already flattened: members resolve against
            // the tables populated so far, so forward references are empty.
            for member in split_quoted_list(&edit.member) {
                if let Some(entry) = addrs.get(&member) {
                    set.extend_unique(&entry.values);
                } else if let Some(entry) = groups.get(&member) {
                    set.extend_unique(&entry.values);
                }
            }
        }
        if self.v6 {
            vd.grp6.insert(edit.name, set);
        } else {
            vd.grp4.insert(edit.name, set);
        }
    }
}
