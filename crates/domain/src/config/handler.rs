//! Stanza handler contract and the path-keyed registry.
//!
//! One handler instance per stanza type: handlers are single-threaded state
//! machines holding at most one in-progress edit, parameterized by the
//! current VDOM name on installation.

use std::collections::HashMap;

use crate::common::entity::TypeMode;
use crate::store::Store;

use super::address::{
    AddrGrpHandler, Address6Handler, AddressHandler, MulticastAddress6Handler,
    MulticastAddressHandler,
};
use super::policy::PolicyHandler;
use super::service::{ServiceGroupHandler, ServiceHandler};

pub trait StanzaHandler {
    /// `edit <name>` opened a fresh object with defaults.
    fn begin(&mut self, name: &str);

    /// `set <key> <value…>` inside the current edit. Unknown keys are
    /// ignored; `unset <key>` arrives as an empty value.
    fn set(&mut self, key: &str, value: &str);

    /// `next` closed the edit: normalize and install under the edit name in
    /// the owning domain record. Without an open edit this is a no-op.
    fn finish(&mut self, store: &mut Store, vdom: &str);

    /// `end` closed the whole stanza. Installs a still-open edit so a dump
    /// truncated before its `next` is not lost.
    fn finish_stanza(&mut self, store: &mut Store, vdom: &str) {
        self.finish(store, vdom);
    }
}

const STANZAS: [&str; 14] = [
    "firewall address",
    "firewall address6",
    "firewall addrgrp",
    "firewall addrgrp6",
    "firewall multicast-address",
    "firewall multicast-address6",
    "firewall service custom",
    "firewall service group",
    "firewall policy",
    "firewall policy6",
    "firewall policy64",
    "firewall policy46",
    "firewall multicast-policy",
    "firewall multicast-policy6",
];

/// Map a `config …` path (space-joined tokens) to its registry key.
pub(super) fn recognize(path: &str) -> Option<&'static str> {
    STANZAS.iter().copied().find(|s| *s == path)
}

pub(super) fn handler_registry() -> HashMap<&'static str, Box<dyn StanzaHandler>> {
    let mut handlers: HashMap<&'static str, Box<dyn StanzaHandler>> = HashMap::new();
    handlers.insert("firewall address", Box::new(AddressHandler::default()));
    handlers.insert("firewall address6", Box::new(Address6Handler::default()));
    handlers.insert("firewall addrgrp", Box::new(AddrGrpHandler::v4()));
    handlers.insert("firewall addrgrp6", Box::new(AddrGrpHandler::v6()));
    handlers.insert(
        "firewall multicast-address",
        Box::new(MulticastAddressHandler::default()),
    );
    handlers.insert(
        "firewall multicast-address6",
        Box::new(MulticastAddress6Handler::default()),
    );
    handlers.insert("firewall service custom", Box::new(ServiceHandler::default()));
    handlers.insert(
        "firewall service group",
        Box::new(ServiceGroupHandler::default()),
    );
    handlers.insert(
        "firewall policy",
        Box::new(PolicyHandler::new(TypeMode::FourToFour)),
    );
    handlers.insert(
        "firewall policy6",
        Box::new(PolicyHandler::new(TypeMode::SixToSix)),
    );
    handlers.insert(
        "firewall policy64",
        Box::new(PolicyHandler::new(TypeMode::SixToFour)),
    );
    handlers.insert(
        "firewall policy46",
        Box::new(PolicyHandler::new(TypeMode::FourToSix)),
    );
    handlers.insert(
        "firewall multicast-policy",
        Box::new(PolicyHandler::new(TypeMode::MulticastFour)),
    );
    handlers.insert(
        "firewall multicast-policy6",
        Box::new(PolicyHandler::new(TypeMode::MulticastSix)),
    );
    handlers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stanza_has_a_handler() {
        let registry = handler_registry();
        for path in STANZAS {
            assert!(registry.contains_key(path), "missing handler for {path}");
        }
        assert_eq!(registry.len(), STANZAS.len());
    }

    #[test]
    fn recognize_known_and_unknown() {
        assert_eq!(recognize("firewall address"), Some("firewall address"));
        assert_eq!(recognize("firewall policy64"), Some("firewall policy64"));
        assert_eq!(recognize("system interface"), None);
        assert_eq!(recognize("vdom"), None);
    }
}
