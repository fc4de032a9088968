//! Application-level policy pipeline service.
//!
//! Owns the domain store and the derived flattened row list; each stage of
//! the port contract runs synchronously against that state. A new parse
//! replaces the store wholesale and invalidates the flattened rows.

use domain::config;
use domain::lookup::classify::parse_lookup_list;
use domain::lookup::engine::{LookupOptions, run_lookup};
use domain::output;
use domain::policy::entity::PolicyRow;
use domain::policy::flatten::flatten_store;
use domain::store::Store;
use ports::primary::pipeline_port::{LookupOutput, ObjectListings, PolicyPipelinePort};

#[derive(Default)]
pub struct PolicyPipelineService {
    store: Store,
    flattened: Vec<PolicyRow>,
}

impl PolicyPipelineService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows the last flatten produced.
    pub fn flattened_len(&self) -> usize {
        self.flattened.len()
    }
}

impl PolicyPipelinePort for PolicyPipelineService {
    fn make_list(&mut self, config_text: &str) -> ObjectListings {
        self.store = config::parse(config_text);
        self.flattened.clear();
        let rows: usize = self
            .store
            .iter()
            .map(|(_, vd)| vd.policy_row_count())
            .sum();
        tracing::info!(
            domains = self.store.len(),
            policy_rows = rows,
            "configuration parsed"
        );
        ObjectListings {
            addresses: output::address_listing(&self.store),
            services: output::service_listing(&self.store),
        }
    }

    fn normalize(&mut self) -> String {
        output::policy_text(&self.store)
    }

    fn flatten(&mut self, flatten_addresses: bool, flatten_services: bool) -> String {
        self.flattened = flatten_store(&self.store, flatten_addresses, flatten_services);
        tracing::info!(
            rows = self.flattened.len(),
            flatten_addresses,
            flatten_services,
            "policies flattened"
        );
        output::rows_text(&self.flattened)
    }

    fn lookup(&mut self, list_text: &str, fqdn_geo_match_all: bool) -> LookupOutput {
        let lines = parse_lookup_list(list_text);
        let matches = run_lookup(
            &self.flattened,
            &lines,
            LookupOptions { fqdn_geo_match_all },
        );
        tracing::info!(
            queries = lines.len(),
            matched = matches.all.len(),
            effective = matches.effective.len(),
            "lookup complete"
        );
        LookupOutput {
            all: matches.all.join(output::CRLF),
            without_ineffectual: matches.effective.join(output::CRLF),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: &str = "config firewall address\n\
        edit \"all\"\nnext\n\
        edit \"LAN\"\nset subnet 10.0.0.0 255.0.0.0\nnext\n\
        end\n\
        config firewall service custom\n\
        edit \"ALL\"\nset protocol IP\nnext\n\
        end\n\
        config firewall policy\n\
        edit 1\nset srcintf \"inside\"\nset dstintf \"outside\"\n\
        set srcaddr \"LAN\"\nset dstaddr \"all\"\nset action accept\n\
        set service \"ALL\"\nnext\nend\n";

    #[test]
    fn make_list_returns_listings() {
        let mut service = PolicyPipelineService::new();
        let listings = service.make_list(CFG);
        assert!(listings.addresses.contains(",address4,LAN,10.0.0.0/8,"));
        assert!(listings.services.contains(",service_custom,ALL,ip;-,"));
    }

    #[test]
    fn stages_in_order_produce_lookup_matches() {
        let mut service = PolicyPipelineService::new();
        service.make_list(CFG);
        let normalized = service.normalize();
        assert_eq!(normalized.split("\r\n").count(), 1);

        let flattened = service.flatten(true, true);
        assert!(flattened.contains("10.0.0.0/8"));
        assert!(flattened.contains(",ip,"));

        let looked_up = service.lookup("10.1.2.3,\n", false);
        assert!(looked_up.all.starts_with("from_10.1.2.3/32,"));
        assert_eq!(looked_up.all, looked_up.without_ineffectual);
    }

    #[test]
    fn lookup_before_flatten_sees_empty_rows() {
        let mut service = PolicyPipelineService::new();
        service.make_list(CFG);
        let looked_up = service.lookup("10.1.2.3,\n", false);
        assert!(looked_up.all.is_empty());
        assert!(looked_up.without_ineffectual.is_empty());
    }

    #[test]
    fn reparse_replaces_state_wholesale() {
        let mut service = PolicyPipelineService::new();
        service.make_list(CFG);
        service.flatten(true, true);
        assert!(service.flattened_len() > 0);

        service.make_list("");
        assert_eq!(service.flattened_len(), 0);
        assert!(service.normalize().is_empty());
        assert!(service.lookup("10.1.2.3,\n", false).all.is_empty());
    }
}
