//! Policy stanza handler, shared across all six type-modes.
//!
//! Accumulates raw fields and, on `next`, runs the Cartesian expansion and
//! appends the rows to the owning domain's per-mode list.

use crate::common::entity::TypeMode;
use crate::policy::expand::{PolicyRecord, expand_policy};
use crate::store::Store;
use crate::token::dequote;

use super::handler::StanzaHandler;

#[derive(Debug)]
pub(super) struct PolicyHandler {
    mode: TypeMode,
    current: Option<PolicyRecord>,
}

impl PolicyHandler {
    pub(super) fn new(mode: TypeMode) -> Self {
        Self {
            mode,
            current: None,
        }
    }
}

impl StanzaHandler for PolicyHandler {
    fn begin(&mut self, name: &str) {
        self.current = Some(PolicyRecord {
            id: name.to_string(),
            ..PolicyRecord::default()
        });
    }

    fn set(&mut self, key: &str, value: &str) {
        let Some(record) = self.current.as_mut() else {
            return;
        };
        match key {
            // List-valued fields keep their quoting for the member split.
            "srcintf" => record.srcintf = value.to_string(),
            "dstintf" => record.dstintf = value.to_string(),
            "srcaddr" => record.srcaddr = value.to_string(),
            "dstaddr" => record.dstaddr = value.to_string(),
            "service" => record.service = value.to_string(),
            "name" => record.name = dequote(value).to_string(),
            "action" => record.action = dequote(value).to_string(),
            "status" => record.status = dequote(value).to_string(),
            "schedule" => record.schedule = dequote(value).to_string(),
            "comments" => record.comments = dequote(value).to_string(),
            "srcaddr-negate" => record.srcaddr_negate = dequote(value).to_string(),
            "dstaddr-negate" => record.dstaddr_negate = dequote(value).to_string(),
            "service-negate" => record.service_negate = dequote(value).to_string(),
            "protocol" => record.protocol = dequote(value).to_string(),
            "start-port" => record.start_port = dequote(value).to_string(),
            "end-port" => record.end_port = dequote(value).to_string(),
            _ => {}
        }
    }

    fn finish(&mut self, store: &mut Store, vdom: &str) {
        let Some(record) = self.current.take() else {
            return;
        };
        let vd = store.vdom_mut(vdom);
        let line = vd.next_policy_line(self.mode);
        let rows = expand_policy(&record, self.mode, vdom, line, &vd.services, &vd.service_groups);
        vd.push_policy_rows(self.mode, rows);
    }
}
