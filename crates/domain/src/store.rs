//! Per-VDOM object store.
//!
//! Populated by one parse pass and replaced wholesale by the next.
//! Listings and forward-reference semantics depend on configuration file
//! order, so every collection here preserves insertion order.

use std::collections::HashMap;

use crate::common::entity::TypeMode;
use crate::policy::entity::PolicyRow;

/// One named object's normalized values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    /// Ordered, duplicate-free canonical tokens.
    pub values: Vec<String>,
    pub comment: String,
    /// Protocol-class mask; meaningful for service entries only.
    pub class: u8,
}

impl TokenSet {
    pub fn new(comment: String) -> Self {
        Self {
            comment,
            ..Self::default()
        }
    }

    /// Append a value unless already present (first insertion wins).
    pub fn push_unique(&mut self, value: String) {
        if !self.values.iter().any(|v| *v == value) {
            self.values.push(value);
        }
    }

    pub fn extend_unique<'a>(&mut self, values: impl IntoIterator<Item = &'a String>) {
        for v in values {
            self.push_unique(v.clone());
        }
    }
}

/// Insertion-ordered name → `TokenSet` table.
#[derive(Debug, Default)]
pub struct ObjectTable {
    entries: Vec<(String, TokenSet)>,
    index: HashMap<String, usize>,
}

impl ObjectTable {
    /// Insert or replace; a replaced entry keeps its original position.
    pub fn insert(&mut self, name: String, set: TokenSet) {
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = set,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, set));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TokenSet> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenSet)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All named collections of one virtual domain.
#[derive(Debug, Default)]
pub struct Vdom {
    pub addr4: ObjectTable,
    pub addr6: ObjectTable,
    pub grp4: ObjectTable,
    pub grp6: ObjectTable,
    pub mcast4: ObjectTable,
    pub mcast6: ObjectTable,
    pub services: ObjectTable,
    pub service_groups: ObjectTable,
    policies: [Vec<PolicyRow>; 6],
    policy_seq: [usize; 6],
}

impl Vdom {
    pub fn policies(&self, mode: TypeMode) -> &[PolicyRow] {
        &self.policies[mode.index()]
    }

    pub fn push_policy_rows(&mut self, mode: TypeMode, rows: Vec<PolicyRow>) {
        self.policies[mode.index()].extend(rows);
    }

    /// 1-based order number of the next policy in this mode's list.
    pub fn next_policy_line(&mut self, mode: TypeMode) -> usize {
        self.policy_seq[mode.index()] += 1;
        self.policy_seq[mode.index()]
    }

    pub fn policy_row_count(&self) -> usize {
        self.policies.iter().map(Vec::len).sum()
    }
}

/// Insertion-ordered map of VDOM name → domain record.
/// The empty name is the global (non-VDOM) scope.
#[derive(Debug, Default)]
pub struct Store {
    vdoms: Vec<(String, Vdom)>,
    index: HashMap<String, usize>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a domain record, creating it lazily on first reference.
    pub fn vdom_mut(&mut self, name: &str) -> &mut Vdom {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.index.insert(name.to_string(), self.vdoms.len());
                self.vdoms.push((name.to_string(), Vdom::default()));
                self.vdoms.len() - 1
            }
        };
        &mut self.vdoms[i].1
    }

    pub fn vdom(&self, name: &str) -> Option<&Vdom> {
        self.index.get(name).map(|&i| &self.vdoms[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vdom)> {
        self.vdoms.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vdoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vdoms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_set_dedup_preserves_first_insertion() {
        let mut set = TokenSet::new(String::new());
        set.push_unique("a".into());
        set.push_unique("b".into());
        set.push_unique("a".into());
        set.push_unique("c".into());
        assert_eq!(set.values, vec!["a", "b", "c"]);
    }

    #[test]
    fn object_table_preserves_insertion_order() {
        let mut table = ObjectTable::default();
        for name in ["zeta", "alpha", "mid"] {
            table.insert(name.to_string(), TokenSet::new(String::new()));
        }
        let names: Vec<&str> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn object_table_replace_keeps_position() {
        let mut table = ObjectTable::default();
        table.insert("a".to_string(), TokenSet::new("first".into()));
        table.insert("b".to_string(), TokenSet::new(String::new()));
        table.insert("a".to_string(), TokenSet::new("second".into()));
        assert_eq!(table.len(), 2);
        let names: Vec<&str> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(table.get("a").unwrap().comment, "second");
    }

    #[test]
    fn store_creates_vdoms_lazily_in_order() {
        let mut store = Store::new();
        store.vdom_mut("");
        store.vdom_mut("dmz");
        store.vdom_mut("");
        assert_eq!(store.len(), 2);
        let names: Vec<&str> = store.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["", "dmz"]);
    }

    #[test]
    fn policy_line_counter_is_per_mode() {
        let mut vd = Vdom::default();
        assert_eq!(vd.next_policy_line(TypeMode::FourToFour), 1);
        assert_eq!(vd.next_policy_line(TypeMode::FourToFour), 2);
        assert_eq!(vd.next_policy_line(TypeMode::SixToSix), 1);
        assert_eq!(vd.next_policy_line(TypeMode::FourToFour), 3);
    }
}
