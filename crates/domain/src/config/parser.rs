//! Line-oriented, stack-based reader for the FortiGate
//! `config/edit/set/unset/next/end` grammar.
//!
//! Each line is routed through the top-of-stack frame: only lines inside a
//! recognized `config firewall …` stanza reach a handler, so unrecognized
//! stanzas (and anything nested inside an edit) are skipped without special
//! cases. Nothing here fails; malformed lines are ignored.

use std::collections::HashMap;

use crate::store::Store;
use crate::token::dequote;

use super::handler::{StanzaHandler, handler_registry, recognize};

/// Parse a full configuration dump into a fresh store.
pub fn parse(text: &str) -> Store {
    let mut parser = ConfigParser::new();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

struct Frame {
    recognized: Option<&'static str>,
    is_vdom: bool,
}

struct ConfigParser {
    store: Store,
    handlers: HashMap<&'static str, Box<dyn StanzaHandler>>,
    stack: Vec<Frame>,
    vdom: String,
}

impl ConfigParser {
    fn new() -> Self {
        Self {
            store: Store::new(),
            handlers: handler_registry(),
            stack: Vec::new(),
            vdom: String::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        match verb {
            "config" => self.on_config(rest),
            "edit" => self.on_edit(rest),
            "set" => self.on_set(rest),
            "unset" => self.on_unset(rest),
            "next" => self.on_next(),
            "end" => self.on_end(),
            _ => {}
        }
    }

    fn finish(mut self) -> Store {
        // Unwind anything a truncated dump left open.
        while !self.stack.is_empty() {
            self.on_end();
        }
        self.store
    }

    fn on_config(&mut self, rest: &str) {
        let path = rest.split_whitespace().collect::<Vec<_>>().join(" ");
        self.stack.push(Frame {
            recognized: recognize(&path),
            is_vdom: path == "vdom",
        });
    }

    fn on_edit(&mut self, rest: &str) {
        let Some(top) = self.stack.last() else {
            return;
        };
        if top.is_vdom {
            self.vdom = dequote(rest).to_string();
            self.store.vdom_mut(&self.vdom);
        } else if let Some(key) = top.recognized
            && let Some(handler) = self.handlers.get_mut(key)
        {
            handler.begin(dequote(rest));
        }
    }

    fn on_set(&mut self, rest: &str) {
        let Some(handler) = self.current_handler() else {
            return;
        };
        let (key, value) = match rest.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (rest, ""),
        };
        handler.set(key, value);
    }

    fn on_unset(&mut self, rest: &str) {
        if let Some(handler) = self.current_handler() {
            handler.set(rest, "");
        }
    }

    fn on_next(&mut self) {
        let Some(top) = self.stack.last() else {
            return;
        };
        if let Some(key) = top.recognized
            && let Some(handler) = self.handlers.get_mut(key)
        {
            handler.finish(&mut self.store, &self.vdom);
        }
    }

    fn on_end(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if frame.is_vdom {
            self.vdom.clear();
        } else if let Some(key) = frame.recognized
            && let Some(handler) = self.handlers.get_mut(key)
        {
            handler.finish_stanza(&mut self.store, &self.vdom);
        }
    }

    fn current_handler(&mut self) -> Option<&mut Box<dyn StanzaHandler>> {
        let key = self.stack.last()?.recognized?;
        self.handlers.get_mut(key)
    }
}
