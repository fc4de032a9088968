#![no_main]

use libfuzzer_sys::fuzz_target;

use domain::config::parse;
use domain::output::{address_listing, policy_text, service_listing};
use domain::policy::flatten::flatten_store;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // The parser must never panic and the store must always render.
    let store = parse(text);
    let _ = address_listing(&store);
    let _ = service_listing(&store);
    let _ = policy_text(&store);
    let _ = flatten_store(&store, true, true);
});
