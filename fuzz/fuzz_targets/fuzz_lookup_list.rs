#![no_main]

use libfuzzer_sys::fuzz_target;

use domain::lookup::classify::parse_lookup_list;
use domain::lookup::contains::value_matches;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Split fuzz input into a stored token (first line) and a lookup list
    // (the rest); neither side may panic.
    let (stored, list) = text.split_once('\n').unwrap_or((text, ""));
    for line in parse_lookup_list(list) {
        for query in [line.src, line.dst].into_iter().flatten() {
            let _ = value_matches(stored, &query.addr, false, false);
            let _ = value_matches(stored, &query.addr, true, true);
        }
    }
});
