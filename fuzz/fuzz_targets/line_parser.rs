#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use logharbor_core::types::HostRegistry;
use logharbor_ingest::{LineParser, RawLine};

fn parser() -> &'static LineParser {
    static PARSER: OnceLock<LineParser> = OnceLock::new();
    PARSER.get_or_init(|| {
        let registry = HostRegistry::new(["web01", "web", "db.prod", "cache+1", "[v6]"]);
        LineParser::new(&registry).unwrap()
    })
}

fuzz_target!(|data: &[u8]| {
    let line = RawLine::new(data, 1);
    if let Ok(parsed) = parser().parse(&line) {
        assert!(!parsed.host.is_empty());
        assert!(parsed.message.len() <= line.content().len() * 3);
    }
});
