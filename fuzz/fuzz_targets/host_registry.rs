#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use logharbor_core::types::HostRegistry;
use logharbor_ingest::LineParser;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 호스트 식별자 (정규식 메타문자 포함 가능)
    hosts: Vec<String>,
    /// 프리앰블에 들어갈 파일 경로
    file: String,
    message: String,
}

fuzz_target!(|input: FuzzInput| {
    let hosts: Vec<String> = input
        .hosts
        .into_iter()
        .filter(|h| !h.trim().is_empty() && !h.contains([':', '\n', '\r']))
        .take(16)
        .collect();
    let Some(first) = hosts.first().cloned() else {
        return;
    };
    if input.file.contains([':', '\n', '\r']) {
        return;
    }

    let registry = HostRegistry::new(hosts);
    let Ok(parser) = LineParser::new(&registry) else {
        return;
    };

    // 등록된 호스트로 만든 라인은 항상 파싱되어야 함
    let text = format!("./{}{}:{}", first, input.file, input.message);
    let parsed = parser
        .parse_text(&text, 1)
        .expect("line built from a registered host must parse");
    assert!(registry.contains(&parsed.host));
    assert_eq!(parsed.message, input.message);
});
