//! 라인 파서 -- 원시 라인을 (호스트, 파일, 메시지)로 분해합니다.
//!
//! 마스터 로그의 각 라인은 `<preamble>:<message>` 형식이며, 프리앰블에는
//! 호스트 식별자와 그 뒤의 원본 파일 경로가 들어 있습니다.
//!
//! ```text
//! ./web01/var/log/app.log:2024-01-01 00:00:00 user login ok
//! |     |              | |
//! |     +-- host       | +-- message
//! |      file ---------+
//! ```
//!
//! # 매칭 규칙
//! - 첫 번째 `:`에서 프리앰블과 메시지를 나눕니다.
//! - 호스트 식별자는 모든 정규식 메타문자를 이스케이프한 뒤 긴 것부터 교대(alternation)로 묶습니다.
//! - 앞부분 그룹은 lazy이므로 프리앰블에서 가장 먼저 나오는 호스트가 선택됩니다.

use regex::Regex;

use logharbor_core::error::ParseError;
use logharbor_core::types::HostRegistry;

use crate::error::IngestError;
use crate::reader::RawLine;

/// 파싱된 라인
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// 원본 호스트
    pub host: String,
    /// 호스트 식별자 뒤의 원본 파일 경로
    pub file: String,
    /// 첫 번째 `:` 이후의 메시지 (줄바꿈 제외)
    pub message: String,
}

/// 호스트 레지스트리 기반 라인 파서
#[derive(Debug, Clone)]
pub struct LineParser {
    pattern: Regex,
}

impl LineParser {
    /// 호스트 레지스트리로 파서를 생성합니다.
    ///
    /// 레지스트리가 비어 있으면 어떤 라인도 파싱할 수 없으므로 설정 에러를 반환합니다.
    pub fn new(registry: &HostRegistry) -> Result<Self, IngestError> {
        if registry.is_empty() {
            return Err(IngestError::Config {
                field: "hosts".to_owned(),
                reason: "host registry is empty".to_owned(),
            });
        }

        let mut hosts: Vec<&str> = registry.iter().collect();
        // 같은 위치에서 `web01`이 `web`보다 먼저 시도되도록
        hosts.sort_by_key(|h| std::cmp::Reverse(h.len()));

        let alternation = hosts
            .iter()
            .map(|h| regex::escape(h))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("^(.*?)({alternation})(.*)$"))?;

        tracing::debug!(hosts = registry.len(), "built host pattern");
        Ok(Self { pattern })
    }

    /// 원시 라인을 파싱합니다.
    ///
    /// UTF-8이 아닌 바이트는 대체 문자로 바뀝니다.
    pub fn parse(&self, line: &RawLine) -> Result<ParsedLine, ParseError> {
        let text = String::from_utf8_lossy(line.content());
        self.parse_text(&text, line.index())
    }

    /// 줄바꿈이 제거된 텍스트를 파싱합니다. `line`은 에러 보고용 라인 번호입니다.
    pub fn parse_text(&self, text: &str, line: u64) -> Result<ParsedLine, ParseError> {
        let (preamble, message) = text
            .split_once(':')
            .ok_or(ParseError::MissingDelimiter { line })?;

        let captures = self
            .pattern
            .captures(preamble)
            .ok_or_else(|| ParseError::UnknownHost {
                line,
                preamble: preamble.to_owned(),
            })?;

        match (captures.get(2), captures.get(3)) {
            (Some(host), Some(file)) => Ok(ParsedLine {
                host: host.as_str().to_owned(),
                file: file.as_str().to_owned(),
                message: message.to_owned(),
            }),
            _ => Err(ParseError::UnknownHost {
                line,
                preamble: preamble.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(hosts: &[&str]) -> LineParser {
        LineParser::new(&HostRegistry::new(hosts.iter().copied())).unwrap()
    }

    #[test]
    fn parses_canonical_line() {
        let p = parser(&["web01", "web02"]);
        let line = RawLine::new(
            b"./web01/var/log/app.log:2024-01-01 00:00:00 user login ok\n".to_vec(),
            1,
        );
        let parsed = p.parse(&line).unwrap();
        assert_eq!(parsed.host, "web01");
        assert_eq!(parsed.file, "/var/log/app.log");
        assert_eq!(parsed.message, "2024-01-01 00:00:00 user login ok");
    }

    #[test]
    fn splits_on_first_colon_only() {
        let p = parser(&["web01"]);
        let parsed = p.parse_text("./web01/app.log:time 12:30:45 a:b", 1).unwrap();
        assert_eq!(parsed.file, "/app.log");
        assert_eq!(parsed.message, "time 12:30:45 a:b");
    }

    #[test]
    fn empty_message_is_allowed() {
        let p = parser(&["web01"]);
        let parsed = p.parse_text("./web01/app.log:", 1).unwrap();
        assert_eq!(parsed.message, "");
    }

    #[test]
    fn missing_delimiter_fails() {
        let p = parser(&["web01"]);
        let err = p.parse_text("malformed line without colon", 9).unwrap_err();
        assert_eq!(err, ParseError::MissingDelimiter { line: 9 });
    }

    #[test]
    fn unknown_host_fails() {
        let p = parser(&["web01", "web02"]);
        let err = p.parse_text("./db01/var/log/x.log:boom", 4).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownHost {
                line: 4,
                preamble: "./db01/var/log/x.log".to_owned()
            }
        );
    }

    #[test]
    fn longest_host_wins_at_same_position() {
        let p = parser(&["web", "web01"]);
        let parsed = p.parse_text("./web01/app.log:x", 1).unwrap();
        assert_eq!(parsed.host, "web01");
        assert_eq!(parsed.file, "/app.log");
    }

    #[test]
    fn first_host_occurrence_wins() {
        let p = parser(&["web01", "web02"]);
        let parsed = p.parse_text("./web01/var/log/web02.log:x", 1).unwrap();
        assert_eq!(parsed.host, "web01");
        assert_eq!(parsed.file, "/var/log/web02.log");
    }

    #[test]
    fn metacharacters_are_literal() {
        let p = parser(&["db.prod", "cache+1"]);
        // `.`이 임의 문자와 매칭되면 안 됨
        assert!(p.parse_text("./dbxprod/x.log:m", 1).is_err());
        let parsed = p.parse_text("./db.prod/x.log:m", 1).unwrap();
        assert_eq!(parsed.host, "db.prod");
        let parsed = p.parse_text("./cache+1/y.log:m", 1).unwrap();
        assert_eq!(parsed.host, "cache+1");
        assert_eq!(parsed.file, "/y.log");
    }

    #[test]
    fn non_utf8_bytes_are_parsed_lossily() {
        let p = parser(&["web01"]);
        let line = RawLine::new(b"./web01/a.log:caf\xe9\n".to_vec(), 1);
        let parsed = p.parse(&line).unwrap();
        assert_eq!(parsed.message, "caf\u{fffd}");
    }

    #[test]
    fn crlf_terminator_is_not_part_of_message() {
        let p = parser(&["web01"]);
        let line = RawLine::new(b"./web01/a.log:hello\r\n".to_vec(), 1);
        assert_eq!(p.parse(&line).unwrap().message, "hello");
    }

    #[test]
    fn empty_registry_is_rejected() {
        let err = LineParser::new(&HostRegistry::default()).unwrap_err();
        assert!(matches!(err, IngestError::Config { .. }));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_arbitrary_bytes_does_not_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
                let p = parser(&["web01", "db.prod", "a+b"]);
                let _ = p.parse(&RawLine::new(bytes, 1));
            }

            #[test]
            fn rendered_line_round_trips(
                host_idx in 0usize..3,
                file in "(/[a-z0-9_.-]{1,12}){1,4}",
                message in "[ -~]{0,80}",
            ) {
                let hosts = ["web01", "web02", "db-01.internal"];
                let p = parser(&hosts);
                let raw = format!("./{}{}:{}\n", hosts[host_idx], file, message);
                let parsed = p.parse(&RawLine::new(raw.into_bytes(), 1)).unwrap();
                prop_assert_eq!(parsed.host, hosts[host_idx]);
                prop_assert_eq!(parsed.file, file);
                prop_assert_eq!(parsed.message, message);
            }
        }
    }
}
