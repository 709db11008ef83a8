//! 마스터 로그 리더 -- 두 번의 패스로 라인을 스트리밍합니다.
//!
//! 1. [`MasterLogReader::open`]: 파일을 한 번 훑어 전체 라인 수를 셉니다 (진행률 분모).
//! 2. [`MasterLogReader::lines`]: 파일을 다시 열어 라인을 순서대로 읽습니다.
//!
//! 어느 패스도 라인 내용을 보관하지 않으므로 메모리 사용량은
//! 파일 크기가 아니라 가장 긴 라인의 길이에 비례합니다.
//! 마지막 라인에 줄바꿈이 없어도 하나의 라인으로 취급합니다.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use logharbor_core::types::ContentHash;

use crate::error::IngestError;

/// 읽기 버퍼 크기
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// 마스터 로그의 원시 라인
///
/// 줄바꿈 문자를 포함한 원시 바이트와 1부터 시작하는 라인 번호를 가집니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    bytes: Vec<u8>,
    index: u64,
}

impl RawLine {
    /// 원시 바이트와 라인 번호로 라인을 생성합니다.
    pub fn new(bytes: impl Into<Vec<u8>>, index: u64) -> Self {
        Self {
            bytes: bytes.into(),
            index,
        }
    }

    /// 줄바꿈을 포함한 원시 바이트
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 원시 바이트 길이
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// 빈 라인인지 확인합니다 (줄바꿈 문자도 없음).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 1부터 시작하는 라인 번호
    pub fn index(&self) -> u64 {
        self.index
    }

    /// 줄바꿈 문자(`\n` 또는 `\r\n`)를 제외한 내용
    pub fn content(&self) -> &[u8] {
        let content = self.bytes.strip_suffix(b"\n").unwrap_or(&self.bytes);
        content.strip_suffix(b"\r").unwrap_or(content)
    }

    /// 원시 바이트 전체의 콘텐츠 해시
    pub fn hash(&self) -> ContentHash {
        ContentHash::digest(&self.bytes)
    }
}

/// 마스터 로그 리더
#[derive(Debug)]
pub struct MasterLogReader {
    path: PathBuf,
    total_lines: u64,
}

impl MasterLogReader {
    /// 파일을 열어 전체 라인 수를 셉니다 (첫 번째 패스).
    ///
    /// 파일을 열 수 없으면 [`IngestError::MasterLog`]를 반환합니다.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let file = open_file(&path)?;
        let total_lines = count_lines(BufReader::with_capacity(READ_BUFFER_SIZE, file))
            .map_err(|source| master_log_error(&path, source))?;

        tracing::debug!(path = %path.display(), total_lines, "counted master log lines");

        Ok(Self { path, total_lines })
    }

    /// 마스터 로그 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 첫 번째 패스에서 센 전체 라인 수
    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }

    /// 파일을 다시 열어 라인을 순서대로 읽습니다 (두 번째 패스).
    ///
    /// 호출할 때마다 처음부터 다시 읽습니다.
    pub fn lines(&self) -> Result<RawLines, IngestError> {
        let file = open_file(&self.path)?;
        Ok(RawLines {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, file),
            path: self.path.clone(),
            next_index: 1,
            done: false,
        })
    }
}

/// 마스터 로그 라인 이터레이터
///
/// 파일 핸들은 이터레이터가 drop될 때 닫힙니다.
pub struct RawLines {
    reader: BufReader<File>,
    path: PathBuf,
    next_index: u64,
    done: bool,
}

impl Iterator for RawLines {
    type Item = Result<RawLine, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut bytes = Vec::new();
        match self.reader.read_until(b'\n', &mut bytes) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                let line = RawLine::new(bytes, self.next_index);
                self.next_index += 1;
                Some(Ok(line))
            }
            Err(source) => {
                self.done = true;
                Some(Err(master_log_error(&self.path, source)))
            }
        }
    }
}

fn open_file(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|source| master_log_error(path, source))
}

fn master_log_error(path: &Path, source: std::io::Error) -> IngestError {
    IngestError::MasterLog {
        path: path.display().to_string(),
        source,
    }
}

/// 줄바꿈 수를 세고, 줄바꿈 없이 끝나는 마지막 조각이 있으면 하나를 더합니다.
fn count_lines<R: BufRead>(mut reader: R) -> std::io::Result<u64> {
    let mut count = 0u64;
    let mut last_byte = None;

    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        count += chunk.iter().filter(|b| **b == b'\n').count() as u64;
        last_byte = chunk.last().copied();
        let consumed = chunk.len();
        reader.consume(consumed);
    }

    if matches!(last_byte, Some(b) if b != b'\n') {
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn counts_terminated_lines() {
        assert_eq!(count_lines(&b"a\nb\nc\n"[..]).unwrap(), 3);
    }

    #[test]
    fn counts_unterminated_final_fragment() {
        assert_eq!(count_lines(&b"a\nb\nc"[..]).unwrap(), 3);
    }

    #[test]
    fn counts_empty_input() {
        assert_eq!(count_lines(&b""[..]).unwrap(), 0);
    }

    #[test]
    fn counts_blank_lines() {
        assert_eq!(count_lines(&b"\n\n"[..]).unwrap(), 2);
    }

    #[test]
    fn open_missing_file_fails() {
        let err = MasterLogReader::open("/nonexistent/master.log").unwrap_err();
        assert!(matches!(err, IngestError::MasterLog { .. }));
    }

    #[test]
    fn lines_yield_raw_bytes_with_index() {
        let file = write_temp(b"./web01/a.log:one\n./web01/a.log:two\r\n./web02/b.log:three");
        let reader = MasterLogReader::open(file.path()).unwrap();
        assert_eq!(reader.total_lines(), 3);

        let lines: Vec<RawLine> = reader.lines().unwrap().map(Result::unwrap).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].index(), 1);
        assert_eq!(lines[0].bytes(), b"./web01/a.log:one\n");
        assert_eq!(lines[0].content(), b"./web01/a.log:one");
        assert_eq!(lines[1].content(), b"./web01/a.log:two");
        assert_eq!(lines[2].index(), 3);
        assert_eq!(lines[2].bytes(), b"./web02/b.log:three");
        assert_eq!(lines[2].content(), lines[2].bytes());
    }

    #[test]
    fn lines_can_be_restarted() {
        let file = write_temp(b"x:1\ny:2\n");
        let reader = MasterLogReader::open(file.path()).unwrap();
        let first: Vec<_> = reader.lines().unwrap().map(Result::unwrap).collect();
        let second: Vec<_> = reader.lines().unwrap().map(Result::unwrap).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn hash_covers_terminator() {
        let terminated = RawLine::new(b"x:1\n".to_vec(), 1);
        let bare = RawLine::new(b"x:1".to_vec(), 2);
        assert_eq!(terminated.content(), bare.content());
        assert_ne!(terminated.hash(), bare.hash());
        assert_eq!(terminated.hash(), ContentHash::digest(b"x:1\n"));
    }
}
