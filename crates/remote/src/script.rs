//! pull/tail 셸 스크립트 렌더링
//!
//! 스크립트는 문자열로만 만들어지며 실행하지 않습니다. 설정에서 온 모든 값은
//! [`shell::quote`](crate::shell::quote)로 인용됩니다.

use std::fs::OpenOptions;
use std::path::Path;

use chrono::{Local, NaiveDateTime};

use crate::error::RemoteError;
use crate::plan::CollectionPlan;
use crate::shell::quote;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 로그 사본을 내려받고 마스터 로그를 만드는 스크립트
///
/// # 생성 순서
/// 1. 시작 시각 기록
/// 2. 로그마다 진행률 출력, `mkdir -p`, `scp`
/// 3. `<output_dir>`에서 `*.log`를 모아 `grep -H`로 마스터 로그 생성 (`sort -u`)
/// 4. 경과 시간과 다음 단계 안내 출력
#[derive(Debug, Clone)]
pub struct PullScript<'p> {
    plan: &'p CollectionPlan,
    output_dir: String,
    master_log: String,
}

impl<'p> PullScript<'p> {
    /// 새 pull 스크립트를 생성합니다.
    pub fn new(
        plan: &'p CollectionPlan,
        output_dir: impl Into<String>,
        master_log: impl Into<String>,
    ) -> Self {
        let output_dir = output_dir.into();
        let trimmed = output_dir.trim_end_matches('/');
        let output_dir = if trimmed.is_empty() && !output_dir.is_empty() {
            "/".to_owned()
        } else {
            trimmed.to_owned()
        };
        Self {
            plan,
            output_dir,
            master_log: master_log.into(),
        }
    }

    /// 현재 시각으로 렌더링합니다.
    pub fn render(&self) -> String {
        self.render_at(Local::now().naive_local())
    }

    /// `started`를 시작 시각으로 렌더링합니다.
    pub fn render_at(&self, started: NaiveDateTime) -> String {
        let total = self.plan.total_logs();
        let mut lines = vec![
            "LOGHARBOR_START=$(date '+%s')".to_owned(),
            format!("echo {}", quote(&format!("-- {} --", started.format(TIMESTAMP_FORMAT)))),
        ];

        for (count, (host, log)) in self.plan.iter().enumerate() {
            let target = self.target_dir(&host.host, log);
            let status = format!(
                "[{:>3}%] Fetching {} from {} ...",
                percent(count, total),
                log,
                host.host
            );
            lines.push(format!("echo {}", quote(&status)));
            lines.push(format!("mkdir -p {}", quote(&target)));
            lines.push(format!(
                "scp -P {} {}@{}:{} {}",
                host.port,
                quote(&host.user),
                quote(&host.host),
                quote(log),
                quote(&target)
            ));
        }

        lines.push("echo '[100%] All logs fetched.'".to_owned());
        lines.push("echo '[  0%] Building master index ...'".to_owned());
        lines.push(self.index_command());
        lines.push("echo '[100%] Master index built.'".to_owned());
        lines.push("LOGHARBOR_END=$(date '+%s')".to_owned());
        lines.push(r#"echo "-- $(date '+%Y-%m-%d %H:%M:%S') --""#.to_owned());
        lines.push(r#"echo "Elapsed: $((LOGHARBOR_END - LOGHARBOR_START)) s""#.to_owned());
        lines.push("echo 'You may now index and query logs with:'".to_owned());
        lines.push("echo '   logharbor ingest'".to_owned());
        lines.push(r#"echo "   logharbor search '<text>' [--host <host>] [--file <file>]""#.to_owned());

        join_lines(lines)
    }

    /// `<output_dir>/<host>/<원격 로그의 디렉토리>`
    fn target_dir(&self, host: &str, log: &str) -> String {
        let dir = Path::new(log)
            .parent()
            .map(|p| p.to_string_lossy().trim_start_matches('/').to_owned())
            .unwrap_or_default();
        let base = if self.output_dir == "/" {
            ""
        } else {
            self.output_dir.as_str()
        };
        if dir.is_empty() {
            format!("{base}/{host}")
        } else {
            format!("{base}/{host}/{dir}")
        }
    }

    /// 출력 디렉토리 기준 상대 경로(`./<host>/...`)로 라인을 모읍니다.
    fn index_command(&self) -> String {
        let exclude = Path::new(&self.master_log)
            .file_name()
            .map(|name| format!(" ! -name {}", quote(&name.to_string_lossy())))
            .unwrap_or_default();
        format!(
            "(cd {} && find . -name '*.log' -type f{} -exec grep -H '.*' {{}} \\;) | sort -u > {}",
            quote(&self.output_dir),
            exclude,
            quote(&self.master_log)
        )
    }
}

/// 모든 감시 로그를 ssh로 따라가는 스크립트
#[derive(Debug, Clone)]
pub struct TailScript<'p> {
    plan: &'p CollectionPlan,
}

impl<'p> TailScript<'p> {
    /// 새 tail 스크립트를 생성합니다.
    pub fn new(plan: &'p CollectionPlan) -> Self {
        Self { plan }
    }

    /// 현재 시각으로 렌더링합니다.
    pub fn render(&self) -> String {
        self.render_at(Local::now().naive_local())
    }

    /// `started`를 시작 시각으로 렌더링합니다.
    pub fn render_at(&self, started: NaiveDateTime) -> String {
        let mut lines = vec![format!(
            "echo {}",
            quote(&format!("-- {} --", started.format(TIMESTAMP_FORMAT)))
        )];
        for (host, log) in self.plan.iter() {
            lines.push(format!(
                "ssh -p {} {}@{} tail -n0 -f {} &",
                host.port,
                quote(&host.user),
                quote(&host.host),
                quote(log)
            ));
        }
        lines.push("wait".to_owned());
        join_lines(lines)
    }
}

/// 출력 디렉토리가 존재하고 쓸 수 있는지 확인합니다.
///
/// 임시 파일을 만들었다 지워 실제 쓰기 가능 여부를 봅니다.
pub fn check_output_dir(path: impl AsRef<Path>) -> Result<(), RemoteError> {
    let path = path.as_ref();
    let fail = |reason: String| RemoteError::OutputDir {
        path: path.display().to_string(),
        reason,
    };

    let meta = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            fail("directory does not exist, create it or make it writable by the current user".to_owned())
        } else {
            fail(e.to_string())
        }
    })?;
    if !meta.is_dir() {
        return Err(fail("not a directory".to_owned()));
    }

    let probe = path.join(format!(".logharbor-write-check-{}", std::process::id()));
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(|e| fail(e.to_string()))?;
    if let Err(e) = std::fs::remove_file(&probe) {
        tracing::warn!(path = %probe.display(), error = %e, "failed to remove write check file");
    }
    Ok(())
}

/// `count`번째(0부터) 로그를 시작할 때의 진행률 (반올림)
fn percent(count: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (count * 200 + total) / (2 * total)
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
