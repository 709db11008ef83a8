//! 진행률 계산 및 출력
//!
//! [`ProgressTracker`]는 라인 번호로부터 백분율을 계산하고, 값이 바뀔 때만
//! 새 값을 돌려줍니다. 출력은 [`ProgressReporter`] 구현체가 담당합니다.

use std::io::Write;

use logharbor_core::pipeline::ProgressReporter;

/// 진행률 계산기
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: u64,
    last: u8,
}

impl ProgressTracker {
    /// 전체 라인 수로 계산기를 생성합니다.
    pub fn new(total: u64) -> Self {
        Self { total, last: 0 }
    }

    /// `index`번째 라인(1부터)을 처리하기 직전의 진행률을 계산합니다.
    ///
    /// `floor((index - 1) * 100 / total)`이 직전 값과 다를 때만 `Some`을 반환합니다.
    /// 반환값은 단조 증가하며 100 미만입니다.
    pub fn advance(&mut self, index: u64) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let done = index.saturating_sub(1).min(self.total);
        let percent = u8::try_from(u128::from(done) * 100 / u128::from(self.total))
            .unwrap_or(100)
            .min(99);
        if percent > self.last {
            self.last = percent;
            Some(percent)
        } else {
            None
        }
    }

    /// 마지막으로 보고한 진행률
    pub fn last(&self) -> u8 {
        self.last
    }
}

/// 아무것도 출력하지 않는 진행률 보고기
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _percent: u8) {}

    fn complete(&mut self) {}
}

/// 터미널 스트림에 진행률을 한 줄로 덮어쓰며 출력하는 보고기
///
/// ```text
/// [ 42%] Building log file database ...\r
/// [100%] Log file database successfully built.
/// ```
pub struct StreamProgress<W: Write> {
    out: W,
}

impl<W: Write> StreamProgress<W> {
    /// 출력 스트림으로 보고기를 생성합니다.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// 내부 스트림을 반환합니다.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: std::fmt::Arguments<'_>) {
        let result = self
            .out
            .write_fmt(text)
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            tracing::debug!(error = %e, "failed to write progress");
        }
    }
}

impl<W: Write> ProgressReporter for StreamProgress<W> {
    fn report(&mut self, percent: u8) {
        self.write(format_args!(
            "[{:3}%] Building log file database ...\r",
            percent
        ));
    }

    fn complete(&mut self) {
        self.write(format_args!("[100%] Log file database successfully built.\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitted(total: u64) -> Vec<u8> {
        let mut tracker = ProgressTracker::new(total);
        (1..=total).filter_map(|i| tracker.advance(i)).collect()
    }

    #[test]
    fn emits_only_on_change() {
        // 200라인: 라인 3에서 1%, 라인 5에서 2% ...
        let values = emitted(200);
        assert_eq!(values.len(), 99);
        assert_eq!(values.first(), Some(&1));
        assert_eq!(values.last(), Some(&99));
    }

    #[test]
    fn small_inputs_skip_values() {
        assert_eq!(emitted(4), vec![25, 50, 75]);
        assert_eq!(emitted(1), Vec::<u8>::new());
    }

    #[test]
    fn empty_input_never_emits() {
        let mut tracker = ProgressTracker::new(0);
        assert_eq!(tracker.advance(1), None);
        assert_eq!(tracker.last(), 0);
    }

    #[test]
    fn index_past_total_is_clamped() {
        let mut tracker = ProgressTracker::new(2);
        assert_eq!(tracker.advance(2), Some(50));
        assert_eq!(tracker.advance(10), Some(99));
        assert_eq!(tracker.advance(11), None);
    }

    #[test]
    fn stream_progress_writes_indicator() {
        let mut progress = StreamProgress::new(Vec::new());
        progress.report(7);
        progress.report(42);
        progress.complete();
        let out = String::from_utf8(progress.into_inner()).unwrap();
        assert_eq!(
            out,
            "[  7%] Building log file database ...\r\
             [ 42%] Building log file database ...\r\
             [100%] Log file database successfully built.\n"
        );
    }
}
