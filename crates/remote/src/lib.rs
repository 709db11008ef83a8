#![doc = include_str!("../README.md")]
//!
//! # 모듈 구조
//!
//! - [`plan`]: 호스트별 수집 대상 (`CollectionPlan`, `HostLogs`)
//! - [`script`]: 셸 스크립트 렌더링 (`PullScript`, `TailScript`, `check_output_dir`)
//! - [`shell`]: 셸 인자 인용
//! - [`error`]: 도메인 에러 (`RemoteError`)
//!
//! # 흐름
//!
//! ```text
//! LogHarborConfig --> CollectionPlan --+--> PullScript --> scp + master log
//!                                      |
//!                                      +--> TailScript --> ssh tail -f
//! ```

pub mod error;
pub mod plan;
pub mod script;
pub mod shell;

pub use error::RemoteError;
pub use plan::{CollectionPlan, HostLogs};
pub use script::{PullScript, TailScript, check_output_dir};
