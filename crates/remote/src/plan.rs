//! 수집 계획 -- 호스트별로 가져올 원격 로그 파일 목록
//!
//! 그룹 설정을 펼쳐 `호스트 -> 로그 파일 목록` 순서 있는 매핑을 만듭니다.
//! 한 그룹에 로그가 없으면 그 그룹의 호스트는 계획에 추가되지 않습니다.

use std::collections::HashMap;

use serde::Serialize;

use logharbor_core::config::{GroupHosts, HostConfig, LogHarborConfig};

use crate::error::RemoteError;

/// 한 호스트에서 가져올 로그 파일들
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostLogs {
    /// 호스트 식별자
    pub host: String,
    /// SSH 포트
    pub port: u16,
    /// SSH 사용자
    pub user: String,
    /// 원격 로그 파일 경로 (중복 없음, 처음 선언된 순서)
    pub logs: Vec<String>,
}

impl HostLogs {
    fn new(host: &HostConfig) -> Self {
        Self {
            host: host.host.clone(),
            port: host.port,
            user: host.user.clone(),
            logs: Vec::new(),
        }
    }

    fn add(&mut self, log: &str) {
        if !self.logs.iter().any(|l| l == log) {
            self.logs.push(log.to_owned());
        }
    }
}

/// 수집 계획
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionPlan {
    hosts: Vec<HostLogs>,
}

impl CollectionPlan {
    /// 설정의 호스트/그룹으로 수집 계획을 만듭니다.
    ///
    /// `filter`가 비어 있지 않으면 그 순서대로 해당 호스트만 남깁니다.
    /// 필터나 그룹에 설정에 없는 호스트가 있으면 에러를 반환합니다.
    pub fn from_config(config: &LogHarborConfig, filter: &[String]) -> Result<Self, RemoteError> {
        let mut hosts: Vec<HostLogs> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for group in &config.groups {
            let members = group_members(config, &group.name, &group.hosts)?;
            for member in members {
                for log in &group.logs {
                    let slot = *index.entry(member.host.clone()).or_insert_with(|| {
                        hosts.push(HostLogs::new(member));
                        hosts.len() - 1
                    });
                    hosts[slot].add(log);
                }
            }
        }

        if !filter.is_empty() {
            let mut selected = Vec::with_capacity(filter.len());
            for name in filter {
                if config.host(name).is_none() {
                    return Err(RemoteError::UnknownHost { host: name.clone() });
                }
                if selected.iter().any(|h: &HostLogs| &h.host == name) {
                    continue;
                }
                match index.get(name) {
                    Some(&slot) => selected.push(hosts[slot].clone()),
                    None => tracing::debug!(host = name.as_str(), "host has no logs to collect"),
                }
            }
            hosts = selected;
        }

        let plan = Self { hosts };
        tracing::debug!(
            hosts = plan.len(),
            logs = plan.total_logs(),
            "collection plan built"
        );
        Ok(plan)
    }

    /// 호스트별 로그 목록 (계획 순서)
    pub fn hosts(&self) -> &[HostLogs] {
        &self.hosts
    }

    /// 호스트 이름으로 항목을 찾습니다.
    pub fn get(&self, host: &str) -> Option<&HostLogs> {
        self.hosts.iter().find(|h| h.host == host)
    }

    /// 계획에 포함된 호스트 수
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// 가져올 로그가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// 전체 (호스트, 로그) 쌍의 개수
    pub fn total_logs(&self) -> usize {
        self.hosts.iter().map(|h| h.logs.len()).sum()
    }

    /// (호스트, 로그) 쌍을 계획 순서대로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&HostLogs, &str)> {
        self.hosts
            .iter()
            .flat_map(|h| h.logs.iter().map(move |log| (h, log.as_str())))
    }
}

fn group_members<'c>(
    config: &'c LogHarborConfig,
    group: &str,
    hosts: &GroupHosts,
) -> Result<Vec<&'c HostConfig>, RemoteError> {
    match hosts {
        GroupHosts::Wildcard(_) if hosts.is_wildcard() => Ok(config.hosts.iter().collect()),
        GroupHosts::Wildcard(other) => Err(RemoteError::UnknownGroupHost {
            group: group.to_owned(),
            host: other.clone(),
        }),
        GroupHosts::List(names) => names
            .iter()
            .map(|name| {
                config.host(name).ok_or_else(|| RemoteError::UnknownGroupHost {
                    group: group.to_owned(),
                    host: name.clone(),
                })
            })
            .collect(),
    }
}
