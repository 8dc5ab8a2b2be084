//! Event resolution and tagging.
//!
//! Resolves a host for every record type relevant to its event kind and
//! returns the tags to attach plus the resolved children per record type.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::config::ALL_RECORD_TYPES;
use crate::dns::engine::{dns_debug, DnsEngine};
use crate::dns::types::{Query, RecordType};
use crate::domain::{is_ip, is_private_ip, is_ptr, parse_ip};
use crate::error_handling::EngineError;

/// Kind of scan event a host belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A hostname
    #[default]
    DnsName,
    /// An IP address
    IpAddress,
    /// Any other event carrying a host
    #[serde(other)]
    Other,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::DnsName => "DNS_NAME",
            EventKind::IpAddress => "IP_ADDRESS",
            EventKind::Other => "OTHER",
        })
    }
}

impl FromStr for EventKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "DNS_NAME" => EventKind::DnsName,
            "IP_ADDRESS" => EventKind::IpAddress,
            _ => EventKind::Other,
        })
    }
}

/// Tags and resolved children of one event host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventResolution {
    /// Tags such as `resolved`, `a-record`, `mx-error`, `private-ip`
    pub tags: BTreeSet<String>,
    /// Resolved values per record type
    pub children: BTreeMap<RecordType, BTreeSet<String>>,
}

/// Record types resolved for an event host.
fn event_record_types(host: &str, kind: EventKind, minimal: bool) -> Vec<RecordType> {
    if is_ip(host) {
        if minimal {
            Vec::new()
        } else {
            vec![RecordType::PTR]
        }
    } else if kind == EventKind::DnsName && !minimal {
        ALL_RECORD_TYPES.to_vec()
    } else {
        vec![RecordType::A, RecordType::AAAA]
    }
}

/// Canonical text for IP values; other values pass through.
fn normalize_value(value: String) -> String {
    match parse_ip(&value) {
        Some(ip) => ip.to_string(),
        None => value,
    }
}

impl DnsEngine {
    /// Resolves an event host and computes its tags and children.
    ///
    /// IP hosts are reverse-resolved (skipped when `minimal`). DNS names are
    /// resolved for every default record type, or only A/AAAA when `minimal`
    /// or when the event is not a DNS name.
    pub async fn resolve_event(
        &self,
        host: &str,
        kind: EventKind,
        minimal: bool,
    ) -> EventResolution {
        log::debug!("Resolving event {kind}:{host}");
        let mut resolution = EventResolution::default();
        let types = event_record_types(host, kind, minimal);
        let filter_ptrs = self.config().dns_filter_ptrs;

        let mut answers = self.resolve_raw_batch(types.into_iter().map(|t| Query::new(host, t)));
        while let Some((query, extracted)) = answers.next().await {
            if extracted.targets.is_empty() {
                if !extracted.errors.is_empty() {
                    resolution
                        .tags
                        .insert(format!("{}-error", query.rdtype.tag_prefix()));
                }
                continue;
            }
            resolution.tags.insert("resolved".to_string());
            resolution
                .tags
                .insert(format!("{}-record", query.rdtype.tag_prefix()));
            for (rdtype, value) in extracted.targets {
                if value.is_empty() {
                    continue;
                }
                let value = normalize_value(value);
                if filter_ptrs && query.rdtype == RecordType::PTR && is_ptr(&value) {
                    dns_debug!(self, "Filtering out bad PTR: {value}");
                    continue;
                }
                resolution.children.entry(rdtype).or_default().insert(value);
            }
        }

        if !is_ip(host) && !resolution.tags.contains("resolved") {
            resolution.tags.insert("unresolved".to_string());
        }
        let has_private = resolution
            .children
            .values()
            .flatten()
            .filter_map(|value| parse_ip(value))
            .any(is_private_ip);
        if has_private {
            resolution.tags.insert("private-ip".to_string());
        }
        resolution
    }
}
