//! Wildcard reconciliation of resolved events.
//!
//! Combines `is_wildcard()` and `is_wildcard_domain()` into the tags a scan
//! event should carry, and decides when a host that only exists because of
//! wildcard DNS is collapsed into `_wildcard.<parent>`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dns::cache::host_key;
use crate::dns::engine::DnsEngine;
use crate::dns::event::EventKind;
use crate::dns::types::RecordType;
use crate::dns::wildcard::WildcardStatus;
use crate::domain::{is_domain, is_ip, parent_domain};
use crate::error_handling::EngineError;

/// Label marking a collapsed wildcard host.
pub const WILDCARD_LABEL: &str = "_wildcard";

/// The parts of a scan event wildcard reconciliation looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    /// Host of the event
    pub host: String,
    /// Canonical event data, e.g. the hostname as reported
    pub data: String,
    /// Event kind
    pub kind: EventKind,
    /// Whether the event is a scan target (discoveries are logged at info)
    #[serde(default)]
    pub is_target: bool,
}

impl EventRef {
    /// A `DNS_NAME` event whose data is its host.
    pub fn dns_name(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            data: host.clone(),
            host,
            kind: EventKind::DnsName,
            is_target: false,
        }
    }
}

/// Tags to add and the rewritten data, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WildcardVerdict {
    /// Tags such as `wildcard`, `a-wildcard`, `aaaa-error`, `wildcard-domain`
    pub tags: BTreeSet<String>,
    /// `_wildcard.<parent>` when the event is a full wildcard
    pub data: Option<String>,
}

fn wildcard_tags(statuses: &BTreeMap<RecordType, WildcardStatus>, tags: &mut BTreeSet<String>) {
    for (rdtype, status) in statuses {
        match status.is_wildcard {
            Some(true) => {
                tags.insert("wildcard".to_string());
                tags.insert(format!("{}-wildcard", rdtype.tag_prefix()));
            }
            None => {
                tags.insert(format!("{}-error", rdtype.tag_prefix()));
            }
            Some(false) => {}
        }
    }
}

impl DnsEngine {
    /// Computes wildcard tags for an event and its resolved children.
    ///
    /// A host whose resolved record types are all confirmed wildcard types is
    /// a full wildcard; a `DNS_NAME` event for it is rewritten to
    /// `_wildcard.<parent>`. Otherwise, a bare domain (or a host probed
    /// before) with nothing confirmed is tagged `wildcard-domain` if it or a
    /// parent serves wildcard DNS. IP hosts are left alone.
    ///
    /// # Errors
    ///
    /// Propagates `is_wildcard()` argument errors.
    pub async fn handle_wildcard_event(
        &self,
        event: &EventRef,
        children: &BTreeMap<RecordType, BTreeSet<String>>,
    ) -> Result<WildcardVerdict, EngineError> {
        log::debug!(
            "Entering handle_wildcard_event({}, children={children:?})",
            event.host
        );
        let mut verdict = WildcardVerdict::default();
        let host = event.host.as_str();
        if is_ip(host) {
            return Ok(verdict);
        }

        let statuses = self.is_wildcard(host, None, None).await?;
        wildcard_tags(&statuses, &mut verdict.tags);

        let confirmed: BTreeSet<RecordType> = statuses
            .iter()
            .filter(|(_, s)| s.is_wildcard == Some(true))
            .map(|(t, _)| *t)
            .collect();
        let resolved: BTreeSet<RecordType> = children
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(t, _)| *t)
            .collect();
        let full_wildcard = !resolved.is_empty() && resolved.is_subset(&confirmed);

        if full_wildcard {
            let already_collapsed = event.data.split('.').any(|label| label == WILDCARD_LABEL);
            if event.kind == EventKind::DnsName && !already_collapsed {
                let parent = statuses
                    .values()
                    .find(|s| s.is_wildcard == Some(true))
                    .map(|s| s.parent.clone())
                    .unwrap_or_else(|| parent_domain(host));
                let data = format!("{WILDCARD_LABEL}.{parent}");
                if data != event.data {
                    log::debug!(
                        "Wildcard detected, changing event data \"{}\" --> \"{data}\"",
                        event.data
                    );
                    verdict.data = Some(data);
                }
            }
        } else if (resolved.is_empty() || confirmed.is_empty())
            && (is_domain(host) || self.wildcard_cache().contains(host_key(host)))
        {
            let domains = self.is_wildcard_domain(host, event.is_target).await;
            for records in domains.values().filter(|r| !r.is_empty()) {
                verdict.tags.insert("wildcard-domain".to_string());
                for rdtype in records.keys() {
                    verdict
                        .tags
                        .insert(format!("{}-wildcard-domain", rdtype.tag_prefix()));
                }
            }
        }

        log::debug!("Finished handle_wildcard_event({})", event.host);
        Ok(verdict)
    }
}
