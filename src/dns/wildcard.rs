//! Wildcard DNS detection.
//!
//! A host is probed by resolving random subdomains of it. Any answer for a
//! record type means the host serves wildcard DNS for that type; the observed
//! values are cached per host and compared against the real answers of names
//! below it.
//!
//! - `is_wildcard_domain()` - Probes a domain and each of its parents, once per host
//! - `is_wildcard()` - Decides per record type whether a name is a wildcard entry

use std::collections::{BTreeMap, BTreeSet};

use futures::StreamExt;
use serde::Serialize;

use crate::config::{ALL_RECORD_TYPES, WILDCARD_LABEL_LENGTH};
use crate::dns::cache::host_key;
use crate::dns::engine::{dns_debug, DnsEngine};
use crate::dns::types::{Query, RecordType, WildcardRecords};
use crate::domain::{
    clean_dns_record, domain_parents, host_in_host, is_dns_name, is_ip, parent_domain, rand_label,
};
use crate::error_handling::{EngineError, StatKind};

/// Wildcard verdict for one record type of a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WildcardStatus {
    /// `Some(true)` for a wildcard entry, `Some(false)` for a real record,
    /// `None` when the name itself could not be resolved
    pub is_wildcard: Option<bool>,
    /// Parent the verdict is attributed to
    pub parent: String,
}

impl WildcardStatus {
    fn confirmed(&self) -> bool {
        self.is_wildcard == Some(true)
    }
}

type Verdicts = BTreeMap<RecordType, WildcardStatus>;

fn all_confirmed(baseline: &BTreeMap<RecordType, BTreeSet<String>>, result: &Verdicts) -> bool {
    !baseline.is_empty()
        && baseline
            .keys()
            .all(|t| result.get(t).is_some_and(WildcardStatus::confirmed))
}

impl DnsEngine {
    /// Checks whether `domain` or any of its parents serves wildcard DNS.
    ///
    /// Hosts are walked root-most first. Returns the wildcard values per
    /// record type for every host examined; hosts that are not wildcards map
    /// to an empty record set. Each host is probed at most once per engine,
    /// later calls read the wildcard cache. Types confirmed at a parent are
    /// not probed again below it.
    pub async fn is_wildcard_domain(
        &self,
        domain: &str,
        log_info: bool,
    ) -> BTreeMap<String, WildcardRecords> {
        let domain = clean_dns_record(domain);
        let mut results = BTreeMap::new();
        if !is_dns_name(&domain) {
            return results;
        }
        if self
            .wildcard_ignore()
            .iter()
            .any(|ignored| host_in_host(&domain, ignored))
        {
            log::debug!(
                "Skipping wildcard detection on {domain} because it is excluded in the config"
            );
            return results;
        }

        let mut rdtypes_to_check: BTreeSet<RecordType> = ALL_RECORD_TYPES.into_iter().collect();
        for host in domain_parents(&domain, true).into_iter().rev() {
            let records = self
                .wildcard_records(&host, &mut rdtypes_to_check, log_info)
                .await;
            results.insert(host, records);
        }
        results
    }

    /// Cached wildcard records for `host`, probing under the host lock on first use.
    async fn wildcard_records(
        &self,
        host: &str,
        rdtypes_to_check: &mut BTreeSet<RecordType>,
        log_info: bool,
    ) -> WildcardRecords {
        let key = host_key(host);
        let handle = self.host_locks().handle(key);
        let records = {
            let _guard = handle.lock().await;
            match self.wildcard_cache().get(key) {
                Some(cached) => cached,
                None => {
                    let records = self.probe_host(host, rdtypes_to_check).await;
                    self.wildcard_cache().insert(key, records.clone());
                    if records.is_empty() {
                        log::debug!("Finished checking {host}, it is not a wildcard");
                    } else {
                        let types: Vec<&str> = records.keys().map(RecordType::as_str).collect();
                        let msg = format!(
                            "Encountered domain with wildcard DNS ({}): {host}",
                            types.join(",")
                        );
                        if log_info {
                            log::info!("{msg}");
                        } else {
                            log::debug!("{msg}");
                        }
                    }
                    records
                }
            }
        };
        self.host_locks().release(key, handle);
        records
    }

    /// Resolves random subdomains of `host` for every undetermined type.
    ///
    /// A type with any answer is a wildcard type and is removed from
    /// `rdtypes_to_check`.
    async fn probe_host(
        &self,
        host: &str,
        rdtypes_to_check: &mut BTreeSet<RecordType>,
    ) -> WildcardRecords {
        dns_debug!(self, "Checking if {host} is a wildcard");
        let tests = self.config().dns_wildcard_tests;
        let queries: Vec<Query> = rdtypes_to_check
            .iter()
            .flat_map(|&rdtype| {
                (0..tests).map(move |_| {
                    Query::new(format!("{}.{host}", rand_label(WILDCARD_LABEL_LENGTH)), rdtype)
                })
            })
            .collect();
        self.stats().add(StatKind::WildcardProbe, queries.len());

        let mut records = WildcardRecords::new();
        let mut results = self.resolve_raw_batch(queries);
        while let Some((query, extracted)) = results.next().await {
            if extracted.targets.is_empty() {
                continue;
            }
            records
                .entry(query.rdtype)
                .or_default()
                .extend(extracted.targets.into_iter().map(|(_, value)| value));
            rdtypes_to_check.remove(&query.rdtype);
        }
        records
    }

    /// Checks whether `query` is a wildcard entry, per record type.
    ///
    /// The baseline is either `ips` (values already resolved for `rdtype`) or
    /// a fresh resolution of `query` for `rdtype` or every default type. Each
    /// baseline type is compared against the wildcard values of the parents,
    /// shortest parent first; the first overlapping parent is recorded.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` if `ips` is given without a
    /// record type or contains no usable value, and `EngineError::InvalidQuery`
    /// for an empty query.
    pub async fn is_wildcard(
        &self,
        query: &str,
        ips: Option<&[String]>,
        rdtype: Option<RecordType>,
    ) -> Result<BTreeMap<RecordType, WildcardStatus>, EngineError> {
        let query = clean_dns_record(query);
        if query.is_empty() {
            return Err(EngineError::InvalidQuery(query));
        }
        let parent = parent_domain(&query);
        let mut result = Verdicts::new();

        let baseline = match (ips, rdtype) {
            (Some(_), None) => {
                return Err(EngineError::InvalidArgument(
                    "a record type must be specified along with ips".to_string(),
                ))
            }
            (Some(ips), Some(rdtype)) => {
                let cleaned: BTreeSet<String> = ips
                    .iter()
                    .map(|ip| clean_dns_record(ip))
                    .filter(|ip| !ip.is_empty())
                    .collect();
                if cleaned.is_empty() {
                    return Err(EngineError::InvalidArgument(
                        "valid IPs must be specified".to_string(),
                    ));
                }
                BTreeMap::from([(rdtype, cleaned)])
            }
            (None, rdtype) => {
                if is_ip(&query) {
                    return Ok(result);
                }
                self.wildcard_baseline(&query, rdtype, &parent, &mut result)
                    .await
            }
        };
        if baseline.is_empty() {
            return Ok(result);
        }

        let parents = domain_parents(&query, false);
        if !self
            .compare_parents(&query, &parents, &baseline, &mut result)
            .await
        {
            dns_debug!(self, "Walked every parent of {query} for wildcards");
        }

        for rdtype in baseline.keys() {
            result.entry(*rdtype).or_insert_with(|| WildcardStatus {
                is_wildcard: Some(false),
                parent: parent.clone(),
            });
        }
        Ok(result)
    }

    /// Resolves `query` for the baseline types; failed types are marked inconclusive.
    async fn wildcard_baseline(
        &self,
        query: &str,
        rdtype: Option<RecordType>,
        parent: &str,
        result: &mut Verdicts,
    ) -> BTreeMap<RecordType, BTreeSet<String>> {
        let types = rdtype.map_or_else(|| ALL_RECORD_TYPES.to_vec(), |t| vec![t]);
        let mut baseline = BTreeMap::new();
        let mut answers = self.resolve_raw_batch(types.into_iter().map(|t| Query::new(query, t)));
        while let Some((q, extracted)) = answers.next().await {
            if !extracted.targets.is_empty() {
                let values = extracted.targets.into_iter().map(|(_, v)| v).collect();
                baseline.insert(q.rdtype, values);
            } else if !extracted.errors.is_empty() {
                dns_debug!(
                    self,
                    "Failed to resolve {query} ({}) during wildcard detection",
                    q.rdtype
                );
                result.insert(
                    q.rdtype,
                    WildcardStatus {
                        is_wildcard: None,
                        parent: parent.to_string(),
                    },
                );
            }
        }
        baseline
    }

    /// Walks `parents` shortest first, attributing baseline types to wildcard parents.
    ///
    /// Returns `true` if the walk stopped early because every baseline type
    /// was already confirmed.
    async fn compare_parents(
        &self,
        query: &str,
        parents: &[String],
        baseline: &BTreeMap<RecordType, BTreeSet<String>>,
        result: &mut Verdicts,
    ) -> bool {
        for host in parents.iter().rev() {
            self.is_wildcard_domain(host, false).await;
            let Some(wildcard_records) = self.wildcard_cache().get(host_key(host)) else {
                continue;
            };
            for (rdtype, values) in baseline {
                if result.get(rdtype).is_some_and(WildcardStatus::confirmed) {
                    continue;
                }
                let overlaps = wildcard_records
                    .get(rdtype)
                    .is_some_and(|wildcard_values| !wildcard_values.is_disjoint(values));
                if overlaps {
                    result.insert(
                        *rdtype,
                        WildcardStatus {
                            is_wildcard: Some(true),
                            parent: host.clone(),
                        },
                    );
                }
            }
            if all_confirmed(baseline, result) {
                log::debug!(
                    "Breaking from wildcard detection for {query} at {host} because every baseline record type is a wildcard"
                );
                return true;
            }
        }
        false
    }
}
