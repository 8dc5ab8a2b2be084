//! Target extraction from raw DNS records.
//!
//! Projects each record onto the host names or addresses it points to.

use std::collections::BTreeSet;

use crate::dns::types::{DnsRecord, RecordType};
use crate::domain::{clean_dns_record, DNS_NAME_REGEX};

/// Extracts `(record type, value)` targets from a raw record.
///
/// Names are normalized with [`clean_dns_record`]. TXT records are scanned
/// for embedded DNS names and may yield any number of targets. Records of
/// unsupported types yield nothing.
///
/// # Examples
///
/// ```
/// use dns_recon::{extract_targets, DnsRecord, RecordType};
///
/// let mx = DnsRecord::MX { preference: 10, exchange: "Mail.Example.com.".into() };
/// let targets = extract_targets(&mx);
/// assert!(targets.contains(&(RecordType::MX, "mail.example.com".to_string())));
/// ```
pub fn extract_targets(record: &DnsRecord) -> BTreeSet<(RecordType, String)> {
    let mut results = BTreeSet::new();
    match record {
        DnsRecord::A { address } => {
            results.insert((RecordType::A, address.to_string()));
        }
        DnsRecord::AAAA { address } => {
            results.insert((RecordType::AAAA, address.to_string()));
        }
        DnsRecord::NS { target } => {
            results.insert((RecordType::NS, clean_dns_record(target)));
        }
        DnsRecord::CNAME { target } => {
            results.insert((RecordType::CNAME, clean_dns_record(target)));
        }
        DnsRecord::PTR { target } => {
            results.insert((RecordType::PTR, clean_dns_record(target)));
        }
        DnsRecord::SOA { mname, .. } => {
            results.insert((RecordType::SOA, clean_dns_record(mname)));
        }
        DnsRecord::MX { exchange, .. } => {
            results.insert((RecordType::MX, clean_dns_record(exchange)));
        }
        DnsRecord::SRV { target, .. } => {
            results.insert((RecordType::SRV, clean_dns_record(target)));
        }
        DnsRecord::TXT { strings } => {
            for s in strings {
                for m in DNS_NAME_REGEX.find_iter(s) {
                    results.insert((RecordType::TXT, m.as_str().to_string()));
                }
            }
        }
        DnsRecord::NSEC { next } => {
            results.insert((RecordType::NSEC, clean_dns_record(next)));
        }
        DnsRecord::Other { rtype, .. } => {
            log::warn!("Unknown DNS record type \"{rtype}\"");
        }
    }
    results.retain(|(_, value)| !value.is_empty());
    results
}
