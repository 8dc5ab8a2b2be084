//! DNS protocol client abstraction.
//!
//! The engine talks to DNS through the [`DnsClient`] trait so the real
//! `hickory-resolver` backend can be swapped for [`super::MockClient`] in
//! tests. Implementations must report failures with the [`QueryError`]
//! taxonomy instead of opaque errors.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::error::ProtoErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{Name, RData, Record, RecordType as WireRecordType};
use hickory_resolver::proto::serialize::binary::{BinDecodable, BinDecoder};
use hickory_resolver::TokioAsyncResolver;

use crate::dns::types::{DnsRecord, RecordType};
use crate::error_handling::QueryError;

/// Forward and reverse lookups against some DNS backend.
///
/// An empty `Ok` vector means the name exists without records of that type
/// or does not exist at all.
#[async_trait]
pub trait DnsClient: Send + Sync {
    /// Forward lookup of `name` for `rdtype`.
    async fn resolve(&self, name: &str, rdtype: RecordType) -> Result<Vec<DnsRecord>, QueryError>;

    /// Reverse (PTR) lookup of `ip`.
    async fn resolve_address(&self, ip: IpAddr) -> Result<Vec<DnsRecord>, QueryError>;
}

/// [`DnsClient`] backed by a `hickory-resolver` async resolver.
#[derive(Clone)]
pub struct HickoryClient {
    resolver: Arc<TokioAsyncResolver>,
}

impl HickoryClient {
    /// Wraps an initialized resolver.
    pub fn new(resolver: Arc<TokioAsyncResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl DnsClient for HickoryClient {
    async fn resolve(&self, name: &str, rdtype: RecordType) -> Result<Vec<DnsRecord>, QueryError> {
        let wire_type = to_wire_type(rdtype);
        // Trailing dot keeps search domains from being appended
        let fqdn = format!("{}.", name.trim_end_matches('.'));
        match self.resolver.lookup(fqdn.as_str(), wire_type).await {
            Ok(lookup) => Ok(lookup
                .record_iter()
                .filter(|r| r.record_type() == wire_type)
                .filter_map(convert_record)
                .collect()),
            Err(e) => map_resolve_error(e),
        }
    }

    async fn resolve_address(&self, ip: IpAddr) -> Result<Vec<DnsRecord>, QueryError> {
        match self.resolver.reverse_lookup(ip).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|ptr| DnsRecord::PTR {
                    target: ptr.0.to_utf8(),
                })
                .collect()),
            Err(e) => map_resolve_error(e),
        }
    }
}

fn to_wire_type(rdtype: RecordType) -> WireRecordType {
    match rdtype {
        RecordType::A => WireRecordType::A,
        RecordType::AAAA => WireRecordType::AAAA,
        RecordType::SRV => WireRecordType::SRV,
        RecordType::MX => WireRecordType::MX,
        RecordType::NS => WireRecordType::NS,
        RecordType::SOA => WireRecordType::SOA,
        RecordType::CNAME => WireRecordType::CNAME,
        RecordType::TXT => WireRecordType::TXT,
        RecordType::PTR => WireRecordType::PTR,
        RecordType::NSEC => WireRecordType::NSEC,
    }
}

fn convert_record(record: &Record) -> Option<DnsRecord> {
    let converted = match record.data()? {
        RData::A(a) => DnsRecord::A { address: a.0 },
        RData::AAAA(aaaa) => DnsRecord::AAAA { address: aaaa.0 },
        RData::NS(ns) => DnsRecord::NS {
            target: ns.0.to_utf8(),
        },
        RData::CNAME(cname) => DnsRecord::CNAME {
            target: cname.0.to_utf8(),
        },
        RData::PTR(ptr) => DnsRecord::PTR {
            target: ptr.0.to_utf8(),
        },
        RData::SOA(soa) => DnsRecord::SOA {
            mname: soa.mname().to_utf8(),
            rname: soa.rname().to_utf8(),
            serial: soa.serial(),
        },
        RData::MX(mx) => DnsRecord::MX {
            preference: mx.preference(),
            exchange: mx.exchange().to_utf8(),
        },
        RData::SRV(srv) => DnsRecord::SRV {
            priority: srv.priority(),
            weight: srv.weight(),
            port: srv.port(),
            target: srv.target().to_utf8(),
        },
        RData::TXT(txt) => DnsRecord::TXT {
            strings: txt
                .iter()
                .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                .collect(),
        },
        // Without DNSSEC support NSEC arrives undecoded
        RData::Unknown { code, rdata } if *code == WireRecordType::NSEC => {
            match nsec_next_name(rdata.anything()) {
                Some(next) => DnsRecord::NSEC { next },
                None => DnsRecord::Other {
                    rtype: code.to_string(),
                    data: format!("{rdata}"),
                },
            }
        }
        other => DnsRecord::Other {
            rtype: record.record_type().to_string(),
            data: other.to_string(),
        },
    };
    Some(converted)
}

/// Reads the next domain name at the start of NSEC rdata (RFC 4034, never compressed).
fn nsec_next_name(rdata: &[u8]) -> Option<String> {
    let mut decoder = BinDecoder::new(rdata);
    Name::read(&mut decoder).ok().map(|name| name.to_utf8())
}

/// Maps a resolver error onto the query failure taxonomy.
///
/// NXDOMAIN and empty answers are not failures and become `Ok(vec![])`.
fn map_resolve_error(error: ResolveError) -> Result<Vec<DnsRecord>, QueryError> {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::ServFail | ResponseCode::Refused => {
                Err(QueryError::NoNameservers(response_code.to_string()))
            }
            _ => Ok(Vec::new()),
        },
        ResolveErrorKind::Timeout => Err(QueryError::Timeout),
        ResolveErrorKind::NoConnections => {
            Err(QueryError::NoNameservers("no connections available".to_string()))
        }
        ResolveErrorKind::Proto(proto) => match proto.kind() {
            ProtoErrorKind::Timeout => Err(QueryError::Timeout),
            _ => Err(QueryError::Protocol(proto.to_string())),
        },
        ResolveErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            Err(QueryError::Timeout)
        }
        ResolveErrorKind::Message(msg) => Err(QueryError::Protocol(msg.to_string())),
        ResolveErrorKind::Msg(msg) => Err(QueryError::Protocol(msg.clone())),
        _ => Err(QueryError::Unexpected(error.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_mapping_is_exhaustive() {
        use strum::IntoEnumIterator;
        for rdtype in RecordType::iter() {
            assert_eq!(to_wire_type(rdtype).to_string(), rdtype.to_string());
        }
    }

    fn nsec_record(rdata: Vec<u8>) -> Record {
        let rdata = RData::Unknown {
            code: WireRecordType::NSEC,
            rdata: hickory_resolver::proto::rr::rdata::NULL::with(rdata),
        };
        Record::from_rdata(Name::from_ascii("evilcorp.com.").unwrap(), 300, rdata)
    }

    #[test]
    fn test_undecoded_nsec_yields_next_name() {
        let mut rdata = b"\x04next\x08evilcorp\x03com\x00".to_vec();
        // Type bitmap: window 0, A and NSEC
        rdata.extend_from_slice(&[0x00, 0x06, 0x40, 0x00, 0x00, 0x00, 0x00, 0x03]);
        let record = convert_record(&nsec_record(rdata)).unwrap();
        assert!(matches!(&record, DnsRecord::NSEC { .. }));
        let targets = crate::dns::extract_targets(&record);
        assert!(targets.contains(&(RecordType::NSEC, "next.evilcorp.com".to_string())));
    }

    #[test]
    fn test_garbled_nsec_is_kept_as_other() {
        let record = convert_record(&nsec_record(vec![0x3f])).unwrap();
        assert!(matches!(record, DnsRecord::Other { .. }));
    }

    #[test]
    fn test_map_timeout_error() {
        let err = ResolveError::from(ResolveErrorKind::Timeout);
        assert_eq!(map_resolve_error(err), Err(QueryError::Timeout));
    }

    #[test]
    fn test_map_no_connections_error() {
        let err = ResolveError::from(ResolveErrorKind::NoConnections);
        assert!(matches!(
            map_resolve_error(err),
            Err(QueryError::NoNameservers(_))
        ));
    }

    #[test]
    fn test_map_message_error() {
        let err = ResolveError::from("malformed response");
        assert!(matches!(map_resolve_error(err), Err(QueryError::Protocol(_))));
    }
}
