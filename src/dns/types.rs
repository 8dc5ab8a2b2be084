//! DNS data types.
//!
//! This module defines the record types the engine understands, the raw
//! records returned by a protocol client, and the query/result shapes passed
//! between resolution layers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use crate::config::ALL_RECORD_TYPES;
use crate::error_handling::{EngineError, QueryError};

/// DNS resource record types the engine can query and extract.
#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    AAAA,
    /// Service locator
    SRV,
    /// Mail exchanger
    MX,
    /// Nameserver
    NS,
    /// Start of authority
    SOA,
    /// Canonical name
    CNAME,
    /// Free-form text
    TXT,
    /// Reverse pointer
    PTR,
    /// Next secure record
    NSEC,
}

impl RecordType {
    /// Upper-case mnemonic, e.g. `"AAAA"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::SRV => "SRV",
            RecordType::MX => "MX",
            RecordType::NS => "NS",
            RecordType::SOA => "SOA",
            RecordType::CNAME => "CNAME",
            RecordType::TXT => "TXT",
            RecordType::PTR => "PTR",
            RecordType::NSEC => "NSEC",
        }
    }

    /// Lower-case mnemonic used in tags, e.g. `"aaaa"`.
    pub fn tag_prefix(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::AAAA),
            "SRV" => Ok(RecordType::SRV),
            "MX" => Ok(RecordType::MX),
            "NS" => Ok(RecordType::NS),
            "SOA" => Ok(RecordType::SOA),
            "CNAME" => Ok(RecordType::CNAME),
            "TXT" => Ok(RecordType::TXT),
            "PTR" => Ok(RecordType::PTR),
            "NSEC" => Ok(RecordType::NSEC),
            _ => Err(EngineError::InvalidRecordType(s.to_string())),
        }
    }
}

/// Record types requested for a query: one type, or the full default set.
///
/// # Examples
///
/// ```
/// use dns_recon::{RecordType, RecordTypeSelector};
///
/// let selector: RecordTypeSelector = "any".parse().unwrap();
/// assert_eq!(selector.types().len(), 8);
/// assert_eq!("mx".parse::<RecordTypeSelector>().unwrap().types(), vec![RecordType::MX]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordTypeSelector {
    /// A single record type
    Single(RecordType),
    /// `any`, `all` or `*`
    All,
    /// No type given; forward lookups use A, reverse lookups PTR
    #[default]
    Default,
}

impl RecordTypeSelector {
    /// Types to query for a hostname.
    pub fn types(&self) -> Vec<RecordType> {
        match self {
            RecordTypeSelector::Single(t) => vec![*t],
            RecordTypeSelector::All => ALL_RECORD_TYPES.to_vec(),
            RecordTypeSelector::Default => vec![RecordType::A],
        }
    }
}

impl FromStr for RecordTypeSelector {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" | "all" | "*" => Ok(RecordTypeSelector::All),
            _ => s.parse().map(RecordTypeSelector::Single),
        }
    }
}

impl From<RecordType> for RecordTypeSelector {
    fn from(rdtype: RecordType) -> Self {
        RecordTypeSelector::Single(rdtype)
    }
}

/// A raw DNS record as returned by a protocol client.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum DnsRecord {
    /// IPv4 address record
    A {
        /// Address
        address: Ipv4Addr,
    },
    /// IPv6 address record
    AAAA {
        /// Address
        address: Ipv6Addr,
    },
    /// Nameserver record
    NS {
        /// Nameserver host
        target: String,
    },
    /// Canonical name record
    CNAME {
        /// Alias target
        target: String,
    },
    /// Reverse pointer record
    PTR {
        /// Pointed-to host
        target: String,
    },
    /// Start of authority
    SOA {
        /// Primary nameserver
        mname: String,
        /// Responsible mailbox
        rname: String,
        /// Zone serial
        serial: u32,
    },
    /// Mail exchanger
    MX {
        /// Preference, lower wins
        preference: u16,
        /// Mail host
        exchange: String,
    },
    /// Service locator
    SRV {
        /// Priority
        priority: u16,
        /// Weight
        weight: u16,
        /// Port
        port: u16,
        /// Target host
        target: String,
    },
    /// Text record, one entry per character-string
    TXT {
        /// Character strings
        strings: Vec<String>,
    },
    /// Next secure record
    NSEC {
        /// Next owner name in the zone
        next: String,
    },
    /// Any record type the engine does not extract from
    Other {
        /// Record type mnemonic as reported by the client
        rtype: String,
        /// Presentation-format data
        data: String,
    },
}

impl DnsRecord {
    /// Record type, or `None` for [`DnsRecord::Other`].
    pub fn record_type(&self) -> Option<RecordType> {
        match self {
            DnsRecord::A { .. } => Some(RecordType::A),
            DnsRecord::AAAA { .. } => Some(RecordType::AAAA),
            DnsRecord::NS { .. } => Some(RecordType::NS),
            DnsRecord::CNAME { .. } => Some(RecordType::CNAME),
            DnsRecord::PTR { .. } => Some(RecordType::PTR),
            DnsRecord::SOA { .. } => Some(RecordType::SOA),
            DnsRecord::MX { .. } => Some(RecordType::MX),
            DnsRecord::SRV { .. } => Some(RecordType::SRV),
            DnsRecord::TXT { .. } => Some(RecordType::TXT),
            DnsRecord::NSEC { .. } => Some(RecordType::NSEC),
            DnsRecord::Other { .. } => None,
        }
    }

    /// Parses presentation-format record data for `rdtype`.
    ///
    /// Accepts the forms found in zone files: `"10 mail.example.com."` for MX,
    /// `"0 5 443 sip.example.com."` for SRV, `"ns1.example.com. admin.example.com. 1"`
    /// for SOA, and quoted or bare text for TXT.
    pub fn parse(rdtype: RecordType, text: &str) -> Result<Self, EngineError> {
        let text = text.trim();
        let invalid = || EngineError::InvalidArgument(format!("invalid {rdtype} data {text:?}"));
        let fields: Vec<&str> = text.split_whitespace().collect();
        let record = match rdtype {
            RecordType::A => DnsRecord::A {
                address: text.parse().map_err(|_| invalid())?,
            },
            RecordType::AAAA => DnsRecord::AAAA {
                address: text.parse().map_err(|_| invalid())?,
            },
            RecordType::NS => DnsRecord::NS {
                target: text.to_string(),
            },
            RecordType::CNAME => DnsRecord::CNAME {
                target: text.to_string(),
            },
            RecordType::PTR => DnsRecord::PTR {
                target: text.to_string(),
            },
            RecordType::NSEC => DnsRecord::NSEC {
                next: fields.first().ok_or_else(invalid)?.to_string(),
            },
            RecordType::MX => match fields.as_slice() {
                [preference, exchange] => DnsRecord::MX {
                    preference: preference.parse().map_err(|_| invalid())?,
                    exchange: exchange.to_string(),
                },
                [exchange] => DnsRecord::MX {
                    preference: 0,
                    exchange: exchange.to_string(),
                },
                _ => return Err(invalid()),
            },
            RecordType::SRV => match fields.as_slice() {
                [priority, weight, port, target] => DnsRecord::SRV {
                    priority: priority.parse().map_err(|_| invalid())?,
                    weight: weight.parse().map_err(|_| invalid())?,
                    port: port.parse().map_err(|_| invalid())?,
                    target: target.to_string(),
                },
                _ => return Err(invalid()),
            },
            RecordType::SOA => match fields.as_slice() {
                [mname, rname, rest @ ..] => DnsRecord::SOA {
                    mname: mname.to_string(),
                    rname: rname.to_string(),
                    serial: rest.first().and_then(|s| s.parse().ok()).unwrap_or(0),
                },
                _ => return Err(invalid()),
            },
            RecordType::TXT => DnsRecord::TXT {
                strings: vec![text.trim_matches('"').to_string()],
            },
        };
        Ok(record)
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsRecord::A { address } => write!(f, "{address}"),
            DnsRecord::AAAA { address } => write!(f, "{address}"),
            DnsRecord::NS { target } | DnsRecord::CNAME { target } | DnsRecord::PTR { target } => {
                f.write_str(target)
            }
            DnsRecord::SOA {
                mname,
                rname,
                serial,
            } => write!(f, "{mname} {rname} {serial}"),
            DnsRecord::MX {
                preference,
                exchange,
            } => write!(f, "{preference} {exchange}"),
            DnsRecord::SRV {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{priority} {weight} {port} {target}"),
            DnsRecord::TXT { strings } => {
                let quoted: Vec<String> = strings.iter().map(|s| format!("{s:?}")).collect();
                f.write_str(&quoted.join(" "))
            }
            DnsRecord::NSEC { next } => f.write_str(next),
            DnsRecord::Other { rtype, data } => write!(f, "{rtype} {data}"),
        }
    }
}

/// A single `(target, record type)` query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// Hostname or IP address
    pub target: String,
    /// Record type to query
    pub rdtype: RecordType,
}

impl Query {
    /// Builds a query.
    pub fn new(target: impl Into<String>, rdtype: RecordType) -> Self {
        Self {
            target: target.into(),
            rdtype,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target, self.rdtype)
    }
}

impl FromStr for Query {
    type Err = EngineError;

    /// Parses `target` or `target:TYPE`. IPv6 targets must carry an explicit type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EngineError::InvalidQuery(s.to_string()));
        }
        match s.rsplit_once(':') {
            Some((target, rdtype)) if !target.is_empty() && rdtype.parse::<RecordType>().is_ok() => {
                Ok(Query::new(target, rdtype.parse()?))
            }
            _ if crate::domain::is_ip(s) => Ok(Query::new(s, RecordType::PTR)),
            _ => Ok(Query::new(s, RecordType::A)),
        }
    }
}

/// Raw answers and counted failures for one resolution.
///
/// `answers` holds one entry per record type that returned records;
/// `errors` one entry per failed attempt (timeouts and nameserver failures).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResolution {
    /// Records per queried type
    pub answers: Vec<(RecordType, Vec<DnsRecord>)>,
    /// Failures per queried type
    pub errors: Vec<(RecordType, QueryError)>,
}

impl RawResolution {
    /// Whether any records came back.
    pub fn has_answers(&self) -> bool {
        self.answers.iter().any(|(_, records)| !records.is_empty())
    }

    /// Every returned record, in order.
    pub fn records(&self) -> impl Iterator<Item = &DnsRecord> {
        self.answers.iter().flat_map(|(_, records)| records.iter())
    }

    pub(crate) fn extend(&mut self, other: RawResolution) {
        self.answers.extend(other.answers);
        self.errors.extend(other.errors);
    }
}

/// Extracted `(record type, value)` targets and the errors of one raw-batch query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedResolution {
    /// Extracted targets
    pub targets: BTreeSet<(RecordType, String)>,
    /// Counted failures
    pub errors: Vec<QueryError>,
}

/// Observed wildcard values per record type for one host.
pub type WildcardRecords = BTreeMap<RecordType, BTreeSet<String>>;
