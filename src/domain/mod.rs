//! Hostname classification and parent-domain utilities.
//!
//! This module provides the name handling the resolution engine relies on.
//! Registrable domains are computed from the ICANN section of the Public
//! Suffix List, so privately-operated suffixes such as `github.io` count as
//! ordinary domains (and can therefore be probed for wildcard DNS).
//!
//! Key functions:
//! - `clean_dns_record()` - Normalizes a name (trim, strip trailing dot, lowercase)
//! - `domain_parents()` - Lists parent domains up to the registrable domain
//! - `is_dns_name()` / `is_ip()` / `is_ptr()` - Classify a host string

use std::net::IpAddr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

/// Matches DNS names embedded in free text (e.g. TXT records).
pub(crate) static DNS_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\w(?:[\w-]{0,100}\w)?\.)+(?:[xX][nN]--)?[^\W_]{1,63}\.?")
        .expect("DNS name pattern is valid")
});

static DNS_NAME_VALIDATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\w(?:[\w-]{0,100}\w)?\.)+(?:[xX][nN]--)?[^\W_]{1,63}$")
        .expect("DNS name validation pattern is valid")
});

static HOSTNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\W_](?:[\w-]{0,61}[^\W_])?$").expect("hostname pattern is valid")
});

// Reverse names generated from an address, e.g. "1-2-3-4.dyn.example.net"
static PTR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[0-9]{1,3}[-_\.]){3}[0-9]{1,3}").expect("PTR pattern is valid")
});

const LABEL_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Normalizes a DNS name or record value.
///
/// Trims whitespace, strips a trailing dot and lowercases.
///
/// # Examples
///
/// ```
/// use dns_recon::domain::clean_dns_record;
///
/// assert_eq!(clean_dns_record(" One.One.One.One. "), "one.one.one.one");
/// ```
pub fn clean_dns_record(record: &str) -> String {
    record.trim().trim_end_matches('.').to_lowercase()
}

/// Parses `host` as an IPv4 or IPv6 address.
pub fn parse_ip(host: &str) -> Option<IpAddr> {
    host.trim().trim_matches(|c| c == '[' || c == ']').parse().ok()
}

/// Whether `host` is an IP address.
pub fn is_ip(host: &str) -> bool {
    parse_ip(host).is_some()
}

/// Whether `ip` belongs to a private, loopback, link-local or documentation range.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || (a == 198 && (b & 0xfe) == 18)
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
                || (first == 0x2001 && v6.segments()[1] == 0x0db8)
        }
    }
}

/// Whether `host` is a syntactically valid DNS name (single-label hostnames included).
pub fn is_dns_name(host: &str) -> bool {
    let host = host.trim().trim_end_matches('.');
    if host.is_empty() || is_ip(host) {
        return false;
    }
    HOSTNAME_REGEX.is_match(host) || DNS_NAME_VALIDATION_REGEX.is_match(host)
}

/// Whether `host` looks like an auto-generated reverse DNS name.
pub fn is_ptr(host: &str) -> bool {
    PTR_REGEX.is_match(host)
}

/// Removes the left-most label. Names without a dot and IPs are returned unchanged.
pub fn parent_domain(host: &str) -> String {
    let host = clean_dns_record(host);
    if is_ip(&host) {
        return host;
    }
    match host.split_once('.') {
        Some((_, parent)) if !parent.is_empty() => parent.to_string(),
        _ => host,
    }
}

/// Whether `host` equals `other` or is a subdomain of it.
pub fn host_in_host(host: &str, other: &str) -> bool {
    host == other || host.ends_with(&format!(".{other}"))
}

/// Returns the ICANN public suffix of `host`, skipping private-section rules.
fn icann_suffix(host: &str) -> Option<String> {
    let mut candidate = host.to_string();
    loop {
        let suffix = psl::suffix(candidate.as_bytes())?;
        let text = std::str::from_utf8(suffix.as_bytes()).ok()?.to_string();
        if !matches!(suffix.typ(), Some(psl::Type::Private)) {
            return Some(text);
        }
        let (_, parent) = text.split_once('.')?;
        candidate = parent.to_string();
    }
}

/// Returns the registrable domain of `host` (public suffix plus one label).
///
/// Returns `None` for IP addresses and for names that are themselves a
/// public suffix.
pub fn registered_domain(host: &str) -> Option<String> {
    let host = clean_dns_record(host);
    if host.is_empty() || is_ip(&host) {
        return None;
    }
    let suffix = icann_suffix(&host)?;
    let rest = host.strip_suffix(&format!(".{suffix}"))?;
    let label = rest.rsplit('.').next().filter(|l| !l.is_empty())?;
    Some(format!("{label}.{suffix}"))
}

/// Whether `host` is a bare registrable domain, e.g. `evilcorp.com`.
pub fn is_domain(host: &str) -> bool {
    let host = clean_dns_record(host);
    registered_domain(&host).is_some_and(|d| d == host)
}

/// Whether `host` is below its registrable domain, e.g. `www.evilcorp.com`.
pub fn is_subdomain(host: &str) -> bool {
    let host = clean_dns_record(host);
    registered_domain(&host).is_some_and(|d| d != host)
}

/// Lists the parent domains of `host`, most specific first.
///
/// The walk stops at the registrable domain; public suffixes are never
/// returned. With `include_self` the host itself comes first.
///
/// # Examples
///
/// ```
/// use dns_recon::domain::domain_parents;
///
/// assert_eq!(
///     domain_parents("www.a.evilcorp.com", true),
///     vec!["www.a.evilcorp.com", "a.evilcorp.com", "evilcorp.com"]
/// );
/// ```
pub fn domain_parents(host: &str, include_self: bool) -> Vec<String> {
    let host = clean_dns_record(host);
    let mut parents = Vec::new();
    if host.is_empty() || is_ip(&host) {
        return parents;
    }
    if include_self {
        parents.push(host.clone());
    }
    let mut current = host;
    loop {
        let parent = parent_domain(&current);
        if parent == current {
            break;
        }
        if is_subdomain(&parent) {
            parents.push(parent.clone());
            current = parent;
            continue;
        }
        if is_domain(&parent) {
            parents.push(parent);
        }
        break;
    }
    parents
}

/// Random lowercase label used for wildcard probes.
pub fn rand_label(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| LABEL_ALPHABET[rng.random_range(0..LABEL_ALPHABET.len())] as char)
        .collect()
}
