//! Email address grammar used for `ownerEmail` and the `email` format.
//!
//! Accepts a dot-atom or quoted local part and a hostname or bracketed IP
//! literal domain. A top-level domain is not required (`ops@localhost` is
//! accepted).

use regex::Regex;
use std::sync::LazyLock;

const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 255;

static LOCAL_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r##"(?i)^(?:[a-z0-9!#$%&'*+/=?^_`{|}~\x{80}-\x{10FFFF}-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~\x{80}-\x{10FFFF}-]+)*|"(?:[^"\\\r\n]|\\.)*")$"##,
    )
    .unwrap()
});

static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9\x{80}-\x{10FFFF}](?:[a-z0-9\x{80}-\x{10FFFF}-]*[a-z0-9\x{80}-\x{10FFFF}])?(?:\.[a-z0-9\x{80}-\x{10FFFF}](?:[a-z0-9\x{80}-\x{10FFFF}-]*[a-z0-9\x{80}-\x{10FFFF}])?)*$",
    )
    .unwrap()
});

static IP_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[(?:(?:[0-9]{1,3}\.){3}[0-9]{1,3}|IPv6:[0-9a-f:.]+)\]$").unwrap()
});

/// Returns `true` if `address` is a syntactically valid email address.
pub fn is_valid_email(address: &str) -> bool {
    let Some((local, domain)) = address.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > MAX_LOCAL_PART_LEN {
        return false;
    }
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    LOCAL_PART_RE.is_match(local)
        && (HOSTNAME_RE.is_match(domain) || IP_LITERAL_RE.is_match(domain))
}
