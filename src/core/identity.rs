use std::fmt;
use std::net::IpAddr;

/// Longest fingerprint kept in an identity key
pub const MAX_FINGERPRINT_LEN: usize = 128;

/// What a visitor told us about themselves
#[derive(Debug, Clone, Default)]
pub struct VisitorClaim {
    /// Account id already verified by the account resolver
    pub account_id: Option<String>,
    /// Client-computed device fingerprint, untrusted
    pub fingerprint: Option<String>,
    pub remote_addr: Option<IpAddr>,
}

/// Resolved visitor key used for rounds, balances and draws
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Account(String),
    Anonymous {
        fingerprint: String,
        network: Option<String>,
    },
}

impl IdentityKey {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, IdentityKey::Account(_))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Account(id) => write!(f, "acct:{}", id),
            IdentityKey::Anonymous {
                fingerprint,
                network: Some(network),
            } => write!(f, "anon:{}@{}", fingerprint, network),
            IdentityKey::Anonymous {
                fingerprint,
                network: None,
            } => write!(f, "anon:{}", fingerprint),
        }
    }
}

/// Turns a visitor claim into an identity key
///
/// An authenticated account always wins. Anonymous visitors are keyed by
/// fingerprint, optionally pinned to a coarse network bucket so a copied
/// fingerprint does not carry its round to another network. An empty
/// fingerprint is accepted and simply collides with every other one.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver {
    network_bucketing: bool,
}

impl IdentityResolver {
    pub fn new(network_bucketing: bool) -> Self {
        Self { network_bucketing }
    }

    pub fn resolve(&self, claim: &VisitorClaim) -> IdentityKey {
        if let Some(account_id) = claim
            .account_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            return IdentityKey::Account(account_id.to_string());
        }

        let fingerprint: String = claim
            .fingerprint
            .as_deref()
            .unwrap_or_default()
            .trim()
            .chars()
            .take(MAX_FINGERPRINT_LEN)
            .collect();

        let network = if self.network_bucketing {
            claim.remote_addr.map(network_bucket)
        } else {
            None
        };

        IdentityKey::Anonymous { fingerprint, network }
    }
}

/// Coarse network bucket: /24 for IPv4, /48 for IPv6
pub fn network_bucket(addr: IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            format!("{}.{}.{}.0/24", a, b, c)
        }
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            format!("{:x}:{:x}:{:x}::/48", segments[0], segments[1], segments[2])
        }
    }
}
