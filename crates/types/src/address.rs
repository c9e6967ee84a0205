use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of raw bytes behind an identity.
pub const ADDRESS_BYTES: usize = 32;
/// Leading character of the textual form.
pub const ADDRESS_PREFIX: char = 'q';

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("identity must start with 'q'")]
    MissingPrefix,
    #[error("identity payload must be 32 hex-encoded bytes")]
    Payload(#[from] hex::FromHexError),
}

/// Identity of a participant, an admin, or a governance resource (token mint).
///
/// Written as `q` followed by 64 hex digits, in records and scripts alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_BYTES]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload = s
            .strip_prefix(ADDRESS_PREFIX)
            .ok_or(AddressError::MissingPrefix)?;
        let mut bytes = [0u8; ADDRESS_BYTES];
        hex::decode_to_slice(payload, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ADDRESS_PREFIX}{}", hex::encode(self.0))
    }
}

/// Token mint whose holdings weigh votes in a domain.
pub type ResourceId = Address;

/// Deterministic identity of a governance domain.
///
/// Derived from the admin identity alone, so one admin can configure at most
/// one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DomainId(#[serde(with = "hex::serde")] pub [u8; 32]);

impl DomainId {
    pub const SEED_PREFIX: &'static [u8] = b"governance";

    /// Derive the domain identity for an admin.
    pub fn derive(admin: &Address) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(Self::SEED_PREFIX);
        hasher.update(admin.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
