//! Canonical on-chain identifiers.
//!
//! Addresses and selectors are stored as fixed-size byte arrays, so two
//! spellings that differ only in hex case compare equal by construction.
//! Rendering is always lower-case `0x`-prefixed hex.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

/// `transfer(address,uint256)`
pub const TRANSFER_SELECTOR: Selector = Selector([0xa9, 0x05, 0x9c, 0xbb]);
/// `approve(address,uint256)`
pub const APPROVE_SELECTOR: Selector = Selector([0x09, 0x5e, 0xa7, 0xb3]);

pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
pub const APPROVE_SIGNATURE: &str = "approve(address,uint256)";

/// Signature for the two token selectors the shorthand entries expand to.
pub fn known_signature(selector: Selector) -> Option<&'static str> {
    if selector == TRANSFER_SELECTOR {
        Some(TRANSFER_SIGNATURE)
    } else if selector == APPROVE_SELECTOR {
        Some(APPROVE_SIGNATURE)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Shape errors
// ---------------------------------------------------------------------------

/// Why a hex field failed to parse. Callers attach tag/field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HexFieldError {
    MissingPrefix { raw: String },
    WrongLength { raw: String, expected: usize, got: usize },
    NotHex { raw: String },
}

impl fmt::Display for HexFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexFieldError::MissingPrefix { raw } => write!(f, "missing 0x prefix: '{raw}'"),
            HexFieldError::WrongLength { raw, expected, got } => write!(
                f,
                "expected 0x + {expected} hex chars, got {got}: '{raw}'"
            ),
            HexFieldError::NotHex { raw } => write!(f, "non-hex characters: '{raw}'"),
        }
    }
}

impl std::error::Error for HexFieldError {}

fn parse_fixed_hex<const N: usize>(raw: &str) -> Result<[u8; N], HexFieldError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| HexFieldError::MissingPrefix {
            raw: raw.to_string(),
        })?;

    if digits.len() != N * 2 {
        return Err(HexFieldError::WrongLength {
            raw: raw.to_string(),
            expected: N * 2,
            got: digits.len(),
        });
    }

    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out).map_err(|_| HexFieldError::NotHex {
        raw: raw.to_string(),
    })?;
    Ok(out)
}

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// 20-byte account / contract address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Sentinel produced by padding or malformed logs. Never a real target.
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Strict parse: `0x` followed by exactly 40 hex chars, any case.
    pub fn parse(raw: &str) -> Result<Self, HexFieldError> {
        parse_fixed_hex::<20>(raw).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = HexFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical string form of an address. Idempotent and case-insensitive.
pub fn normalize_address(raw: &str) -> Result<String, HexFieldError> {
    Address::parse(raw).map(|a| a.to_string())
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// 4-byte function selector.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Selector([u8; 4]);

impl Selector {
    /// Sentinel produced by padding or malformed logs.
    pub const ZERO: Selector = Selector([0u8; 4]);

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Strict parse: `0x` followed by exactly 8 hex chars, any case.
    pub fn parse(raw: &str) -> Result<Self, HexFieldError> {
        parse_fixed_hex::<4>(raw).map(Self)
    }

    /// First four bytes of `keccak256(signature)`, e.g. `transfer(address,uint256)`.
    pub fn from_signature(signature: &str) -> Self {
        let digest = keccak256(signature.as_bytes());
        Self([digest[0], digest[1], digest[2], digest[3]])
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Selector {
    type Err = HexFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical string form of a selector. Idempotent and case-insensitive.
pub fn normalize_selector(raw: &str) -> Result<String, HexFieldError> {
    Selector::parse(raw).map(|s| s.to_string())
}

// ---------------------------------------------------------------------------
// Serde: always as canonical strings
// ---------------------------------------------------------------------------

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                <$ty>::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(Address);
string_serde!(Selector);

// ---------------------------------------------------------------------------
// CallKey
// ---------------------------------------------------------------------------

/// The (target, selector) pair every permission is keyed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallKey {
    pub target: Address,
    pub selector: Selector,
}

impl CallKey {
    pub const fn new(target: Address, selector: Selector) -> Self {
        Self { target, selector }
    }

    /// True when either half is the all-zero sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.target.is_zero() || self.selector.is_zero()
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.selector)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
