//! Textual forms of standard addresses.

use everscale_types::cell::HashBytes;
use everscale_types::models::{Base64StdAddrFlags, DisplayBase64StdAddr, StdAddr, StdAddrFormat};
use serde::Serializer;

pub const BASECHAIN: i8 = 0;
pub const MASTERCHAIN: i8 = -1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address {input:?}: {reason}")]
pub struct AddressError {
    pub input: String,
    pub reason: String,
}

/// `addr_std` without anycast.
pub const fn std_addr(workchain: i8, hash: [u8; 32]) -> StdAddr {
    StdAddr {
        anycast: None,
        workchain,
        address: HashBytes(hash),
    }
}

/// Accepts the raw form (`0:<hex>`) and both base64 alphabets.
pub fn parse_address(input: &str) -> Result<StdAddr, AddressError> {
    StdAddr::from_str_ext(input.trim(), StdAddrFormat::any())
        .map(|(address, _)| address)
        .map_err(|e| AddressError {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

pub trait AddressExt {
    /// Whether the workchain is one the network actually runs.
    fn is_known_workchain(&self) -> bool;

    /// User-friendly base64url form.
    fn to_friendly(&self, bounceable: bool, testnet: bool) -> String;
}

impl AddressExt for StdAddr {
    fn is_known_workchain(&self) -> bool {
        self.anycast.is_none() && matches!(self.workchain, BASECHAIN | MASTERCHAIN)
    }

    fn to_friendly(&self, bounceable: bool, testnet: bool) -> String {
        DisplayBase64StdAddr {
            addr: self,
            flags: Base64StdAddrFlags {
                testnet,
                base64_url: true,
                bounceable,
            },
        }
        .to_string()
    }
}

/// Serialize as the raw form.
pub fn serialize_raw<S: Serializer>(address: &StdAddr, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(address)
}
