//! Encoding of the two initialization messages accepted by the jetton/ICO
//! contract.
//!
//! | message  | layout                                                             |
//! |----------|--------------------------------------------------------------------|
//! | Mint     | `op:uint32` `amount:Coins` `receiver:MsgAddressInt`                |
//! | SetupICO | `op:uint32` `price:Coins` `start_time:uint64` `end_time:uint64` `hard_cap:Coins` |

use everscale_types::error::Error;
use everscale_types::models::StdAddr;
use everscale_types::num::Tokens;
use everscale_types::prelude::*;

use crate::address::AddressExt;
use crate::error::DeployError;

pub const MINT_OPCODE: u32 = 0x0ecb_e2b1;
pub const SETUP_ICO_OPCODE: u32 = 0x3d0f_6c2c;

/// Largest value a `Coins` field holds.
pub const MAX_COINS: u128 = (1u128 << 120) - 1;

/// Credit `amount` freshly minted jettons to `receiver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintMessage {
    pub amount: u128,
    pub receiver: StdAddr,
}

/// Configure the sale price, window and cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupIcoMessage {
    pub price: u128,
    pub start_time: u64,
    pub end_time: u64,
    pub hard_cap: u128,
}

impl MintMessage {
    pub fn encode(&self) -> Result<Cell, DeployError> {
        check_coins("amount", self.amount)?;
        check_receiver(&self.receiver)?;
        build(|b| {
            b.store_u32(MINT_OPCODE)?;
            store(b, &Tokens::new(self.amount))?;
            store(b, &self.receiver)
        })
    }

    pub fn decode(body: &DynCell) -> Result<Self, DeployError> {
        parse(body, MINT_OPCODE, |s| {
            Ok(Self {
                amount: Tokens::load_from(s)?.into_inner(),
                receiver: StdAddr::load_from(s)?,
            })
        })
    }
}

impl SetupIcoMessage {
    pub fn encode(&self) -> Result<Cell, DeployError> {
        if self.start_time > self.end_time {
            return Err(DeployError::InvalidWindow {
                start_time: self.start_time,
                end_time: self.end_time,
            });
        }
        check_coins("price", self.price)?;
        check_coins("hard_cap", self.hard_cap)?;
        build(|b| {
            b.store_u32(SETUP_ICO_OPCODE)?;
            store(b, &Tokens::new(self.price))?;
            b.store_u64(self.start_time)?;
            b.store_u64(self.end_time)?;
            store(b, &Tokens::new(self.hard_cap))
        })
    }

    pub fn decode(body: &DynCell) -> Result<Self, DeployError> {
        parse(body, SETUP_ICO_OPCODE, |s| {
            Ok(Self {
                price: Tokens::load_from(s)?.into_inner(),
                start_time: s.load_u64()?,
                end_time: s.load_u64()?,
                hard_cap: Tokens::load_from(s)?.into_inner(),
            })
        })
    }
}

pub fn encode_mint(amount: u128, receiver: &StdAddr) -> Result<Cell, DeployError> {
    MintMessage {
        amount,
        receiver: receiver.clone(),
    }
    .encode()
}

pub fn encode_setup_ico(
    price: u128,
    start_time: u64,
    end_time: u64,
    hard_cap: u128,
) -> Result<Cell, DeployError> {
    SetupIcoMessage {
        price,
        start_time,
        end_time,
        hard_cap,
    }
    .encode()
}

pub fn decode_mint(body: &DynCell) -> Result<MintMessage, DeployError> {
    MintMessage::decode(body)
}

pub fn decode_setup_ico(body: &DynCell) -> Result<SetupIcoMessage, DeployError> {
    SetupIcoMessage::decode(body)
}

/// Store any TL-B model into `builder`.
pub(crate) fn store<T: Store + ?Sized>(builder: &mut CellBuilder, value: &T) -> Result<(), Error> {
    value.store_into(builder, &mut Cell::empty_context())
}

pub(crate) fn check_coins(field: &str, value: u128) -> Result<(), DeployError> {
    if value > MAX_COINS {
        return Err(DeployError::Encoding(format!(
            "{field} {value} exceeds the 120-bit Coins range"
        )));
    }
    Ok(())
}

fn check_receiver(receiver: &StdAddr) -> Result<(), DeployError> {
    if !receiver.is_known_workchain() {
        return Err(DeployError::Encoding(format!(
            "receiver workchain {} is neither basechain nor masterchain",
            receiver.workchain
        )));
    }
    Ok(())
}

fn build(write: impl FnOnce(&mut CellBuilder) -> Result<(), Error>) -> Result<Cell, DeployError> {
    let mut b = CellBuilder::new();
    write(&mut b).map_err(DeployError::encoding)?;
    b.build().map_err(DeployError::encoding)
}

fn parse<T>(
    body: &DynCell,
    opcode: u32,
    read: impl FnOnce(&mut CellSlice<'_>) -> Result<T, Error>,
) -> Result<T, DeployError> {
    let mut s = body.as_slice().map_err(DeployError::encoding)?;
    let found = s.load_u32().map_err(DeployError::encoding)?;
    if found != opcode {
        return Err(DeployError::Encoding(format!(
            "expected opcode {opcode:#010x}, found {found:#010x}"
        )));
    }
    let value = read(&mut s).map_err(DeployError::encoding)?;
    if s.size_bits() != 0 || s.size_refs() != 0 {
        return Err(DeployError::Encoding(format!(
            "{} trailing bits and {} trailing references",
            s.size_bits(),
            s.size_refs()
        )));
    }
    Ok(value)
}
