//! Message envelopes handed to the wallet.

use everscale_types::error::Error;
use everscale_types::models::StdAddr;
use everscale_types::num::Tokens;
use everscale_types::prelude::*;
use serde::Serialize;

use crate::codec::{MAX_COINS, store};
use crate::contract::ContractInit;

/// One internal message inside a wallet transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: StdAddr,
    /// Attached value in nano units.
    pub value: u128,
    pub bounce: bool,
    pub init: Option<ContractInit>,
    pub body: Cell,
}

impl OutboundMessage {
    /// Serialize as `int_msg_info` with the init and body each stored as a
    /// reference. Source, fees and logical time are left for the validator
    /// to fill in.
    pub fn to_cell(&self) -> Result<Cell, Error> {
        if self.value > MAX_COINS {
            return Err(Error::IntOverflow);
        }
        let mut b = CellBuilder::new();
        b.store_bit_zero()?; // int_msg_info$0
        b.store_bit_one()?; // ihr_disabled
        b.store_bit(self.bounce)?;
        b.store_bit_zero()?; // bounced
        b.store_zeros(2)?; // src: addr_none
        store(&mut b, &self.to)?;
        store(&mut b, &Tokens::new(self.value))?;
        b.store_bit_zero()?; // no extra currencies
        store(&mut b, &Tokens::ZERO)?; // ihr_fee
        store(&mut b, &Tokens::ZERO)?; // fwd_fee
        b.store_u64(0)?;
        b.store_u32(0)?;

        match &self.init {
            Some(init) => {
                b.store_bit_one()?;
                b.store_bit_one()?;
                b.store_reference(init.state_init_cell()?)?;
            }
            None => b.store_bit_zero()?,
        }
        b.store_bit_one()?;
        b.store_reference(self.body.clone())?;
        b.build()
    }

    pub fn summary(&self) -> MessageSummary {
        MessageSummary {
            to: self.to.to_string(),
            value: self.value,
            bounce: self.bounce,
            has_init: self.init.is_some(),
            body_hash: self.body.repr_hash().to_string(),
        }
    }
}

/// Loggable view of an [`OutboundMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    pub to: String,
    pub value: u128,
    pub bounce: bool,
    pub has_init: bool,
    pub body_hash: String,
}

/// `ext_in_msg_info` from nowhere to `dest`, carrying `body` by reference.
pub fn external_message(dest: &StdAddr, body: Cell) -> Result<Cell, Error> {
    let mut b = CellBuilder::new();
    b.store_small_uint(0b10, 2)?;
    b.store_zeros(2)?; // src: addr_none
    store(&mut b, dest)?;
    store(&mut b, &Tokens::ZERO)?; // import_fee
    b.store_bit_zero()?; // no state init
    b.store_bit_one()?;
    b.store_reference(body)?;
    b.build()
}
