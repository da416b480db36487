//! Contract init state and deterministic address derivation.

use std::path::Path;

use anyhow::Context;
use everscale_types::error::Error;
use everscale_types::models::{StateInit, StdAddr};
use everscale_types::prelude::*;

use crate::address::{BASECHAIN, MASTERCHAIN};
use crate::codec::store;
use crate::error::DeployError;

/// Deepest cell tree the network accepts.
pub const MAX_CELL_DEPTH: u16 = 1024;

/// Compiled contract artifacts: the code cell and, for Tact contracts, the
/// system cell that the init data references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCode {
    pub code: Cell,
    pub system: Option<Cell>,
}

impl ContractCode {
    pub fn new(code: Cell) -> Self {
        Self { code, system: None }
    }

    pub fn with_system(mut self, system: Cell) -> Self {
        self.system = Some(system);
        self
    }

    /// Parse code (and optional system) bags of cells.
    pub fn from_boc(code: &[u8], system: Option<&[u8]>) -> Result<Self, DeployError> {
        let code = Boc::decode(code).map_err(DeployError::malformed)?;
        let system = system
            .map(Boc::decode)
            .transpose()
            .map_err(DeployError::malformed)?;
        Ok(Self { code, system })
    }

    /// Read the compiled artifacts from disk.
    pub fn load(code_path: &Path, system_path: Option<&Path>) -> anyhow::Result<Self> {
        let code = std::fs::read(code_path)
            .with_context(|| format!("Failed to read contract code: {}", code_path.display()))?;
        let system = system_path
            .map(|p| {
                std::fs::read(p)
                    .with_context(|| format!("Failed to read system cell: {}", p.display()))
            })
            .transpose()?;
        Self::from_boc(&code, system.as_deref())
            .with_context(|| format!("Invalid contract code: {}", code_path.display()))
    }
}

/// Code and data the contract is deployed with. Fully determines its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInit {
    pub workchain: i8,
    pub code: Cell,
    pub data: Cell,
}

impl ContractInit {
    /// Lay out the init data for `(owner, content, max_supply)`:
    /// `[^system] init:uint1=0 owner:MsgAddressInt ^content max_supply:int257`.
    pub fn new(
        workchain: i8,
        contract: &ContractCode,
        owner: &StdAddr,
        content: Cell,
        max_supply: u128,
    ) -> Result<Self, DeployError> {
        let data = init_data(contract.system.as_ref(), owner, content, max_supply)
            .map_err(DeployError::malformed)?;
        Ok(Self {
            workchain,
            code: contract.code.clone(),
            data,
        })
    }

    pub fn state_init(&self) -> StateInit {
        state_init(&self.code, &self.data)
    }

    /// The `StateInit` cell carried by deploying messages.
    pub fn state_init_cell(&self) -> Result<Cell, Error> {
        state_init_cell(&self.code, &self.data)
    }

    pub fn address(&self) -> Result<StdAddr, DeployError> {
        derive_address(self.workchain, &self.code, &self.data)
    }
}

fn init_data(
    system: Option<&Cell>,
    owner: &StdAddr,
    content: Cell,
    max_supply: u128,
) -> Result<Cell, Error> {
    let mut b = CellBuilder::new();
    if let Some(system) = system {
        b.store_reference(system.clone())?;
    }
    b.store_bit_zero()?;
    store(&mut b, owner)?;
    b.store_reference(content)?;
    // max_supply is an int257; the value is never negative.
    b.store_zeros(129)?;
    b.store_raw(&max_supply.to_be_bytes(), 128)?;
    b.build()
}

fn state_init(code: &Cell, data: &Cell) -> StateInit {
    StateInit {
        split_depth: None,
        special: None,
        code: Some(code.clone()),
        data: Some(data.clone()),
        libraries: Dict::new(),
    }
}

/// `split_depth:nothing special:nothing code:^code data:^data library:empty`.
pub fn state_init_cell(code: &Cell, data: &Cell) -> Result<Cell, Error> {
    CellBuilder::build_from(state_init(code, data))
}

/// Address of the contract deployed with `code` and `data` on `workchain`.
pub fn derive_address(workchain: i8, code: &Cell, data: &Cell) -> Result<StdAddr, DeployError> {
    if !matches!(workchain, BASECHAIN | MASTERCHAIN) {
        return Err(DeployError::MalformedInit(format!(
            "workchain {workchain} is neither basechain nor masterchain"
        )));
    }
    let depth = code.repr_depth().max(data.repr_depth()) + 1;
    if depth > MAX_CELL_DEPTH {
        return Err(DeployError::MalformedInit(format!(
            "state init depth {depth} exceeds {MAX_CELL_DEPTH}"
        )));
    }
    let state_init = state_init_cell(code, data).map_err(DeployError::malformed)?;
    Ok(StdAddr::new(workchain, *state_init.repr_hash()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::std_addr;

    fn code() -> ContractCode {
        let mut b = CellBuilder::new();
        b.store_raw(b"jetton-ico code", 15 * 8).unwrap();
        ContractCode::new(b.build().unwrap())
    }

    fn content() -> Cell {
        let mut b = CellBuilder::new();
        b.store_u8(0).unwrap();
        b.build().unwrap()
    }

    fn owner() -> StdAddr {
        std_addr(0, [0x11; 32])
    }

    #[test]
    fn identical_inputs_give_identical_init_and_address() {
        let a = ContractInit::new(0, &code(), &owner(), content(), 1_000).unwrap();
        let b = ContractInit::new(0, &code(), &owner(), content(), 1_000).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.address().unwrap(), b.address().unwrap());
    }

    #[test]
    fn any_input_change_moves_the_address() {
        let address = |contract: &ContractCode, owner: &StdAddr, supply: u128| {
            ContractInit::new(0, contract, owner, content(), supply)
                .unwrap()
                .address()
                .unwrap()
        };
        let base = address(&code(), &owner(), 1_000);
        assert_ne!(base, address(&code(), &owner(), 1_001));
        assert_ne!(base, address(&code(), &std_addr(0, [0x12; 32]), 1_000));
        assert_ne!(
            base,
            address(&code().with_system(Cell::empty_cell()), &owner(), 1_000)
        );
    }

    #[test]
    fn address_is_state_init_hash() {
        let init = ContractInit::new(0, &code(), &owner(), content(), 7).unwrap();
        let state_init = init.state_init_cell().unwrap();
        let address = init.address().unwrap();
        assert_eq!(address.address, *state_init.repr_hash());
        assert_eq!(address.workchain, 0);
        assert_eq!(
            *CellBuilder::build_from(init.state_init()).unwrap().repr_hash(),
            address.address
        );
    }

    #[test]
    fn state_init_layout() {
        let c = Cell::empty_cell();
        let state_init = state_init_cell(&c, &c).unwrap();
        assert_eq!(state_init.bit_len(), 5);
        assert_eq!(state_init.reference_count(), 2);
        let mut s = state_init.as_slice().unwrap();
        assert_eq!(s.load_small_uint(5).unwrap(), 0b00110);
    }

    #[test]
    fn init_data_layout() {
        let init = ContractInit::new(0, &code(), &owner(), content(), 42).unwrap();
        let mut s = init.data.as_slice().unwrap();
        assert!(!s.load_bit().unwrap());
        assert_eq!(StdAddr::load_from(&mut s).unwrap(), owner());
        assert_eq!(s.load_reference().unwrap().repr_hash(), content().repr_hash());
        assert!(!s.load_bit().unwrap());
        assert_eq!(s.load_u64().unwrap(), 0);
        assert_eq!(s.load_u64().unwrap(), 0);
        assert_eq!(s.load_u64().unwrap(), 0);
        assert_eq!(s.load_u64().unwrap(), 42);
        assert_eq!(s.size_bits(), 0);
        assert_eq!(s.size_refs(), 0);
    }

    #[test]
    fn system_cell_is_first_reference() {
        let system = content();
        let init = ContractInit::new(
            0,
            &code().with_system(system.clone()),
            &owner(),
            Cell::empty_cell(),
            1,
        )
        .unwrap();
        assert_eq!(init.data.reference_count(), 2);
        assert_eq!(
            init.data.reference(0).unwrap().repr_hash(),
            system.repr_hash()
        );
    }

    #[test]
    fn unknown_workchain_is_malformed() {
        let c = Cell::empty_cell();
        assert!(matches!(
            derive_address(4, &c, &c),
            Err(DeployError::MalformedInit(_))
        ));
    }

    #[test]
    fn too_deep_code_is_malformed() {
        let mut deep = Cell::empty_cell();
        for _ in 0..MAX_CELL_DEPTH {
            let mut b = CellBuilder::new();
            b.store_reference(deep).unwrap();
            deep = b.build().unwrap();
        }
        let err = derive_address(0, &deep, &Cell::empty_cell()).unwrap_err();
        assert!(matches!(err, DeployError::MalformedInit(ref m) if m.contains("depth")));
    }

    #[test]
    fn code_loads_from_boc_files() {
        let dir = tempfile::tempdir().unwrap();
        let code_path = dir.path().join("contract.code.boc");
        let system_path = dir.path().join("contract.system.boc");
        std::fs::write(&code_path, Boc::encode(&code().code)).unwrap();
        std::fs::write(&system_path, Boc::encode(Cell::empty_cell())).unwrap();

        let loaded = ContractCode::load(&code_path, Some(&system_path)).unwrap();
        assert_eq!(loaded.code, code().code);
        assert_eq!(loaded.system, Some(Cell::empty_cell()));
    }

    #[test]
    fn garbage_code_is_malformed() {
        assert!(matches!(
            ContractCode::from_boc(b"not a boc", None),
            Err(DeployError::MalformedInit(_))
        ));
    }

    #[test]
    fn oversized_cell_count_is_malformed_not_fatal() {
        // magic, flags (4-byte refs, 1-byte offsets), then cell_count = u32::MAX
        let mut boc = vec![0xb5, 0xee, 0x9c, 0x72, 0x04, 0x01, 0xff, 0xff, 0xff, 0xff];
        boc.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
        boc.extend_from_slice(&[0x00; 6]);
        assert!(matches!(
            ContractCode::from_boc(&boc, None),
            Err(DeployError::MalformedInit(_))
        ));
        assert!(matches!(
            ContractCode::from_boc(&Boc::encode(&code().code), Some(&boc)),
            Err(DeployError::MalformedInit(_))
        ));
    }
}
