// Jetton + ICO deployment on TON

pub mod address;
pub mod codec;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod lock;
pub mod message;
pub mod metadata;
pub mod node;
pub mod signer;
pub mod wallet;
pub mod wallet_v4;

// Re-export primary types for convenient access.
pub use address::{AddressError, AddressExt, BASECHAIN, MASTERCHAIN, parse_address, std_addr};
pub use codec::{
    MAX_COINS, MINT_OPCODE, MintMessage, SETUP_ICO_OPCODE, SetupIcoMessage, decode_mint,
    decode_setup_ico, encode_mint, encode_setup_ico,
};
pub use contract::{ContractCode, ContractInit, derive_address, state_init_cell};
pub use deploy::{
    DeployParams, Deployer, DeploymentBatch, DeploymentReport, SaleParams, prepare_deployment,
};
pub use error::DeployError;
pub use lock::{DeploymentLocks, SenderGuard};
pub use message::OutboundMessage;
pub use metadata::{MetadataEncoder, OnchainMetadataEncoder, TokenMetadata};
pub use node::{AccountInfo, AccountStatus, NodeClient, NodeError};
pub use signer::{MnemonicError, MnemonicSigner};
pub use wallet::{SubmissionReceipt, TransferContext, WalletClient, WalletError};
pub use wallet_v4::{TransferSigner, WalletV4};
