pub mod rpc;
pub mod wallet;

pub use rpc::{Network, SolanaRpc};
pub use wallet::{is_valid_pubkey, WalletError, WalletManager};
