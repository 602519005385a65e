pub mod index;
pub mod protocol_state;
pub mod real_balance;
pub mod vault_authority;

pub use index::*;
pub use protocol_state::*;
pub use real_balance::*;
pub use vault_authority::*;
