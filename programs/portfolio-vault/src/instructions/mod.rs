pub mod deposit;
pub mod initialize;
pub mod initialize_index;
pub mod open_balance;
pub mod sub_transfer;
pub mod transfer;
pub mod withdraw;

pub use deposit::*;
pub use initialize::*;
pub use initialize_index::*;
pub use open_balance::*;
pub use sub_transfer::*;
pub use transfer::*;
pub use withdraw::*;
