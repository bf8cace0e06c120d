pub mod ledger;
pub mod policy;

pub use ledger::{SeatedParty, SeatingLedger};
pub use policy::{check_batch, SeatingPolicy};
