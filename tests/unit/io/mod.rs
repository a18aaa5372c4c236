pub mod image;
pub mod ledger;
pub mod output;
