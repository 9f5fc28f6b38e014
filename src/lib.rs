//! Berth is the contract-formation core of a decentralized storage
//! marketplace renter: it negotiates storage agreements with hosts, funds
//! them on the ledger, and tracks the resulting obligations against an
//! allowance.

pub mod contractor;
pub mod dialer;
pub mod host;
pub mod ledger;
pub mod logging;
pub mod persist;
pub mod wallet;
pub mod wire;

pub use contractor::{Allowance, Contract, Contractor, FormationError};
