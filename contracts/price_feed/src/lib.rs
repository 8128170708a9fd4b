#![cfg_attr(not(feature = "std"), no_std)]

//! # Price Feed Interface
//!
//! Shared shape of a native/USD price oracle. The FundMe ledger reads only
//! `latest_round_data().answer`; the remaining messages exist so a real
//! aggregator and the local mock expose the same surface.
//!
//! Answers are signed fixed-point integers carrying `decimals()` decimal
//! places (8 for every USD pair the ledger is deployed against).

use ink::prelude::string::String;

/// Snapshot of a single oracle round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub struct RoundData {
    pub round_id: u64,
    /// Price scaled by `decimals()`. Non-positive values are never a valid price.
    pub answer: i128,
    pub started_at: u64,
    pub updated_at: u64,
    pub answered_in_round: u64,
}

impl RoundData {
    /// A round that was never written.
    pub const EMPTY: RoundData = RoundData {
        round_id: 0,
        answer: 0,
        started_at: 0,
        updated_at: 0,
        answered_in_round: 0,
    };
}

#[ink::trait_definition]
pub trait AggregatorV3Interface {
    /// Number of decimal places in every answer.
    #[ink(message)]
    fn decimals(&self) -> u8;

    #[ink(message)]
    fn description(&self) -> String;

    #[ink(message)]
    fn version(&self) -> u32;

    /// Most recent round. May be stale; callers decide what that means.
    #[ink(message)]
    fn latest_round_data(&self) -> RoundData;

    /// Historical round, `None` if it was never recorded.
    #[ink(message)]
    fn get_round_data(&self, round_id: u64) -> Option<RoundData>;
}
