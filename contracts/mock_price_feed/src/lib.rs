#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub use self::mock_price_feed::{MockPriceFeed, MockPriceFeedRef};

/// # Mock Price Feed
///
/// Local stand-in for a native/USD aggregator. Deployed on development
/// chains so FundMe has something to read; anyone may push a new answer.
///
/// Every update opens a new round and keeps its answer, timestamp and
/// start time for later `get_round_data` queries.
#[ink::contract]
mod mock_price_feed {
    use ink::prelude::string::String;
    use ink::storage::Mapping;
    use price_feed::{AggregatorV3Interface, RoundData};

    // =========================================================================
    // CONSTANTS
    // =========================================================================

    /// Decimal places used by USD pairs.
    pub const DECIMALS: u8 = 8;

    /// $2000 per native unit at 8 decimals.
    pub const INITIAL_ANSWER: i128 = 200_000_000_000;

    pub const VERSION: u32 = 0;

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct MockPriceFeed {
        decimals: u8,
        latest_answer: i128,
        latest_timestamp: u64,
        latest_round: u64,

        // ── Round history ────────────────────────────────────────────────
        answers: Mapping<u64, i128>,
        timestamps: Mapping<u64, u64>,
        started_at: Mapping<u64, u64>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct AnswerUpdated {
        #[ink(topic)]
        current: i128,
        #[ink(topic)]
        round_id: u64,
        updated_at: u64,
    }

    #[ink(event)]
    pub struct NewRound {
        #[ink(topic)]
        round_id: u64,
        #[ink(topic)]
        started_by: AccountId,
        started_at: u64,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl MockPriceFeed {
        #[ink(constructor)]
        pub fn new(decimals: u8, initial_answer: i128) -> Self {
            let mut feed = Self {
                decimals,
                latest_answer: 0,
                latest_timestamp: 0,
                latest_round: 0,
                answers: Mapping::default(),
                timestamps: Mapping::default(),
                started_at: Mapping::default(),
            };
            feed.update_answer(initial_answer);
            feed
        }

        /// Dev-chain defaults: 8 decimals at $2000.
        #[ink(constructor)]
        pub fn default_usd() -> Self {
            Self::new(DECIMALS, INITIAL_ANSWER)
        }

        /// Publish `answer` as a new round stamped with the current block time.
        #[ink(message)]
        pub fn update_answer(&mut self, answer: i128) {
            let now = self.env().block_timestamp();
            let round_id = self.latest_round.saturating_add(1);

            self.write_round(round_id, answer, now, now);

            self.env().emit_event(AnswerUpdated {
                current: answer,
                round_id,
                updated_at: now,
            });
            self.env().emit_event(NewRound {
                round_id,
                started_by: self.env().caller(),
                started_at: now,
            });
        }

        /// Overwrite the latest round with explicit values.
        #[ink(message)]
        pub fn update_round_data(
            &mut self,
            round_id: u64,
            answer: i128,
            timestamp: u64,
            started_at: u64,
        ) {
            self.write_round(round_id, answer, timestamp, started_at);
        }

        #[ink(message)]
        pub fn latest_answer(&self) -> i128 {
            self.latest_answer
        }

        #[ink(message)]
        pub fn latest_timestamp(&self) -> u64 {
            self.latest_timestamp
        }

        #[ink(message)]
        pub fn latest_round(&self) -> u64 {
            self.latest_round
        }

        fn write_round(&mut self, round_id: u64, answer: i128, timestamp: u64, started_at: u64) {
            self.latest_round = round_id;
            self.latest_answer = answer;
            self.latest_timestamp = timestamp;
            self.answers.insert(round_id, &answer);
            self.timestamps.insert(round_id, &timestamp);
            self.started_at.insert(round_id, &started_at);
        }

        fn round(&self, round_id: u64) -> Option<RoundData> {
            let answer = self.answers.get(round_id)?;
            Some(RoundData {
                round_id,
                answer,
                started_at: self.started_at.get(round_id).unwrap_or(0),
                updated_at: self.timestamps.get(round_id).unwrap_or(0),
                answered_in_round: round_id,
            })
        }
    }

    impl AggregatorV3Interface for MockPriceFeed {
        #[ink(message)]
        fn decimals(&self) -> u8 {
            self.decimals
        }

        #[ink(message)]
        fn description(&self) -> String {
            String::from("mock_price_feed: native / USD")
        }

        #[ink(message)]
        fn version(&self) -> u32 {
            VERSION
        }

        #[ink(message)]
        fn latest_round_data(&self) -> RoundData {
            self.round(self.latest_round).unwrap_or(RoundData::EMPTY)
        }

        #[ink(message)]
        fn get_round_data(&self, round_id: u64) -> Option<RoundData> {
            self.round(round_id)
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
