#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod price_converter;

/// # FundMe — Crowdfunding Ledger
///
/// **Role:** Accepts native-currency contributions worth at least $50 (priced
/// through an external native/USD feed), keeps a per-funder tally for the
/// current epoch, and lets the deployer drain the pot.
///
/// ```text
///   fund() ──► price feed (latest_round_data) ──► ≥ $50? ──► ledger += amount
///
///   withdraw() / cheaper_withdraw()   (owner only)
///     1. zero every funder's tally, empty the registry
///     2. transfer the free balance to the owner
///     3. transfer failed → restore 1. and return TransferFailed
/// ```
///
/// An epoch runs from deployment (or the last successful withdrawal) to the
/// next successful withdrawal. The registry may list the same funder more
/// than once per epoch; only the tally carries the amount.
///
/// The two withdrawal messages end in identical states. `cheaper_withdraw`
/// reads the registry once into memory instead of hitting storage for the
/// length and every element on each iteration.
#[ink::contract]
mod fund_me {
    use crate::price_converter;
    use ink::env::call::{build_call, ExecutionInput, Selector};
    use ink::prelude::vec::Vec;
    use ink::storage::{Mapping, StorageVec};
    use price_feed::RoundData;
    use primitive_types::U256;

    // =========================================================================
    // CONSTANTS
    // =========================================================================

    /// Minimum contribution: $50 with 18 decimals.
    pub const MINIMUM_USD: u128 = 50 * price_converter::PRECISION;

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct FundMe {
        /// Deployer; the only account allowed to withdraw.
        owner: AccountId,

        /// Native/USD aggregator.
        price_feed: AccountId,

        // ── Current epoch ─────────────────────────────────────────────────
        /// Every successful contribution appends its caller.
        funders: StorageVec<AccountId>,

        /// Cumulative contribution per funder.
        address_to_amount_funded: Mapping<AccountId, Balance>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Funded {
        #[ink(topic)]
        funder: AccountId,
        amount: Balance,
        /// 18-decimal USD value, saturated at `u128::MAX`.
        usd_value: u128,
    }

    #[ink(event)]
    pub struct Withdrawn {
        #[ink(topic)]
        owner: AccountId,
        amount: Balance,
        funders_cleared: u32,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        /// Contribution converts to less than the $50 minimum.
        InsufficientContribution,
        /// Caller is not the contract owner.
        NotOwner,
        /// Funder index is past the end of the registry.
        IndexOutOfRange,
        /// Paying the owner failed; the ledger was restored.
        TransferFailed,
        /// Cross-contract read of the price feed failed.
        PriceFeedUnavailable,
        /// Price feed answered zero or a negative price.
        InvalidPrice,
        /// Arithmetic overflow.
        Overflow,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl FundMe {
        #[ink(constructor)]
        pub fn new(price_feed: AccountId) -> Self {
            Self {
                owner: Self::env().caller(),
                price_feed,
                funders: StorageVec::new(),
                address_to_amount_funded: Mapping::default(),
            }
        }

        // =====================================================================
        // CONTRIBUTIONS
        // =====================================================================

        /// Contribute the transferred value.
        ///
        /// Fails with [`Error::InsufficientContribution`] below $50; the
        /// returned `Err` reverts the call, value included.
        #[ink(message, payable)]
        pub fn fund(&mut self) -> Result<(), Error> {
            let caller = self.env().caller();
            let amount = self.env().transferred_value();
            let price = self.latest_price()?;
            self.record_contribution(caller, amount, price)
        }

        /// Ledger half of [`Self::fund`], separate from the oracle read so it
        /// can run without a cross-contract call.
        fn record_contribution(
            &mut self,
            funder: AccountId,
            amount: Balance,
            price: U256,
        ) -> Result<(), Error> {
            let usd_value = price_converter::to_usd(amount, price).ok_or(Error::Overflow)?;
            if usd_value < U256::from(MINIMUM_USD) {
                return Err(Error::InsufficientContribution);
            }

            let funded = self
                .address_to_amount_funded
                .get(funder)
                .unwrap_or(0)
                .checked_add(amount)
                .ok_or(Error::Overflow)?;

            self.address_to_amount_funded.insert(funder, &funded);
            self.funders.push(&funder);

            self.env().emit_event(Funded {
                funder,
                amount,
                usd_value: price_converter::to_u128(usd_value).unwrap_or(u128::MAX),
            });

            Ok(())
        }

        // =====================================================================
        // WITHDRAWALS
        // =====================================================================

        /// Drain the free balance to the owner and reset the ledger.
        #[ink(message)]
        pub fn withdraw(&mut self) -> Result<(), Error> {
            self.only_owner()?;
            let cleared = self.drain_registry();
            self.pay_owner(cleared)
        }

        /// Same outcome as [`Self::withdraw`], one registry read.
        #[ink(message)]
        pub fn cheaper_withdraw(&mut self) -> Result<(), Error> {
            self.only_owner()?;
            let cleared = self.drain_registry_cached();
            self.pay_owner(cleared)
        }

        /// Walks the stored registry, re-reading its length and each slot.
        /// Returns every `(funder, amount)` pair taken, in registry order.
        fn drain_registry(&mut self) -> Vec<(AccountId, Balance)> {
            let mut cleared = Vec::new();
            let mut index = 0;
            while index < self.funders.len() {
                if let Some(funder) = self.funders.get(index) {
                    let amount = self.address_to_amount_funded.take(funder).unwrap_or(0);
                    cleared.push((funder, amount));
                }
                index += 1;
            }
            self.funders.clear();
            cleared
        }

        fn drain_registry_cached(&mut self) -> Vec<(AccountId, Balance)> {
            let funders = self.load_funders();
            let mut cleared = Vec::with_capacity(funders.len());
            for funder in funders {
                let amount = self.address_to_amount_funded.take(funder).unwrap_or(0);
                cleared.push((funder, amount));
            }
            self.funders.clear();
            cleared
        }

        fn load_funders(&self) -> Vec<AccountId> {
            let len = self.funders.len();
            (0..len).filter_map(|i| self.funders.get(i)).collect()
        }

        /// Ledger is already reset when this runs; the transfer comes last.
        fn pay_owner(&mut self, cleared: Vec<(AccountId, Balance)>) -> Result<(), Error> {
            let amount = self.withdrawable_balance();
            let transfer = self.env().transfer(self.owner, amount);
            self.settle_withdrawal(cleared, amount, transfer)
        }

        /// Commit or undo a drain depending on how the owner transfer went.
        fn settle_withdrawal(
            &mut self,
            cleared: Vec<(AccountId, Balance)>,
            amount: Balance,
            transfer: Result<(), ink::env::Error>,
        ) -> Result<(), Error> {
            if transfer.is_err() {
                self.restore(cleared);
                return Err(Error::TransferFailed);
            }

            self.env().emit_event(Withdrawn {
                owner: self.owner,
                amount,
                funders_cleared: cleared.len() as u32,
            });

            Ok(())
        }

        /// Undo a drain. A funder listed twice was taken once with its real
        /// amount and again with zero, so only non-zero amounts are written.
        fn restore(&mut self, cleared: Vec<(AccountId, Balance)>) {
            for (funder, amount) in cleared {
                self.funders.push(&funder);
                if amount > 0 {
                    self.address_to_amount_funded.insert(funder, &amount);
                }
            }
        }

        /// Free balance above the existential deposit, which the chain keeps
        /// locked on every contract account.
        fn withdrawable_balance(&self) -> Balance {
            self.env()
                .balance()
                .saturating_sub(self.env().minimum_balance())
        }

        // =====================================================================
        // PRICE FEED
        // =====================================================================

        /// Latest feed answer lifted to 18 decimals.
        fn latest_price(&self) -> Result<U256, Error> {
            let result: Result<ink::MessageResult<RoundData>, ink::env::Error> =
                build_call::<ink::env::DefaultEnvironment>()
                    .call(self.price_feed)
                    .exec_input(ExecutionInput::new(Selector::new(ink::selector_bytes!(
                        "AggregatorV3Interface::latest_round_data"
                    ))))
                    .returns::<RoundData>()
                    .try_invoke();

            Self::price_from_call(result)
        }

        fn price_from_call(
            result: Result<ink::MessageResult<RoundData>, ink::env::Error>,
        ) -> Result<U256, Error> {
            match result {
                Ok(Ok(round)) => price_converter::feed_price(round.answer).ok_or(Error::InvalidPrice),
                _ => Err(Error::PriceFeedUnavailable),
            }
        }

        fn usd_value(amount: Balance, price: U256) -> Result<Balance, Error> {
            price_converter::to_usd(amount, price)
                .and_then(price_converter::to_u128)
                .ok_or(Error::Overflow)
        }

        // =====================================================================
        // VIEW FUNCTIONS
        // =====================================================================

        /// USD value (18 decimals) of `amount` at the current feed price.
        #[ink(message)]
        pub fn get_conversion_rate(&self, amount: Balance) -> Result<Balance, Error> {
            let price = self.latest_price()?;
            Self::usd_value(amount, price)
        }

        #[ink(message)]
        pub fn get_price_feed(&self) -> AccountId {
            self.price_feed
        }

        #[ink(message)]
        pub fn get_owner(&self) -> AccountId {
            self.owner
        }

        #[ink(message)]
        pub fn get_funder(&self, index: u32) -> Result<AccountId, Error> {
            self.funders.get(index).ok_or(Error::IndexOutOfRange)
        }

        #[ink(message)]
        pub fn get_funder_count(&self) -> u32 {
            self.funders.len()
        }

        #[ink(message)]
        pub fn get_address_to_amt_funded(&self, funder: AccountId) -> Balance {
            self.address_to_amount_funded.get(funder).unwrap_or(0)
        }

        #[ink(message)]
        pub fn get_minimum_usd(&self) -> Balance {
            MINIMUM_USD
        }

        fn only_owner(&self) -> Result<(), Error> {
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            Ok(())
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================
    //
    // The off-chain engine cannot dispatch cross-contract calls, so the tests
    // drive `record_contribution` with an explicit price and credit the
    // contract account the way an accepted `fund()` call would. The full
    // `fund()` path against a deployed feed lives in `e2e_tests`.


    // =========================================================================
    // END-TO-END TESTS
    // =========================================================================
    //
    // Need a running contracts node: `cargo test --features e2e-tests`.

    #[cfg(all(test, feature = "e2e-tests"))]
    mod e2e_tests {
        use super::*;
        use ink_e2e::ContractsBackend;
        use mock_price_feed::MockPriceFeedRef;

        type E2EResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

        const ONE: Balance = price_converter::PRECISION;

        #[ink_e2e::test]
        async fn fund_reads_deployed_feed<Client: E2EBackend>(mut client: Client) -> E2EResult<()> {
            let mut feed_ctor = MockPriceFeedRef::default_usd();
            let feed = client
                .instantiate("mock_price_feed", &ink_e2e::alice(), &mut feed_ctor)
                .submit()
                .await
                .expect("mock_price_feed instantiate failed");

            let mut ctor = FundMeRef::new(feed.account_id);
            let fund_me = client
                .instantiate("fund_me", &ink_e2e::alice(), &mut ctor)
                .submit()
                .await
                .expect("fund_me instantiate failed");
            let mut call_builder = fund_me.call_builder::<FundMe>();

            // $2000 feed: one unit is worth $2000
            let rate = call_builder.get_conversion_rate(ONE);
            let res = client.call(&ink_e2e::bob(), &rate).dry_run().await?;
            assert_eq!(res.return_value(), Ok(2_000 * ONE));

            // 1 smallest unit is far below $50
            let fund = call_builder.fund();
            let res = client.call(&ink_e2e::bob(), &fund).value(1).dry_run().await?;
            assert_eq!(res.return_value(), Err(Error::InsufficientContribution));

            let fund = call_builder.fund();
            client
                .call(&ink_e2e::bob(), &fund)
                .value(ONE)
                .submit()
                .await
                .expect("fund failed");

            let bob = ink_e2e::account_id(ink_e2e::AccountKeyring::Bob);
            let funded = call_builder.get_address_to_amt_funded(bob);
            let res = client.call(&ink_e2e::alice(), &funded).dry_run().await?;
            assert_eq!(res.return_value(), ONE);

            let first = call_builder.get_funder(0);
            let res = client.call(&ink_e2e::alice(), &first).dry_run().await?;
            assert_eq!(res.return_value(), Ok(bob));

            let withdraw = call_builder.cheaper_withdraw();
            client
                .call(&ink_e2e::alice(), &withdraw)
                .submit()
                .await
                .expect("withdraw failed");

            let first = call_builder.get_funder(0);
            let res = client.call(&ink_e2e::alice(), &first).dry_run().await?;
            assert_eq!(res.return_value(), Err(Error::IndexOutOfRange));

            Ok(())
        }

        #[ink_e2e::test]
        async fn fund_rejects_non_positive_feed_answer<Client: E2EBackend>(
            mut client: Client,
        ) -> E2EResult<()> {
            let mut feed_ctor = MockPriceFeedRef::new(8, 0);
            let feed = client
                .instantiate("mock_price_feed", &ink_e2e::alice(), &mut feed_ctor)
                .submit()
                .await
                .expect("mock_price_feed instantiate failed");

            let mut ctor = FundMeRef::new(feed.account_id);
            let fund_me = client
                .instantiate("fund_me", &ink_e2e::alice(), &mut ctor)
                .submit()
                .await
                .expect("fund_me instantiate failed");
            let mut call_builder = fund_me.call_builder::<FundMe>();

            let fund = call_builder.fund();
            let res = client.call(&ink_e2e::bob(), &fund).value(ONE).dry_run().await?;
            assert_eq!(res.return_value(), Err(Error::InvalidPrice));

            Ok(())
        }

        #[ink_e2e::test]
        async fn fund_without_feed_contract_is_unavailable<Client: E2EBackend>(
            mut client: Client,
        ) -> E2EResult<()> {
            // dave holds no contract code
            let dave = ink_e2e::account_id(ink_e2e::AccountKeyring::Dave);
            let mut ctor = FundMeRef::new(dave);
            let fund_me = client
                .instantiate("fund_me", &ink_e2e::alice(), &mut ctor)
                .submit()
                .await
                .expect("fund_me instantiate failed");
            let mut call_builder = fund_me.call_builder::<FundMe>();

            let fund = call_builder.fund();
            let res = client.call(&ink_e2e::bob(), &fund).value(ONE).dry_run().await?;
            assert_eq!(res.return_value(), Err(Error::PriceFeedUnavailable));

            let rate = call_builder.get_conversion_rate(ONE);
            let res = client.call(&ink_e2e::bob(), &rate).dry_run().await?;
            assert_eq!(res.return_value(), Err(Error::PriceFeedUnavailable));

            Ok(())
        }
    }
}
