use crate::backend::{Connector, TokenBackend};
use alloy_primitives::{Address, TxHash, U256};
use balance::{Balance, BalanceQuery, Monitor, TokenInfo};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tokio::sync::Notify;

pub const ONE_TOKEN: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

pub fn tokens(amount: u64) -> U256 {
    U256::from(amount) * ONE_TOKEN
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Address, U256>,
    native: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    submitted: usize,
    fail_reads: bool,
}

/// In-memory token contract seen through a connected account.
#[derive(Debug, Clone)]
pub struct Ledger {
    account: Address,
    token: Address,
    inner: Arc<Mutex<LedgerState>>,
    transfer_gate: Option<Arc<Notify>>,
    /// Decimals the contract reports, which may differ from the configured 18
    token_decimals: u8,
}

impl Ledger {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            token: Address::repeat_byte(0xee),
            inner: Arc::default(),
            transfer_gate: None,
            token_decimals: 18,
        }
    }

    pub fn with_balance(self, holder: Address, amount: U256) -> Self {
        self.inner.lock().unwrap().balances.insert(holder, amount);
        self
    }

    pub fn with_native(self, holder: Address, amount: U256) -> Self {
        self.inner.lock().unwrap().native.insert(holder, amount);
        self
    }

    pub const fn with_token_decimals(mut self, decimals: u8) -> Self {
        self.token_decimals = decimals;
        self
    }

    /// Transfers wait for a permit on `gate` before touching the ledger.
    pub fn with_transfer_gate(mut self, gate: Arc<Notify>) -> Self {
        self.transfer_gate = Some(gate);
        self
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.inner
            .lock()
            .unwrap()
            .balances
            .get(&holder)
            .copied()
            .unwrap_or_default()
    }

    /// Number of transactions that reached the ledger.
    pub fn submitted(&self) -> usize {
        self.inner.lock().unwrap().submitted
    }

    fn receipt() -> action::Result {
        action::Result {
            tx_hash: TxHash::repeat_byte(0xab),
            block_number: Some(1),
            gas_used: None,
        }
    }
}

impl Monitor for Ledger {
    async fn query_balance(&self, query: BalanceQuery) -> eyre::Result<Balance> {
        let state = self.inner.lock().unwrap();
        if state.fail_reads {
            eyre::bail!("rpc unavailable");
        }

        let balance = match query {
            BalanceQuery::ERC20Balance { token, holder } => Balance {
                holder,
                asset: token,
                amount: state.balances.get(&holder).copied().unwrap_or_default(),
            },
            BalanceQuery::NativeBalance { address } => Balance {
                holder: address,
                asset: Address::ZERO,
                amount: state.native.get(&address).copied().unwrap_or_default(),
            },
            BalanceQuery::Allowance {
                token,
                owner,
                spender,
            } => Balance {
                holder: owner,
                asset: token,
                amount: state
                    .allowances
                    .get(&(owner, spender))
                    .copied()
                    .unwrap_or_default(),
            },
        };

        Ok(balance)
    }
}

impl TokenBackend for Ledger {
    fn account(&self) -> Address {
        self.account
    }

    fn chain_id(&self) -> u64 {
        11155111
    }

    fn token(&self) -> Address {
        self.token
    }

    fn decimals(&self) -> u8 {
        18
    }

    async fn token_info(&self) -> eyre::Result<TokenInfo> {
        if self.inner.lock().unwrap().fail_reads {
            eyre::bail!("rpc unavailable");
        }

        Ok(TokenInfo {
            address: self.token,
            name: "Test Token".to_string(),
            symbol: "TST".to_string(),
            decimals: self.token_decimals,
            total_supply: tokens(1_000_000),
        })
    }

    async fn transfer(&self, recipient: Address, amount: U256) -> eyre::Result<action::Result> {
        if let Some(gate) = &self.transfer_gate {
            gate.notified().await;
        }

        let mut state = self.inner.lock().unwrap();
        state.submitted += 1;

        let balance = state.balances.get(&self.account).copied().unwrap_or_default();
        if balance < amount {
            eyre::bail!("execution reverted");
        }

        state.balances.insert(self.account, balance - amount);
        *state.balances.entry(recipient).or_default() += amount;

        Ok(Self::receipt())
    }

    async fn approve(&self, spender: Address, amount: U256) -> eyre::Result<action::Result> {
        let mut state = self.inner.lock().unwrap();
        state.submitted += 1;
        state.allowances.insert((self.account, spender), amount);

        Ok(Self::receipt())
    }
}

/// Wallet that hands out a ledger, or refuses like a user closing the prompt.
#[derive(Debug)]
pub struct MockConnector {
    ledger: Option<Ledger>,
    attempts: AtomicUsize,
}

impl MockConnector {
    pub fn accepting(ledger: Ledger) -> Self {
        Self {
            ledger: Some(ledger),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            ledger: None,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    type Backend = Ledger;

    async fn connect(&self) -> eyre::Result<Ledger> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match &self.ledger {
            Some(ledger) => Ok(ledger.clone()),
            None => eyre::bail!("User rejected the request"),
        }
    }
}
