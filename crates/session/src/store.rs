use crate::{
    backend::{Connector, TokenBackend},
    error::{Notification, SessionError},
    input::parse_address,
    state::{ActionKind, AllowanceView, ConnectionInfo, SessionState, Update, WalletView},
};
use alloy_primitives::Address;
use balance::{
    units::{format_native_amount, format_token_amount, parse_token_amount},
    BalanceQuery, Monitor, TokenInfo,
};
use eyre::WrapErr;
use tokio::sync::{mpsc, watch, OnceCell};
use tracing::{debug, info, warn};

/// A wallet session over a single token.
///
/// Operations take `&self` and may overlap; the published [`SessionState`]
/// is only ever replaced by applying an [`Update`].
pub struct Session<C: Connector> {
    connector: C,
    backend: OnceCell<C::Backend>,
    state: watch::Sender<SessionState>,
    notifications: mpsc::UnboundedSender<Notification>,
}

/// Clears the pending flag of an action when dropped.
struct InFlight<'a> {
    state: &'a watch::Sender<SessionState>,
    kind: ActionKind,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let kind = self.kind;
        self.state
            .send_modify(|state| *state = state.apply(Update::ActionFinished(kind)));
    }
}

impl<C: Connector> Session<C> {
    /// Create a disconnected session and the receiver of its notifications.
    pub fn new(connector: C) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notifications, receiver) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(SessionState::default());

        let session = Self {
            connector,
            backend: OnceCell::new(),
            state,
            notifications,
        };

        (session, receiver)
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.backend.initialized()
    }

    /// Connect the wallet, then load token metadata and balances.
    ///
    /// Once connected, further calls return the existing connection.
    pub async fn connect(&self) -> Result<ConnectionInfo, SessionError> {
        if let Some(backend) = self.backend.get() {
            debug!(address = %backend.account(), "Wallet already connected");
            return Ok(connection_of(backend));
        }

        let backend = match self
            .backend
            .get_or_try_init(|| self.connector.connect())
            .await
        {
            Ok(backend) => backend,
            Err(err) => return Err(self.fail(SessionError::Connection(err))),
        };

        let connection = connection_of(backend);
        self.update(Update::Connected(connection));
        info!(
            address = %connection.address,
            chain_id = connection.chain_id,
            "Session connected."
        );

        match backend.token_info().await {
            Ok(token) => {
                if !decimals_agree(backend.decimals(), &token) {
                    warn!(
                        token = %token.address,
                        configured = backend.decimals(),
                        reported = token.decimals,
                        "Token decimals differ from the configured value"
                    );
                }
                self.update(Update::TokenInfoLoaded(token));
            }
            Err(err) => warn!(error = %err, "Failed to read token metadata"),
        }

        if let Err(err) = self.refresh(backend).await {
            warn!(error = %err, "Initial balance refresh failed");
        }

        Ok(connection)
    }

    /// Re-read the connected account's token and native balances.
    ///
    /// Failures are logged and leave the displayed balances untouched.
    pub async fn refresh_balances(&self) -> Result<(), SessionError> {
        let backend = self.backend()?;
        self.refresh(backend).await.inspect_err(|err| {
            warn!(error = %err, "Balance refresh failed");
        })
    }

    /// Transfer `amount` tokens to `recipient`, then refresh balances.
    pub async fn transfer(
        &self,
        recipient: &str,
        amount: &str,
    ) -> Result<action::Result, SessionError> {
        let result = self
            .submit(ActionKind::Transfer, recipient, amount)
            .await
            .map_err(|err| self.fail(err))?;

        info!(tx_hash = %result.tx_hash, "Transfer successful.");
        self.notify(Notification::Success("Transfer successful".to_string()));

        if let Err(err) = self.refresh_balances().await {
            debug!(error = %err, "Balances not refreshed after transfer");
        }

        Ok(result)
    }

    /// Allow `spender` to move `amount` tokens from the connected account.
    pub async fn approve(
        &self,
        spender: &str,
        amount: &str,
    ) -> Result<action::Result, SessionError> {
        let result = self
            .submit(ActionKind::Approve, spender, amount)
            .await
            .map_err(|err| self.fail(err))?;

        info!(tx_hash = %result.tx_hash, "Approval successful.");
        self.notify(Notification::Success("Approval successful".to_string()));

        Ok(result)
    }

    /// Read how much `spender` may move on behalf of the connected account.
    pub async fn check_allowance(&self, spender: &str) -> Result<AllowanceView, SessionError> {
        self.read_allowance(spender)
            .await
            .map_err(|err| self.fail(err))
    }

    /// Read the balances of any wallet without touching the connected
    /// account's own.
    pub async fn lookup_wallet(&self, address: &str) -> Result<WalletView, SessionError> {
        self.read_wallet(address)
            .await
            .map_err(|err| self.fail(err))
    }

    /// Read the token's name, symbol, decimals and total supply.
    pub async fn token_info(&self) -> Result<TokenInfo, SessionError> {
        let result = match self.backend() {
            Ok(backend) => backend.token_info().await.map_err(SessionError::Read),
            Err(err) => Err(err),
        };

        let token = result.map_err(|err| self.fail(err))?;
        self.update(Update::TokenInfoLoaded(token.clone()));
        Ok(token)
    }

    fn backend(&self) -> Result<&C::Backend, SessionError> {
        self.backend.get().ok_or(SessionError::NotConnected)
    }

    fn update(&self, update: Update) {
        self.state.send_if_modified(|state| {
            let next = state.apply(update);
            if next == *state {
                return false;
            }
            *state = next;
            true
        });
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }

    fn fail(&self, err: SessionError) -> SessionError {
        warn!(error = %err, "{}", err.user_message());
        self.notify(Notification::from(&err));
        err
    }

    /// Raise the pending flag of `kind`, or fail if it is already raised.
    fn begin(&self, kind: ActionKind) -> Result<InFlight<'_>, SessionError> {
        let mut outcome = Err(SessionError::NotConnected);

        self.state.send_if_modified(|state| {
            if state.pending.is_pending(kind) {
                outcome = Err(SessionError::Busy(kind));
                return false;
            }

            let next = state.apply(Update::ActionStarted(kind));
            if !next.pending.is_pending(kind) {
                return false;
            }

            *state = next;
            outcome = Ok(());
            true
        });

        outcome.map(|()| InFlight {
            state: &self.state,
            kind,
        })
    }

    async fn refresh(&self, backend: &C::Backend) -> Result<(), SessionError> {
        let (token_balance, native_balance) = read_balances(backend, backend.account())
            .await
            .map_err(SessionError::Read)?;

        self.update(Update::BalancesRefreshed {
            token_balance,
            native_balance,
        });

        Ok(())
    }

    async fn submit(
        &self,
        kind: ActionKind,
        counterparty: &str,
        amount: &str,
    ) -> Result<action::Result, SessionError> {
        let backend = self.backend()?;
        let _in_flight = self.begin(kind)?;

        execute(backend, kind, counterparty, amount)
            .await
            .map_err(|cause| SessionError::Transaction {
                action: kind,
                cause,
            })
    }

    async fn read_allowance(&self, spender: &str) -> Result<AllowanceView, SessionError> {
        let backend = self.backend()?;
        let spender = parse_address(spender)
            .wrap_err("Invalid spender address")
            .map_err(SessionError::Read)?;
        let owner = backend.account();

        let allowance = backend
            .query_balance(BalanceQuery::Allowance {
                token: backend.token(),
                owner,
                spender,
            })
            .await
            .map_err(SessionError::Read)?;

        let view = AllowanceView {
            owner,
            spender,
            amount: format_token_amount(allowance.amount, backend.decimals()),
        };
        self.update(Update::AllowanceChecked(view.clone()));

        Ok(view)
    }

    async fn read_wallet(&self, address: &str) -> Result<WalletView, SessionError> {
        let backend = self.backend()?;
        let address = parse_address(address)
            .wrap_err("Invalid wallet address")
            .map_err(SessionError::Lookup)?;

        let (token_balance, native_balance) = read_balances(backend, address)
            .await
            .map_err(SessionError::Lookup)?;

        let view = WalletView {
            address,
            token_balance,
            native_balance,
        };
        self.update(Update::WalletLookedUp(view.clone()));

        Ok(view)
    }
}

/// Whether the contract's own decimals match the configured ones.
const fn decimals_agree(configured: u8, token: &TokenInfo) -> bool {
    configured == token.decimals
}

fn connection_of<B: TokenBackend>(backend: &B) -> ConnectionInfo {
    ConnectionInfo {
        address: backend.account(),
        chain_id: backend.chain_id(),
    }
}

/// Token and native balance of `holder`, formatted for display.
async fn read_balances<B: TokenBackend>(
    backend: &B,
    holder: Address,
) -> eyre::Result<(String, String)> {
    let (token, native) = tokio::try_join!(
        backend.query_balance(BalanceQuery::ERC20Balance {
            token: backend.token(),
            holder,
        }),
        backend.query_balance(BalanceQuery::NativeBalance { address: holder }),
    )?;

    Ok((
        format_token_amount(token.amount, backend.decimals()),
        format_native_amount(native.amount),
    ))
}

/// Parse the form inputs and submit the transaction.
///
/// Inputs are validated before anything is sent to the wallet.
async fn execute<B: TokenBackend>(
    backend: &B,
    kind: ActionKind,
    counterparty: &str,
    amount: &str,
) -> eyre::Result<action::Result> {
    let counterparty = parse_address(counterparty)
        .wrap_err_with(|| format!("Invalid address {counterparty:?}"))?;
    let amount = parse_token_amount(amount, backend.decimals())
        .wrap_err_with(|| format!("Invalid amount {amount:?}"))?;

    match kind {
        ActionKind::Transfer => backend.transfer(counterparty, amount).await,
        ActionKind::Approve => backend.approve(counterparty, amount).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{tokens, Ledger, MockConnector};
    use alloy_primitives::U256;
    use std::sync::Arc;
    use tokio::sync::Notify;

    const ACCOUNT: Address = Address::repeat_byte(0x11);
    const RECIPIENT: &str = "0x2222222222222222222222222222222222222222";
    const SPENDER: &str = "0x3333333333333333333333333333333333333333";

    fn funded_ledger() -> Ledger {
        Ledger::new(ACCOUNT)
            .with_balance(ACCOUNT, tokens(100))
            .with_native(ACCOUNT, U256::from(10u64).pow(U256::from(18)))
    }

    type Connected = (Session<MockConnector>, mpsc::UnboundedReceiver<Notification>);

    async fn connected(ledger: Ledger) -> Connected {
        let (session, notifications) = Session::new(MockConnector::accepting(ledger));
        session.connect().await.unwrap();
        (session, notifications)
    }

    #[tokio::test]
    async fn test_connect_failure_keeps_defaults() {
        let (session, mut notifications) = Session::new(MockConnector::rejecting());

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::Connection(_)));
        assert_eq!(session.state(), SessionState::default());
        assert!(!session.is_connected());

        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::Failure(
                "Error connecting to wallet. Please check your wallet connection.".to_string()
            )
        );
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_loads_balances_and_metadata() {
        let (session, mut notifications) = connected(funded_ledger()).await;

        let state = session.state();
        assert_eq!(state.connection.unwrap().address, ACCOUNT);
        assert_eq!(state.connection.unwrap().chain_id, 11155111);
        assert_eq!(state.token_balance, "100");
        assert_eq!(state.native_balance, "1.000000");
        assert_eq!(state.token.unwrap().symbol, "TST");
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connect_with_mismatched_decimals_keeps_configured() {
        let ledger = funded_ledger().with_token_decimals(6);
        let (session, mut notifications) = connected(ledger).await;

        let state = session.state();
        let token = state.token.unwrap();
        assert_eq!(token.decimals, 6);
        assert!(!decimals_agree(18, &token));
        assert!(decimals_agree(6, &token));
        assert_eq!(state.token_balance, "100");
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_second_connect_reuses_wallet() {
        let (session, _notifications) = connected(funded_ledger()).await;

        let connection = session.connect().await.unwrap();
        assert_eq!(connection.address, ACCOUNT);
        assert_eq!(session.connector.attempts(), 1);
    }

    #[tokio::test]
    async fn test_transfer_refreshes_balance() {
        let ledger = funded_ledger();
        let (session, mut notifications) = connected(ledger.clone()).await;

        session.transfer(RECIPIENT, "10").await.unwrap();

        assert_eq!(session.state().token_balance, "90");
        assert_eq!(ledger.balance_of(RECIPIENT.parse().unwrap()), tokens(10));
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::Success("Transfer successful".to_string())
        );
        assert!(!session.state().pending.transfer);
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_before_submission() {
        let ledger = funded_ledger();
        let (session, mut notifications) = connected(ledger.clone()).await;

        let err = session.transfer("0x1234", "10").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transaction {
                action: ActionKind::Transfer,
                ..
            }
        ));
        assert_eq!(ledger.submitted(), 0);
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::Failure("Transfer failed".to_string())
        );
        assert_eq!(session.state().token_balance, "100");
        assert!(!session.state().pending.transfer);
    }

    #[tokio::test]
    async fn test_invalid_amount_fails_before_submission() {
        let ledger = funded_ledger();
        let (session, _notifications) = connected(ledger.clone()).await;

        assert!(session.transfer(RECIPIENT, "1.2.3").await.is_err());
        assert!(session.transfer(RECIPIENT, "-5").await.is_err());
        assert!(session.approve(SPENDER, "").await.is_err());
        assert_eq!(ledger.submitted(), 0);
    }

    #[tokio::test]
    async fn test_rejected_transfer_keeps_balance() {
        let (session, mut notifications) = connected(funded_ledger()).await;

        assert!(session.transfer(RECIPIENT, "150").await.is_err());
        assert_eq!(session.state().token_balance, "100");
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::Failure("Transfer failed".to_string())
        );
    }

    #[tokio::test]
    async fn test_actions_require_connection() {
        let (session, mut notifications) =
            Session::new(MockConnector::accepting(funded_ledger()));

        let err = session.transfer(RECIPIENT, "1").await.unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::Failure("Wallet not connected".to_string())
        );
        assert_eq!(session.state(), SessionState::default());
    }

    #[tokio::test]
    async fn test_unapproved_allowance_is_zero() {
        let (session, mut notifications) = connected(funded_ledger()).await;

        let view = session.check_allowance(SPENDER).await.unwrap();
        assert_eq!(view.amount, "0");
        assert_eq!(view.owner, ACCOUNT);
        assert_eq!(session.state().allowance, Some(view));
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_approve_then_check_allowance() {
        let (session, mut notifications) = connected(funded_ledger()).await;

        session.approve(SPENDER, "25.5").await.unwrap();
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::Success("Approval successful".to_string())
        );

        let view = session.check_allowance(SPENDER).await.unwrap();
        assert_eq!(view.amount, "25.5");
        assert_eq!(session.state().token_balance, "100");
    }

    #[tokio::test]
    async fn test_lookup_keeps_own_balances() {
        let other: Address = RECIPIENT.parse().unwrap();
        let ledger = funded_ledger().with_balance(other, tokens(7));
        let (session, _notifications) = connected(ledger).await;

        let view = session.lookup_wallet(RECIPIENT).await.unwrap();
        assert_eq!(view.token_balance, "7");
        assert_eq!(view.native_balance, "0.000000");

        let state = session.state();
        assert_eq!(state.token_balance, "100");
        assert_eq!(state.native_balance, "1.000000");
        assert_eq!(state.lookup, Some(view));
    }

    #[tokio::test]
    async fn test_lookup_failure_notifies() {
        let ledger = funded_ledger();
        let (session, mut notifications) = connected(ledger.clone()).await;

        ledger.fail_reads(true);
        let err = session.lookup_wallet(RECIPIENT).await.unwrap_err();
        assert!(matches!(err, SessionError::Lookup(_)));
        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::Failure("Failed to fetch wallet balance".to_string())
        );
        assert!(session.state().lookup.is_none());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_snapshot() {
        let ledger = funded_ledger();
        let (session, mut notifications) = connected(ledger.clone()).await;
        let before = session.state();

        ledger.fail_reads(true);
        let err = session.refresh_balances().await.unwrap_err();
        assert!(matches!(err, SessionError::Read(_)));
        assert_eq!(session.state(), before);
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_transfer_is_rejected() {
        let gate = Arc::new(Notify::new());
        let ledger = funded_ledger().with_transfer_gate(gate.clone());
        let (session, mut notifications) = connected(ledger.clone()).await;
        let session = Arc::new(session);

        let mut updates = session.subscribe();
        let first = tokio::spawn({
            let session = session.clone();
            async move { session.transfer(RECIPIENT, "10").await }
        });
        updates.wait_for(|state| state.pending.transfer).await.unwrap();

        let err = session.transfer(RECIPIENT, "5").await.unwrap_err();
        assert!(matches!(err, SessionError::Busy(ActionKind::Transfer)));
        assert_eq!(
            notifications.recv().await.unwrap(),
            Notification::Failure("A transfer is already pending".to_string())
        );

        // Approvals are guarded separately.
        session.approve(SPENDER, "1").await.unwrap();
        assert_eq!(
            notifications.recv().await.unwrap(),
            Notification::Success("Approval successful".to_string())
        );

        gate.notify_one();
        first.await.unwrap().unwrap();

        assert_eq!(session.state().token_balance, "90");
        assert!(!session.state().pending.transfer);
        assert_eq!(ledger.submitted(), 2);
    }
}
