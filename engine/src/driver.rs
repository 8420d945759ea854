//! The outer driver: a long-running task that wakes on a fixed interval and
//! runs the beneficiary and fee scanners concurrently.

use std::{
    ops::Deref,
    sync::{
        mpsc::{channel, Receiver, Sender, TryRecvError},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use log::{debug, error, info, trace};
use tokio::{
    sync::Mutex as AsyncMutex,
    task::JoinHandle,
    time,
};

use crate::{
    error::GatewayError,
    intake::{Intake, IntakePolicy, PaymentRequest},
    payment::{Id, Payment},
    payout::PayoutContext,
    query::Query,
    scanner::{IndexKind, Scanner},
    store::Store,
    wallet::Wallet,
};

const DEFAULT_PROCESS_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 1000;
const DEFAULT_WALLET_DEADLINE: Duration = Duration::from_secs(120);

/// Whether the driver's scanning loop is running.
#[derive(Debug)]
pub enum GatewayStatus {
    /// No scanning loop is active.
    NotRunning,
    /// The scanning loop is active.
    Running,
    /// The scanning loop exited with an error.
    Error(GatewayError),
}

/// The payment gateway: intake, query, and the periodic scanning driver,
/// bound to one wallet and one store.
pub struct Gateway<W: Wallet, S: Store>(Arc<Inner<W, S>>);

impl<W: Wallet, S: Store> Clone for Gateway<W, S> {
    fn clone(&self) -> Self {
        Gateway(self.0.clone())
    }
}

impl<W: Wallet, S: Store> Deref for Gateway<W, S> {
    type Target = Inner<W, S>;

    fn deref(&self) -> &Inner<W, S> {
        &self.0
    }
}

#[doc(hidden)]
pub struct Inner<W: Wallet, S: Store> {
    wallet: W,
    store: S,
    intake: Intake<W, S>,
    query: Query<S>,
    process_interval: Duration,
    max_concurrent_jobs: usize,
    wallet_deadline: Duration,
    scanner_handle: AsyncMutex<Option<JoinHandle<Result<(), GatewayError>>>>,
    command_channel: (Mutex<Sender<Stop>>, Arc<Mutex<Receiver<Stop>>>),
}

struct Stop;

impl<W: Wallet + 'static, S: Store + 'static> Gateway<W, S> {
    /// Returns a builder used to construct a new gateway.
    #[must_use]
    pub fn builder(wallet: W, store: S) -> GatewayBuilder<W, S> {
        GatewayBuilder::new(wallet, store)
    }

    /// Validate and durably record a new payment.
    pub async fn receive(&self, request: PaymentRequest) -> Result<Payment, GatewayError> {
        self.intake.receive(request).await
    }

    /// Look up a payment by id.
    pub async fn get(&self, id: Id) -> Result<Payment, GatewayError> {
        self.query.get(id).await
    }

    /// Start the scanning loop. Does nothing but return an error if already
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AlreadyRunning`] if the loop is already
    /// active.
    pub async fn run(&self) -> Result<(), GatewayError> {
        {
            let handle = self.scanner_handle.lock().await;
            if let Some(handle) = handle.as_ref() {
                if !handle.is_finished() {
                    return Err(GatewayError::AlreadyRunning);
                }
            }
        }

        let wallet = self.wallet.clone();
        let store = self.store.clone();
        let process_interval = self.process_interval;
        let payout_ctx = PayoutContext {
            wallet_deadline: self.wallet_deadline,
        };
        let max_concurrent_jobs = self.max_concurrent_jobs;
        let command_receiver = self.command_channel.1.clone();

        info!("starting payment gateway scanning loop");
        *self.scanner_handle.lock().await = Some(tokio::spawn(async move {
            let beneficiary_scanner =
                Scanner::new(IndexKind::Pending, wallet.clone(), store.clone(), max_concurrent_jobs, payout_ctx);
            let fee_scanner = Scanner::new(IndexKind::Fee, wallet, store, max_concurrent_jobs, payout_ctx);
            let mut ticker = time::interval(process_interval);
            loop {
                match command_receiver
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .try_recv()
                {
                    Ok(Stop) => {
                        info!("scanning loop received stop signal");
                        break;
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        error!("scanning loop lost its command channel, stopping");
                        break;
                    }
                }

                ticker.tick().await;
                trace!("running beneficiary and fee scans");
                let (beneficiary_result, fee_result) =
                    tokio::join!(beneficiary_scanner.scan(), fee_scanner.scan());
                if let Err(e) = beneficiary_result {
                    error!("beneficiary scan failed: {e}");
                }
                if let Err(e) = fee_result {
                    error!("fee scan failed: {e}");
                }
            }
            Ok(())
        }));
        debug!("scanning loop started");
        Ok(())
    }

    /// The current status of the scanning loop.
    pub async fn status(&self) -> GatewayStatus {
        let mut handle = self.scanner_handle.lock().await;
        match handle.as_ref() {
            None => GatewayStatus::NotRunning,
            Some(h) if h.is_finished() => {
                if let Some(h) = handle.take() {
                    match h.await {
                        Ok(Ok(())) => GatewayStatus::NotRunning,
                        Ok(Err(e)) => GatewayStatus::Error(e),
                        Err(e) => GatewayStatus::Error(GatewayError::Join(e)),
                    }
                } else {
                    GatewayStatus::NotRunning
                }
            }
            Some(_) => GatewayStatus::Running,
        }
    }

    /// Stop the scanning loop, blocking until it has exited. Does nothing if
    /// it is not running.
    pub async fn stop(&self) -> Result<(), GatewayError> {
        match self.scanner_handle.lock().await.take() {
            None => Ok(()),
            Some(handle) if handle.is_finished() => handle.await.map_err(GatewayError::Join)?,
            Some(handle) => {
                self.command_channel
                    .0
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .send(Stop)
                    .map_err(|e| GatewayError::StopSignal(e.to_string()))?;
                handle.await.map_err(GatewayError::Join)?
            }
        }
    }
}

/// Builds a [`Gateway`].
pub struct GatewayBuilder<W: Wallet, S: Store> {
    wallet: W,
    store: S,
    policy: IntakePolicy,
    process_interval: Duration,
    max_concurrent_jobs: usize,
}

impl<W: Wallet + 'static, S: Store + 'static> GatewayBuilder<W, S> {
    fn new(wallet: W, store: S) -> Self {
        GatewayBuilder {
            wallet,
            store,
            policy: IntakePolicy {
                min_amount: 0,
                max_amount: u64::MAX,
                receive_timeout: Duration::from_secs(24 * 3600),
                fee_percentage: 0,
                beneficiary_address_for_fee: String::new(),
                wallet_deadline: DEFAULT_WALLET_DEADLINE,
            },
            process_interval: DEFAULT_PROCESS_INTERVAL,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
        }
    }

    /// Set the intake policy (amount bounds, timeout, fee percentage,
    /// operator fee address).
    #[must_use]
    pub fn policy(mut self, policy: IntakePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the interval at which the driver re-scans both indexes.
    #[must_use]
    pub fn process_interval(mut self, interval: Duration) -> Self {
        self.process_interval = interval;
        self
    }

    /// Set the maximum number of payments processed concurrently per scan.
    #[must_use]
    pub fn max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    /// Build the gateway. Does not start the scanning loop; call
    /// [`Gateway::run`] for that.
    #[must_use]
    pub fn build(self) -> Gateway<W, S> {
        let wallet_deadline = self.policy.wallet_deadline;
        let intake = Intake::new(self.wallet.clone(), self.store.clone(), self.policy);
        let query = Query::new(self.store.clone());
        let (tx, rx) = channel();
        Gateway(Arc::new(Inner {
            wallet: self.wallet,
            store: self.store,
            intake,
            query,
            process_interval: self.process_interval,
            max_concurrent_jobs: self.max_concurrent_jobs,
            wallet_deadline,
            scanner_handle: AsyncMutex::new(None),
            command_channel: (Mutex::new(tx), Arc::new(Mutex::new(rx))),
        }))
    }
}
