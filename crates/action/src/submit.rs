//! Runs approve-if-needed and then the transfer under one lifecycle ticket.
//!
//! Ordering is strict: the allowance is read first, an approval is sent and
//! confirmed if it falls short, and only then is the transfer sent. Any
//! failure stops the run. Nothing is retried and a confirmed approval stays
//! in place.
//!
//! The router and the allowance are read before the lifecycle ticket is
//! taken, so a slow read never counts against the wallet watchdog.

use crate::{Action, Airdrop, AirdropAction, Approve, ApproveAction, Reverted};
use alloy_primitives::{Address, TxHash};
use client::ChainClient;
use config::RouterTable;
use input::Form;
use lifecycle::{LifecycleError, TransactionLifecycle, Tracker};
use token::{assess, Blocker, Readiness, TokenState};
use tracing::{debug, error, info};

/// Default number of confirmations awaited for every transaction.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// No router for the connected chain; nothing was sent
    #[error("No router configured for chain {0}")]
    UnsupportedChain(u64),

    /// The form is not ready to submit; nothing was sent
    #[error("Not ready to submit: {0}")]
    NotReady(Blocker),

    /// The lifecycle did not accept a new submission; nothing was sent
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A chain read before the submission started failed; nothing was sent
    #[error(transparent)]
    Preflight(eyre::Report),

    #[error("{action} transaction {tx_hash} reverted")]
    Reverted {
        action: &'static str,
        tx_hash: TxHash,
    },

    /// RPC or wallet failure
    #[error(transparent)]
    Chain(eyre::Report),
}

impl SubmitError {
    /// True when the submission never started: no ticket was taken and
    /// nothing reached the wallet.
    pub const fn is_refused(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedChain(_) | Self::NotReady(_) | Self::Lifecycle(_) | Self::Preflight(_)
        )
    }
}

impl From<eyre::Report> for SubmitError {
    fn from(report: eyre::Report) -> Self {
        match report.downcast::<Reverted>() {
            Ok(Reverted { action, tx_hash }) => Self::Reverted { action, tx_hash },
            Err(report) => Self::Chain(report),
        }
    }
}

/// How a submission ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The transfer was confirmed, after an approval if one was needed
    Confirmed {
        approval: Option<crate::Result>,
        transfer: crate::Result,
    },
    /// The wallet never answered or the prompt was dismissed
    Cancelled,
}

/// Submits airdrops for one account.
pub struct Submitter<C> {
    client: C,
    routers: RouterTable,
    lifecycle: TransactionLifecycle,
    confirmations: u64,
}

impl<C> Submitter<C>
where
    C: ChainClient + Clone,
{
    pub const fn new(client: C, routers: RouterTable, lifecycle: TransactionLifecycle) -> Self {
        Self {
            client,
            routers,
            lifecycle,
            confirmations: DEFAULT_CONFIRMATIONS,
        }
    }

    pub const fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations;
        self
    }

    pub const fn lifecycle(&self) -> &TransactionLifecycle {
        &self.lifecycle
    }

    /// Router for the connected chain.
    pub async fn router(&self) -> Result<Address, SubmitError> {
        let chain_id = self.client.chain_id().await.map_err(SubmitError::Preflight)?;
        self.routers
            .resolve(chain_id)
            .map_err(|_| SubmitError::UnsupportedChain(chain_id))
    }

    /// Submit `form` from `owner`.
    ///
    /// `token` must be the state read for the form's token; it is assessed
    /// together with the form before anything is sent. The router is resolved
    /// first, so an unsupported chain never reaches the wallet.
    pub async fn submit(
        &self,
        form: &Form,
        token: &TokenState,
        owner: Address,
    ) -> Result<SubmitOutcome, SubmitError> {
        let router = self.router().await?;

        let parsed = form.parse();
        if let Readiness::Blocked(blocker) = assess(form, &parsed, token) {
            debug!(%blocker, "Refusing to submit");
            return Err(SubmitError::NotReady(blocker));
        }
        let token_address = token.token().ok_or(SubmitError::NotReady(Blocker::InvalidToken))?;
        let (recipients, amounts) = parsed
            .transfer_lists()
            .ok_or(SubmitError::NotReady(Blocker::Misaligned))?;

        let total = parsed.total();

        let allowance = self
            .client
            .read_allowance(token_address, owner, router)
            .await
            .map_err(|e| SubmitError::Preflight(e.wrap_err("Failed to read allowance")))?;
        let needs_approval = allowance < total;
        debug!(%allowance, %total, needs_approval, "Checked allowance");

        let tracker = self.lifecycle.submit()?;

        let airdrop = Airdrop {
            router,
            token: token_address,
            recipients,
            amounts,
            total,
        };

        info!(
            %router,
            token = %token_address,
            %owner,
            recipients = airdrop.recipients.len(),
            total = %airdrop.total,
            "Submitting airdrop"
        );

        let result = tokio::select! {
            result = self.run(&tracker, owner, airdrop, needs_approval) => result,
            () = tracker.abandoned() => {
                info!("Submission cancelled before the wallet answered");
                return Ok(SubmitOutcome::Cancelled);
            }
        };

        match result {
            Ok((approval, transfer)) => {
                tracker.confirmed();
                Ok(SubmitOutcome::Confirmed { approval, transfer })
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Airdrop submission failed");
                tracker.failed(format!("{e:#}"));
                Err(e.into())
            }
        }
    }

    async fn run(
        &self,
        tracker: &Tracker,
        owner: Address,
        airdrop: Airdrop,
        needs_approval: bool,
    ) -> eyre::Result<(Option<crate::Result>, crate::Result)> {
        let approval = if needs_approval {
            let mut approve = ApproveAction::new(
                self.client.clone(),
                tracker.clone(),
                self.confirmations,
                Approve {
                    token: airdrop.token,
                    owner,
                    spender: airdrop.router,
                    amount: airdrop.total,
                },
            );
            info!("{}", approve.description());
            Some(approve.execute().await?)
        } else {
            debug!("Allowance covers the total, skipping approval");
            None
        };

        let mut transfer =
            AirdropAction::new(self.client.clone(), tracker.clone(), self.confirmations, airdrop);
        info!("{}", transfer.description());
        let transfer = transfer.execute().await?;

        Ok((approval, transfer))
    }
}
