pub mod cache;
pub mod config;
pub mod metrics;

use crate::metrics::Metrics;
use ::config::RouterTable;
use action::{SubmitError, SubmitOutcome, Submitter};
use alloy_primitives::{Address, U256};
use client::ChainClient;
use input::Form;
use lifecycle::{LifecycleState, TransactionLifecycle};
use serde::Serialize;
use std::fmt;
use token::{assess, Readiness, TokenReader, TokenState, TransactionDetails};
use tokio::task::JoinHandle;
use tracing::info;

/// Everything known about a form before it is submitted.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub chain_id: u64,
    /// `None` when the chain has no router
    pub router: Option<Address>,
    pub token: TokenState,
    pub details: TransactionDetails,
    pub readiness: Readiness,
    pub recipients: usize,
    pub amounts: usize,
    /// Amount tokens that were dropped, with the reason
    pub rejected_amounts: Vec<String>,
    /// Recipient tokens that are not addresses
    pub malformed_recipients: Vec<String>,
}

impl Check {
    pub const fn is_ready(&self) -> bool {
        self.router.is_some() && self.readiness.is_ready()
    }

    /// True when the allowance is known and falls short of the total.
    pub fn needs_approval(&self) -> bool {
        self.token
            .allowance
            .loaded()
            .is_some_and(|allowance| *allowance < self.details.total)
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.details)?;
        writeln!(f, "Recipients:       {}", self.recipients)?;
        writeln!(f, "Amounts:          {}", self.amounts)?;
        if let Some(balance) = self.token.balance.loaded() {
            writeln!(f, "Balance:          {balance}")?;
        }
        if let Some(allowance) = self.token.allowance.loaded() {
            let note = if self.needs_approval() { " (approval needed)" } else { "" };
            writeln!(f, "Allowance:        {allowance}{note}")?;
        }
        for rejected in &self.rejected_amounts {
            writeln!(f, "Dropped amount:   {rejected}")?;
        }
        for malformed in &self.malformed_recipients {
            writeln!(f, "Bad recipient:    {malformed}")?;
        }

        match (self.router, self.readiness) {
            (None, _) => write!(f, "Status:           chain {} is not supported", self.chain_id),
            (Some(_), Readiness::Ready) => write!(f, "Status:           ready to send"),
            (Some(_), Readiness::Blocked(blocker)) => write!(f, "Status:           {blocker}"),
        }
    }
}

/// Read the token for `form` and assess whether it can be submitted.
pub async fn check<C>(
    client: &C,
    routers: &RouterTable,
    form: &Form,
    owner: Address,
) -> eyre::Result<Check>
where
    C: ChainClient + Clone,
{
    let chain_id = client.chain_id().await?;
    let router = routers.get(chain_id);

    let token = TokenReader::new(client.clone())
        .read(&form.token, owner, router)
        .await;

    let parsed = form.parse();
    let readiness = assess(form, &parsed, &token);
    let details = TransactionDetails::new(
        token.name.loaded().cloned(),
        token.decimals.loaded().copied(),
        parsed.total(),
    );

    Ok(Check {
        chain_id,
        router,
        details,
        readiness,
        recipients: parsed.recipients.len(),
        amounts: parsed.amounts.len(),
        rejected_amounts: parsed
            .amounts
            .rejected
            .iter()
            .map(|token| format!("#{} '{}': {}", token.index + 1, token.text, token.reason))
            .collect(),
        malformed_recipients: parsed
            .recipients
            .malformed()
            .into_iter()
            .map(|(index, text)| format!("#{} '{text}'", index + 1))
            .collect(),
        token,
    })
}

/// Submit `form`, recording the outcome in `metrics`.
pub async fn send<C>(
    submitter: &Submitter<C>,
    form: &Form,
    token: &TokenState,
    owner: Address,
    metrics: &Metrics,
) -> Result<SubmitOutcome, SubmitError>
where
    C: ChainClient + Clone,
{
    let outcome = submitter.submit(form, token, owner).await;
    metrics.record_outcome(form.parse().recipients.len(), &outcome);
    outcome
}

/// Log every lifecycle transition until the lifecycle is dropped.
pub fn log_transitions(lifecycle: &TransactionLifecycle) -> JoinHandle<()> {
    let mut states = lifecycle.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            info!(%state, "Submission state changed");
        }
    })
}

/// Dismiss the wallet prompt after an interrupt and report whether the
/// submission will still return on its own.
///
/// False only while a signed transaction waits for the chain: it may still be
/// mined, and waiting for it is what the interrupt asked to stop.
pub fn interrupt(lifecycle: &TransactionLifecycle) -> bool {
    lifecycle.dismiss() != LifecycleState::AwaitingChainConfirmation
}

/// Overlay the fields given on the command line onto the cached form.
pub fn resolve_form(
    cached: Form,
    token: Option<String>,
    recipients: Option<String>,
    amounts: Option<String>,
) -> Form {
    Form {
        token: token.unwrap_or(cached.token),
        recipients: recipients.unwrap_or(cached.recipients),
        amounts: amounts.unwrap_or(cached.amounts),
    }
}

/// Whole-token rendering of `amount`, or base units when decimals are unknown.
pub fn display_amount(amount: U256, decimals: Option<u8>) -> String {
    TransactionDetails::new(None, decimals, amount)
        .token_amount()
        .unwrap_or_else(|| amount.to_string())
}
