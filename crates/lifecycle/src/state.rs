use alloy_primitives::TxHash;
use std::fmt;

/// Where the current submission stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    #[default]
    Idle,
    /// Wallet prompt is open, nothing signed yet
    AwaitingWalletConfirmation,
    /// Signed and broadcast, waiting for the receipt
    AwaitingChainConfirmation,
    Succeeded,
    Failed,
}

impl LifecycleState {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Succeeded or failed: no further events apply.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingWalletConfirmation => "awaiting wallet confirmation",
            Self::AwaitingChainConfirmation => "awaiting chain confirmation",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// The state `event` leads to, or `None` when it does not apply here.
    ///
    /// Receipts are honoured even if they arrive before the signature.
    pub const fn on(self, event: &LifecycleEvent) -> Option<Self> {
        use LifecycleState::*;

        match (self, event) {
            (AwaitingChainConfirmation, LifecycleEvent::WalletPrompt) => {
                Some(AwaitingWalletConfirmation)
            }
            (AwaitingWalletConfirmation, LifecycleEvent::WalletDeclined) => Some(Idle),
            (AwaitingWalletConfirmation, LifecycleEvent::Signed(_)) => {
                Some(AwaitingChainConfirmation)
            }
            (
                AwaitingWalletConfirmation | AwaitingChainConfirmation,
                LifecycleEvent::ReceiptSucceeded,
            ) => Some(Succeeded),
            (
                AwaitingWalletConfirmation | AwaitingChainConfirmation,
                LifecycleEvent::ReceiptFailed(_),
            ) => Some(Failed),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// External signal about the current submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A wallet prompt was opened
    WalletPrompt,
    /// The prompt closed without a signature
    WalletDeclined,
    Signed(TxHash),
    ReceiptSucceeded,
    /// Revert or RPC failure, with its cause
    ReceiptFailed(String),
}
