use crate::{FieldRead, TokenState};
use alloy_primitives::Address;
use client::ChainClient;
use tracing::{debug, warn};

// Token metadata reader.
pub struct TokenReader<C> {
    client: C,
}

impl<C> TokenReader<C>
where
    C: ChainClient,
{
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Read name, decimals and balance of `token_field` for `owner`.
    ///
    /// The three reads run concurrently and fail independently. When a
    /// `spender` is given the allowance towards it is read as well. A token
    /// field that is not an address fails every read without touching the
    /// chain; an empty field reads nothing.
    pub async fn read(
        &self,
        token_field: &str,
        owner: Address,
        spender: Option<Address>,
    ) -> TokenState {
        let mut state = TokenState::pending(token_field);
        if state.address.is_empty() {
            return state;
        }

        let Some(token) = state.token() else {
            debug!(token = %state.address, "Token field is not an address");
            let reason = format!("invalid token address: {}", state.address);
            state.name = FieldRead::Failed(reason.clone());
            state.decimals = FieldRead::Failed(reason.clone());
            state.balance = FieldRead::Failed(reason);
            return state;
        };

        debug!(%token, %owner, "Querying token metadata");

        let (name, decimals, balance) = tokio::join!(
            self.client.read_name(token),
            self.client.read_decimals(token),
            self.client.read_balance_of(token, owner),
        );

        state.name = name.into();
        state.decimals = decimals.into();
        state.balance = balance.into();

        if let Some(spender) = spender {
            state.allowance = self.client.read_allowance(token, owner, spender).await.into();
        }

        for (field, error) in [
            ("name", failure(&state.name)),
            ("decimals", failure(&state.decimals)),
            ("balance", failure(&state.balance)),
            ("allowance", failure(&state.allowance)),
        ] {
            if let Some(error) = error {
                warn!(%token, field, error, "Token read failed");
            }
        }

        state
    }
}

fn failure<T>(read: &FieldRead<T>) -> Option<&str> {
    match read {
        FieldRead::Failed(error) => Some(error),
        _ => None,
    }
}
