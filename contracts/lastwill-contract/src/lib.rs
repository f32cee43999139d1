#![no_std]
//! Dead-man's-switch custody engine.
//!
//! A principal account is monitored for liveness. Once no activity has been
//! recorded for the configured period, anyone may call [`check`] and the
//! engine pays out the principal's registered assets to a fixed list of
//! heirs by percentage share. The principal can ping the timer, manage the
//! token registry, or revoke the whole arrangement with a one-way [`kill`].
//!
//! The contract exposes no deposit entry point; value reaches its balance
//! only through token contracts' own transfer functions.
//!
//! [`check`]: LastWillContract::check
//! [`kill`]: LastWillContract::kill
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, vec, Address, Env,
    IntoVal, InvokeError, Symbol, Val, Vec,
};

/// Percentage shares are expressed out of 100.
const PERCENT_BASE: u128 = 100;

// ─────────────────────────────────────────────────
// Data Types
// ─────────────────────────────────────────────────

/// One heir and its fixed share of every distributed asset.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeirShare {
    pub heir: Address,
    pub percent: u32,
}

/// How the engine moves a registered token during distribution.
///
/// `Pull` tokens are drawn from the principal's own balance, bounded by the
/// allowance the principal has granted the engine. `Push` tokens sit on the
/// engine's balance and are paid out from there.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Pull,
    Push,
}

/// A monitored token and its transfer capability.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenEntry {
    pub token: Address,
    pub kind: TokenKind,
}

// ─────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenAddedEvent {
    pub token: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokensSentEvent {
    pub token: Address,
    pub recipient: Address,
    pub percent: u32,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsSentEvent {
    pub recipient: Address,
    pub percent: u32,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KilledEvent {
    pub by_user: bool,
}

// ─────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LastWillError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    InvalidConfiguration = 3,
    Unauthorized = 4,
    AlreadyKilled = 5,
    NotOverdue = 6,
    NotFound = 7,
    TokenAlreadyAdded = 8,
    TransferFailure = 9,
}

// ─────────────────────────────────────────────────
// Storage Keys
// ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Principal,
    Heirs,
    NoActivityPeriod,
    NativeToken,
    LastActivity,
    Killed,
    Tokens,
}

// ─────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────

#[contract]
pub struct LastWillContract;

#[contractimpl]
impl LastWillContract {
    // ─── Init ───────────────────────────────────────

    /// Set up the engine for one principal. Can only be called once.
    ///
    /// # Arguments
    /// * `principal` - The monitored account (must authorize this call)
    /// * `heirs` - Beneficiary addresses, order preserved
    /// * `percents` - Share per heir, parallel to `heirs`, out of 100
    /// * `no_activity_period` - Required silence in seconds before a
    ///   distribution becomes eligible
    /// * `native_token` - Asset contract whose engine-held balance is
    ///   distributed first, if any
    ///
    /// # Errors
    /// - `AlreadyInitialized` on a second call
    /// - `InvalidConfiguration` if the sequences differ in length or are
    ///   empty, if the percents sum past 100, or if the period is zero
    pub fn initialize(
        env: Env,
        principal: Address,
        heirs: Vec<Address>,
        percents: Vec<u32>,
        no_activity_period: u64,
        native_token: Option<Address>,
    ) -> Result<(), LastWillError> {
        principal.require_auth();
        if env.storage().instance().has(&DataKey::Principal) {
            return Err(LastWillError::AlreadyInitialized);
        }

        if heirs.is_empty() || heirs.len() != percents.len() || no_activity_period == 0 {
            return Err(LastWillError::InvalidConfiguration);
        }
        let mut percent_sum: u64 = 0;
        for percent in percents.iter() {
            percent_sum += percent as u64;
        }
        if percent_sum > PERCENT_BASE as u64 {
            return Err(LastWillError::InvalidConfiguration);
        }

        let mut shares: Vec<HeirShare> = Vec::new(&env);
        for (heir, percent) in heirs.iter().zip(percents.iter()) {
            shares.push_back(HeirShare { heir, percent });
        }

        env.storage().instance().set(&DataKey::Principal, &principal);
        env.storage().instance().set(&DataKey::Heirs, &shares);
        env.storage()
            .instance()
            .set(&DataKey::NoActivityPeriod, &no_activity_period);
        if let Some(native) = native_token {
            env.storage().instance().set(&DataKey::NativeToken, &native);
        }
        env.storage()
            .instance()
            .set(&DataKey::LastActivity, &env.ledger().timestamp());
        env.storage().instance().set(&DataKey::Killed, &false);
        env.storage()
            .persistent()
            .set(&DataKey::Tokens, &Vec::<TokenEntry>::new(&env));

        log!(
            &env,
            "Engine initialized: {} heirs, {}s inactivity period",
            shares.len(),
            no_activity_period
        );
        Ok(())
    }

    // ─── Guards / Storage ───────────────────────────

    fn get_principal(env: &Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Principal)
    }

    fn require_principal(env: &Env, caller: &Address) -> Result<(), LastWillError> {
        caller.require_auth();
        let principal = Self::get_principal(env).ok_or(LastWillError::NotInitialized)?;
        if principal != *caller {
            return Err(LastWillError::Unauthorized);
        }
        Ok(())
    }

    fn require_initialized(env: &Env) -> Result<(), LastWillError> {
        if !env.storage().instance().has(&DataKey::Principal) {
            return Err(LastWillError::NotInitialized);
        }
        Ok(())
    }

    fn is_killed(env: &Env) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::Killed)
            .unwrap_or(false)
    }

    fn require_not_killed(env: &Env) -> Result<(), LastWillError> {
        if Self::is_killed(env) {
            return Err(LastWillError::AlreadyKilled);
        }
        Ok(())
    }

    fn get_heirs(env: &Env) -> Vec<HeirShare> {
        env.storage()
            .instance()
            .get(&DataKey::Heirs)
            .unwrap_or(Vec::new(env))
    }

    fn get_tokens(env: &Env) -> Vec<TokenEntry> {
        env.storage()
            .persistent()
            .get(&DataKey::Tokens)
            .unwrap_or(Vec::new(env))
    }

    fn set_tokens(env: &Env, tokens: &Vec<TokenEntry>) {
        env.storage().persistent().set(&DataKey::Tokens, tokens);
    }

    fn get_native_token(env: &Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::NativeToken)
    }

    // ─── Token Invocation ───────────────────────────
    //
    // Every interaction with an asset contract goes through try_invoke so a
    // non-conforming or missing token surfaces as TransferFailure instead
    // of trapping; the host rolls the whole invocation back either way.

    fn token_balance(env: &Env, token: &Address, id: &Address) -> Result<i128, LastWillError> {
        let args: Vec<Val> = vec![env, id.clone().into_val(env)];
        match env.try_invoke_contract::<i128, InvokeError>(token, &symbol_short!("balance"), args) {
            Ok(Ok(balance)) => Ok(balance),
            _ => Err(LastWillError::TransferFailure),
        }
    }

    fn token_allowance(
        env: &Env,
        token: &Address,
        from: &Address,
        spender: &Address,
    ) -> Result<i128, LastWillError> {
        let args: Vec<Val> = vec![env, from.clone().into_val(env), spender.clone().into_val(env)];
        match env.try_invoke_contract::<i128, InvokeError>(token, &symbol_short!("allowance"), args)
        {
            Ok(Ok(allowance)) => Ok(allowance),
            _ => Err(LastWillError::TransferFailure),
        }
    }

    /// Move `amount` from the engine's own balance to `to`.
    fn token_transfer(
        env: &Env,
        token: &Address,
        to: &Address,
        amount: i128,
    ) -> Result<(), LastWillError> {
        let args: Vec<Val> = vec![
            env,
            env.current_contract_address().into_val(env),
            to.clone().into_val(env),
            amount.into_val(env),
        ];
        let res =
            env.try_invoke_contract::<(), InvokeError>(token, &symbol_short!("transfer"), args);
        if res.is_err() {
            return Err(LastWillError::TransferFailure);
        }
        Ok(())
    }

    /// Move `amount` out of `from`'s balance using the allowance granted to
    /// the engine.
    fn token_transfer_from(
        env: &Env,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: i128,
    ) -> Result<(), LastWillError> {
        let args: Vec<Val> = vec![
            env,
            env.current_contract_address().into_val(env),
            from.clone().into_val(env),
            to.clone().into_val(env),
            amount.into_val(env),
        ];
        let res = env.try_invoke_contract::<(), InvokeError>(
            token,
            &Symbol::new(env, "transfer_from"),
            args,
        );
        if res.is_err() {
            return Err(LastWillError::TransferFailure);
        }
        Ok(())
    }

    // ─── Share Math ─────────────────────────────────

    /// Truncating percentage share. The sum over all heirs never exceeds
    /// the available amount; any remainder stays with the source.
    fn share_amount(available: i128, percent: u32) -> i128 {
        (available as u128)
            .checked_mul(percent as u128)
            .and_then(|v| v.checked_div(PERCENT_BASE))
            .unwrap_or(0) as i128
    }

    // ─── Token Registry ─────────────────────────────

    /// Register one token for distribution with an explicit capability
    /// kind.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the principal
    /// - `AlreadyKilled` once the engine has been killed
    /// - `TokenAlreadyAdded` if `token` is already registered
    pub fn add_token(
        env: Env,
        caller: Address,
        token: Address,
        kind: TokenKind,
    ) -> Result<(), LastWillError> {
        Self::require_initialized(&env)?;
        Self::require_principal(&env, &caller)?;
        Self::require_not_killed(&env)?;

        let mut tokens = Self::get_tokens(&env);
        for entry in tokens.iter() {
            if entry.token == token {
                return Err(LastWillError::TokenAlreadyAdded);
            }
        }
        tokens.push_back(TokenEntry {
            token: token.clone(),
            kind,
        });
        Self::set_tokens(&env, &tokens);

        env.events().publish(
            (symbol_short!("TOKEN"), symbol_short!("ADDED")),
            TokenAddedEvent { token },
        );
        log!(&env, "Token registered, {} monitored", tokens.len());
        Ok(())
    }

    /// Register a batch of allowance-style tokens in input order. One
    /// `TokenAdded` event per element; the first failure aborts the whole
    /// batch.
    pub fn add_tokens(
        env: Env,
        caller: Address,
        new_tokens: Vec<Address>,
    ) -> Result<(), LastWillError> {
        Self::require_initialized(&env)?;
        Self::require_principal(&env, &caller)?;
        Self::require_not_killed(&env)?;

        let mut tokens = Self::get_tokens(&env);
        for token in new_tokens.iter() {
            for entry in tokens.iter() {
                if entry.token == token {
                    return Err(LastWillError::TokenAlreadyAdded);
                }
            }
            tokens.push_back(TokenEntry {
                token: token.clone(),
                kind: TokenKind::Pull,
            });
            env.events().publish(
                (symbol_short!("TOKEN"), symbol_short!("ADDED")),
                TokenAddedEvent { token },
            );
        }
        Self::set_tokens(&env, &tokens);

        log!(&env, "Token batch registered, {} monitored", tokens.len());
        Ok(())
    }

    /// Deregister a token. Removal swaps the last entry into the vacated
    /// slot, so survivor order may change.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the principal
    /// - `AlreadyKilled` once the engine has been killed
    /// - `NotFound` if `token` is not registered
    pub fn delete_token(env: Env, caller: Address, token: Address) -> Result<(), LastWillError> {
        Self::require_initialized(&env)?;
        Self::require_principal(&env, &caller)?;
        Self::require_not_killed(&env)?;

        let mut tokens = Self::get_tokens(&env);
        let mut found: Option<u32> = None;
        for (i, entry) in tokens.iter().enumerate() {
            if entry.token == token {
                found = Some(i as u32);
                break;
            }
        }
        let index = found.ok_or(LastWillError::NotFound)?;

        // Swap with last and pop.
        let last_index = tokens.len() - 1;
        if index != last_index {
            let last_entry = tokens.get(last_index).unwrap();
            tokens.set(index, last_entry);
        }
        tokens.pop_back();
        Self::set_tokens(&env, &tokens);

        log!(&env, "Token deregistered, {} monitored", tokens.len());
        Ok(())
    }

    /// Current registry in internal order.
    pub fn list_tokens(env: Env) -> Vec<TokenEntry> {
        Self::get_tokens(&env)
    }

    // ─── Liveness ───────────────────────────────────

    /// Liveness ping: resets the inactivity timer to now.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the principal
    /// - `AlreadyKilled` once the engine has been killed
    pub fn record_activity(env: Env, caller: Address) -> Result<(), LastWillError> {
        Self::require_initialized(&env)?;
        Self::require_principal(&env, &caller)?;
        Self::require_not_killed(&env)?;

        let now = env.ledger().timestamp();
        env.storage().instance().set(&DataKey::LastActivity, &now);
        log!(&env, "Activity recorded at {}", now);
        Ok(())
    }

    fn overdue(env: &Env) -> Result<bool, LastWillError> {
        let last: u64 = env
            .storage()
            .instance()
            .get(&DataKey::LastActivity)
            .ok_or(LastWillError::NotInitialized)?;
        let period: u64 = env
            .storage()
            .instance()
            .get(&DataKey::NoActivityPeriod)
            .ok_or(LastWillError::NotInitialized)?;
        let now = env.ledger().timestamp();
        Ok(now.saturating_sub(last) >= period)
    }

    // ─── Kill ───────────────────────────────────────

    /// One-way revocation. After this every mutating call, including
    /// `check`, fails with `AlreadyKilled` forever.
    pub fn kill(env: Env, caller: Address) -> Result<(), LastWillError> {
        Self::require_initialized(&env)?;
        Self::require_principal(&env, &caller)?;
        if Self::is_killed(&env) {
            return Err(LastWillError::AlreadyKilled);
        }

        env.storage().instance().set(&DataKey::Killed, &true);
        env.events().publish(
            (symbol_short!("WILL"), symbol_short!("KILLED")),
            KilledEvent { by_user: true },
        );
        log!(&env, "Engine killed by principal");
        Ok(())
    }

    // ─── Distribution ───────────────────────────────

    /// Trigger the payout. Callable by anyone; the engine itself decides
    /// eligibility.
    ///
    /// Assets go out native-first, then tokens in registry order, heirs in
    /// registry order within each asset, each heir receiving
    /// `floor(available * percent / 100)`. All balances and allowances are
    /// snapshotted before the first outbound transfer, so nothing a
    /// transfer recipient does mid-call can change the amounts already
    /// decided. A call either distributes everything it planned or fails
    /// as a whole.
    ///
    /// # Errors
    /// - `AlreadyKilled` once the engine has been killed
    /// - `NotOverdue` while the principal's inactivity period has not
    ///   elapsed
    /// - `TransferFailure` if any asset interaction fails; the host rolls
    ///   back every transfer and event of the call
    pub fn check(env: Env) -> Result<(), LastWillError> {
        Self::require_initialized(&env)?;
        Self::require_not_killed(&env)?;
        if !Self::overdue(&env)? {
            return Err(LastWillError::NotOverdue);
        }

        let principal = Self::get_principal(&env).ok_or(LastWillError::NotInitialized)?;
        let contract_id = env.current_contract_address();
        let heirs = Self::get_heirs(&env);

        // Snapshot phase: read every amount to move before any transfer.
        let native_available: Option<(Address, i128)> = match Self::get_native_token(&env) {
            Some(native) => {
                let balance = Self::token_balance(&env, &native, &contract_id)?;
                Some((native, balance))
            }
            None => None,
        };
        let mut plan: Vec<(TokenEntry, i128)> = Vec::new(&env);
        for entry in Self::get_tokens(&env).iter() {
            let available = match entry.kind {
                TokenKind::Pull => {
                    let balance = Self::token_balance(&env, &entry.token, &principal)?;
                    let allowance =
                        Self::token_allowance(&env, &entry.token, &principal, &contract_id)?;
                    balance.min(allowance)
                }
                TokenKind::Push => Self::token_balance(&env, &entry.token, &contract_id)?,
            };
            plan.push_back((entry, available));
        }

        // Transfer phase: native first, then tokens in registry order.
        if let Some((native, available)) = native_available {
            if available > 0 {
                for share in heirs.iter() {
                    let amount = Self::share_amount(available, share.percent);
                    if amount > 0 {
                        Self::token_transfer(&env, &native, &share.heir, amount)?;
                    }
                    env.events().publish(
                        (symbol_short!("FUNDS"), symbol_short!("SENT")),
                        FundsSentEvent {
                            recipient: share.heir.clone(),
                            percent: share.percent,
                            amount,
                        },
                    );
                }
            }
        }

        for (entry, available) in plan.iter() {
            if available <= 0 {
                continue;
            }
            for share in heirs.iter() {
                let amount = Self::share_amount(available, share.percent);
                if amount > 0 {
                    match entry.kind {
                        TokenKind::Pull => Self::token_transfer_from(
                            &env,
                            &entry.token,
                            &principal,
                            &share.heir,
                            amount,
                        )?,
                        TokenKind::Push => {
                            Self::token_transfer(&env, &entry.token, &share.heir, amount)?
                        }
                    }
                }
                env.events().publish(
                    (symbol_short!("TOKENS"), symbol_short!("SENT")),
                    TokensSentEvent {
                        token: entry.token.clone(),
                        recipient: share.heir.clone(),
                        percent: share.percent,
                        amount,
                    },
                );
            }
        }

        log!(&env, "Distribution executed for {} heirs", heirs.len());
        Ok(())
    }

    // ─── Read Access ────────────────────────────────

    /// The monitored account.
    pub fn principal(env: Env) -> Result<Address, LastWillError> {
        Self::get_principal(&env).ok_or(LastWillError::NotInitialized)
    }

    /// Required silence in seconds before `check` becomes eligible.
    pub fn no_activity_period(env: Env) -> Result<u64, LastWillError> {
        env.storage()
            .instance()
            .get(&DataKey::NoActivityPeriod)
            .ok_or(LastWillError::NotInitialized)
    }

    /// Timestamp of the most recent liveness signal.
    pub fn last_activity(env: Env) -> Result<u64, LastWillError> {
        env.storage()
            .instance()
            .get(&DataKey::LastActivity)
            .ok_or(LastWillError::NotInitialized)
    }

    /// Whether the inactivity period has elapsed.
    pub fn is_overdue(env: Env) -> Result<bool, LastWillError> {
        Self::overdue(&env)
    }

    /// The i-th heir and share, in construction order.
    pub fn heir_at(env: Env, index: u32) -> Option<HeirShare> {
        Self::get_heirs(&env).get(index)
    }

    /// All heirs in construction order.
    pub fn heirs(env: Env) -> Vec<HeirShare> {
        Self::get_heirs(&env)
    }

    pub fn killed(env: Env) -> bool {
        Self::is_killed(&env)
    }

    pub fn native_token(env: Env) -> Option<Address> {
        Self::get_native_token(&env)
    }
}
