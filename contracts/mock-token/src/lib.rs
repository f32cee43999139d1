#![no_std]
//! Minimal SEP-41 fungible token used as a test fixture by the contract
//! test suites. Open mint, no events.
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, token,
    token::TokenInterface, Address, Env, String,
};

const DECIMALS: u32 = 7;

// ─────────────────────────────────────────────────
// Storage Keys
// ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Balance(Address),
    // (owner, spender)
    Allowance(Address, Address),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceValue {
    pub amount: i128,
    pub expiration_ledger: u32,
}

// ─────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MockTokenError {
    NegativeAmount = 1,
    InsufficientBalance = 2,
    InsufficientAllowance = 3,
    InvalidExpirationLedger = 4,
}

// ─────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────

#[contract]
pub struct MockToken;

fn read_balance(env: &Env, id: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Balance(id.clone()))
        .unwrap_or(0i128)
}

fn write_balance(env: &Env, id: &Address, amount: i128) {
    env.storage()
        .persistent()
        .set(&DataKey::Balance(id.clone()), &amount);
}

fn read_allowance(env: &Env, from: &Address, spender: &Address) -> i128 {
    let key = DataKey::Allowance(from.clone(), spender.clone());
    match env.storage().persistent().get::<_, AllowanceValue>(&key) {
        Some(a) if a.expiration_ledger >= env.ledger().sequence() => a.amount,
        _ => 0,
    }
}

fn spend_balance(env: &Env, from: &Address, amount: i128) {
    let balance = read_balance(env, from);
    if balance < amount {
        panic_with_error!(env, MockTokenError::InsufficientBalance);
    }
    write_balance(env, from, balance - amount);
}

fn require_nonnegative(env: &Env, amount: i128) {
    if amount < 0 {
        panic_with_error!(env, MockTokenError::NegativeAmount);
    }
}

#[contractimpl]
impl MockToken {
    /// Credit `amount` to `to`. Unrestricted; this token exists only for
    /// tests.
    pub fn mint(env: Env, to: Address, amount: i128) {
        require_nonnegative(&env, amount);
        write_balance(&env, &to, read_balance(&env, &to) + amount);
    }
}

#[contractimpl]
impl token::TokenInterface for MockToken {
    fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        read_allowance(&env, &from, &spender)
    }

    fn approve(env: Env, from: Address, spender: Address, amount: i128, expiration_ledger: u32) {
        from.require_auth();
        require_nonnegative(&env, amount);
        if amount > 0 && expiration_ledger < env.ledger().sequence() {
            panic_with_error!(&env, MockTokenError::InvalidExpirationLedger);
        }
        env.storage().persistent().set(
            &DataKey::Allowance(from, spender),
            &AllowanceValue {
                amount,
                expiration_ledger,
            },
        );
    }

    fn balance(env: Env, id: Address) -> i128 {
        read_balance(&env, &id)
    }

    fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        require_nonnegative(&env, amount);
        spend_balance(&env, &from, amount);
        write_balance(&env, &to, read_balance(&env, &to) + amount);
    }

    fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        spender.require_auth();
        require_nonnegative(&env, amount);
        let allowance = read_allowance(&env, &from, &spender);
        if allowance < amount {
            panic_with_error!(&env, MockTokenError::InsufficientAllowance);
        }
        let key = DataKey::Allowance(from.clone(), spender);
        let mut value: AllowanceValue = env.storage().persistent().get(&key).unwrap();
        value.amount = allowance - amount;
        env.storage().persistent().set(&key, &value);
        spend_balance(&env, &from, amount);
        write_balance(&env, &to, read_balance(&env, &to) + amount);
    }

    fn burn(env: Env, from: Address, amount: i128) {
        from.require_auth();
        require_nonnegative(&env, amount);
        spend_balance(&env, &from, amount);
    }

    fn burn_from(env: Env, spender: Address, from: Address, amount: i128) {
        spender.require_auth();
        require_nonnegative(&env, amount);
        let allowance = read_allowance(&env, &from, &spender);
        if allowance < amount {
            panic_with_error!(&env, MockTokenError::InsufficientAllowance);
        }
        let key = DataKey::Allowance(from.clone(), spender);
        let mut value: AllowanceValue = env.storage().persistent().get(&key).unwrap();
        value.amount = allowance - amount;
        env.storage().persistent().set(&key, &value);
        spend_balance(&env, &from, amount);
    }

    fn decimals(_env: Env) -> u32 {
        DECIMALS
    }

    fn name(env: Env) -> String {
        String::from_str(&env, "Mock Token")
    }

    fn symbol(env: Env) -> String {
        String::from_str(&env, "MOCK")
    }
}

mod test;
