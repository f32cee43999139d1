#![cfg(test)]

use super::*;
use soroban_sdk::{testutils::Address as _, testutils::Ledger, token, Address, Env};

fn setup(env: &Env) -> (Address, token::Client<'_>) {
    env.mock_all_auths();
    let token_id = env.register_contract(None, MockToken);
    let client = token::Client::new(env, &token_id);
    (token_id, client)
}

#[test]
fn test_mint_and_balance() {
    let env = Env::default();
    let (token_id, client) = setup(&env);
    let user = Address::generate(&env);

    MockTokenClient::new(&env, &token_id).mint(&user, &1000i128);
    assert_eq!(client.balance(&user), 1000);
}

#[test]
fn test_transfer() {
    let env = Env::default();
    let (token_id, client) = setup(&env);
    let from = Address::generate(&env);
    let to = Address::generate(&env);

    MockTokenClient::new(&env, &token_id).mint(&from, &500i128);
    client.transfer(&from, &to, &200i128);

    assert_eq!(client.balance(&from), 300);
    assert_eq!(client.balance(&to), 200);
}

#[test]
#[should_panic]
fn test_transfer_insufficient_balance_panics() {
    let env = Env::default();
    let (token_id, client) = setup(&env);
    let from = Address::generate(&env);
    let to = Address::generate(&env);

    MockTokenClient::new(&env, &token_id).mint(&from, &100i128);
    client.transfer(&from, &to, &200i128);
}

#[test]
fn test_approve_and_transfer_from() {
    let env = Env::default();
    let (token_id, client) = setup(&env);
    let owner = Address::generate(&env);
    let spender = Address::generate(&env);
    let to = Address::generate(&env);

    MockTokenClient::new(&env, &token_id).mint(&owner, &1000i128);
    client.approve(&owner, &spender, &400i128, &1000u32);
    assert_eq!(client.allowance(&owner, &spender), 400);

    client.transfer_from(&spender, &owner, &to, &250i128);
    assert_eq!(client.balance(&owner), 750);
    assert_eq!(client.balance(&to), 250);
    assert_eq!(client.allowance(&owner, &spender), 150);
}

#[test]
#[should_panic]
fn test_transfer_from_exceeding_allowance_panics() {
    let env = Env::default();
    let (token_id, client) = setup(&env);
    let owner = Address::generate(&env);
    let spender = Address::generate(&env);
    let to = Address::generate(&env);

    MockTokenClient::new(&env, &token_id).mint(&owner, &1000i128);
    client.approve(&owner, &spender, &100i128, &1000u32);
    client.transfer_from(&spender, &owner, &to, &101i128);
}

#[test]
fn test_expired_allowance_reads_zero() {
    let env = Env::default();
    let (token_id, client) = setup(&env);
    let owner = Address::generate(&env);
    let spender = Address::generate(&env);

    MockTokenClient::new(&env, &token_id).mint(&owner, &1000i128);
    let seq = env.ledger().sequence();
    client.approve(&owner, &spender, &400i128, &(seq + 5));
    assert_eq!(client.allowance(&owner, &spender), 400);

    // Past the expiration ledger the allowance reads zero.
    env.ledger().set_sequence_number(seq + 6);
    assert_eq!(client.allowance(&owner, &spender), 0);
}
