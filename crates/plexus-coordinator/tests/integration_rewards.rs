//! Integration tests for Plexus token rewards
//!
//! These tests drive a full in-memory deployment through the coordinator:
//! conversion, deposits into tiers, block mining, withdrawals and reward
//! settlement.

use plexus_coordinator::{ConvertOrder, Deployment, PlexusConfig, TransactionStatus};
use plexus_core::{AccountId, Amount, Clock, RewardsError, TokenId, ONE_TOKEN, SECONDS_PER_YEAR};
use plexus_rewards::{lot_reward, RewardEvent, RewardOutcome};
use std::sync::Arc;

const APR: u64 = 40_000;

fn deploy() -> Deployment {
    Deployment::setup(&PlexusConfig::default()).unwrap()
}

/// Whitelist, APR and a funded treasury for every default tier token
fn deploy_active(treasury: Amount) -> Deployment {
    let d = deploy();
    let c = &d.coordinator;
    for token in d.tokens.values() {
        c.add_token_to_whitelist(&d.admin, token).unwrap();
        c.update_apr(&d.admin, APR, token).unwrap();
    }
    if treasury > 0 {
        c.fund_treasury(&d.admin, treasury).unwrap();
    }
    d
}

fn convert_into(d: &Deployment, who: &AccountId, token: TokenId, value: Amount) -> Amount {
    d.fund_native(who, value).unwrap();
    let order = ConvertOrder {
        targets: vec![token],
        paths: vec![vec![d.wrapped_native, token]],
        amount_placeholder: 1,
        slippage_tolerance: 1,
        deadline: d.clock.now() + 10,
    };
    let receipt = d.coordinator.convert(who, order, value).unwrap();
    receipt.output.outputs[0].1
}

fn deposit(d: &Deployment, who: &AccountId, tier: &str, token: TokenId, amount: Amount) {
    d.ledger
        .approve(&token, who, &d.coordinator.account(), amount)
        .unwrap();
    d.coordinator.deposit(who, tier, &token, amount).unwrap();
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_full_reward_cycle() {
        let d = deploy();
        let c = &d.coordinator;
        let owner = d.admin;
        let symbols = ["FARM", "DAI", "PICKLE"];

        for symbol in symbols {
            c.add_token_to_whitelist(&owner, &d.token(symbol).unwrap()).unwrap();
        }
        for symbol in symbols {
            let bought = convert_into(&d, &owner, d.token(symbol).unwrap(), 2 * ONE_TOKEN);
            assert!(bought > 0);
        }

        assert!(d.ledger.balance_of(&owner, &d.reward_token) >= 100_000 * ONE_TOKEN);
        c.fund_treasury(&owner, 950_000 * ONE_TOKEN).unwrap();
        assert_eq!(c.treasury_balance().unwrap(), 950_000 * ONE_TOKEN);

        for symbol in symbols {
            let token = d.token(symbol).unwrap();
            c.update_apr(&owner, APR, &token).unwrap();
            assert_eq!(c.token_apr(&token).unwrap(), APR);
        }

        let mut before = Vec::new();
        for symbol in symbols {
            let token = d.token(symbol).unwrap();
            before.push(d.ledger.balance_of(&owner, &token));
            deposit(&d, &owner, symbol, token, 2 * ONE_TOKEN);
        }

        let plx_before = d.ledger.balance_of(&owner, &d.reward_token);
        d.clock.mine_blocks(10);

        for (i, symbol) in symbols.iter().enumerate() {
            let token = d.token(symbol).unwrap();
            let receipt = c.withdraw(&owner, symbol, &token, 2 * ONE_TOKEN).unwrap();
            assert_eq!(receipt.status, TransactionStatus::Confirmed);
            assert_eq!(
                receipt.output.reward,
                RewardOutcome::Paid {
                    amount: lot_reward(2 * ONE_TOKEN, APR, 130).unwrap()
                }
            );
            assert!(d.ledger.balance_of(&owner, &token) >= before[i]);
        }

        assert!(d.ledger.balance_of(&owner, &d.reward_token) > plx_before);
    }

    #[test]
    fn test_one_year_pays_apr() {
        let d = deploy_active(1_000 * ONE_TOKEN);
        let farm = d.token("FARM").unwrap();
        let user = AccountId::from_label("addr1");
        convert_into(&d, &user, farm, 10 * ONE_TOKEN);

        deposit(&d, &user, "FARM", farm, 100 * ONE_TOKEN);
        d.clock.advance_time(SECONDS_PER_YEAR as u64);

        assert_eq!(
            d.coordinator.pending_reward(&user, &farm).unwrap(),
            40 * ONE_TOKEN
        );
        let receipt = d.coordinator.withdraw(&user, "FARM", &farm, 100 * ONE_TOKEN).unwrap();
        assert_eq!(receipt.output.reward.paid(), 40 * ONE_TOKEN);
        assert_eq!(d.ledger.balance_of(&user, &d.reward_token), 40 * ONE_TOKEN);
    }

    #[test]
    fn test_apr_change_mid_position_uses_withdrawal_rate() {
        let d = deploy_active(1_000 * ONE_TOKEN);
        let farm = d.token("FARM").unwrap();
        let user = AccountId::from_label("addr1");
        convert_into(&d, &user, farm, 10 * ONE_TOKEN);
        deposit(&d, &user, "FARM", farm, 100 * ONE_TOKEN);

        let half_year = SECONDS_PER_YEAR as u64 / 2;
        d.clock.advance_time(half_year);
        d.coordinator.update_apr(&d.admin, 100_000, &farm).unwrap();
        d.clock.advance_time(half_year);

        // 100% in effect at withdrawal applies to the full year
        let receipt = d.coordinator.withdraw(&user, "FARM", &farm, 100 * ONE_TOKEN).unwrap();
        assert_eq!(receipt.output.reward.paid(), 100 * ONE_TOKEN);
    }

    #[test]
    fn test_apr_set_after_deposit() {
        let d = deploy();
        let c = &d.coordinator;
        let farm = d.token("FARM").unwrap();
        let user = AccountId::from_label("addr1");
        c.add_token_to_whitelist(&d.admin, &farm).unwrap();
        c.fund_treasury(&d.admin, 1_000 * ONE_TOKEN).unwrap();
        convert_into(&d, &user, farm, 10 * ONE_TOKEN);
        deposit(&d, &user, "FARM", farm, 100 * ONE_TOKEN);

        let half_year = SECONDS_PER_YEAR as u64 / 2;
        d.clock.advance_time(half_year);
        c.update_apr(&d.admin, APR, &farm).unwrap();
        d.clock.advance_time(half_year);

        let receipt = c.withdraw(&user, "FARM", &farm, 100 * ONE_TOKEN).unwrap();
        assert_eq!(receipt.output.reward.paid(), 40 * ONE_TOKEN);
    }

    #[test]
    fn test_flash_deposit_earns_nothing() {
        let d = deploy_active(1_000 * ONE_TOKEN);
        let dai = d.token("DAI").unwrap();
        let user = AccountId::from_label("addr2");
        convert_into(&d, &user, dai, ONE_TOKEN);

        deposit(&d, &user, "DAI", dai, 500 * ONE_TOKEN);
        let receipt = d.coordinator.withdraw(&user, "DAI", &dai, 500 * ONE_TOKEN).unwrap();
        assert_eq!(receipt.output.reward, RewardOutcome::NothingAccrued);
        assert_eq!(c_treasury(&d), 1_000 * ONE_TOKEN);
    }

    fn c_treasury(d: &Deployment) -> Amount {
        d.coordinator.treasury_balance().unwrap()
    }
}

mod partial_withdrawal_tests {
    use super::*;

    #[test]
    fn test_partial_then_full_withdrawal() {
        let d = deploy_active(1_000 * ONE_TOKEN);
        let c = &d.coordinator;
        let farm = d.token("FARM").unwrap();
        let user = AccountId::from_label("addr1");
        convert_into(&d, &user, farm, ONE_TOKEN);

        deposit(&d, &user, "FARM", farm, 5 * ONE_TOKEN);
        d.clock.mine_blocks(100);
        deposit(&d, &user, "FARM", farm, 3 * ONE_TOKEN);
        d.clock.mine_blocks(100);

        // Oldest lot first: 5 held 2600s, 1 of the second lot held 1300s
        let first = c.withdraw(&user, "FARM", &farm, 6 * ONE_TOKEN).unwrap();
        let expected = lot_reward(5 * ONE_TOKEN, APR, 2_600).unwrap()
            + lot_reward(ONE_TOKEN, APR, 1_300).unwrap();
        assert_eq!(first.output.reward.paid(), expected);
        assert_eq!(c.principal_of(&user, &farm).unwrap(), 2 * ONE_TOKEN);

        let lots = c.lots_of(&user, &farm).unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].amount, 2 * ONE_TOKEN);

        d.clock.mine_blocks(100);
        let second = c.withdraw(&user, "FARM", &farm, 2 * ONE_TOKEN).unwrap();
        assert_eq!(
            second.output.reward.paid(),
            lot_reward(2 * ONE_TOKEN, APR, 2_600).unwrap()
        );
        assert_eq!(c.principal_of(&user, &farm).unwrap(), 0);
        assert_eq!(c.total_principal(&farm).unwrap(), 0);
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn test_non_whitelisted_deposit() {
        let d = deploy();
        let farm = d.token("FARM").unwrap();
        let user = AccountId::from_label("addr1");
        convert_into(&d, &user, farm, ONE_TOKEN);
        let balance = d.ledger.balance_of(&user, &farm);

        d.ledger.approve(&farm, &user, &d.coordinator.account(), ONE_TOKEN).unwrap();
        let result = d.coordinator.deposit(&user, "FARM", &farm, ONE_TOKEN);

        assert_eq!(result.unwrap_err(), RewardsError::NotWhitelisted(farm));
        assert_eq!(d.ledger.balance_of(&user, &farm), balance);
        assert_eq!(d.coordinator.principal_of(&user, &farm).unwrap(), 0);
    }

    #[test]
    fn test_withdrawal_cannot_drain_other_tier() {
        let d = deploy_active(1_000 * ONE_TOKEN);
        let farm = d.token("FARM").unwrap();
        let dai = d.token("DAI").unwrap();
        let alice = AccountId::from_label("alice");
        let bob = AccountId::from_label("bob");
        convert_into(&d, &alice, farm, ONE_TOKEN);
        convert_into(&d, &bob, farm, ONE_TOKEN);
        convert_into(&d, &bob, dai, ONE_TOKEN);
        deposit(&d, &alice, "FARM", farm, 10 * ONE_TOKEN);
        deposit(&d, &bob, "DAI", dai, 10 * ONE_TOKEN);

        let result = d.coordinator.withdraw(&alice, "DAI", &farm, 10 * ONE_TOKEN);
        assert!(matches!(result, Err(RewardsError::TransferFailed(_))));
        assert_eq!(d.coordinator.principal_of(&alice, &farm).unwrap(), 10 * ONE_TOKEN);

        // Both principals stay withdrawable from their own tiers
        d.coordinator.withdraw(&bob, "DAI", &dai, 10 * ONE_TOKEN).unwrap();
        d.coordinator.withdraw(&alice, "FARM", &farm, 10 * ONE_TOKEN).unwrap();
    }

    #[test]
    fn test_shared_token_tiers_not_deployable() {
        let mut config = PlexusConfig::default();
        let mut second = config.tiers[0].clone();
        second.name = format!("{}2", second.name);
        config.tiers.push(second);

        assert!(matches!(
            Deployment::setup(&config),
            Err(RewardsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_over_withdrawal() {
        let d = deploy_active(1_000 * ONE_TOKEN);
        let dai = d.token("DAI").unwrap();
        let user = AccountId::from_label("addr1");
        convert_into(&d, &user, dai, ONE_TOKEN);
        deposit(&d, &user, "DAI", dai, 10 * ONE_TOKEN);
        let balance = d.ledger.balance_of(&user, &dai);

        let result = d.coordinator.withdraw(&user, "DAI", &dai, 11 * ONE_TOKEN);
        assert_eq!(
            result.unwrap_err(),
            RewardsError::InsufficientBalance {
                requested: 11 * ONE_TOKEN,
                available: 10 * ONE_TOKEN
            }
        );
        assert_eq!(d.ledger.balance_of(&user, &dai), balance);
        assert_eq!(d.coordinator.principal_of(&user, &dai).unwrap(), 10 * ONE_TOKEN);
    }

    #[test]
    fn test_treasury_exhaustion_returns_principal() {
        let d = deploy_active(0);
        let pickle = d.token("PICKLE").unwrap();
        let user = AccountId::from_label("addr1");
        convert_into(&d, &user, pickle, ONE_TOKEN);
        let balance = d.ledger.balance_of(&user, &pickle);

        deposit(&d, &user, "PICKLE", pickle, 50 * ONE_TOKEN);
        d.clock.mine_blocks(10);

        let receipt = d.coordinator.withdraw(&user, "PICKLE", &pickle, 50 * ONE_TOKEN).unwrap();
        assert_eq!(receipt.status, TransactionStatus::RewardSkipped);
        assert!(matches!(
            receipt.output.reward,
            RewardOutcome::Skipped {
                error: RewardsError::InsufficientTreasury { available: 0, .. }
            }
        ));
        assert!(receipt
            .events
            .iter()
            .any(|e| matches!(e, RewardEvent::RewardSkipped { .. })));
        assert_eq!(d.ledger.balance_of(&user, &pickle), balance);
        assert_eq!(d.ledger.balance_of(&user, &d.reward_token), 0);
    }

    #[test]
    fn test_router_failure_rolls_back_native_debit() {
        let d = deploy();
        let farm = d.token("FARM").unwrap();
        let user = AccountId::from_label("addr1");
        d.fund_native(&user, 5 * ONE_TOKEN).unwrap();

        // Path skips the wrapped native token
        let order = ConvertOrder {
            targets: vec![farm],
            paths: vec![vec![d.token("DAI").unwrap(), farm]],
            amount_placeholder: 0,
            slippage_tolerance: 1,
            deadline: d.clock.now() + 10,
        };
        let result = d.coordinator.convert(&user, order, 5 * ONE_TOKEN);

        assert!(matches!(result, Err(RewardsError::InvalidInput(_))));
        assert_eq!(d.ledger.balance_of(&user, &TokenId::NATIVE), 5 * ONE_TOKEN);
        assert_eq!(d.ledger.balance_of(&d.coordinator.account(), &TokenId::NATIVE), 0);
    }

    #[test]
    fn test_tier_rejection_rolls_back() {
        let d = deploy_active(1_000 * ONE_TOKEN);
        let farm = d.token("FARM").unwrap();
        let user = AccountId::from_label("addr1");
        convert_into(&d, &user, farm, ONE_TOKEN);
        let balance = d.ledger.balance_of(&user, &farm);

        // DAI tier does not hold FARM
        d.ledger.approve(&farm, &user, &d.coordinator.account(), ONE_TOKEN).unwrap();
        let result = d.coordinator.deposit(&user, "DAI", &farm, ONE_TOKEN);

        assert!(matches!(result, Err(RewardsError::TransferFailed(_))));
        assert_eq!(d.ledger.balance_of(&user, &farm), balance);
        assert_eq!(d.ledger.allowance(&farm, &user, &d.coordinator.account()), ONE_TOKEN);
        assert_eq!(d.coordinator.principal_of(&user, &farm).unwrap(), 0);
    }

    #[test]
    fn test_delisted_token_still_withdrawable() {
        let d = deploy_active(1_000 * ONE_TOKEN);
        let farm = d.token("FARM").unwrap();
        let user = AccountId::from_label("addr1");
        convert_into(&d, &user, farm, ONE_TOKEN);
        deposit(&d, &user, "FARM", farm, 4 * ONE_TOKEN);
        d.clock.mine_blocks(10);

        d.coordinator.remove_token_from_whitelist(&d.admin, &farm).unwrap();
        assert_eq!(
            d.coordinator.update_apr(&d.admin, APR, &farm).unwrap_err(),
            RewardsError::InvalidRate(farm)
        );

        let receipt = d.coordinator.withdraw(&user, "FARM", &farm, 4 * ONE_TOKEN).unwrap();
        assert_eq!(receipt.output.reward, RewardOutcome::Suspended);
        assert_eq!(receipt.output.principal, 4 * ONE_TOKEN);
    }
}

mod receipt_tests {
    use super::*;

    #[test]
    fn test_receipt_serializes_events() {
        let d = deploy();
        let farm = d.token("FARM").unwrap();
        let receipt = d.coordinator.add_token_to_whitelist(&d.admin, &farm).unwrap();

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["events"][0]["event"], "token_whitelisted");
        assert_eq!(json["status"], "Confirmed");
        assert_eq!(json["block_number"], 0);
    }

    #[test]
    fn test_admin_handover() {
        let d = deploy();
        let farm = d.token("FARM").unwrap();
        let multisig = AccountId::from_label("multisig");

        d.coordinator.transfer_admin(&d.admin, &multisig).unwrap();
        assert_eq!(d.coordinator.admin().unwrap(), multisig);
        assert_eq!(
            d.coordinator.add_token_to_whitelist(&d.admin, &farm).unwrap_err(),
            RewardsError::Unauthorized
        );
        d.coordinator.add_token_to_whitelist(&multisig, &farm).unwrap();
        assert!(d.coordinator.is_whitelisted(&farm).unwrap());
    }
}

mod concurrency_tests {
    use super::*;

    #[test]
    fn test_parallel_depositors() {
        let d = deploy_active(1_000 * ONE_TOKEN);
        let dai = d.token("DAI").unwrap();
        let users: Vec<AccountId> = (0..8)
            .map(|i| AccountId::from_label(&format!("user-{}", i)))
            .collect();
        for user in &users {
            convert_into(&d, user, dai, ONE_TOKEN);
            d.ledger
                .approve(&dai, user, &d.coordinator.account(), 100 * ONE_TOKEN)
                .unwrap();
        }

        let coordinator = Arc::clone(&d.coordinator);
        let handles: Vec<_> = users
            .iter()
            .map(|user| {
                let coordinator = Arc::clone(&coordinator);
                let user = *user;
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        coordinator.deposit(&user, "DAI", &dai, 10 * ONE_TOKEN).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(d.coordinator.total_principal(&dai).unwrap(), 800 * ONE_TOKEN);
        for user in &users {
            assert_eq!(d.coordinator.principal_of(user, &dai).unwrap(), 100 * ONE_TOKEN);
            assert_eq!(d.coordinator.lots_of(user, &dai).unwrap().len(), 10);
        }
    }
}
