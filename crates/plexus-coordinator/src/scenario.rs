//! End-to-end reward scenario
//!
//! Drives a [`Deployment`] through the standard lifecycle:
//!
//! 1. whitelist every tier's tokens
//! 2. convert native currency into each token
//! 3. fund the treasury and set the APR
//! 4. deposit into each tier
//! 5. mine blocks
//! 6. withdraw everything and settle rewards

use crate::config::PlexusConfig;
use crate::coordinator::{ConvertOrder, TransactionStatus};
use crate::deploy::Deployment;
use plexus_core::{format_units, Amount, BlockNumber, Clock, Result, RewardsError, TokenId, ONE_TOKEN};
use plexus_rewards::RewardOutcome;
use serde::{Deserialize, Serialize};

/// Seconds a conversion stays valid
const CONVERT_DEADLINE_SECS: i64 = 10;

#[derive(Clone, Debug)]
pub struct ScenarioParams {
    /// Blocks mined between deposit and withdrawal
    pub blocks: u64,

    /// Native currency converted into each token
    pub convert_value: Amount,

    /// Tokens deposited into each tier
    pub deposit_amount: Amount,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            blocks: 10,
            convert_value: 2 * ONE_TOKEN,
            deposit_amount: 2 * ONE_TOKEN,
        }
    }
}

/// Outcome for one tier
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TierReport {
    pub tier: String,
    pub token: String,
    pub converted: Amount,
    pub deposited: Amount,
    pub balance_before: Amount,
    pub balance_after: Amount,
    pub reward: Amount,
    pub reward_status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub start_block: BlockNumber,
    pub end_block: BlockNumber,
    pub elapsed_secs: i64,
    pub apr: u64,
    pub tiers: Vec<TierReport>,
    pub reward_balance_before: Amount,
    pub reward_balance_after: Amount,
    pub treasury_after: Amount,
    pub transactions: usize,
}

impl ScenarioReport {
    pub fn total_reward(&self) -> Amount {
        self.tiers.iter().map(|t| t.reward).sum()
    }

    /// Human-readable summary
    pub fn render(&self) -> String {
        let mut out = format!(
            "Blocks {} -> {} ({}s) at APR {}\n",
            self.start_block, self.end_block, self.elapsed_secs, self.apr
        );
        for tier in &self.tiers {
            out.push_str(&format!(
                "  {:<8} {:<8} deposited {:>12}  balance {} -> {}  reward {} ({})\n",
                tier.tier,
                tier.token,
                format_units(tier.deposited),
                format_units(tier.balance_before),
                format_units(tier.balance_after),
                format_units(tier.reward),
                tier.reward_status
            ));
        }
        out.push_str(&format!(
            "Reward balance {} -> {}, treasury {} ({} transactions)\n",
            format_units(self.reward_balance_before),
            format_units(self.reward_balance_after),
            format_units(self.treasury_after),
            self.transactions
        ));
        out
    }
}

/// Deploy from `config` and run the scenario
pub fn run(config: &PlexusConfig, params: &ScenarioParams) -> Result<ScenarioReport> {
    let deployment = Deployment::setup(config)?;
    run_on(&deployment, config, params)
}

/// Run the scenario on an existing deployment, acting as the administrator
pub fn run_on(deployment: &Deployment, config: &PlexusConfig, params: &ScenarioParams) -> Result<ScenarioReport> {
    let coordinator = &deployment.coordinator;
    let owner = deployment.admin;
    let apr = config.rewards.default_apr;
    let mut transactions = 0;

    let tiers: Vec<(String, String, TokenId)> = config
        .tiers
        .iter()
        .filter_map(|tier| tier.tokens.first().map(|symbol| (tier.name.clone(), symbol.to_ascii_uppercase())))
        .map(|(tier, symbol)| deployment.token(&symbol).map(|id| (tier, symbol, id)))
        .collect::<Result<_>>()?;

    for (_, _, token) in &tiers {
        coordinator.add_token_to_whitelist(&owner, token)?;
        transactions += 1;
    }

    // Convert
    let native_needed = params
        .convert_value
        .checked_mul(tiers.len() as u128)
        .ok_or(RewardsError::Overflow("convert value"))?;
    deployment.fund_native(&owner, native_needed)?;

    let mut converted = Vec::with_capacity(tiers.len());
    for (_, _, token) in &tiers {
        let order = ConvertOrder {
            targets: vec![*token],
            paths: vec![vec![deployment.wrapped_native, *token]],
            amount_placeholder: 1,
            slippage_tolerance: 1,
            deadline: deployment.clock.now() + CONVERT_DEADLINE_SECS,
        };
        let receipt = coordinator.convert(&owner, order, params.convert_value)?;
        converted.push(receipt.output.outputs.first().map(|(_, out)| *out).unwrap_or(0));
        transactions += 1;
    }

    // Treasury and APR
    if config.rewards.treasury_funding > 0 {
        coordinator.fund_treasury(&owner, config.rewards.treasury_funding as u128 * ONE_TOKEN)?;
        transactions += 1;
    }
    for (_, _, token) in &tiers {
        coordinator.update_apr(&owner, apr, token)?;
        transactions += 1;
    }

    // Deposit
    let mut balances_before = Vec::with_capacity(tiers.len());
    for (tier, _, token) in &tiers {
        balances_before.push(deployment.ledger.balance_of(&owner, token));
        deployment
            .ledger
            .approve(token, &owner, &coordinator.account(), params.deposit_amount)?;
        coordinator.deposit(&owner, tier, token, params.deposit_amount)?;
        transactions += 1;
    }

    let reward_balance_before = deployment.ledger.balance_of(&owner, &deployment.reward_token);
    let start = deployment.clock.head();
    let end = deployment.clock.mine_blocks(params.blocks);

    // Withdraw
    let mut reports = Vec::with_capacity(tiers.len());
    for (i, (tier, symbol, token)) in tiers.iter().enumerate() {
        let receipt = coordinator.withdraw(&owner, tier, token, params.deposit_amount)?;
        transactions += 1;

        let reward_status = match (&receipt.output.reward, receipt.status) {
            (RewardOutcome::Paid { .. }, _) => "paid".to_string(),
            (RewardOutcome::NothingAccrued, _) => "nothing accrued".to_string(),
            (RewardOutcome::Suspended, _) => "suspended".to_string(),
            (RewardOutcome::Skipped { error }, TransactionStatus::RewardSkipped) => {
                format!("skipped: {}", error)
            }
            (RewardOutcome::Skipped { .. }, _) => "skipped".to_string(),
        };

        reports.push(TierReport {
            tier: tier.clone(),
            token: symbol.clone(),
            converted: converted[i],
            deposited: params.deposit_amount,
            balance_before: balances_before[i],
            balance_after: deployment.ledger.balance_of(&owner, token),
            reward: receipt.output.reward.paid(),
            reward_status,
        });
    }

    Ok(ScenarioReport {
        start_block: start.number,
        end_block: end.number,
        elapsed_secs: end.timestamp - start.timestamp,
        apr,
        tiers: reports,
        reward_balance_before,
        reward_balance_after: deployment.ledger.balance_of(&owner, &deployment.reward_token),
        treasury_after: coordinator.treasury_balance()?,
        transactions,
    })
}
