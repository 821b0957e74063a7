use chrono::NaiveDate;

use super::engine::{payoff_date_estimate, run_simulation, simulate_payoff_on};
use super::types::{
    Account, Insight, InsightKind, PortfolioMetrics, Strategy, WhatIfOutcome, active_snapshot,
    non_negative,
};

pub const DEFAULT_WHAT_IF_DELTAS: [f64; 3] = [100.0, 50.0, -50.0];

const HIGH_APR_THRESHOLD: f64 = 20.0;

pub fn portfolio_metrics(accounts: &[Account]) -> PortfolioMetrics {
    let active = active_snapshot(accounts);
    PortfolioMetrics {
        total_debt: active.iter().map(|a| a.balance).sum(),
        monthly_interest: active.iter().map(|a| a.balance * a.monthly_rate()).sum(),
        total_min: active.iter().map(|a| a.min_payment).sum(),
        active_accounts: active.len(),
    }
}

pub fn what_if(
    accounts: &[Account],
    budget: f64,
    strategy: Strategy,
    deltas: &[f64],
    horizon_months: u32,
) -> Vec<WhatIfOutcome> {
    let budget = non_negative(budget);
    let base = run_simulation(accounts, budget, strategy, horizon_months, false);

    deltas
        .iter()
        .filter(|delta| delta.is_finite())
        .map(|&delta| {
            let scenario_budget = (budget + delta).max(0.0);
            let scenario = run_simulation(accounts, scenario_budget, strategy, horizon_months, false);
            WhatIfOutcome {
                delta,
                budget: scenario_budget,
                months: scenario.months,
                total_interest: scenario.total_interest,
                months_saved: i64::from(base.months) - i64::from(scenario.months),
                interest_saved: base.total_interest - scenario.total_interest,
            }
        })
        .collect()
}

pub fn insights(
    accounts: &[Account],
    budget: f64,
    strategy: Strategy,
    horizon_months: u32,
    today: NaiveDate,
) -> Vec<Insight> {
    let active = active_snapshot(accounts);
    if active.is_empty() {
        return Vec::new();
    }

    let report = simulate_payoff_on(&active, budget, strategy, horizon_months, today);
    let mut out = Vec::with_capacity(3);

    let on_track = match payoff_date_estimate(report.months, today) {
        Some(date) if report.paid_off => format!(
            "You're on track to be debt-free by {}. Your current strategy saves {} vs minimum payments only.",
            date.format("%b %Y"),
            money(report.interest_saved)
        ),
        _ => format!(
            "At this budget the balances are not paid off within {horizon_months} months. Raise the budget to reach a debt-free date."
        ),
    };
    out.push(Insight {
        kind: InsightKind::Success,
        message: on_track,
    });

    if let Some(focus) = strategy.focus(&active) {
        let monthly_extra = (report.budget - report.total_min).max(1.0);
        let months = (focus.balance / monthly_extra).ceil() as u64;
        out.push(Insight {
            kind: InsightKind::Info,
            message: format!(
                "Upcoming Milestone: You'll pay off {} in about {months} months if you continue.",
                display_name(focus)
            ),
        });
    }

    if let Some(high) = active.iter().find(|a| a.apr > HIGH_APR_THRESHOLD) {
        out.push(Insight {
            kind: InsightKind::Warning,
            message: format!(
                "Consider transferring {} balance to a 0% card. This could save you {} in interest over 12 months.",
                display_name(high),
                money(high.balance * high.apr / 100.0)
            ),
        });
    }

    out
}

fn display_name(account: &Account) -> &str {
    if account.nickname.is_empty() {
        &account.id
    } else {
        &account.nickname
    }
}

fn money(value: f64) -> String {
    format!("${value:.2}")
}
