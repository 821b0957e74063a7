use chrono::{Months, NaiveDate, Utc};

use super::priority::Prioritized;
use super::types::{
    Account, AccountPayment, DebtPoint, FocusAccount, LEDGER_MONTHS, MonthRecord, PayoffReport,
    Rationale, SimulationResult, Strategy, active_snapshot, non_negative,
};

const PAID_OFF_EPSILON: f64 = 1e-5;
const EXTRA_THRESHOLD: f64 = 0.01;
const NEGLIGIBLE_SAVINGS: f64 = 1.0;

#[derive(Debug, Clone)]
struct WorkingBalance {
    id: String,
    apr: f64,
    min_payment: f64,
    balance: f64,
}

impl From<Account> for WorkingBalance {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            apr: account.apr,
            min_payment: account.min_payment,
            balance: account.balance,
        }
    }
}

impl Prioritized for WorkingBalance {
    fn priority_apr(&self) -> f64 {
        self.apr
    }

    fn priority_balance(&self) -> f64 {
        self.balance
    }
}

#[derive(Debug, Clone)]
struct MonthAllocation {
    payments: Vec<f64>,
    minimums_paid: f64,
    extra_paid: f64,
    shortfall: bool,
}

pub fn simulate_payoff(
    accounts: &[Account],
    budget: f64,
    strategy: Strategy,
    horizon_months: u32,
) -> PayoffReport {
    simulate_payoff_on(
        accounts,
        budget,
        strategy,
        horizon_months,
        Utc::now().date_naive(),
    )
}

pub fn simulate_payoff_on(
    accounts: &[Account],
    budget: f64,
    strategy: Strategy,
    horizon_months: u32,
    today: NaiveDate,
) -> PayoffReport {
    let budget = non_negative(budget);
    let active = active_snapshot(accounts);

    let total_min = active.iter().map(|a| a.min_payment).sum::<f64>();
    let feasible = budget >= total_min && active.iter().all(|a| a.min_payment > 0.0);

    let baseline = run_simulation(&active, total_min, Strategy::Avalanche, horizon_months, true);
    let plan = run_simulation(&active, budget, strategy, horizon_months, false);

    let focus = strategy.focus(&active);
    let why = focus.map(|f| build_rationale(f, strategy, &plan, &baseline));
    if !plan.paid_off {
        tracing::debug!(
            strategy = strategy.name(),
            horizon_months,
            remaining = plan.remaining_balance,
            "payoff not reached within horizon"
        );
    }

    PayoffReport {
        feasible,
        budget,
        total_min,
        extra: (budget - total_min).max(0.0),
        months: plan.months,
        paid_off: plan.paid_off,
        total_interest: plan.total_interest,
        payoff_date_estimate: payoff_date_estimate(plan.months, today),
        baseline_months: baseline.months,
        baseline_interest: baseline.total_interest,
        interest_saved: (baseline.total_interest - plan.total_interest).max(0.0),
        focus_account: focus.map(|f| FocusAccount {
            id: f.id.clone(),
            label: f.label(),
            apr: f.apr,
            balance: f.balance,
        }),
        why,
        monthly_breakdown: plan.monthly_breakdown,
        timeline: plan.timeline,
    }
}

pub fn run_simulation(
    accounts: &[Account],
    budget: f64,
    strategy: Strategy,
    horizon_months: u32,
    minimum_only: bool,
) -> SimulationResult {
    let budget = non_negative(budget);
    let mut working = active_snapshot(accounts)
        .into_iter()
        .map(WorkingBalance::from)
        .collect::<Vec<_>>();

    let mut months = 0;
    let mut total_interest = 0.0;
    let mut monthly_breakdown = Vec::with_capacity(LEDGER_MONTHS);
    let mut timeline = Vec::new();

    while months < horizon_months && !is_paid_off(&working) {
        let interest = accrue_interest(&mut working);
        total_interest += interest;

        let allocation = allocate_month(&working, budget, strategy, minimum_only);
        apply_payments(&mut working, &allocation.payments);

        if (months as usize) < LEDGER_MONTHS {
            monthly_breakdown.push(MonthRecord {
                month: months + 1,
                interest,
                payments: working
                    .iter()
                    .zip(allocation.payments.iter())
                    .map(|(w, pay)| AccountPayment {
                        id: w.id.clone(),
                        pay: *pay,
                    })
                    .collect(),
            });
        }

        months += 1;
        timeline.push(DebtPoint {
            month: months,
            debt: total_balance(&working),
        });
    }

    SimulationResult {
        months,
        paid_off: is_paid_off(&working),
        total_interest,
        remaining_balance: total_balance(&working),
        monthly_breakdown,
        timeline,
    }
}

pub fn payoff_date_estimate(months: u32, today: NaiveDate) -> Option<NaiveDate> {
    if months == 0 {
        return None;
    }
    today.checked_add_months(Months::new(months))
}

fn is_paid_off(working: &[WorkingBalance]) -> bool {
    working.iter().all(|w| w.balance <= PAID_OFF_EPSILON)
}

fn total_balance(working: &[WorkingBalance]) -> f64 {
    working.iter().map(|w| w.balance).sum()
}

fn accrue_interest(working: &mut [WorkingBalance]) -> f64 {
    let mut interest = 0.0;
    for w in working.iter_mut().filter(|w| w.balance > 0.0) {
        let accrued = w.balance * (w.apr / 100.0) / 12.0;
        w.balance += accrued;
        interest += accrued;
    }
    interest
}

fn allocate_month(
    working: &[WorkingBalance],
    budget: f64,
    strategy: Strategy,
    minimum_only: bool,
) -> MonthAllocation {
    let minimums = working
        .iter()
        .map(|w| {
            if w.balance <= 0.0 {
                0.0
            } else {
                w.min_payment.min(w.balance)
            }
        })
        .collect::<Vec<_>>();
    let min_total = minimums.iter().sum::<f64>();

    if budget < min_total {
        // Shortfall: split the budget by each account's share of the minimums.
        let payments = minimums
            .iter()
            .map(|m| if *m > 0.0 { budget * (m / min_total) } else { 0.0 })
            .collect::<Vec<_>>();
        return MonthAllocation {
            payments,
            minimums_paid: budget,
            extra_paid: 0.0,
            shortfall: true,
        };
    }

    let mut payments = minimums;
    let remaining = budget - min_total;
    let mut extra_paid = 0.0;

    if !minimum_only && remaining > EXTRA_THRESHOLD {
        let mut order = (0..working.len())
            .filter(|&idx| working[idx].balance > 0.0)
            .collect::<Vec<_>>();
        order.sort_by(|&a, &b| strategy.compare(&working[a], &working[b]));

        let mut pool = remaining;
        for idx in order {
            if pool <= EXTRA_THRESHOLD {
                break;
            }
            // Capped at the post-accrual balance; any overshoot past the
            // minimum is absorbed by the clamp in apply_payments.
            let pay = pool.min(working[idx].balance);
            payments[idx] += pay;
            pool -= pay;
            extra_paid += pay;
        }
    }

    MonthAllocation {
        payments,
        minimums_paid: min_total,
        extra_paid,
        shortfall: false,
    }
}

fn apply_payments(working: &mut [WorkingBalance], payments: &[f64]) {
    for (w, pay) in working.iter_mut().zip(payments.iter()) {
        w.balance = (w.balance - pay).max(0.0);
    }
}

fn build_rationale(
    focus: &Account,
    strategy: Strategy,
    plan: &SimulationResult,
    baseline: &SimulationResult,
) -> Rationale {
    let strategy_rule = match strategy {
        Strategy::Avalanche => {
            "Avalanche focuses on the highest APR first to reduce interest fastest."
        }
        Strategy::Snowball => "Snowball focuses on the smallest balance first to build momentum.",
        Strategy::Manual => "Manual mode follows your own order and sends extra to the first account.",
    };

    let apr_note = match strategy {
        Strategy::Avalanche => format!(
            "This account has an APR of {:.2}%, which is where interest grows fastest.",
            focus.apr
        ),
        Strategy::Snowball | Strategy::Manual => {
            format!("This account has an APR of {:.2}%.", focus.apr)
        }
    };

    let savings = (baseline.total_interest - plan.total_interest).max(0.0);
    let savings_note = if savings > NEGLIGIBLE_SAVINGS {
        format!(
            "Compared to paying only minimums, this plan saves about ${:.0} in interest overall.",
            savings.round()
        )
    } else {
        "Interest savings versus minimum-only payments are negligible at this budget.".to_string()
    };

    Rationale {
        title: "Why this account is first".to_string(),
        strategy_rule: strategy_rule.to_string(),
        apr_note,
        savings_note,
    }
}
