use super::types::{Account, Plan, PlanRow, Strategy, active_snapshot, non_negative};

const MINIMUM_ONLY_REASON: &str = "Pay minimum to avoid fees.";

fn focus_reason(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Avalanche => "Highest APR first to reduce interest fastest.",
        Strategy::Snowball => "Smallest balance first to build momentum.",
        Strategy::Manual => "First in your chosen order.",
    }
}

pub fn compute_plan(accounts: &[Account], budget: f64, strategy: Strategy) -> Plan {
    let budget = non_negative(budget);
    let active = active_snapshot(accounts);

    let total_min = active.iter().map(|a| a.min_payment).sum::<f64>();
    let extra = (budget - total_min).max(0.0);

    let focus = strategy.focus(&active).cloned();
    let focus_id = focus.as_ref().map(|f| f.id.as_str());

    let mut rows = active
        .iter()
        .map(|account| {
            let is_focus = focus_id == Some(account.id.as_str());
            let extra_pay = if is_focus { extra } else { 0.0 };
            PlanRow {
                id: account.id.clone(),
                label: account.label(),
                min: account.min_payment,
                extra: extra_pay,
                total: account.min_payment + extra_pay,
                reason: if is_focus {
                    focus_reason(strategy)
                } else {
                    MINIMUM_ONLY_REASON
                },
            }
        })
        .collect::<Vec<_>>();

    // Focus row first; the rest keep caller order.
    rows.sort_by_key(|row| focus_id != Some(row.id.as_str()));

    Plan {
        budget,
        total_min,
        extra,
        focus,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn two_accounts() -> Vec<Account> {
        vec![
            Account::new("a", 500.0, 10.0, 25.0).with_names("First Bank", "Everyday"),
            Account::new("b", 5_000.0, 22.0, 100.0).with_names("Second Bank", "Rewards"),
        ]
    }

    #[test]
    fn avalanche_sends_extra_to_highest_apr() {
        let plan = compute_plan(&two_accounts(), 500.0, Strategy::Avalanche);
        assert_approx(plan.total_min, 125.0);
        assert_approx(plan.extra, 375.0);
        assert_eq!(plan.focus.as_ref().map(|f| f.id.as_str()), Some("b"));

        assert_eq!(plan.rows.len(), 2);
        assert_eq!(plan.rows[0].id, "b");
        assert_approx(plan.rows[0].extra, 375.0);
        assert_approx(plan.rows[0].total, 475.0);
        assert_eq!(plan.rows[0].reason, "Highest APR first to reduce interest fastest.");
        assert_eq!(plan.rows[1].id, "a");
        assert_approx(plan.rows[1].extra, 0.0);
        assert_approx(plan.rows[1].total, 25.0);
        assert_eq!(plan.rows[1].reason, MINIMUM_ONLY_REASON);
        assert_eq!(plan.rows[1].label, "First Bank • Everyday");
    }

    #[test]
    fn snowball_sends_extra_to_smallest_balance() {
        let plan = compute_plan(&two_accounts(), 500.0, Strategy::Snowball);
        assert_eq!(plan.focus.as_ref().map(|f| f.id.as_str()), Some("a"));
        assert_eq!(plan.rows[0].id, "a");
        assert_approx(plan.rows[0].extra, 375.0);
        assert_approx(plan.rows[1].extra, 0.0);
        assert_eq!(plan.rows[0].reason, "Smallest balance first to build momentum.");
    }

    #[test]
    fn manual_targets_first_account_in_caller_order() {
        let mut accounts = two_accounts();
        accounts.reverse();
        let plan = compute_plan(&accounts, 500.0, Strategy::Manual);
        assert_eq!(plan.focus.as_ref().map(|f| f.id.as_str()), Some("b"));
        assert_eq!(plan.rows[0].reason, "First in your chosen order.");
    }

    #[test]
    fn zero_balance_accounts_get_no_row() {
        let mut accounts = two_accounts();
        accounts.push(Account::new("paid", 0.0, 30.0, 50.0));
        let plan = compute_plan(&accounts, 500.0, Strategy::Avalanche);
        assert_eq!(plan.rows.len(), 2);
        assert!(plan.rows.iter().all(|r| r.id != "paid"));
        assert_approx(plan.total_min, 125.0);
    }

    #[test]
    fn budget_below_minimums_has_no_extra() {
        let plan = compute_plan(&two_accounts(), 50.0, Strategy::Avalanche);
        assert_approx(plan.extra, 0.0);
        assert!(plan.rows.iter().all(|r| r.extra == 0.0));
        assert_approx(plan.rows[0].total, 100.0);
    }

    #[test]
    fn negative_or_non_finite_budget_is_zero() {
        let plan = compute_plan(&two_accounts(), -200.0, Strategy::Avalanche);
        assert_approx(plan.budget, 0.0);
        assert_approx(plan.extra, 0.0);

        let plan = compute_plan(&two_accounts(), f64::NAN, Strategy::Avalanche);
        assert_approx(plan.budget, 0.0);
    }

    #[test]
    fn non_finite_fields_are_coerced_to_zero() {
        let accounts = vec![
            Account::new("x", 1_000.0, f64::NAN, f64::INFINITY),
            Account::new("y", 200.0, 12.0, 20.0),
        ];
        let plan = compute_plan(&accounts, 100.0, Strategy::Avalanche);
        assert_approx(plan.total_min, 20.0);
        assert_eq!(plan.focus.as_ref().map(|f| f.id.as_str()), Some("y"));
    }

    #[test]
    fn empty_accounts_produce_empty_plan() {
        let plan = compute_plan(&[], 300.0, Strategy::Snowball);
        assert!(plan.rows.is_empty());
        assert!(plan.focus.is_none());
        assert_approx(plan.total_min, 0.0);
        assert_approx(plan.extra, 300.0);
    }

    #[test]
    fn rows_after_focus_keep_caller_order() {
        let accounts = vec![
            Account::new("p", 900.0, 5.0, 10.0),
            Account::new("q", 800.0, 29.0, 10.0),
            Account::new("r", 700.0, 7.0, 10.0),
            Account::new("s", 600.0, 3.0, 10.0),
        ];
        let plan = compute_plan(&accounts, 100.0, Strategy::Avalanche);
        let ids = plan.rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["q", "p", "r", "s"]);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_plan_is_deterministic_and_conserves_budget(
            balances in proptest::collection::vec(0u32..20_000, 0..6),
            apr_bp in proptest::collection::vec(0u32..3_500, 6),
            mins in proptest::collection::vec(0u32..400, 6),
            budget in 0u32..5_000,
            strategy_idx in 0usize..3
        ) {
            let strategy = [Strategy::Avalanche, Strategy::Snowball, Strategy::Manual][strategy_idx];
            let accounts = balances
                .iter()
                .enumerate()
                .map(|(i, b)| Account::new(format!("acct-{i}"), *b as f64, apr_bp[i] as f64 / 100.0, mins[i] as f64))
                .collect::<Vec<_>>();

            let first = compute_plan(&accounts, budget as f64, strategy);
            let second = compute_plan(&accounts, budget as f64, strategy);
            prop_assert_eq!(&first, &second);

            let extras = first.rows.iter().filter(|r| r.extra > 0.0).count();
            prop_assert!(extras <= 1);
            if let Some(focus) = &first.focus {
                prop_assert_eq!(&first.rows[0].id, &focus.id);
            }

            let total = first.rows.iter().map(|r| r.total).sum::<f64>();
            prop_assert!(total <= (budget as f64).max(first.total_min) + 1e-6);

            for row in &first.rows {
                prop_assert!((row.total - row.min - row.extra).abs() <= 1e-9);
            }
        }

        #[test]
        fn prop_avalanche_and_snowball_focus_respect_ordering(
            balances in proptest::collection::vec(1u32..20_000, 1..6),
            apr_bp in proptest::collection::vec(0u32..3_500, 6)
        ) {
            let accounts = balances
                .iter()
                .enumerate()
                .map(|(i, b)| Account::new(format!("acct-{i}"), *b as f64, apr_bp[i] as f64 / 100.0, 10.0))
                .collect::<Vec<_>>();

            let avalanche = compute_plan(&accounts, 1_000.0, Strategy::Avalanche);
            let focus = avalanche.focus.expect("focus expected");
            for account in &accounts {
                prop_assert!(focus.apr >= account.apr);
                if account.apr == focus.apr {
                    prop_assert!(focus.balance <= account.balance);
                }
            }

            let snowball = compute_plan(&accounts, 1_000.0, Strategy::Snowball);
            let focus = snowball.focus.expect("focus expected");
            for account in &accounts {
                prop_assert!(focus.balance <= account.balance);
                if account.balance == focus.balance {
                    prop_assert!(focus.apr >= account.apr);
                }
            }
        }
    }
}
