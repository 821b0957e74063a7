mod allocator;
mod engine;
mod insights;
mod priority;
mod solver;
mod types;

pub use allocator::compute_plan;
pub use engine::{payoff_date_estimate, run_simulation, simulate_payoff, simulate_payoff_on};
pub use insights::{DEFAULT_WHAT_IF_DELTAS, insights, portfolio_metrics, what_if};
pub use priority::Prioritized;
pub use solver::{
    BudgetGoalConfig, BudgetGoalIteration, BudgetGoalResult, MAX_SOLVE_ITERATIONS, SolveError,
    solve_budget,
};
pub use types::{
    Account, AccountPayment, DEFAULT_HORIZON_MONTHS, DebtPoint, FocusAccount, Insight, InsightKind,
    LEDGER_MONTHS, MAX_HORIZON_MONTHS, MonthRecord, PayoffReport, Plan, PlanRow, PortfolioMetrics,
    Rationale, SimulationResult, Strategy, WhatIfOutcome,
};
