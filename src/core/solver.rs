use serde::Serialize;
use thiserror::Error;

use super::engine::run_simulation;
use super::types::{Account, MAX_HORIZON_MONTHS, Strategy, active_snapshot};

pub const MAX_SOLVE_ITERATIONS: u32 = 200;

#[derive(Debug, Clone, Copy)]
pub struct BudgetGoalConfig {
    pub target_months: u32,
    pub strategy: Strategy,
    pub search_min: Option<f64>,
    pub search_max: Option<f64>,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl BudgetGoalConfig {
    pub fn new(target_months: u32, strategy: Strategy) -> Self {
        Self {
            target_months,
            strategy,
            search_min: None,
            search_max: None,
            tolerance: 0.5,
            max_iterations: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetGoalIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_budget: f64,
    pub months: u32,
    pub paid_off: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetGoalResult {
    pub target_months: u32,
    pub strategy: Strategy,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_budget: Option<f64>,
    pub achieved_months: Option<u32>,
    pub achieved_interest: Option<f64>,
    pub iterations: Vec<BudgetGoalIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
    #[error("targetMonths must be > 0")]
    ZeroTarget,
    #[error("targetMonths must be at most 1200")]
    TargetTooLong,
    #[error("search bounds must be finite and >= 0")]
    InvalidBounds,
    #[error("searchMax must be greater than searchMin")]
    EmptyRange,
    #[error("tolerance must be > 0")]
    InvalidTolerance,
    #[error("maxIterations must be > 0")]
    ZeroIterations,
    #[error("maxIterations must be at most 200")]
    TooManyIterations,
}

#[derive(Debug, Clone, Copy)]
struct CandidateEval {
    months: u32,
    total_interest: f64,
    paid_off: bool,
}

impl CandidateEval {
    fn meets(self, target_months: u32) -> bool {
        self.paid_off && self.months <= target_months
    }
}

pub fn solve_budget(
    accounts: &[Account],
    config: BudgetGoalConfig,
) -> Result<BudgetGoalResult, SolveError> {
    let active = active_snapshot(accounts);
    let (search_min, search_max) = resolve_bounds(&active, config)?;
    validate_config(config, search_min, search_max)?;

    let target = config.target_months;
    let mut iterations = Vec::new();
    let low_eval = evaluate_candidate(&active, config, search_min);
    let high_eval = evaluate_candidate(&active, config, search_max);

    let mut solved_budget = None;
    let mut converged = false;
    let feasible;
    let message;

    if low_eval.meets(target) {
        solved_budget = Some(search_min);
        converged = true;
        feasible = true;
        message = "Already pays off within target at the lower budget bound.".to_string();
    } else if !high_eval.meets(target) {
        feasible = false;
        message = "No budget within the search bounds pays off in time.".to_string();
    } else {
        let mut lo = search_min;
        let mut hi = search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let eval = evaluate_candidate(&active, config, mid);
            iterations.push(BudgetGoalIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_budget: mid,
                months: eval.months,
                paid_off: eval.paid_off,
            });

            if eval.meets(target) {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_budget = Some(hi);
        feasible = true;
        message = if converged {
            "Solved minimum monthly budget.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        };
    }

    let final_eval = solved_budget.map(|budget| evaluate_candidate(&active, config, budget));
    tracing::debug!(
        target_months = target,
        solved = ?solved_budget,
        iterations = iterations.len(),
        "budget goal solve finished"
    );

    Ok(BudgetGoalResult {
        target_months: target,
        strategy: config.strategy,
        search_min,
        search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_budget,
        achieved_months: final_eval.map(|e| e.months),
        achieved_interest: final_eval.map(|e| e.total_interest),
        iterations,
        converged,
        feasible,
        message,
    })
}

fn resolve_bounds(active: &[Account], config: BudgetGoalConfig) -> Result<(f64, f64), SolveError> {
    let total_min = active.iter().map(|a| a.min_payment).sum::<f64>();
    let total_debt = active.iter().map(|a| a.balance).sum::<f64>();

    let search_min = config.search_min.unwrap_or(total_min);
    // Paying the full debt plus a month of minimums clears any positive-APR
    // portfolio in a single month.
    let search_max = config
        .search_max
        .unwrap_or_else(|| (total_debt + total_min).max(search_min + 1.0));

    if !search_min.is_finite() || !search_max.is_finite() || search_min < 0.0 {
        return Err(SolveError::InvalidBounds);
    }
    Ok((search_min, search_max))
}

fn evaluate_candidate(active: &[Account], config: BudgetGoalConfig, budget: f64) -> CandidateEval {
    let result = run_simulation(active, budget, config.strategy, config.target_months, false);
    CandidateEval {
        months: result.months,
        total_interest: result.total_interest,
        paid_off: result.paid_off,
    }
}

fn validate_config(
    config: BudgetGoalConfig,
    search_min: f64,
    search_max: f64,
) -> Result<(), SolveError> {
    if config.target_months == 0 {
        return Err(SolveError::ZeroTarget);
    }
    if config.target_months > MAX_HORIZON_MONTHS {
        return Err(SolveError::TargetTooLong);
    }
    if search_max <= search_min {
        return Err(SolveError::EmptyRange);
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::InvalidTolerance);
    }
    if config.max_iterations == 0 {
        return Err(SolveError::ZeroIterations);
    }
    if config.max_iterations > MAX_SOLVE_ITERATIONS {
        return Err(SolveError::TooManyIterations);
    }
    Ok(())
}
