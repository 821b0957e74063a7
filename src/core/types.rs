use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_HORIZON_MONTHS: u32 = 360;
pub const LEDGER_MONTHS: usize = 12;
pub const MAX_HORIZON_MONTHS: u32 = 1_200;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Avalanche,
    Snowball,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub bank: String,
    pub nickname: String,
    pub balance: f64,
    pub apr: f64,
    pub min_payment: f64,
    pub due_date: String,
}

impl Account {
    pub fn new(id: impl Into<String>, balance: f64, apr: f64, min_payment: f64) -> Self {
        Self {
            id: id.into(),
            bank: String::new(),
            nickname: String::new(),
            balance,
            apr,
            min_payment,
            due_date: String::new(),
        }
    }

    pub fn with_names(mut self, bank: impl Into<String>, nickname: impl Into<String>) -> Self {
        self.bank = bank.into();
        self.nickname = nickname.into();
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = due_date.into();
        self
    }

    pub fn label(&self) -> String {
        format!("{} • {}", self.bank, self.nickname)
    }

    pub fn is_active(&self) -> bool {
        self.balance > 0.0
    }

    pub fn monthly_rate(&self) -> f64 {
        (self.apr / 100.0) / 12.0
    }

    /// Copy with every numeric field coerced to a finite, non-negative value.
    pub fn sanitized(&self) -> Self {
        Self {
            balance: non_negative(self.balance),
            apr: non_negative(self.apr),
            min_payment: non_negative(self.min_payment),
            ..self.clone()
        }
    }
}

pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub(crate) fn active_snapshot(accounts: &[Account]) -> Vec<Account> {
    accounts
        .iter()
        .map(Account::sanitized)
        .filter(Account::is_active)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRow {
    pub id: String,
    pub label: String,
    pub min: f64,
    pub extra: f64,
    pub total: f64,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub budget: f64,
    pub total_min: f64,
    pub extra: f64,
    pub focus: Option<Account>,
    pub rows: Vec<PlanRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayment {
    pub id: String,
    pub pay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    pub month: u32,
    pub interest: f64,
    pub payments: Vec<AccountPayment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPoint {
    pub month: u32,
    pub debt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub months: u32,
    pub paid_off: bool,
    pub total_interest: f64,
    pub remaining_balance: f64,
    pub monthly_breakdown: Vec<MonthRecord>,
    /// Total balance left after each month's payments, one point per simulated month.
    pub timeline: Vec<DebtPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusAccount {
    pub id: String,
    pub label: String,
    pub apr: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rationale {
    pub title: String,
    pub strategy_rule: String,
    pub apr_note: String,
    pub savings_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffReport {
    pub feasible: bool,
    pub budget: f64,
    pub total_min: f64,
    pub extra: f64,
    pub months: u32,
    pub paid_off: bool,
    pub total_interest: f64,
    pub payoff_date_estimate: Option<NaiveDate>,
    pub baseline_months: u32,
    pub baseline_interest: f64,
    pub interest_saved: f64,
    #[serde(rename = "focusCard")]
    pub focus_account: Option<FocusAccount>,
    pub why: Option<Rationale>,
    pub monthly_breakdown: Vec<MonthRecord>,
    pub timeline: Vec<DebtPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub total_debt: f64,
    pub monthly_interest: f64,
    pub total_min: f64,
    pub active_accounts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfOutcome {
    pub delta: f64,
    pub budget: f64,
    pub months: u32,
    pub total_interest: f64,
    pub months_saved: i64,
    pub interest_saved: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Success,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}
