use std::cmp::Ordering;

use super::types::{Account, Strategy};

/// Anything the strategy comparator can rank: allocation rows, focus
/// candidates and the simulator's working balances all go through here so
/// their orderings cannot diverge.
pub trait Prioritized {
    fn priority_apr(&self) -> f64;
    fn priority_balance(&self) -> f64;
}

impl Prioritized for Account {
    fn priority_apr(&self) -> f64 {
        self.apr
    }

    fn priority_balance(&self) -> f64 {
        self.balance
    }
}

impl<T: Prioritized + ?Sized> Prioritized for &T {
    fn priority_apr(&self) -> f64 {
        (**self).priority_apr()
    }

    fn priority_balance(&self) -> f64 {
        (**self).priority_balance()
    }
}

impl Strategy {
    pub fn compare<T: Prioritized>(self, a: &T, b: &T) -> Ordering {
        match self {
            Strategy::Avalanche => b
                .priority_apr()
                .total_cmp(&a.priority_apr())
                .then_with(|| a.priority_balance().total_cmp(&b.priority_balance())),
            Strategy::Snowball => a
                .priority_balance()
                .total_cmp(&b.priority_balance())
                .then_with(|| b.priority_apr().total_cmp(&a.priority_apr())),
            Strategy::Manual => Ordering::Equal,
        }
    }

    /// Stable sort, so equal keys (and every manual comparison) keep caller order.
    pub fn sort<T: Prioritized>(self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }

    pub fn focus<'a, T: Prioritized>(self, items: &'a [T]) -> Option<&'a T> {
        items.iter().min_by(|a, b| self.compare(*a, *b))
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Avalanche => "avalanche",
            Strategy::Snowball => "snowball",
            Strategy::Manual => "manual",
        }
    }
}
