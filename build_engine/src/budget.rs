//! Build kernel: Point Arithmetic
//!
//! All point math goes through here. Spending is signed (a negative spend is
//! a refund); the resulting pool is unsigned and never negative.

use crate::error::Rejection;

/// Apply a net spend to the pool. Positive spends consume points,
/// negative spends refund them.
pub fn settle(points: u32, spend: i64) -> Result<u32, Rejection> {
    let next = i64::from(points) - spend;
    if next < 0 {
        return Err(Rejection::InsufficientPoints {
            required: u32::try_from(spend).unwrap_or(u32::MAX),
            available: points,
        });
    }
    u32::try_from(next).map_err(|_| Rejection::BudgetOverflow)
}

/// Net cost of swapping the held major ability for another.
pub fn swap_cost(new_cost: u32, held_cost: u32) -> i64 {
    i64::from(new_cost) - i64::from(held_cost)
}

/// Net cost of moving a stat between levels.
pub fn level_delta(from: u8, to: u8) -> i64 {
    i64::from(to) - i64::from(from)
}
