//! Linear decay between a floor height and the current height.
//!
//! ```text
//! weight
//!  1.0 |                    /
//!      |                  /
//!      |                /
//! ratio|______________/
//!      +-------------+------+---> event height
//!                  floor  current
//! ```

use burnman_core::error::DecayError;

use crate::rounding::round_half_up;

/// Weight `amount` by the age of the event that produced it.
///
/// The weight is 100% at `event_height == current_height`, falls linearly to
/// `floor_ratio` at `event_height == floor_height` and stays at `floor_ratio`
/// for anything older, including when `floor_height` is negative because the
/// window reaches back before genesis.
///
/// `factor = max(0, (event - floor) / (current - floor))`,
/// `result = max(0, round(amount * (floor_ratio + factor * (1 - floor_ratio))))`.
///
/// A zero-width window (`current_height == floor_height`) has factor 0.
///
/// # Errors
///
/// Negative amount, negative event or current height, or an event after the
/// current height. These are caller bugs and are never clamped.
pub fn decayed_amount(
    amount: i64,
    event_height: i64,
    current_height: i64,
    floor_height: i64,
    floor_ratio: f64,
) -> Result<i64, DecayError> {
    if amount < 0 {
        return Err(DecayError::NegativeAmount(amount));
    }
    if event_height < 0 {
        return Err(DecayError::NegativeHeight { name: "event height", height: event_height });
    }
    if current_height < 0 {
        return Err(DecayError::NegativeHeight { name: "current height", height: current_height });
    }
    if event_height > current_height {
        return Err(DecayError::EventAfterCurrent { event: event_height, current: current_height });
    }

    let span = current_height - floor_height;
    let factor = if span == 0 {
        0.0
    } else {
        ((event_height - floor_height) as f64 / span as f64).max(0.0)
    };
    let factor_with_offset = floor_ratio + factor * (1.0 - floor_ratio);
    Ok(round_half_up(amount as f64 * factor_with_offset).max(0))
}
