//! Governance cycle window helpers.
//!
//! Windows are resolved via cycle boundaries rather than raw block
//! arithmetic. All functions take the ascending cycle list of the ledger.

use crate::types::Cycle;

/// The cycle containing `height`.
pub fn cycle_at(cycles: &[Cycle], height: u64) -> Option<&Cycle> {
    cycles.iter().find(|c| c.contains(height))
}

/// The cycle directly before `cycle`.
pub fn previous_cycle<'a>(cycles: &'a [Cycle], cycle: &Cycle) -> Option<&'a Cycle> {
    let pos = cycles.iter().position(|c| c == cycle)?;
    pos.checked_sub(1).map(|p| &cycles[p])
}

/// The cycle `num_past_cycles` before `cycle`, or `None` if the ledger does
/// not reach back that far.
pub fn past_cycle<'a>(cycles: &'a [Cycle], cycle: &Cycle, num_past_cycles: usize) -> Option<&'a Cycle> {
    let pos = cycles.iter().position(|c| c == cycle)?;
    if num_past_cycles == 0 {
        return Some(&cycles[pos]);
    }
    pos.checked_sub(num_past_cycles).map(|p| &cycles[p])
}

/// First block of the cycle `num_past_cycles` before the one containing
/// `height`.
///
/// Falls back to `genesis_height` if fewer past cycles exist and to 0 if no
/// cycle contains `height` at all.
pub fn first_block_of_past_cycle(cycles: &[Cycle], height: u64, num_past_cycles: usize, genesis_height: u64) -> u64 {
    let Some(current) = cycle_at(cycles, height) else {
        return 0;
    };
    past_cycle(cycles, current, num_past_cycles)
        .map(|c| c.first_block)
        .unwrap_or(genesis_height)
}

/// The cycle containing `height` followed by up to `num_cycles - 1`
/// predecessors, newest first.
pub fn trailing_cycles(cycles: &[Cycle], height: u64, num_cycles: usize) -> Vec<Cycle> {
    let Some(pos) = cycles.iter().position(|c| c.contains(height)) else {
        return Vec::new();
    };
    cycles[..=pos].iter().rev().take(num_cycles).copied().collect()
}

/// Index of the cycle containing `height`, 0 if none.
pub fn cycle_index(cycles: &[Cycle], height: u64) -> u32 {
    cycle_at(cycles, height).map(|c| c.index).unwrap_or(0)
}

/// Consecutive cycles of `length` blocks starting at `genesis_height`,
/// covering at least up to `tip`.
pub fn uniform_cycles(genesis_height: u64, length: u64, tip: u64) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    if length == 0 {
        return cycles;
    }
    let mut first_block = genesis_height;
    let mut index = 0;
    while first_block <= tip {
        cycles.push(Cycle {
            index,
            first_block,
            last_block: first_block + length - 1,
        });
        first_block += length;
        index += 1;
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycles() -> Vec<Cycle> {
        // genesis 100, cycles of 10 blocks: [100..109], [110..119], ..., [190..199]
        uniform_cycles(100, 10, 199)
    }

    #[test]
    fn uniform_cycles_cover_tip() {
        let c = cycles();
        assert_eq!(c.len(), 10);
        assert_eq!(c[0], Cycle { index: 0, first_block: 100, last_block: 109 });
        assert_eq!(c[9].last_block, 199);
        assert!(uniform_cycles(0, 0, 10).is_empty());
    }

    #[test]
    fn cycle_at_finds_containing() {
        let c = cycles();
        assert_eq!(cycle_at(&c, 115).map(|c| c.index), Some(1));
        assert_eq!(cycle_at(&c, 99), None);
        assert_eq!(cycle_at(&c, 200), None);
    }

    #[test]
    fn previous_of_first_is_none() {
        let c = cycles();
        assert_eq!(previous_cycle(&c, &c[0]), None);
        assert_eq!(previous_cycle(&c, &c[3]), Some(&c[2]));
    }

    #[test]
    fn first_block_of_past_cycle_resolves() {
        let c = cycles();
        // height 155 is in cycle 5, three cycles back is cycle 2 starting at 120
        assert_eq!(first_block_of_past_cycle(&c, 155, 3, 100), 120);
        assert_eq!(first_block_of_past_cycle(&c, 155, 0, 100), 150);
    }

    #[test]
    fn first_block_of_past_cycle_falls_back_to_genesis() {
        let c = cycles();
        assert_eq!(first_block_of_past_cycle(&c, 125, 12, 100), 100);
    }

    #[test]
    fn first_block_of_past_cycle_without_cycle_is_zero() {
        let c = cycles();
        assert_eq!(first_block_of_past_cycle(&c, 500, 3, 100), 0);
        assert_eq!(first_block_of_past_cycle(&[], 500, 3, 100), 0);
    }

    #[test]
    fn trailing_cycles_newest_first() {
        let c = cycles();
        let t = trailing_cycles(&c, 135, 3);
        let idx: Vec<u32> = t.iter().map(|c| c.index).collect();
        assert_eq!(idx, vec![3, 2, 1]);
        assert_eq!(trailing_cycles(&c, 105, 3).len(), 1);
        assert!(trailing_cycles(&c, 5, 3).is_empty());
    }

    #[test]
    fn cycle_index_defaults_to_zero() {
        let c = cycles();
        assert_eq!(cycle_index(&c, 185), 8);
        assert_eq!(cycle_index(&c, 1), 0);
    }
}
