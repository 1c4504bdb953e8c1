//! Height-dependent confirmation-delay policy
//!
//! How many blocks must elapse past an event before it is treated as
//! irreversible depends on when the event happened: some historical height
//! ranges of the external chain carried weaker finality guarantees (proof-of-
//! authority test ranges, reorg incidents) and need deeper confirmation,
//! while ranges served by instant-finality infrastructure need none.
//!
//! The rule is a small piecewise-constant table: ranges are closed on the low
//! end, open on the high end, evaluated in ascending order, and every height
//! not covered by a range (below the first, between ranges, above the last)
//! takes the default delay. Total and pure, O(ranges) per call.

use serde::{Deserialize, Serialize};

/// Confirmation delay applied while a height falls in `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub from: u64,
    pub to: u64,
    pub delay: u64,
}

/// Piecewise confirmation-delay rule for one external chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityRule {
    ranges: Vec<DelayRange>,
    default_delay: u64,
}

/// Delay applied outside every configured range
const DEFAULT_BLOCK_DELAY: u64 = 6;

impl Default for FinalityRule {
    /// The documented breakpoint table:
    /// heights 4..6 ran proof-of-authority finality (10 blocks), 2018..2021
    /// and 31337..31338 are served by instant-finality infrastructure (none),
    /// everything else takes the 6-block default.
    fn default() -> Self {
        FinalityRule::new(
            vec![
                DelayRange { from: 4, to: 6, delay: 10 },
                DelayRange { from: 2018, to: 2021, delay: 0 },
                DelayRange { from: 31337, to: 31338, delay: 0 },
            ],
            DEFAULT_BLOCK_DELAY,
        )
    }
}

impl FinalityRule {
    /// Build a rule from ranges (sorted here; evaluation is ascending)
    pub fn new(mut ranges: Vec<DelayRange>, default_delay: u64) -> Self {
        ranges.sort_by_key(|r| r.from);
        FinalityRule {
            ranges,
            default_delay,
        }
    }

    /// Required confirmation delay, in blocks, for an event at `height`.
    /// Defined for every u64 input.
    pub fn required_delay(&self, height: u64) -> u64 {
        for range in &self.ranges {
            if height >= range.from && height < range.to {
                return range.delay;
            }
        }
        self.default_delay
    }

    /// Whether an event observed at `event_height` is safe to act on given
    /// the chain tip `latest_height`: true once
    /// `latest_height >= event_height + required_delay(event_height)`.
    pub fn is_final(&self, event_height: u64, latest_height: u64) -> bool {
        match event_height.checked_add(self.required_delay(event_height)) {
            Some(required) => latest_height >= required,
            // Past the representable range: never final
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_breakpoints() {
        let rule = FinalityRule::default();
        assert_eq!(rule.required_delay(1), 6);
        assert_eq!(rule.required_delay(2018), 0);
        assert_eq!(rule.required_delay(5), 10);
        assert_eq!(rule.required_delay(1235), 6);
    }

    #[test]
    fn test_range_bounds() {
        let rule = FinalityRule::default();
        // closed low end, open high end
        assert_eq!(rule.required_delay(4), 10);
        assert_eq!(rule.required_delay(6), 6);
        assert_eq!(rule.required_delay(2020), 0);
        assert_eq!(rule.required_delay(2021), 6);
        assert_eq!(rule.required_delay(31337), 0);
        assert_eq!(rule.required_delay(31338), 6);
    }

    #[test]
    fn test_total_over_u64() {
        let rule = FinalityRule::default();
        assert_eq!(rule.required_delay(0), 6);
        assert_eq!(rule.required_delay(u64::MAX), 6);
    }

    #[test]
    fn test_unsorted_ranges_are_sorted() {
        let rule = FinalityRule::new(
            vec![
                DelayRange { from: 100, to: 200, delay: 1 },
                DelayRange { from: 0, to: 50, delay: 2 },
            ],
            9,
        );
        assert_eq!(rule.required_delay(10), 2);
        assert_eq!(rule.required_delay(150), 1);
        assert_eq!(rule.required_delay(75), 9);
    }

    #[test]
    fn test_is_final() {
        let rule = FinalityRule::default();
        // delay 6 at height 100: final once the tip reaches 106
        assert!(!rule.is_final(100, 105));
        assert!(rule.is_final(100, 106));
        // delay 0 at height 2018: final immediately
        assert!(rule.is_final(2018, 2018));
        // an event "ahead of" the tip is not final
        assert!(!rule.is_final(2025, 2018));
    }

    #[test]
    fn test_is_final_near_u64_max() {
        let rule = FinalityRule::default();
        // event_height + delay would overflow: treated as never final
        assert!(!rule.is_final(u64::MAX, u64::MAX));

        let zero_delay = FinalityRule::new(vec![], 0);
        assert!(zero_delay.is_final(u64::MAX, u64::MAX));
    }
}
