/// Level for a cumulative XP total: floor(sqrt(xp / 50)) + 1.
///
/// Level 1 covers xp in [0, 49]; level L begins at xp = 50 * (L - 1)^2.
pub fn level_of(xp: u64) -> u32 {
    (xp as f64 / 50.0).sqrt().floor() as u32 + 1
}

/// Total XP at which `level` begins. `level_floor(level_of(xp)) <= xp`
/// holds for all xp.
pub fn level_floor(level: u32) -> u64 {
    let base = level.saturating_sub(1) as u64;
    50 * base * base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_boundaries() {
        assert_eq!(level_of(0), 1);
        assert_eq!(level_of(49), 1);
        assert_eq!(level_of(50), 2);
        assert_eq!(level_of(199), 2);
        assert_eq!(level_of(200), 3);
        assert_eq!(level_of(400), 3);
        assert_eq!(level_of(450), 4);
    }

    #[test]
    fn non_decreasing() {
        let mut prev = level_of(0);
        for xp in 1..=5_000u64 {
            let l = level_of(xp);
            assert!(l >= prev, "level dropped at xp={}", xp);
            prev = l;
        }
    }

    #[test]
    fn floor_matches_formula() {
        for level in 1..=20u32 {
            let floor = level_floor(level);
            assert_eq!(level_of(floor), level);
            if floor > 0 {
                assert_eq!(level_of(floor - 1), level - 1);
            }
        }
    }
}
