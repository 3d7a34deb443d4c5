use proptest::prelude::*;
use sysdash::cli::extract_flag_value;
use sysdash::ui::trend::{Direction, MAX_RUN, TRUNCATION_MARKER, Trend};

proptest! {
    #[test]
    fn run_never_exceeds_cap(delta in -1.0e6f32..1.0e6f32) {
        let trend = Trend::from_delta(delta);
        prop_assert!(trend.run <= MAX_RUN);
        let glyphs = trend.glyphs();
        prop_assert!(glyphs.len() <= MAX_RUN + TRUNCATION_MARKER.len() + 1);
    }

    #[test]
    fn large_moves_are_marked(magnitude in 0.2001f32..1.0e6f32, down in any::<bool>()) {
        let delta = if down { -magnitude } else { magnitude };
        let trend = Trend::from_delta(delta);
        prop_assert!(trend.truncated);
        prop_assert!(trend.glyphs().contains(TRUNCATION_MARKER));
    }

    #[test]
    fn small_moves_are_not_marked(magnitude in 0.0f32..0.199f32) {
        prop_assert!(!Trend::from_delta(magnitude).truncated);
        prop_assert!(!Trend::from_delta(-magnitude).glyphs().contains(TRUNCATION_MARKER));
    }

    #[test]
    fn direction_picks_terminal_glyph(delta in -10.0f32..10.0f32) {
        let trend = Trend::from_delta(delta);
        let last = trend.glyphs().chars().last();
        match trend.direction {
            Direction::Up | Direction::Unchanged => prop_assert_eq!(last, Some('*')),
            Direction::Down => prop_assert_eq!(last, Some('@')),
            Direction::Origin => prop_assert!(false, "deltas never yield an origin"),
        }
    }

    #[test]
    fn well_formed_flags_round_trip(value in any::<u64>()) {
        prop_assert_eq!(extract_flag_value(&format!("--samples={value}"), "samples"), Ok(value));
    }

    #[test]
    fn error_codes_stay_in_range(flag in "\\PC{0,16}", name in "[a-z]{0,8}") {
        if let Err(err) = extract_flag_value(&flag, &name) {
            prop_assert!((-6..=-1).contains(&err.code()));
        }
    }
}
