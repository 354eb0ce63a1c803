//! Property tests for light-delayed visibility

use std::collections::BTreeMap;

use lightcone::core::config::UniverseSettings;
use lightcone::core::types::{Int4D, PlayerId, Tick};
use lightcone::universe::{GlobalData, PlayerData, PlayerType, UniverseHistory, UniverseSlice};
use lightcone::visibility::{int_delay, VisibilityResolver};
use proptest::prelude::*;

const OBSERVER: PlayerId = PlayerId(0);
const TARGET: PlayerId = PlayerId(1);

/// Replay a history one slice at a time, returning the target's seen
/// time after each slice
fn replay(
    observer_at: (i64, i64, i64),
    target_path: &[(i64, i64, i64)],
    settings: &UniverseSettings,
) -> (UniverseHistory, Vec<Option<Tick>>) {
    let mut history = UniverseHistory::new();
    let mut resolver = VisibilityResolver::new();
    let mut seen = Vec::new();

    for (t, &(x, y, z)) in target_path.iter().enumerate() {
        let t = t as Tick;
        let (ox, oy, oz) = observer_at;
        let players = BTreeMap::from([
            (
                OBSERVER,
                PlayerData::new(OBSERVER, PlayerType::Ai, Int4D::new(t, ox, oy, oz)),
            ),
            (
                TARGET,
                PlayerData::new(TARGET, PlayerType::Ai, Int4D::new(t, x, y, z)),
            ),
        ]);
        let appended = history.append(UniverseSlice {
            time: t,
            players,
            global: GlobalData::default(),
        });
        assert!(appended.is_ok());

        let views = resolver.resolve_all(&history, settings);
        seen.push(views[&OBSERVER].seen_time(TARGET));
    }

    (history, seen)
}

fn coord() -> impl Strategy<Value = (i64, i64, i64)> {
    (0i64..12, 0i64..12, 0i64..3)
}

proptest! {
    /// Once seen, a target's image time never goes backwards
    #[test]
    fn seen_time_is_monotone(
        observer in coord(),
        path in prop::collection::vec(coord(), 1..30),
        t_dim in 1i64..10,
        c in 0.5f64..4.0,
    ) {
        let settings = UniverseSettings { t_dim, speed_of_light: c, ..Default::default() };
        let (_, seen) = replay(observer, &path, &settings);

        let mut last: Option<Tick> = None;
        for s in seen {
            if let Some(prev) = last {
                prop_assert!(s.is_some(), "a seen target must stay visible");
                prop_assert!(s.unwrap() >= prev);
            }
            if s.is_some() {
                last = s;
            }
        }
    }

    /// Light needs at least distance / c ticks to arrive
    #[test]
    fn seen_time_respects_light_delay(
        observer in coord(),
        path in prop::collection::vec(coord(), 1..30),
        t_dim in 1i64..10,
        c in 0.5f64..4.0,
    ) {
        let settings = UniverseSettings { t_dim, speed_of_light: c, ..Default::default() };
        let (history, seen) = replay(observer, &path, &settings);
        let (ox, oy, oz) = observer;
        let origin = Int4D::new(0, ox, oy, oz).to_int3d();

        for (now, s) in seen.into_iter().enumerate() {
            let Some(s) = s else { continue };
            let image = history.record_of(TARGET, s).unwrap();
            let delay = int_delay(origin, image.int4d.to_int3d(), c);
            prop_assert!(s <= now as Tick - delay);
            prop_assert!((s as f64) <= now as f64 - origin.distance(&image.int4d.to_int3d()) / c + 1e-9);
        }
    }

    /// A target sharing the observer's cube is always seen up to date
    #[test]
    fn colocated_target_is_current(
        at in coord(),
        len in 1usize..20,
        t_dim in 1i64..10,
    ) {
        let settings = UniverseSettings { t_dim, ..Default::default() };
        let (_, seen) = replay(at, &vec![at; len], &settings);
        for (now, s) in seen.into_iter().enumerate() {
            prop_assert_eq!(s, Some(now as Tick));
        }
    }
}
