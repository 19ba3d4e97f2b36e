// tests/property/debounce.rs

use std::time::{Duration, Instant};

use proptest::prelude::*;

use mirrorsync::engine::{CoreCommand, CoreRuntime, RuntimeEvent, RuntimeOptions};
use mirrorsync::types::{ChangeEvent, ChangeKind};

const QUIET_MS: u64 = 1_000;
const TICK_MS: u64 = 50;

proptest! {
    /// Events spaced closer than the quiet period produce exactly one pass,
    /// no earlier than one quiet period after the last event.
    #[test]
    fn burst_produces_one_pass_after_the_last_event(
        gaps in prop::collection::vec(0u64..QUIET_MS, 1..20),
    ) {
        let mut core = CoreRuntime::new(RuntimeOptions::new(Duration::from_millis(QUIET_MS)));
        let t0 = Instant::now();

        let mut event_times = Vec::new();
        let mut at = 0u64;
        for gap in &gaps {
            at += gap;
            event_times.push(at);
        }
        let last = *event_times.last().unwrap();

        let mut passes = Vec::new();
        let mut next_event = 0;
        let mut now = 0u64;
        while now <= last + QUIET_MS * 3 {
            while next_event < event_times.len() && event_times[next_event] <= now {
                let path = format!("/src/f{}", next_event % 3);
                core.step(
                    RuntimeEvent::Change(ChangeEvent::new(path, ChangeKind::Write)),
                    t0 + Duration::from_millis(event_times[next_event]),
                );
                next_event += 1;
            }

            let step = core.step(RuntimeEvent::Tick, t0 + Duration::from_millis(now));
            for command in step.commands {
                if let CoreCommand::RunPass(batch) = command {
                    passes.push((now, batch));
                    core.step(RuntimeEvent::PassCompleted, t0 + Duration::from_millis(now));
                }
            }
            now += TICK_MS;
        }

        prop_assert_eq!(passes.len(), 1);
        let (fired, batch) = &passes[0];
        prop_assert!(*fired >= last + QUIET_MS);
        prop_assert!(*fired < last + QUIET_MS + TICK_MS);
        prop_assert_eq!(batch.len(), gaps.len().min(3));
    }

    /// Only the latest kind per path survives a window.
    #[test]
    fn latest_kind_wins(kinds in prop::collection::vec(
        prop::sample::select(vec![ChangeKind::Create, ChangeKind::Write, ChangeKind::Remove, ChangeKind::Rename]),
        1..10,
    )) {
        let mut core = CoreRuntime::new(RuntimeOptions::new(Duration::from_millis(QUIET_MS)));
        let t0 = Instant::now();
        for kind in &kinds {
            core.step(RuntimeEvent::Change(ChangeEvent::new("/src/x", *kind)), t0);
        }
        prop_assert_eq!(core.pending().get(std::path::Path::new("/src/x")), kinds.last().copied());
    }
}
