use std::time::Duration;

use assetkiln::engine::Scheduler;
use assetkiln::task::{TaskExpr, parallel, sequence};
use assetkiln_test_utils::{EventLog, FakeTask};
use proptest::prelude::*;

fn run_topology(clean_ms: u64, asset_ms: &[u64], failing: &[bool]) -> EventLog {
    let log = EventLog::new();

    let assets: Vec<TaskExpr> = asset_ms
        .iter()
        .zip(failing)
        .enumerate()
        .map(|(i, (ms, fail))| {
            let mut task =
                FakeTask::new(&format!("asset_{i}"), &log).with_delay(Duration::from_millis(*ms));
            if *fail {
                task = task.failing();
            }
            TaskExpr::task(task.arc()).guarded()
        })
        .collect();

    let expr = sequence([
        TaskExpr::task(
            FakeTask::new("clean", &log)
                .with_delay(Duration::from_millis(clean_ms))
                .arc(),
        ),
        parallel(assets),
        TaskExpr::task(FakeTask::new("watch", &log).arc()),
    ]);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap();
    rt.block_on(async { Scheduler::new().run(&expr).await.unwrap() });
    log
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_topology_ordering_holds_for_any_timing(
        clean_ms in 0u64..5,
        cases in proptest::collection::vec((0u64..5, any::<bool>()), 1..6),
    ) {
        let asset_ms: Vec<u64> = cases.iter().map(|(ms, _)| *ms).collect();
        let failing: Vec<bool> = cases.iter().map(|(_, f)| *f).collect();
        let log = run_topology(clean_ms, &asset_ms, &failing);

        let clean_end = log.ended_at("clean").unwrap();
        let watch_start = log.started_at("watch").unwrap();

        for i in 0..asset_ms.len() {
            let name = format!("asset_{i}");
            let start = log.started_at(&name).unwrap();
            let end = log.ended_at(&name).unwrap();
            prop_assert!(start > clean_end, "{} started before clean ended", name);
            prop_assert!(end < watch_start, "{} ended after watch started", name);
        }
        prop_assert_eq!(log.starts_of("watch"), 1);
    }
}
