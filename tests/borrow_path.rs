//! The default geometry starts with a single hot line. Driving enough hot
//! traffic to wrap the hot write pointer past its own free pool must borrow
//! a line from cold-free rather than stall or fail.

use hcftl::config::DeviceConfig;
use hcftl::ftl::Ftl;
use hcftl::timing::LatencyTimingModel;

#[test]
fn hot_pointer_wrap_borrows_from_cold_free() {
    let cfg = DeviceConfig::default();
    let timing = LatencyTimingModel::new(&cfg);
    let mut ftl = Ftl::new(cfg, timing).unwrap();

    let cold_free_before = ftl.lines().cold_free_cnt();
    assert_eq!(ftl.lines().hot_free_cnt(), 0, "the lone hot line is already active as the write pointer");

    // rewrite one lpn enough times to promote it hot and wrap the hot write
    // pointer at least once past its single pre-allocated line
    for i in 0..32u64 {
        ftl.write(99, 1, i).unwrap();
    }
    assert!(ftl.classifier_is_hot(99));

    assert!(
        ftl.lines().cold_free_cnt() < cold_free_before,
        "hot write pointer exhaustion must borrow a line out of cold-free"
    );
}
