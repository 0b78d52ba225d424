//! Explicitly invoking garbage collection on a partially-invalidated line
//! should relocate its survivors and hand the line back to the free pool
//! with both counters zeroed, without disturbing pages that weren't on it.

use hcftl::config::DeviceConfig;
use hcftl::ftl::Ftl;
use hcftl::timing::LatencyTimingModel;

#[test]
fn explicit_gc_recycles_a_partially_invalid_cold_line() {
    let cfg = DeviceConfig::default();
    let pgs_per_line = cfg.geometry.pgs_per_line() as u64;
    let timing = LatencyTimingModel::new(&cfg);
    let mut ftl = Ftl::new(cfg, timing).unwrap();

    // fill one cold line entirely with distinct, never-repeated lpns
    for lpn in 0..pgs_per_line {
        ftl.write(lpn, 1, 0).unwrap();
    }
    let line_id = ftl.mapping().get(0).unwrap().blk();

    // invalidate most of it by rewriting all but one of its lpns elsewhere;
    // each rewrite's new page lands on whatever line the cold pointer is
    // currently on, which has since moved off `line_id`
    for lpn in 0..(pgs_per_line - 1) {
        ftl.write(lpn, 1, 100 + lpn).unwrap();
    }

    let before_ipc = ftl.lines().line(line_id).ipc;
    assert!(before_ipc > 0, "rewriting elsewhere should have invalidated pages on the original line");

    let survivor_lpn = pgs_per_line - 1;
    let survivor_ppa_before = ftl.mapping().get(survivor_lpn).unwrap();

    let victim = ftl.do_gc(true);
    assert_eq!(victim, Some(line_id), "the only line with invalid pages must be the one picked");

    let after = ftl.lines().line(line_id);
    assert_eq!(after.vpc, 0);
    assert_eq!(after.ipc, 0);

    let survivor_ppa_after = ftl.mapping().get(survivor_lpn).unwrap();
    assert_ne!(
        survivor_ppa_before.raw(),
        survivor_ppa_after.raw(),
        "the one surviving page on the victim line must have been relocated"
    );
    assert!(!survivor_ppa_after.is_unmapped());
}
