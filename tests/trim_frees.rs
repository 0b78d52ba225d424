//! Trimming a range unmaps every LPN in it and leaves the backing line
//! carrying only invalid pages, making it a GC victim candidate.

use hcftl::api::DsmRange;
use hcftl::config::DeviceConfig;
use hcftl::ftl::Ftl;
use hcftl::timing::LatencyTimingModel;

#[test]
fn trim_unmaps_range_and_invalidates_its_line() {
    let cfg = DeviceConfig::default();
    let pgs_per_line = cfg.geometry.pgs_per_line();
    let timing = LatencyTimingModel::new(&cfg);
    let mut ftl = Ftl::new(cfg, timing).unwrap();

    // one full line's worth of fresh cold lpns, landing on a single line
    for lpn in 0..pgs_per_line as u64 {
        ftl.write(lpn, 1, 0).unwrap();
    }
    let victim_line = ftl.mapping().get(0).unwrap().blk();

    ftl.trim(&[DsmRange { slba: 0, nlb: pgs_per_line as u64 }]).unwrap();

    for lpn in 0..pgs_per_line as u64 {
        assert!(ftl.mapping().get(lpn).unwrap().is_unmapped(), "lpn {lpn} must be unmapped after trim");
    }

    let line = ftl.lines().line(victim_line);
    assert_eq!(line.ipc, pgs_per_line, "every page on the trimmed line should now be invalid");
    assert_eq!(line.vpc, 0);

    // trimming again must be a no-op: nothing left to invalidate
    ftl.trim(&[DsmRange { slba: 0, nlb: pgs_per_line as u64 }]).unwrap();
    let line = ftl.lines().line(victim_line);
    assert_eq!(line.ipc, pgs_per_line, "re-trimming an already-trimmed range must not double count");
}
