//! Overwriting the whole device repeatedly exhausts free lines quickly
//! enough that foreground GC must fire; afterward every LPN should still
//! round-trip correctly and the device should report WAF above 1.0.

use hcftl::config::DeviceConfig;
use hcftl::ftl::Ftl;
use hcftl::timing::LatencyTimingModel;

#[test]
fn repeated_full_overwrite_triggers_gc_and_preserves_mapping() {
    let cfg = DeviceConfig::default();
    let tt_pgs = cfg.geometry.tt_pgs();
    let timing = LatencyTimingModel::new(&cfg);
    let mut ftl = Ftl::new(cfg, timing).unwrap();

    for _pass in 0..3 {
        for lpn in 0..tt_pgs {
            ftl.write(lpn, 1, 0).unwrap();
        }
    }

    let stats = ftl.stats();
    assert_eq!(stats.host_writes, 3 * tt_pgs);
    assert!(stats.nand_writes > stats.host_writes, "relocations must push nand writes above host writes");
    assert!(stats.gc_writes > 0, "three full overwrite passes must have forced at least one GC cycle");
    assert!(stats.waf() > 1.0);
    assert!(ftl.lines().free_total() > 0, "gc must leave at least one free line behind");

    for lpn in 0..tt_pgs {
        let ppa = ftl.mapping().get(lpn).unwrap();
        assert!(!ppa.is_unmapped(), "lpn {lpn} must still resolve after gc relocated pages around it");
    }
}
