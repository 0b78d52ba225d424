//! Rewriting one LPN back to back, with interval 1 between writes, should
//! promote it to HOT within a handful of writes and keep the device free of
//! GC overhead (every write lands on a fresh page, never relocated).

use hcftl::config::DeviceConfig;
use hcftl::ftl::Ftl;
use hcftl::timing::LatencyTimingModel;

#[test]
fn tight_rewrite_loop_promotes_and_stays_waf_one() {
    let cfg = DeviceConfig::default();
    let timing = LatencyTimingModel::new(&cfg);
    let mut ftl = Ftl::new(cfg, timing).unwrap();

    let lpn = 42;
    for i in 0..64u64 {
        ftl.write(lpn, 1, i).unwrap();
    }

    assert!(ftl.classifier_is_hot(lpn), "64 back-to-back rewrites of one lpn must promote it to hot");

    let stats = ftl.stats();
    assert_eq!(stats.host_writes, 64);
    assert_eq!(stats.nand_writes, 64);
    assert_eq!(stats.gc_writes, 0, "no GC should be needed relocating a single live lpn");

    let ppa = ftl.mapping().get(lpn).unwrap();
    assert!(!ppa.is_unmapped());
}
