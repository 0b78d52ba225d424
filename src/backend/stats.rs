//! Host/NAND/GC page counters and the periodic WAF report.

use log::info;

use crate::backend::line::LineManager;
use crate::config::Geometry;

/// Emit a report every this many host writes.
pub const REPORT_INTERVAL: u64 = 16_384;

#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub host_writes: u64,
    pub nand_writes: u64,
    pub gc_writes: u64,
}

impl Stats {
    pub fn waf(&self) -> f64 {
        if self.host_writes == 0 { 1.0 } else { self.nand_writes as f64 / self.host_writes as f64 }
    }

    pub fn gc_overhead_pcent(&self) -> f64 {
        if self.host_writes == 0 { 0.0 } else { self.gc_writes as f64 / self.host_writes as f64 * 100.0 }
    }

    /// Bytes moved per counter, derived from a page's sector geometry.
    fn page_bytes(geo: &Geometry) -> f64 { geo.secsz as f64 * geo.secs_per_pg as f64 }

    pub fn host_gib(&self, geo: &Geometry) -> f64 { self.host_writes as f64 * Self::page_bytes(geo) / (1024.0 * 1024.0 * 1024.0) }

    pub fn nand_gib(&self, geo: &Geometry) -> f64 { self.nand_writes as f64 * Self::page_bytes(geo) / (1024.0 * 1024.0 * 1024.0) }

    pub fn gc_gib(&self, geo: &Geometry) -> f64 { self.gc_writes as f64 * Self::page_bytes(geo) / (1024.0 * 1024.0 * 1024.0) }

    /// Logs a report if `host_writes` just crossed a `REPORT_INTERVAL` boundary.
    pub fn maybe_report(&self, geo: &Geometry, lm: &LineManager) {
        if self.host_writes == 0 || self.host_writes % REPORT_INTERVAL != 0 {
            return;
        }
        info!(
            "ftl stats: host={} ({:.2} GiB) nand={} ({:.2} GiB) gc={} ({:.2} GiB) waf={:.3} gc_overhead={:.2}% free_lines=hot:{}/cold:{}/total:{}/{}",
            self.host_writes,
            self.host_gib(geo),
            self.nand_writes,
            self.nand_gib(geo),
            self.gc_writes,
            self.gc_gib(geo),
            self.waf(),
            self.gc_overhead_pcent(),
            lm.hot_free_cnt(),
            lm.cold_free_cnt(),
            lm.free_total(),
            geo.tt_lines(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waf_is_one_with_no_gc() {
        let s = Stats { host_writes: 128, nand_writes: 128, gc_writes: 0 };
        assert_eq!(s.waf(), 1.0);
        assert_eq!(s.gc_overhead_pcent(), 0.0);
    }

    #[test]
    fn waf_above_one_once_gc_relocates_pages() {
        let s = Stats { host_writes: 100, nand_writes: 150, gc_writes: 50 };
        assert_eq!(s.waf(), 1.5);
        assert_eq!(s.gc_overhead_pcent(), 50.0);
    }
}
