//! Configuration loaded once at init. Everything here is immutable for the
//! life of the [`crate::ftl::Ftl`] instance; geometry in particular is
//! load-bearing for every derived constant used on the hot path, so it is
//! parsed once and handed around as plain `Copy` data rather than re-derived.

use serde::{Deserialize, Serialize};

use crate::error::{FtlError, FtlResult};

/// NAND geometry, read once at init. Mirrors the parameters a real NVMe
/// simulator would pull from its device config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub secsz: u32,
    pub secs_per_pg: u32,
    pub pgs_per_blk: u32,
    pub blks_per_pl: u32,
    pub pls_per_lun: u32,
    pub luns_per_ch: u32,
    pub nchs: u32,
}

impl Geometry {
    pub fn luns_per_ch(&self) -> u32 { self.luns_per_ch }

    pub fn total_luns(&self) -> u32 { self.nchs * self.luns_per_ch }

    /// One block per LUN is striped into a line.
    pub fn blks_per_line(&self) -> u32 { self.total_luns() }

    pub fn pgs_per_line(&self) -> u32 { self.blks_per_line() * self.pgs_per_blk }

    /// Total lines == blocks per plane, since every plane's Nth block
    /// belongs to line N.
    pub fn tt_lines(&self) -> u32 { self.blks_per_pl }

    pub fn pgs_per_pl(&self) -> u64 { self.pgs_per_blk as u64 * self.blks_per_pl as u64 }

    pub fn pgs_per_lun(&self) -> u64 { self.pgs_per_pl() * self.pls_per_lun as u64 }

    pub fn pgs_per_ch(&self) -> u64 { self.pgs_per_lun() * self.luns_per_ch as u64 }

    pub fn tt_pgs(&self) -> u64 { self.pgs_per_ch() * self.nchs as u64 }

    pub fn tt_blks(&self) -> u64 { self.blks_per_pl as u64 * self.pls_per_lun as u64 * self.total_luns() as u64 }

    pub fn validate(&self) -> FtlResult<()> {
        if self.nchs == 0 || self.luns_per_ch == 0 || self.pls_per_lun == 0 || self.blks_per_pl == 0 || self.pgs_per_blk == 0 {
            return Err(FtlError::InvariantViolation("geometry field is zero".into()));
        }
        Ok(())
    }
}

/// NAND timing model, in nanoseconds, plus the GC trigger thresholds
/// (percent of total lines, 0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub geometry: Geometry,
    pub pg_rd_lat_ns: u64,
    pub pg_wr_lat_ns: u64,
    pub blk_er_lat_ns: u64,
    pub ch_xfer_lat_ns: u64,
    pub gc_thres_pcent: u32,
    pub gc_thres_pcent_high: u32,
    /// Whether GC's own reads/writes/erases are charged against the timing
    /// model. Disabling this models GC as instantaneous relative to host
    /// I/O, which is occasionally useful for isolating WAF from latency.
    pub gc_delay_enabled: bool,
}

impl DeviceConfig {
    pub fn from_json_str(s: &str) -> FtlResult<Self> {
        let cfg: DeviceConfig =
            serde_json::from_str(s).map_err(|e| FtlError::InvariantViolation(format!("bad config json: {e}")))?;
        cfg.geometry.validate()?;
        if cfg.gc_thres_pcent > 100 || cfg.gc_thres_pcent_high > 100 {
            return Err(FtlError::InvariantViolation("gc threshold percent out of range".into()));
        }
        Ok(cfg)
    }

    pub fn gc_thres_lines(&self) -> u32 {
        (self.geometry.tt_lines() as u64 * self.gc_thres_pcent as u64 / 100) as u32
    }

    pub fn gc_thres_lines_high(&self) -> u32 {
        (self.geometry.tt_lines() as u64 * self.gc_thres_pcent_high as u64 / 100) as u32
    }
}

impl Default for DeviceConfig {
    /// A small, easy-to-reason-about default geometry, matching the one used
    /// throughout the end-to-end scenarios: 2 channels, 2 LUNs/ch, 1 plane/LUN,
    /// 8 blocks/plane, 4 pages/block, 8 sectors/page.
    fn default() -> Self {
        DeviceConfig {
            geometry: Geometry {
                secsz: 512,
                secs_per_pg: 8,
                pgs_per_blk: 4,
                blks_per_pl: 8,
                pls_per_lun: 1,
                luns_per_ch: 2,
                nchs: 2,
            },
            pg_rd_lat_ns: 40_000,
            pg_wr_lat_ns: 200_000,
            blk_er_lat_ns: 2_000_000,
            ch_xfer_lat_ns: 10_000,
            gc_thres_pcent: 25,
            gc_thres_pcent_high: 37,
            gc_delay_enabled: true,
        }
    }
}

/// Classifier tunables. Not exposed through [`DeviceConfig`] because the
/// reference design treats these as compile-time constants; kept as a
/// separate struct so tests can exercise alternate values without touching
/// device geometry.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierTunables {
    pub hot_access_threshold: u32,
    pub hot_interval_threshold_pages: u64,
    pub hot_interval_confirm_count: u8,
    pub hot_decay_window_pages: u64,
}

impl ClassifierTunables {
    pub fn for_geometry(geo: &Geometry) -> Self {
        ClassifierTunables {
            hot_access_threshold: 3,
            hot_interval_threshold_pages: 64,
            hot_interval_confirm_count: 2,
            hot_decay_window_pages: (geo.tt_pgs() / 10).max(1),
        }
    }
}
