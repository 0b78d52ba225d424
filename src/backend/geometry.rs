//! Physical page address: a 64-bit bit-packed value, plus the deterministic
//! conversions between it and the flat page index used to index the NAND
//! array and the reverse map.
//!
//! `{ch:7, lun:8, pl:8, sec:8, pg:16, blk:16, rsv:1}`, low bit first. The
//! field widths here are generous relative to the toy geometries exercised
//! in tests; a real device would size them to its own channel/LUN/plane/
//! block/page counts, but the packed layout is part of the wire contract
//! with the timing model, so we fix it rather than deriving it from geometry.

use bitfield::bitfield;

use crate::config::Geometry;

bitfield! {
    #[derive(Copy, Clone, Eq, PartialEq)]
    pub struct Ppa(u64);
    impl Debug;
    pub u32, ch, set_ch: 6, 0;
    pub u32, lun, set_lun: 14, 7;
    pub u32, pl, set_pl: 22, 15;
    pub u32, sec, set_sec: 30, 23;
    pub u32, pg, set_pg: 46, 31;
    pub u32, blk, set_blk: 62, 47;
    pub rsv, set_rsv: 63;
}

/// Sentinel for "unmapped" in the forward map and "no PPA" generally.
pub const ALL_ONES: u64 = u64::MAX;

impl Ppa {
    pub fn unmapped() -> Self { Ppa(ALL_ONES) }

    pub fn is_unmapped(&self) -> bool { self.0 == ALL_ONES }

    pub fn raw(&self) -> u64 { self.0 }

    pub fn from_raw(raw: u64) -> Self { Ppa(raw) }

    /// Build a PPA from its components, all other bits zero.
    pub fn pack(ch: u32, lun: u32, pl: u32, sec: u32, pg: u32, blk: u32) -> Self {
        let mut p = Ppa(0);
        p.set_ch(ch);
        p.set_lun(lun);
        p.set_pl(pl);
        p.set_sec(sec);
        p.set_pg(pg);
        p.set_blk(blk);
        p
    }

    /// The deterministic flat page index this PPA addresses, per the
    /// nested-stripe layout: channel is outermost, page offset innermost.
    pub fn pgidx(&self, geo: &Geometry) -> u64 {
        let ch = self.ch() as u64;
        let lun = self.lun() as u64;
        let pl = self.pl() as u64;
        let blk = self.blk() as u64;
        let pg = self.pg() as u64;
        (((ch * geo.luns_per_ch as u64 + lun) * geo.pls_per_lun as u64 + pl) * geo.blks_per_pl as u64 + blk)
            * geo.pgs_per_blk as u64
            + pg
    }

    /// Inverse of [`Ppa::pgidx`]: reconstruct a PPA from a flat page index.
    /// `sec` is left at 0 since the index addresses a whole page, not a sector.
    pub fn from_pgidx(idx: u64, geo: &Geometry) -> Self {
        let pg = idx % geo.pgs_per_blk as u64;
        let rest = idx / geo.pgs_per_blk as u64;
        let blk = rest % geo.blks_per_pl as u64;
        let rest = rest / geo.blks_per_pl as u64;
        let pl = rest % geo.pls_per_lun as u64;
        let rest = rest / geo.pls_per_lun as u64;
        let lun = rest % geo.luns_per_ch as u64;
        let ch = rest / geo.luns_per_ch as u64;
        Ppa::pack(ch as u32, lun as u32, pl as u32, 0, pg as u32, blk as u32)
    }

    /// Flat block index, used to index `NandArray::blocks`: same nesting as
    /// `pgidx` but without the innermost page offset term.
    pub fn blkidx(&self, geo: &Geometry) -> u64 {
        let ch = self.ch() as u64;
        let lun = self.lun() as u64;
        let pl = self.pl() as u64;
        let blk = self.blk() as u64;
        ((ch * geo.luns_per_ch as u64 + lun) * geo.pls_per_lun as u64 + pl) * geo.blks_per_pl as u64 + blk
    }

    /// Flat LUN index, used to index `NandArray::luns`.
    pub fn lunidx(&self, geo: &Geometry) -> u64 {
        self.ch() as u64 * geo.luns_per_ch as u64 + self.lun() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo() -> Geometry {
        crate::config::DeviceConfig::default().geometry
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let p = Ppa::pack(1, 1, 0, 3, 9, 5);
        assert_eq!(p.ch(), 1);
        assert_eq!(p.lun(), 1);
        assert_eq!(p.pl(), 0);
        assert_eq!(p.sec(), 3);
        assert_eq!(p.pg(), 9);
        assert_eq!(p.blk(), 5);
    }

    #[test]
    fn pack_unpack_exhaustive_small_geometry() {
        let geo = geo();
        for ch in 0..geo.nchs {
            for lun in 0..geo.luns_per_ch {
                for pl in 0..geo.pls_per_lun {
                    for blk in 0..geo.blks_per_pl {
                        for pg in 0..geo.pgs_per_blk {
                            let p = Ppa::pack(ch, lun, pl, 0, pg, blk);
                            let idx = p.pgidx(&geo);
                            let back = Ppa::from_pgidx(idx, &geo);
                            assert_eq!((p.ch(), p.lun(), p.pl(), p.blk(), p.pg()),
                                (back.ch(), back.lun(), back.pl(), back.blk(), back.pg()));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn pgidx_is_dense_and_contiguous() {
        let geo = geo();
        let tt_pgs = geo.tt_pgs();
        let mut seen = vec![false; tt_pgs as usize];
        for ch in 0..geo.nchs {
            for lun in 0..geo.luns_per_ch {
                for blk in 0..geo.blks_per_pl {
                    for pg in 0..geo.pgs_per_blk {
                        let idx = Ppa::pack(ch, lun, 0, 0, pg, blk).pgidx(&geo);
                        assert!(idx < tt_pgs);
                        assert!(!seen[idx as usize], "duplicate pgidx {idx}");
                        seen[idx as usize] = true;
                    }
                }
            }
        }
        assert!(seen.into_iter().all(|b| b), "pgidx did not cover every page exactly once");
    }

    #[test]
    fn unmapped_sentinel() {
        assert!(Ppa::unmapped().is_unmapped());
        assert!(!Ppa::pack(0, 0, 0, 0, 0, 0).is_unmapped());
    }
}
