//! Per-page/block/LUN NAND state: the layer that enforces the
//! erase-before-write constraint. Everything here is addressed by flat
//! index (`pgidx`/`blkidx`/`lunidx`), computed from a [`Ppa`] by
//! [`crate::backend::geometry`].

use log::trace;

use crate::backend::geometry::Ppa;
use crate::config::Geometry;
use crate::error::{FtlError, FtlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Free,
    Valid,
    Invalid,
}

#[derive(Debug, Clone)]
pub struct NandBlock {
    pub pages: Vec<PageStatus>,
    pub valid_pc: u32,
    pub invalid_pc: u32,
    pub erase_cnt: u64,
}

impl NandBlock {
    fn new(pgs_per_blk: u32) -> Self {
        NandBlock { pages: vec![PageStatus::Free; pgs_per_blk as usize], valid_pc: 0, invalid_pc: 0, erase_cnt: 0 }
    }

    fn check_counts(&self) -> FtlResult<()> {
        if self.valid_pc + self.invalid_pc > self.pages.len() as u32 {
            return Err(FtlError::InvariantViolation(format!(
                "block vpc+ipc {} exceeds pgs_per_blk {}",
                self.valid_pc + self.invalid_pc,
                self.pages.len()
            )));
        }
        Ok(())
    }
}

/// A LUN only tracks when it is next available; the actual latency
/// arithmetic lives in `crate::timing`, which reads and advances this clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct NandLun {
    pub next_available_ns: u64,
}

/// The full NAND array: every page's status, every block's counters, every
/// LUN's clock. Owned exclusively by [`crate::ftl::Ftl`].
pub struct NandArray {
    geo: Geometry,
    blocks: Vec<NandBlock>,
    pub luns: Vec<NandLun>,
}

impl NandArray {
    pub fn new(geo: Geometry) -> Self {
        let tt_blks = geo.tt_blks() as usize;
        let tt_luns = geo.total_luns() as usize;
        NandArray {
            geo,
            blocks: (0..tt_blks).map(|_| NandBlock::new(geo.pgs_per_blk)).collect(),
            luns: vec![NandLun::default(); tt_luns],
        }
    }

    pub fn block(&self, blkidx: u64) -> &NandBlock { &self.blocks[blkidx as usize] }

    fn page_status(&self, ppa: &Ppa) -> FtlResult<PageStatus> {
        let blk = &self.blocks[ppa.blkidx(&self.geo) as usize];
        blk.pages
            .get(ppa.pg() as usize)
            .copied()
            .ok_or_else(|| FtlError::InvariantViolation("page offset out of range for block".into()))
    }

    /// FREE -> VALID. The line's own `vpc`/`last_update_seq` bookkeeping is
    /// the caller's responsibility (`crate::ftl`); this only enforces the
    /// block-local invariant.
    pub fn mark_valid(&mut self, ppa: &Ppa) -> FtlResult<()> {
        let blkidx = ppa.blkidx(&self.geo) as usize;
        let pg = ppa.pg() as usize;
        let status = self.page_status(ppa)?;
        if status != PageStatus::Free {
            return Err(FtlError::InvariantViolation(format!("mark_valid on non-free page (status {status:?})")));
        }
        let blk = &mut self.blocks[blkidx];
        blk.pages[pg] = PageStatus::Valid;
        blk.valid_pc += 1;
        blk.check_counts()?;
        trace!("nand: blk={blkidx} pg={pg} -> VALID (vpc={})", blk.valid_pc);
        Ok(())
    }

    /// VALID -> INVALID. Block-local only; line-level victim/full-list
    /// bookkeeping happens in `crate::ftl`.
    pub fn mark_invalid(&mut self, ppa: &Ppa) -> FtlResult<()> {
        let blkidx = ppa.blkidx(&self.geo) as usize;
        let pg = ppa.pg() as usize;
        let status = self.page_status(ppa)?;
        if status != PageStatus::Valid {
            return Err(FtlError::InvariantViolation(format!("mark_invalid on non-valid page (status {status:?})")));
        }
        let blk = &mut self.blocks[blkidx];
        blk.pages[pg] = PageStatus::Invalid;
        blk.valid_pc -= 1;
        blk.invalid_pc += 1;
        blk.check_counts()?;
        trace!("nand: blk={blkidx} pg={pg} -> INVALID (ipc={})", blk.invalid_pc);
        Ok(())
    }

    /// All pages in the block -> FREE; counters reset; `erase_cnt` bumped.
    pub fn erase_block(&mut self, blkidx: u64) {
        let blk = &mut self.blocks[blkidx as usize];
        for p in blk.pages.iter_mut() {
            *p = PageStatus::Free;
        }
        blk.valid_pc = 0;
        blk.invalid_pc = 0;
        blk.erase_cnt += 1;
    }
}
