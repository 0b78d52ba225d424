//! The worker: the single owner of all core state, and the only mutator of
//! any of it. Every request runs to completion before the next one is
//! dequeued — there are no internal suspension points, so the invariants in
//! the module docs hold after every call returns.

use log::{debug, warn};

use crate::api::{Completion, DsmRange, Opcode, Request};
use crate::backend::classifier::Classifier;
use crate::backend::gc;
use crate::backend::geometry::Ppa;
use crate::backend::line::{LineClass, LineManager};
use crate::backend::mapping::MappingTables;
use crate::backend::nand::NandArray;
use crate::backend::stats::Stats;
use crate::backend::writeptr::WritePointer;
use crate::config::{ClassifierTunables, DeviceConfig, Geometry};
use crate::error::{FtlError, FtlResult};
use crate::ring::{ReplyRing, RequestRing};
use crate::timing::{IoClass, IoCmd, TimingModel};

pub struct Ftl<T: TimingModel> {
    geo: Geometry,
    cfg: DeviceConfig,
    nand: NandArray,
    lines: LineManager,
    mapping: MappingTables,
    classifier: Classifier,
    tunables: ClassifierTunables,
    wp_hot: WritePointer,
    wp_cold: WritePointer,
    stats: Stats,
    timing: T,
    /// Lines currently mid-relocation in `gc_one_line`. A relocation write
    /// can itself trigger a forced allocation (and thus another GC pass);
    /// this keeps that nested pass from picking a line we're still draining.
    gc_in_progress: Vec<u32>,
}

impl<T: TimingModel> Ftl<T> {
    pub fn new(cfg: DeviceConfig, timing: T) -> FtlResult<Self> {
        cfg.geometry.validate()?;
        let geo = cfg.geometry;
        let mut lines = LineManager::new(&geo);
        let hot_id = lines
            .take_free_hot()
            .ok_or(FtlError::AllocationExhausted { class: LineClass::Hot })?;
        let cold_id = lines
            .take_free_cold()
            .ok_or(FtlError::AllocationExhausted { class: LineClass::Cold })?;
        let tt_pgs = geo.tt_pgs();
        let tunables = ClassifierTunables::for_geometry(&geo);
        Ok(Ftl {
            geo,
            cfg,
            nand: NandArray::new(geo),
            lines,
            mapping: MappingTables::new(tt_pgs),
            classifier: Classifier::new(tt_pgs, tunables),
            tunables,
            wp_hot: WritePointer::new(LineClass::Hot, hot_id),
            wp_cold: WritePointer::new(LineClass::Cold, cold_id),
            stats: Stats::default(),
            timing,
            gc_in_progress: Vec::new(),
        })
    }

    pub fn stats(&self) -> Stats { self.stats }

    pub fn geometry(&self) -> Geometry { self.geo }

    pub fn lines(&self) -> &LineManager { &self.lines }

    pub fn mapping(&self) -> &MappingTables { &self.mapping }

    pub fn classifier_is_hot(&self, lpn: u64) -> bool { self.classifier.is_hot(lpn) }

    // ---- write/read/trim entry points (§4.5-4.8) -----------------------

    pub fn write(&mut self, slba: u64, nlb: u64, stime: u64) -> FtlResult<u64> {
        let tt_pgs = self.mapping.tt_pgs();
        if slba >= tt_pgs {
            warn!("write: slba {slba} >= tt_pgs {tt_pgs}, failing fast");
            return Ok(0);
        }
        let end = (slba + nlb.saturating_sub(1)).min(tt_pgs - 1);

        // Foreground GC check happens once here, before any page of this
        // request is serviced — see the module docs' note on multi-page
        // writes and `gc_thres_lines_high`.
        while self.lines.free_total() as u32 <= self.cfg.gc_thres_lines_high() {
            if self.do_gc(true).is_none() {
                break;
            }
        }

        let mut max_lat = 0u64;
        for lpn in slba..=end {
            self.stats.host_writes += 1;
            let seq = self.stats.host_writes;
            self.classifier.maybe_decay(seq);
            self.classifier.on_write(lpn, seq);
            let is_hot = self.classifier.is_hot(lpn);

            let old_ppa = self.mapping.get(lpn)?;
            if !old_ppa.is_unmapped() {
                self.invalidate(&old_ppa)?;
            }

            let new_ppa = self.place_page(lpn, is_hot, seq)?;
            self.stats.nand_writes += 1;

            let lat = self.issue(&new_ppa, IoClass::UserIo, IoCmd::Write, stime);
            max_lat = max_lat.max(lat);

            self.stats.maybe_report(&self.geo, &self.lines);
        }
        Ok(max_lat)
    }

    pub fn read(&mut self, slba: u64, nlb: u64, stime: u64) -> FtlResult<u64> {
        let tt_pgs = self.mapping.tt_pgs();
        if slba >= tt_pgs {
            warn!("read: slba {slba} >= tt_pgs {tt_pgs}, failing fast");
            return Ok(0);
        }
        let end = (slba + nlb.saturating_sub(1)).min(tt_pgs - 1);

        let mut max_lat = 0u64;
        for lpn in slba..=end {
            let ppa = self.mapping.get(lpn)?;
            if ppa.is_unmapped() || ppa.pgidx(&self.geo) >= tt_pgs {
                continue;
            }
            let lat = self.issue(&ppa, IoClass::UserIo, IoCmd::Read, stime);
            max_lat = max_lat.max(lat);
        }
        Ok(max_lat)
    }

    /// DSM/trim. No NAND latency is accounted; out-of-bounds ranges are
    /// skipped with a log rather than failing the whole command.
    pub fn trim(&mut self, ranges: &[DsmRange]) -> FtlResult<()> {
        let tt_pgs = self.mapping.tt_pgs();
        for r in ranges {
            if r.slba >= tt_pgs {
                warn!("trim: range slba {} >= tt_pgs {tt_pgs}, skipping", r.slba);
                continue;
            }
            let end = (r.slba + r.nlb.saturating_sub(1)).min(tt_pgs - 1);
            for lpn in r.slba..=end {
                let ppa = self.mapping.get(lpn)?;
                if ppa.is_unmapped() {
                    continue;
                }
                self.invalidate(&ppa)?;
                self.mapping.set(lpn, Ppa::unmapped())?;
            }
        }
        Ok(())
    }

    /// Services one request end to end and returns the completion the
    /// front-end expects. Unknown opcodes produce zero latency.
    pub fn service(&mut self, req: &Request) -> Completion {
        let reqlat = match req.opcode {
            Opcode::Write => self.write(req.slba, req.nlb, req.stime).unwrap_or_else(|e| {
                warn!("write failed: {e}");
                0
            }),
            Opcode::Read => self.read(req.slba, req.nlb, req.stime).unwrap_or_else(|e| {
                warn!("read failed: {e}");
                0
            }),
            Opcode::Dsm => {
                if let Err(e) = self.trim(&req.dsm_ranges) {
                    warn!("trim failed: {e}");
                }
                0
            }
            Opcode::Unknown => 0,
        };
        self.maybe_background_gc();
        Completion { reqlat, expire_time: req.stime + reqlat }
    }

    /// Background GC: checked after every serviced request, independent of
    /// the foreground check in `write`. Keeps the free-line pool topped up
    /// between bursts of foreground pressure rather than only reacting to it.
    fn maybe_background_gc(&mut self) {
        if self.lines.free_total() as u32 <= self.cfg.gc_thres_lines() {
            self.do_gc(false);
        }
    }

    /// The cooperative worker loop: pop a request, service it fully,
    /// push its completion, repeat until the request ring is drained.
    /// Matches §5 — no suspension points inside a request.
    pub fn run_worker(&mut self, requests: &RequestRing, replies: &ReplyRing) {
        while let Some(req) = requests.pop() {
            let completion = self.service(&req);
            if replies.push(completion).is_err() {
                warn!("reply ring full, dropping a completion");
            }
        }
    }

    // ---- invalidate/valid/erase (§4.7) -----------------------------------

    fn invalidate(&mut self, ppa: &Ppa) -> FtlResult<()> {
        self.nand.mark_invalid(ppa)?;
        self.lines.record_invalidate(ppa.blk());
        self.mapping.clear_reverse(ppa.pgidx(&self.geo))?;
        Ok(())
    }

    /// Places `lpn`'s new value on the write pointer matching `is_hot`,
    /// updating NAND status, line counters, and both mapping directions.
    /// Shared by the host write path and GC relocation.
    fn place_page(&mut self, lpn: u64, is_hot: bool, host_writes: u64) -> FtlResult<Ppa> {
        let cls = if is_hot { LineClass::Hot } else { LineClass::Cold };
        let ppa = self.next_write_ppa(cls, host_writes);
        self.nand.mark_valid(&ppa)?;
        self.lines.record_valid(ppa.blk(), host_writes);
        self.mapping.set(lpn, ppa)?;
        self.mapping.set_reverse(ppa.pgidx(&self.geo), lpn)?;
        Ok(ppa)
    }

    fn issue(&mut self, ppa: &Ppa, class: IoClass, cmd: IoCmd, stime: u64) -> u64 {
        let lun_idx = ppa.lunidx(&self.geo) as usize;
        self.timing.advance(&mut self.nand.luns[lun_idx], class, cmd, stime)
    }

    // ---- write pointer advance / line open-close (§4.2) ------------------

    fn next_write_ppa(&mut self, cls: LineClass, host_writes: u64) -> Ppa {
        let (ppa, wrapped) = match cls {
            LineClass::Hot => {
                let ppa = self.wp_hot.current_ppa();
                (ppa, self.wp_hot.advance(&self.geo))
            }
            LineClass::Cold => {
                let ppa = self.wp_cold.current_ppa();
                (ppa, self.wp_cold.advance(&self.geo))
            }
        };
        if wrapped {
            self.close_current_line(cls);
            let new_id = self.allocate_line(cls);
            self.lines.stamp_opened(new_id, host_writes);
            match cls {
                LineClass::Hot => self.wp_hot.rebind(new_id),
                LineClass::Cold => self.wp_cold.rebind(new_id),
            }
        }
        ppa
    }

    fn close_current_line(&mut self, cls: LineClass) {
        let id = match cls {
            LineClass::Hot => self.wp_hot.curline,
            LineClass::Cold => self.wp_cold.curline,
        };
        if self.lines.is_full(id) {
            self.lines.mark_full(id);
        } else {
            // neither free nor full: reachable only through `lines()`, per §4.2.
            self.lines.mark_partially_invalid(id);
        }
    }

    /// Take a free line of `cls`, forcing GC once and retrying on
    /// exhaustion. A second failure is the one fatal condition in this
    /// design (§7, `AllocationExhausted`): it means thresholds are
    /// mis-tuned or an invariant has already broken, and there is no
    /// well-defined partial-progress state to fall back to.
    fn allocate_line(&mut self, cls: LineClass) -> u32 {
        self.try_take_free(cls).unwrap_or_else(|| {
            warn!("{cls:?} line pool exhausted, forcing gc");
            self.do_gc_class(cls, true);
            self.try_take_free(cls)
                .unwrap_or_else(|| panic!("allocation exhausted for {cls:?} lines after forced gc retry"))
        })
    }

    fn try_take_free(&mut self, cls: LineClass) -> Option<u32> {
        match cls {
            LineClass::Hot => self.lines.take_free_hot(),
            LineClass::Cold => self.lines.take_free_cold(),
        }
    }

    // ---- garbage collection (§4.9) ---------------------------------------

    /// Compares free-pool sizes and attempts GC on the scarcer class first,
    /// then the other. Returns the victim's id on success.
    pub fn do_gc(&mut self, force: bool) -> Option<u32> {
        let first = gc::scarcer_class(&self.lines);
        let second = if first == LineClass::Hot { LineClass::Cold } else { LineClass::Hot };
        self.do_gc_class(first, force).or_else(|| self.do_gc_class(second, force))
    }

    fn do_gc_class(&mut self, cls: LineClass, force: bool) -> Option<u32> {
        let mut exclude = vec![self.wp_hot.curline, self.wp_cold.curline];
        exclude.extend_from_slice(&self.gc_in_progress);
        let pgs_per_line = self.geo.pgs_per_line();
        let victim = match cls {
            LineClass::Hot => gc::select_hot_victim(&self.lines, &exclude, force, pgs_per_line),
            LineClass::Cold => gc::select_cold_victim(&self.lines, &exclude, self.stats.host_writes, &self.tunables, force, pgs_per_line),
        }?;
        self.gc_one_line(victim);
        Some(victim)
    }

    /// Relocates every valid page on `victim` to a fresh PPA (re-consulting
    /// the classifier per LPN), erases every block backing the line, and
    /// returns it to its class's free pool. Afterward `vpc == ipc == 0` and
    /// the line sits on the free list matching its (possibly updated) class.
    fn gc_one_line(&mut self, victim: u32) {
        let cls = self.lines.line(victim).cls;
        debug!("gc: relocating line {victim} (class {cls:?})");
        self.gc_in_progress.push(victim);
        let luns_per_ch = self.geo.luns_per_ch;
        let nchs = self.geo.nchs;
        let pgs_per_blk = self.geo.pgs_per_blk;

        for ch in 0..nchs {
            for lun in 0..luns_per_ch {
                let blkidx = Ppa::pack(ch, lun, 0, 0, 0, victim).blkidx(&self.geo);
                for pg in 0..pgs_per_blk {
                    let src = Ppa::pack(ch, lun, 0, 0, pg, victim);
                    if !self.page_is_valid(&src) {
                        continue;
                    }
                    if self.cfg.gc_delay_enabled {
                        let _ = self.issue(&src, IoClass::GcIo, IoCmd::Read, 0);
                    }

                    let lpn = match self.mapping.reverse(src.pgidx(&self.geo)) {
                        Ok(l) if l != crate::backend::mapping::INVALID_LPN => l,
                        _ => continue,
                    };
                    let is_hot = self.classifier.is_hot(lpn);

                    // the source page becomes invalid as part of relocating off of it;
                    // page_is_valid just confirmed it, so either call failing here means
                    // a bookkeeping invariant is already broken
                    self.nand.mark_invalid(&src).expect("relocated page was valid a line above");
                    self.lines.record_invalidate(victim);
                    self.mapping.clear_reverse(src.pgidx(&self.geo)).expect("relocated page's pgidx is in range");

                    let host_writes = self.stats.host_writes;
                    if let Ok(dst) = self.place_page(lpn, is_hot, host_writes) {
                        self.stats.nand_writes += 1;
                        self.stats.gc_writes += 1;
                        if self.cfg.gc_delay_enabled {
                            let _ = self.issue(&dst, IoClass::GcIo, IoCmd::Write, 0);
                        }
                    }
                }
                self.nand.erase_block(blkidx);
                if self.cfg.gc_delay_enabled {
                    let _ = self.issue(&Ppa::pack(ch, lun, 0, 0, 0, victim), IoClass::GcIo, IoCmd::Erase, 0);
                }
            }
        }
        self.gc_in_progress.pop();
        self.lines.release_to_free(victim);
    }

    fn page_is_valid(&self, ppa: &Ppa) -> bool {
        use crate::backend::nand::PageStatus;
        let blk = self.nand.block(ppa.blkidx(&self.geo));
        blk.pages.get(ppa.pg() as usize).copied() == Some(PageStatus::Valid)
    }
}
