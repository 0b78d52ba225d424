//! Write pointers: one per class, each advancing a fixed traversal order
//! over the line it currently owns. Allocation of a fresh line (including
//! the forced-GC retry on exhaustion) is orchestrated by `crate::ftl`,
//! since that's the layer that also owns the garbage collector; a write
//! pointer by itself only knows how to walk the page offsets of whatever
//! line it currently holds.

use crate::backend::geometry::Ppa;
use crate::backend::line::LineClass;
use crate::config::Geometry;

pub struct WritePointer {
    pub cls: LineClass,
    pub curline: u32,
    ch: u32,
    lun: u32,
    pg: u32,
}

impl WritePointer {
    pub fn new(cls: LineClass, curline: u32) -> Self { WritePointer { cls, curline, ch: 0, lun: 0, pg: 0 } }

    /// The PPA the next write to this pointer's line will land on.
    pub fn current_ppa(&self) -> Ppa { Ppa::pack(self.ch, self.lun, 0, 0, self.pg, self.curline) }

    /// Advance to the next page offset. Channel is the fastest-changing
    /// component, then LUN, then page offset: a page is striped across
    /// every channel, then every LUN, before the page offset advances.
    /// Returns `true` once the page offset wraps back to 0, meaning the
    /// line is exhausted and the caller must close it out and open a new one.
    pub fn advance(&mut self, geo: &Geometry) -> bool {
        self.ch += 1;
        if self.ch >= geo.nchs {
            self.ch = 0;
            self.lun += 1;
            if self.lun >= geo.luns_per_ch {
                self.lun = 0;
                self.pg += 1;
                if self.pg >= geo.pgs_per_blk {
                    self.pg = 0;
                    return true;
                }
            }
        }
        false
    }

    /// Re-point at a freshly allocated line, resetting the traversal to its start.
    pub fn rebind(&mut self, new_line: u32) {
        self.curline = new_line;
        self.ch = 0;
        self.lun = 0;
        self.pg = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo() -> Geometry { crate::config::DeviceConfig::default().geometry }

    #[test]
    fn ch_is_fastest_changing() {
        let geo = geo();
        let mut wp = WritePointer::new(LineClass::Cold, 0);
        let first = wp.current_ppa();
        assert_eq!((first.ch(), first.lun(), first.pg()), (0, 0, 0));
        wp.advance(&geo);
        let second = wp.current_ppa();
        assert_eq!((second.ch(), second.lun(), second.pg()), (1, 0, 0), "ch should increment before lun or pg");
    }

    #[test]
    fn wraps_after_exactly_pgs_per_line() {
        let geo = geo();
        let mut wp = WritePointer::new(LineClass::Cold, 0);
        let pgs_per_line = geo.pgs_per_line();
        for i in 1..pgs_per_line {
            assert!(!wp.advance(&geo), "should not wrap before visiting all {pgs_per_line} offsets (at {i})");
        }
        assert!(wp.advance(&geo), "must wrap on the pgs_per_line-th advance");
    }

    #[test]
    fn every_page_offset_visited_exactly_once_per_line() {
        let geo = geo();
        let mut wp = WritePointer::new(LineClass::Hot, 0);
        let mut seen = std::collections::HashSet::new();
        seen.insert((wp.current_ppa().ch(), wp.current_ppa().lun(), wp.current_ppa().pg()));
        loop {
            let wrapped = wp.advance(&geo);
            if wrapped {
                break;
            }
            let p = wp.current_ppa();
            let key = (p.ch(), p.lun(), p.pg());
            assert!(seen.insert(key), "page offset {key:?} visited twice before line exhausted");
        }
        assert_eq!(seen.len() as u32, geo.pgs_per_line());
    }
}
