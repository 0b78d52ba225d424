//! Victim selection. Pure functions over [`LineManager`] plus whatever
//! scalar context each policy needs — they never touch the NAND array,
//! mapping tables, or write pointers, so they can be unit tested without
//! standing up a full [`crate::ftl::Ftl`]. The actual page-by-page
//! relocation loop that *uses* the chosen victim lives in `crate::ftl`,
//! since that's the layer that owns everything a relocation touches.

use crate::backend::line::{Line, LineClass, LineManager, Location};
use crate::config::ClassifierTunables;

/// Which class is scarcer right now; the dispatcher tries this one first.
pub fn scarcer_class(lm: &LineManager) -> LineClass {
    if lm.hot_free_cnt() <= lm.cold_free_cnt() { LineClass::Hot } else { LineClass::Cold }
}

/// Greedy-by-invalid-count selection among HOT lines. Skips the lines
/// currently pinned as write-pointer heads (`exclude`), anything not HOT,
/// and anything with no invalid pages. Below the forced threshold requires
/// a minimum yield (`ipc >= pgs_per_line / 8`) to avoid thrashing on
/// low-yield victims.
pub fn select_hot_victim(lm: &LineManager, exclude: &[u32], force: bool, pgs_per_line: u32) -> Option<u32> {
    let min_yield = pgs_per_line / 8;
    let mut best: Option<&Line> = None;
    for line in lm.lines() {
        if exclude.contains(&line.id) {
            continue;
        }
        if line.cls != LineClass::Hot || line.ipc == 0 {
            continue;
        }
        if !force && line.ipc < min_yield {
            continue;
        }
        let better = match best {
            None => true,
            Some(b) => line.ipc > b.ipc,
        };
        if better {
            best = Some(line);
        }
    }
    best.map(|l| l.id)
}

/// Age x invalid-ratio selection among COLD lines, with an early exit for
/// lines that are already a clearly strong victim.
pub fn select_cold_victim(
    lm: &LineManager,
    exclude: &[u32],
    host_writes: u64,
    tunables: &ClassifierTunables,
    force: bool,
    pgs_per_line: u32,
) -> Option<u32> {
    let min_ratio = if force { 0.25 } else { 0.30 };
    let min_age = tunables.hot_decay_window_pages / 4;

    let mut best: Option<(u32, u64)> = None; // (id, score)
    for line in lm.lines() {
        if exclude.contains(&line.id) {
            continue;
        }
        if line.cls != LineClass::Cold {
            continue;
        }
        if lm.location(line.id) == Location::Full || line.vpc == pgs_per_line {
            continue;
        }
        if line.ipc == 0 || line.last_update_seq == 0 {
            continue;
        }
        let invalid_ratio = line.ipc as f64 / pgs_per_line as f64;
        if invalid_ratio < min_ratio {
            continue;
        }
        let age = host_writes.saturating_sub(line.last_update_seq);
        if !force && age < min_age {
            continue;
        }
        if invalid_ratio >= 0.7 && age > 5 * tunables.hot_decay_window_pages {
            return Some(line.id);
        }
        let score = (age as f64 * invalid_ratio * 1000.0) as u64;
        let better = match best {
            None => true,
            Some((_, b)) => score > b,
        };
        if better {
            best = Some((line.id, score));
        }
    }
    best.map(|(id, _)| id)
}
