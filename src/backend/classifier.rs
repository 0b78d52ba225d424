//! Per-LPN hot/cold classification driven purely by update-interval
//! patterns: pages rewritten often and with short gaps between rewrites
//! are HOT, everything else is COLD. State is re-consulted on every
//! relocation too, so a page's class can drift across its lifetime.

use log::trace;

use crate::config::ClassifierTunables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpnState {
    Cold,
    Hot,
}

#[derive(Debug, Clone, Copy)]
struct LpnEntry {
    state: LpnState,
    access_cnt: u32,
    last_write_seq: u64,
    short_interval_streak: u8,
}

impl LpnEntry {
    fn fresh() -> Self { LpnEntry { state: LpnState::Cold, access_cnt: 0, last_write_seq: 0, short_interval_streak: 0 } }
}

pub struct Classifier {
    tunables: ClassifierTunables,
    entries: Vec<LpnEntry>,
    last_decay_seq: u64,
}

impl Classifier {
    pub fn new(tt_pgs: u64, tunables: ClassifierTunables) -> Self {
        Classifier { tunables, entries: vec![LpnEntry::fresh(); tt_pgs as usize], last_decay_seq: 0 }
    }

    pub fn is_hot(&self, lpn: u64) -> bool { self.entries[lpn as usize].state == LpnState::Hot }

    /// Checked on every host write, before classification: if the window has
    /// elapsed, halve every LPN's access count and short-interval streak.
    pub fn maybe_decay(&mut self, seq: u64) {
        if seq.saturating_sub(self.last_decay_seq) < self.tunables.hot_decay_window_pages {
            return;
        }
        for e in self.entries.iter_mut() {
            e.access_cnt /= 2;
            e.short_interval_streak /= 2;
        }
        self.last_decay_seq = seq;
        trace!("classifier: decay at seq={seq}");
    }

    /// Update classifier state for a host write of `lpn` at sequence `seq`.
    /// Must be called after `maybe_decay` for the same write.
    pub fn on_write(&mut self, lpn: u64, seq: u64) {
        let t = self.tunables;
        let e = &mut self.entries[lpn as usize];

        let delta = if e.last_write_seq == 0 { None } else { Some(seq.saturating_sub(e.last_write_seq)) };

        e.access_cnt = e.access_cnt.saturating_add(1);

        match delta {
            Some(d) if d <= t.hot_interval_threshold_pages => e.short_interval_streak = e.short_interval_streak.saturating_add(1),
            _ => e.short_interval_streak = 0,
        }

        e.last_write_seq = seq;

        match e.state {
            LpnState::Cold => {
                if e.access_cnt >= t.hot_access_threshold && e.short_interval_streak >= t.hot_interval_confirm_count {
                    e.state = LpnState::Hot;
                    trace!("classifier: lpn={lpn} COLD -> HOT at seq={seq}");
                }
            }
            LpnState::Hot => {
                let interval_cooled = delta.map(|d| d > 4 * t.hot_interval_threshold_pages).unwrap_or(false);
                if e.access_cnt < t.hot_access_threshold || interval_cooled {
                    e.state = LpnState::Cold;
                    e.short_interval_streak = 0;
                    trace!("classifier: lpn={lpn} HOT -> COLD at seq={seq}");
                }
            }
        }
    }
}
