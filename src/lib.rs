//! A hot/cold segregated flash translation layer for an emulated NAND SSD.
//!
//! # Glossary
//!
//! - **PPA** — physical page address: the bit-packed `{ch, lun, pl, sec,
//!   pg, blk}` tuple identifying a page on the simulated NAND array. See
//!   [`backend::geometry::Ppa`].
//! - **LPN** — logical page number, the host-facing address space.
//! - **Line** — the unit of garbage collection: one block from every LUN,
//!   at the same `blk` offset, written and erased together. See
//!   [`backend::line`].
//! - **L2P / P2L** — the forward (LPN -> PPA) and reverse (PPA -> LPN)
//!   mapping tables, see [`backend::mapping`].
//! - **WAF** — write amplification factor: NAND writes per host write,
//!   see [`backend::stats`].
//!
//! # Module map
//!
//! [`ftl::Ftl`] is the single-threaded worker that owns every other piece
//! of state in this crate and is the only thing that mutates it. Requests
//! arrive through [`ring::RequestRing`] and are serviced to completion —
//! there is no suspension point inside a request, so every invariant
//! documented on the `backend` modules holds true between calls.
//! [`timing::TimingModel`] is the pluggable downward interface to whatever
//! is standing in for device latency; [`timing::LatencyTimingModel`] is the
//! one shipped here.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod ftl;
pub mod ring;
pub mod timing;
