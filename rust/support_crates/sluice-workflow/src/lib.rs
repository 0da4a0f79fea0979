//! Concurrency primitives for sluice pipelines.
//!
//! # Key Components
//!
//! - [`slot_channel`] - The single-writer, single-reader, bounded channel that carries
//!   values between stages. It is closed exactly once, when its sender drops, and it can
//!   be cancelled by its reader so that a blocked producer gives up instead of waiting forever.
//! - [`task`] - One dedicated, named thread per stage, with panic isolation and
//!   completion handles ([`task::TaskHandle`]) for observing stage lifetimes.

pub mod slot_channel;
pub mod task;
