//! In-memory reference implementations of the topology, executor, and
//! data-move contracts, gated behind the `test-util` feature. Plays the
//! role the teacher's `ocl-extras` pool types play for `ocl`: something a
//! caller (or this crate's own test suite) can exercise the planner
//! against without real hardware.

pub mod mock;
