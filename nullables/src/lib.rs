//! Nullable infrastructure for deterministic testing.
//!
//! Block height and storage reach the observer module only through traits or
//! explicit arguments. The types here stand in for them in tests: fully
//! deterministic, driven by the test, never touching disk.

pub mod height;
pub mod sample;
pub mod store;

pub use height::NullBlockHeight;
pub use store::NullStore;
