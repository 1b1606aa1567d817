//! Infrastructure layer: movement sources, snapshot storage, configuration,
//! and the stock reconstruction run that ties them together.

pub mod config;
pub mod movement_source;
pub mod reconstruction;
pub mod snapshot_store;

pub use reconstruction::{
    ReconstructionError, ReconstructionOptions, ReconstructionReport, ReconstructionStats,
    StockReconstruction, WriteOutcome, write_snapshots,
};
