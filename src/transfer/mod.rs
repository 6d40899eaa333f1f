//! Physical placement of files in the library.
//!
//! - [`StrategySelector`] picks a [`FileStrategy`] from mount topology
//! - [`TransferExecutor`] carries it out and reports the [`TransferMode`]
//!   actually achieved
//! - [`MountProvider`] answers "which mount is this path on"

mod executor;
mod mount;
mod strategy;

pub use executor::{LocalTransferExecutor, TransferExecutor};
pub use mount::{MountInfo, MountProvider, ProcMountTable, parse_mounts};
pub use strategy::{
    COW_FILESYSTEMS, FileStrategy, NETWORK_FILESYSTEMS, StrategySelector, TransferMode,
    choose_strategy, is_cow_filesystem, is_network_filesystem,
};
