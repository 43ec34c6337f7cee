//! Partition Table Model
//!
//! In-memory representation of a flashable partition table as shown in the
//! partition panel. Rows come from a user-opened rawprogram XML file or from
//! a device-reported GPT dump and are replaced wholesale on every import.

mod record;
mod table;

pub use record::{Lun, PartitionRecord, SECTOR_SIZE_IN_BYTES};
pub use table::PartitionTable;
