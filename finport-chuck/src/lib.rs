//! finport-chuck: importers for Schwab ("Chuck") brokerage exports.

pub mod header;
pub mod numeric;
pub mod positions;
pub mod sections;
pub mod types;

pub use positions::{ChuckPositionsIndiv, IMPORTER_ID};
pub use types::{AccountTitleId, RowKind, TableRow};
