mod directory_v3;
mod entries_v3;
mod entry_v3;
mod header_v3;
mod tile_compression;
mod tile_id;
mod tile_type;

pub use directory_v3::Directory;
pub use entries_v3::EntriesV3;
pub use entry_v3::EntryV3;
pub use header_v3::HeaderV3;
pub use tile_compression::PMTilesCompression;
pub use tile_id::{TileId, tile_id_to_coord};
use tile_type::PMTilesType;
