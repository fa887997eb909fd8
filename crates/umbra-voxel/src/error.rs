use thiserror::Error;

use crate::voxel::BlockId;

/// Errors returned by world-coordinate block access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoxelError {
    /// The chunk containing the cell is not in the resident window, or `y`
    /// is outside the column.
    #[error("voxel ({x}, {y}, {z}) is not resident")]
    NotResident { x: i32, y: i32, z: i32 },
    /// The id has no entry in the block registry.
    #[error("unknown block id {0:?}")]
    UnknownBlock(BlockId),
}
