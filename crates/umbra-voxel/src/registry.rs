//! Block definition table: maps compact [`BlockId`] values to flat [`BlockDef`] records.
//!
//! The registry is built once during startup. Air is always ID 0 so that
//! zero-initialized chunk memory represents empty space. Registration fills
//! each definition's runtime data (rotated hitboxes, footprint and emission
//! flags) so lookups on the hot path are plain indexing.

use std::sync::LazyLock;

use glam::{IVec3, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use umbra_math::Aabb;

use crate::voxel::{BlockId, BlockState};

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// A block-local basis: where the block's X, Y, and Z axes point in the world.
///
/// `fix` shifts transformed geometry back into the unit cell when an axis
/// points in a negative direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordSystem {
    pub axes: [IVec3; 3],
    pub fix: IVec3,
}

impl CoordSystem {
    pub const IDENTITY: CoordSystem = CoordSystem {
        axes: [IVec3::X, IVec3::Y, IVec3::Z],
        fix: IVec3::ZERO,
    };

    pub fn new(x: IVec3, y: IVec3, z: IVec3) -> Self {
        let mut fix = IVec3::ZERO;
        for axis in [x, y, z] {
            if axis.cmplt(IVec3::ZERO).any() {
                fix -= axis;
            }
        }
        Self {
            axes: [x, y, z],
            fix,
        }
    }

    /// World offset of footprint cell `(sx, sy, sz)` relative to the origin.
    pub fn offset(&self, local: IVec3) -> IVec3 {
        self.axes[0] * local.x + self.axes[1] * local.y + self.axes[2] * local.z
    }

    /// Rotates a hitbox from block-local into world orientation.
    pub fn transform(&self, aabb: &Aabb) -> Aabb {
        let [x, y, z] = self.axes.map(|a| a.as_vec3());
        let fix = self.fix.as_vec3();
        let map = |p: Vec3| x * p.x + y * p.y + z * p.z + fix;
        Aabb::new(map(aabb.min), map(aabb.max))
    }
}

static PIPE_VARIANTS: LazyLock<[CoordSystem; 6]> = LazyLock::new(|| {
    [
        // north
        CoordSystem::new(IVec3::X, IVec3::Z, IVec3::NEG_Y),
        // east
        CoordSystem::new(IVec3::Z, IVec3::NEG_X, IVec3::NEG_Y),
        // south
        CoordSystem::new(IVec3::NEG_X, IVec3::NEG_Z, IVec3::NEG_Y),
        // west
        CoordSystem::new(IVec3::NEG_Z, IVec3::X, IVec3::NEG_Y),
        // up
        CoordSystem::new(IVec3::NEG_X, IVec3::Y, IVec3::NEG_Z),
        // down
        CoordSystem::new(IVec3::X, IVec3::NEG_Y, IVec3::NEG_Z),
    ]
});

static PANE_VARIANTS: LazyLock<[CoordSystem; 4]> = LazyLock::new(|| {
    [
        // north
        CoordSystem::new(IVec3::X, IVec3::Y, IVec3::Z),
        // east
        CoordSystem::new(IVec3::NEG_Z, IVec3::Y, IVec3::X),
        // south
        CoordSystem::new(IVec3::NEG_X, IVec3::Y, IVec3::NEG_Z),
        // west
        CoordSystem::new(IVec3::Z, IVec3::Y, IVec3::NEG_X),
    ]
});

/// Which set of orientations a block may take.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationProfile {
    /// Not rotatable.
    #[default]
    None,
    /// Six directions (logs, pipes).
    Pipe,
    /// Four horizontal directions (doors, panes).
    Pane,
}

impl RotationProfile {
    /// Orientation variants, indexed by [`BlockState::rotation`].
    pub fn variants(self) -> &'static [CoordSystem] {
        match self {
            RotationProfile::None => std::slice::from_ref(&CoordSystem::IDENTITY),
            RotationProfile::Pipe => &PIPE_VARIANTS[..],
            RotationProfile::Pane => &PANE_VARIANTS[..],
        }
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Data derived from a [`BlockDef`] at registration time.
#[derive(Clone, Debug, Default)]
pub struct BlockRuntime {
    /// Assigned id.
    pub id: BlockId,
    /// Footprint spans more than one cell.
    pub extended: bool,
    /// Any color channel emits light.
    pub emissive: bool,
    /// `hitboxes` transformed by each rotation variant.
    pub hitboxes: Vec<Vec<Aabb>>,
}

/// Full descriptor for a block type.
///
/// Build with struct update syntax over [`BlockDef::default`] (an opaque
/// solid cube) or [`BlockDef::air`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockDef {
    /// Human-readable name (e.g. "stone", "lamp").
    pub name: String,
    /// Occupies the whole cell as a cube; ray hits need no hitbox test.
    pub solid: bool,
    /// Block light passes through.
    pub light_passing: bool,
    /// Sunlight passes straight down through.
    pub sky_light_passing: bool,
    /// Entities and rays collide with it.
    pub obstacle: bool,
    /// Placement may overwrite it.
    pub replaceable: bool,
    /// Picking rays may select it.
    pub selectable: bool,
    pub rotation: RotationProfile,
    /// Hitboxes in the unrotated orientation.
    pub hitboxes: Vec<Aabb>,
    /// Footprint in cells along the block's local axes.
    pub size: IVec3,
    /// Red, green, blue emission (0–15 each).
    pub emission: [u8; 3],
    #[serde(skip)]
    pub rt: BlockRuntime,
}

impl Default for BlockDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            solid: true,
            light_passing: false,
            sky_light_passing: false,
            obstacle: true,
            replaceable: false,
            selectable: true,
            rotation: RotationProfile::None,
            hitboxes: vec![Aabb::UNIT],
            size: IVec3::ONE,
            emission: [0; 3],
            rt: BlockRuntime::default(),
        }
    }
}

impl BlockDef {
    /// The empty block.
    pub fn air() -> Self {
        Self {
            name: "air".to_string(),
            solid: false,
            light_passing: true,
            sky_light_passing: true,
            obstacle: false,
            replaceable: true,
            selectable: false,
            hitboxes: Vec::new(),
            ..Self::default()
        }
    }

    /// Assigned id (valid after registration).
    pub fn id(&self) -> BlockId {
        self.rt.id
    }

    pub fn is_rotatable(&self) -> bool {
        self.rotation != RotationProfile::None
    }

    pub fn is_extended(&self) -> bool {
        self.rt.extended
    }

    pub fn is_emissive(&self) -> bool {
        self.rt.emissive
    }

    /// Basis for a rotation index; falls back to identity for invalid indices.
    pub fn coord_system(&self, rotation: u8) -> &'static CoordSystem {
        self.rotation
            .variants()
            .get(rotation as usize)
            .unwrap_or(&CoordSystem::IDENTITY)
    }

    /// Hitboxes for the rotation stored in `state`.
    pub fn hitboxes_for(&self, state: BlockState) -> &[Aabb] {
        self.rt
            .hitboxes
            .get(state.rotation() as usize)
            .map_or(self.hitboxes.as_slice(), Vec::as_slice)
    }

    /// Offsets of every footprint cell (origin first) for the given rotation.
    pub fn footprint(&self, rotation: u8) -> impl Iterator<Item = (IVec3, IVec3)> + '_ {
        let coords = self.coord_system(rotation);
        let size = self.size.max(IVec3::ONE);
        (0..size.y).flat_map(move |sy| {
            (0..size.z).flat_map(move |sz| {
                (0..size.x).map(move |sx| {
                    let local = IVec3::new(sx, sy, sz);
                    (local, coords.offset(local))
                })
            })
        })
    }

    fn finalize(&mut self, id: BlockId) {
        self.rt = BlockRuntime {
            id,
            extended: self.size.cmpgt(IVec3::ONE).any(),
            emissive: self.emission.iter().any(|&e| e > 0),
            hitboxes: self
                .rotation
                .variants()
                .iter()
                .map(|coords| self.hitboxes.iter().map(|b| coords.transform(b)).collect())
                .collect(),
        };
    }
}

/// Segment bits for footprint cell `local`: one bit per axis with a non-zero step.
pub fn segment_bits(local: IVec3) -> u8 {
    u8::from(local.x > 0) | (u8::from(local.y > 0) << 1) | (u8::from(local.z > 0) << 2)
}

/// Errors that can occur during block registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A block with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// Every id below the void sentinel has been consumed.
    #[error("block registry is full (max 65535 types)")]
    RegistryFull,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`BlockId`] → [`BlockDef`] with O(1) lookup by index and
/// O(1) reverse lookup by name.
#[derive(Debug)]
pub struct BlockRegistry {
    /// Dense array where `index == BlockId.0`.
    defs: Vec<BlockDef>,
    name_to_id: FxHashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Creates a new registry with Air pre-registered as ID 0.
    pub fn new() -> Self {
        let mut air = BlockDef::air();
        air.finalize(BlockId::AIR);
        let mut name_to_id = FxHashMap::default();
        name_to_id.insert(air.name.clone(), BlockId::AIR);
        Self {
            defs: vec![air],
            name_to_id,
        }
    }

    /// Registers a new block type and returns its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken, or
    /// [`RegistryError::RegistryFull`] if the next id would be the void sentinel.
    pub fn register(&mut self, mut def: BlockDef) -> Result<BlockId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.defs.len() >= BlockId::VOID.index() {
            return Err(RegistryError::RegistryFull);
        }
        if def.solid && !def.hitboxes.iter().any(Aabb::is_full_cell) {
            tracing::warn!(
                name = %def.name,
                "solid block without a full-cell hitbox"
            );
        }
        let id = BlockId(self.defs.len() as u16);
        def.finalize(id);
        tracing::debug!(name = %def.name, id = id.0, "registered block");
        self.name_to_id.insert(def.name.clone(), id);
        self.defs.push(def);
        Ok(id)
    }

    /// Returns the definition for a given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this registry (including
    /// [`BlockId::VOID`]). That is a programming error.
    pub fn get(&self, id: BlockId) -> &BlockDef {
        &self.defs[id.index()]
    }

    /// Returns the definition, or `None` for unknown ids and void.
    pub fn try_get(&self, id: BlockId) -> Option<&BlockDef> {
        self.defs.get(id.index())
    }

    /// Returns the ID for a named block, or `None` if not found.
    pub fn lookup_by_name(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Total number of registered types (including Air).
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if only Air is registered.
    pub fn is_empty(&self) -> bool {
        self.defs.len() <= 1
    }

    /// Light-passing check that treats unknown ids as opaque.
    pub fn is_light_passing(&self, id: BlockId) -> bool {
        self.try_get(id).is_some_and(|def| def.light_passing)
    }

    /// Emission of `id` in color channel `channel` (0 for sun or unknown ids).
    pub fn emission(&self, id: BlockId, channel: usize) -> u8 {
        self.try_get(id)
            .and_then(|def| def.emission.get(channel).copied())
            .unwrap_or(0)
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
