//! Sliding 2D window of optional slots addressed by absolute grid coordinates.

/// A `width × depth` grid of slots whose top-left corner sits at `offset`.
///
/// Coordinates passed to every method are absolute. Values that fall outside
/// the window when it moves or shrinks are handed to the caller's `on_out`
/// callback exactly once.
#[derive(Clone, Debug)]
pub struct AreaMap<T> {
    slots: Vec<Option<T>>,
    offset_x: i32,
    offset_z: i32,
    width: i32,
    depth: i32,
}

impl<T> AreaMap<T> {
    /// Creates an empty window.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `depth` is not positive.
    pub fn new(width: i32, depth: i32) -> Self {
        assert!(width > 0 && depth > 0, "window must not be empty: {width}x{depth}");
        Self {
            slots: Self::empty_slots(width, depth),
            offset_x: 0,
            offset_z: 0,
            width,
            depth,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Absolute coordinates of slot `(0, 0)`.
    pub fn offset(&self) -> (i32, i32) {
        (self.offset_x, self.offset_z)
    }

    /// Returns `true` if `(x, z)` lies inside the window.
    pub fn contains(&self, x: i32, z: i32) -> bool {
        self.local_index(x, z).is_some()
    }

    pub fn get(&self, x: i32, z: i32) -> Option<&T> {
        self.local_index(x, z)
            .and_then(|index| self.slots[index].as_ref())
    }

    pub fn get_mut(&mut self, x: i32, z: i32) -> Option<&mut T> {
        self.local_index(x, z)
            .and_then(|index| self.slots[index].as_mut())
    }

    /// Stores `value` at `(x, z)`, returning the previous occupant.
    ///
    /// Returns `Err(value)` when the coordinates are outside the window.
    pub fn set(&mut self, x: i32, z: i32, value: T) -> Result<Option<T>, T> {
        match self.local_index(x, z) {
            Some(index) => Ok(self.slots[index].replace(value)),
            None => Err(value),
        }
    }

    /// Takes the value at `(x, z)` without notifying anyone.
    pub fn remove(&mut self, x: i32, z: i32) -> Option<T> {
        self.local_index(x, z)
            .and_then(|index| self.slots[index].take())
    }

    /// Moves the window so `(x, z)` is its centre slot.
    pub fn set_center(&mut self, x: i32, z: i32, on_out: impl FnMut(i32, i32, T)) {
        self.translate(x - self.width / 2, z - self.depth / 2, on_out);
    }

    /// Resizes the window, keeping its centre where it was.
    pub fn resize(&mut self, width: i32, depth: i32, mut on_out: impl FnMut(i32, i32, T)) {
        assert!(width > 0 && depth > 0, "window must not be empty: {width}x{depth}");
        if width == self.width && depth == self.depth {
            return;
        }
        let center_x = self.offset_x + self.width / 2;
        let center_z = self.offset_z + self.depth / 2;
        let offset_x = center_x - width / 2;
        let offset_z = center_z - depth / 2;

        let old = std::mem::replace(&mut self.slots, Self::empty_slots(width, depth));
        let (old_x, old_z, old_width) = (self.offset_x, self.offset_z, self.width);
        self.offset_x = offset_x;
        self.offset_z = offset_z;
        self.width = width;
        self.depth = depth;

        for (index, slot) in old.into_iter().enumerate() {
            let Some(value) = slot else { continue };
            let x = old_x + index as i32 % old_width;
            let z = old_z + index as i32 / old_width;
            if let Err(value) = self.set(x, z, value) {
                on_out(x, z, value);
            }
        }
    }

    /// Empties every slot, handing each value to `on_out`.
    pub fn clear(&mut self, mut on_out: impl FnMut(i32, i32, T)) {
        let (offset_x, offset_z, width) = (self.offset_x, self.offset_z, self.width);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.take() {
                on_out(
                    offset_x + index as i32 % width,
                    offset_z + index as i32 / width,
                    value,
                );
            }
        }
    }

    /// Occupied slots with their absolute coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref().map(|value| {
                (
                    self.offset_x + index as i32 % self.width,
                    self.offset_z + index as i32 / self.width,
                    value,
                )
            })
        })
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    fn translate(&mut self, offset_x: i32, offset_z: i32, mut on_out: impl FnMut(i32, i32, T)) {
        let dx = offset_x - self.offset_x;
        let dz = offset_z - self.offset_z;
        if dx == 0 && dz == 0 {
            return;
        }
        let old = std::mem::replace(&mut self.slots, Self::empty_slots(self.width, self.depth));
        let (old_x, old_z) = (self.offset_x, self.offset_z);
        self.offset_x = offset_x;
        self.offset_z = offset_z;

        for (index, slot) in old.into_iter().enumerate() {
            let Some(value) = slot else { continue };
            let x = old_x + index as i32 % self.width;
            let z = old_z + index as i32 / self.width;
            if let Err(value) = self.set(x, z, value) {
                on_out(x, z, value);
            }
        }
    }

    fn local_index(&self, x: i32, z: i32) -> Option<usize> {
        let lx = x - self.offset_x;
        let lz = z - self.offset_z;
        if lx < 0 || lz < 0 || lx >= self.width || lz >= self.depth {
            return None;
        }
        Some((lz * self.width + lx) as usize)
    }

    fn empty_slots(width: i32, depth: i32) -> Vec<Option<T>> {
        std::iter::repeat_with(|| None)
            .take((width * depth) as usize)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
