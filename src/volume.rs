//! The uniform in-memory representation every schematic dialect is lowered
//! into before translation and merging run over it.

/// Which of the four schematic shapes a root tree classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Classic,
    Modern,
    StatesWrapped,
    Fallback,
}

/// Ordered index → Java block descriptor table. Index 0 carries no special
/// meaning; every index referenced by `Volume::cells` must resolve here.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    pub descriptors: Vec<String>,
}

impl Palette {
    pub fn get(&self, index: u32) -> Option<&str> {
        self.descriptors.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// A decoded, dialect-agnostic volume: dimensions plus either a modern
/// palette+cells pair or classic legacy-id+metadata arrays.
pub struct Volume {
    pub width: u32,
    pub height: u32,
    pub length: u32,
    pub dialect: Dialect,

    /// Present for modern / states_wrapped / fallback dialects.
    pub palette: Option<Palette>,
    /// Dense XZY-ordered palette indices, one per cell. Present alongside
    /// `palette`.
    pub cells: Option<Vec<u32>>,

    /// Present only for the classic dialect: low byte of the numeric block
    /// id, widened with `AddBlocks`/`Add` high nibbles where supplied.
    pub legacy_blocks: Option<Vec<u16>>,
    /// Present only for the classic dialect: 4-bit metadata per cell.
    pub legacy_data: Option<Vec<u8>>,
}

impl Volume {
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize * self.length as usize
    }

    /// Linear XZY index ↔ (x, y, z): x varies fastest, then z, then y.
    pub fn coords_of(&self, index: usize) -> (u32, u32, u32) {
        let w = self.width as usize;
        let l = self.length as usize;
        let x = (index % w) as u32;
        let z = ((index / w) % l) as u32;
        let y = (index / (w * l)) as u32;
        (x, y, z)
    }

    pub fn index_of(&self, x: u32, y: u32, z: u32) -> usize {
        x as usize + z as usize * self.width as usize
            + y as usize * self.width as usize * self.length as usize
    }
}
