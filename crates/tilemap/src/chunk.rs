use woodgas_ecs::CameraView;

/// Chunk coordinates, counted in chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: u32,
    pub y: u32,
}

impl ChunkPos {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Chunk holding tile `(x, y)`.
    pub fn of_tile(x: u32, y: u32, chunk_size: u32) -> Self {
        Self::new(x / chunk_size, y / chunk_size)
    }

    pub fn pack(self) -> u64 {
        (u64::from(self.x) << 32) | u64::from(self.y)
    }

    pub fn unpack(key: u64) -> Self {
        Self::new((key >> 32) as u32, key as u32)
    }
}

impl From<ChunkPos> for u64 {
    fn from(pos: ChunkPos) -> u64 {
        pos.pack()
    }
}

impl From<u64> for ChunkPos {
    fn from(key: u64) -> Self {
        Self::unpack(key)
    }
}

/// Square block of tile ids, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilemapChunk {
    pos: ChunkPos,
    size: u32,
    tiles: Vec<u16>,
}

impl TilemapChunk {
    pub fn new(pos: ChunkPos, size: u32) -> Self {
        Self {
            pos,
            size,
            tiles: vec![0; size as usize * size as usize],
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.size && y < self.size).then(|| y as usize * self.size as usize + x as usize)
    }

    /// Tile id at local `(x, y)`; `None` outside the chunk.
    pub fn get(&self, x: u32, y: u32) -> Option<u16> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    /// Returns `false` when `(x, y)` lies outside the chunk.
    pub fn set(&mut self, x: u32, y: u32, id: u16) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.tiles[i] = id;
                true
            }
            None => false,
        }
    }

    /// Non-empty tiles as `(local_x, local_y, id)`, row by row.
    pub fn occupied(&self) -> impl Iterator<Item = (u32, u32, u16)> + '_ {
        let size = self.size;
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, id)| **id != 0)
            .map(move |(i, id)| (i as u32 % size, i as u32 / size, *id))
    }

    /// World-space extent: `(min_x, max_x, min_y, max_y)`.
    pub fn bounds(&self, tile_size: f32) -> (f32, f32, f32, f32) {
        let extent = tile_size * self.size as f32;
        let min_x = extent * self.pos.x as f32;
        let min_y = extent * self.pos.y as f32;
        (min_x, min_x + extent, min_y, min_y + extent)
    }

    /// An edge of the chunk must lie within the camera's half extents on
    /// both axes.
    pub fn is_visible(&self, tile_size: f32, camera: &CameraView) -> bool {
        let (min_x, max_x, min_y, max_y) = self.bounds(tile_size);
        let half_w = camera.half_width();
        let half_h = camera.half_height();
        let horizontal = (min_x - camera.x).abs() <= half_w || (max_x - camera.x).abs() <= half_w;
        let vertical = (min_y - camera.y).abs() <= half_h || (max_y - camera.y).abs() <= half_h;
        horizontal && vertical
    }
}
