use crate::{ChunkPos, TilemapChunk, TilemapError};
use std::collections::BTreeMap;
use woodgas_ecs::{CameraView, Component, ComponentError, EntityView, FrameContext};
use woodgas_render::{RenderBackend, RenderError, TextureHandle, Transform3D};

/// A tile type. Two tiles are the same type when they share a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    pub texture: TextureHandle,
}

impl Tile {
    pub fn new(texture: TextureHandle) -> Self {
        Self { texture }
    }
}

/// Grid of registered tiles, stored in chunks keyed by packed [`ChunkPos`].
#[derive(Debug, Clone)]
pub struct TilemapComponent {
    chunk_size: u32,
    render_tile_size: f32,
    /// Index `i` holds the tile with id `i + 1`.
    tile_types: Vec<Tile>,
    ids: BTreeMap<Tile, u16>,
    chunks: BTreeMap<u64, TilemapChunk>,
}

impl TilemapComponent {
    /// `chunk_size` tiles per chunk side; each tile is drawn
    /// `render_tile_size` world units wide.
    pub fn new(chunk_size: u32, render_tile_size: f32) -> Result<Self, TilemapError> {
        if chunk_size == 0 {
            return Err(TilemapError::InvalidChunkSize);
        }
        Ok(Self {
            chunk_size,
            render_tile_size,
            tile_types: Vec::new(),
            ids: BTreeMap::new(),
            chunks: BTreeMap::new(),
        })
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn render_tile_size(&self) -> f32 {
        self.render_tile_size
    }

    /// Register a tile type and return its id. Ids start at 1.
    pub fn add_tile_type(&mut self, tile: Tile) -> Result<u16, TilemapError> {
        if self.ids.contains_key(&tile) {
            return Err(TilemapError::DuplicateTile(tile));
        }
        let id = u16::try_from(self.tile_types.len() + 1).map_err(|_| TilemapError::TooManyTiles)?;
        self.tile_types.push(tile);
        self.ids.insert(tile, id);
        tracing::debug!(id, ?tile, "tile type registered");
        Ok(id)
    }

    pub fn tile_type(&self, id: u16) -> Option<Tile> {
        let index = usize::from(id).checked_sub(1)?;
        self.tile_types.get(index).copied()
    }

    pub fn tile_id(&self, tile: &Tile) -> Option<u16> {
        self.ids.get(tile).copied()
    }

    pub fn tile_type_count(&self) -> usize {
        self.tile_types.len()
    }

    /// Place `tile` at tile coordinates `(x, y)`, creating the chunk if needed.
    pub fn set_tile(&mut self, x: u32, y: u32, tile: &Tile) -> Result<(), TilemapError> {
        let id = self.tile_id(tile).ok_or(TilemapError::UnknownTile(*tile))?;
        let size = self.chunk_size;
        let pos = ChunkPos::of_tile(x, y, size);
        let chunk = self.chunks.entry(pos.pack()).or_insert_with(|| {
            tracing::trace!(?pos, "chunk created");
            TilemapChunk::new(pos, size)
        });
        chunk.set(x % size, y % size, id);
        Ok(())
    }

    /// Remove whatever is at `(x, y)`. Chunks stay allocated.
    pub fn clear_tile(&mut self, x: u32, y: u32) {
        let size = self.chunk_size;
        if let Some(chunk) = self.chunks.get_mut(&ChunkPos::of_tile(x, y, size).pack()) {
            chunk.set(x % size, y % size, 0);
        }
    }

    /// Tile type at `(x, y)`, `None` when empty.
    pub fn tile_at(&self, x: u32, y: u32) -> Option<Tile> {
        let size = self.chunk_size;
        let id = self.chunk(ChunkPos::of_tile(x, y, size))?.get(x % size, y % size)?;
        self.tile_type(id)
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&TilemapChunk> {
        self.chunks.get(&pos.pack())
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Tile coordinates under a world position; `None` left of or below the map.
    pub fn world_to_tile(&self, x: f32, y: f32) -> Option<(u32, u32)> {
        let tx = (x / self.render_tile_size).floor();
        let ty = (y / self.render_tile_size).floor();
        if tx < 0.0 || ty < 0.0 || !tx.is_finite() || !ty.is_finite() {
            return None;
        }
        Some((tx as u32, ty as u32))
    }

    /// Chunks the camera can see, in key order. Every chunk without a camera.
    pub fn visible_chunks<'a>(&'a self, camera: Option<&'a CameraView>) -> impl Iterator<Item = &'a TilemapChunk> + 'a {
        self.chunks.values().filter(move |chunk| {
            camera.is_none_or(|camera| chunk.is_visible(self.render_tile_size, camera))
        })
    }

    fn draw_chunk(&self, renderer: &mut dyn RenderBackend, chunk: &TilemapChunk) -> Result<usize, RenderError> {
        let rs = self.render_tile_size;
        let origin_x = chunk.pos().x as f32 * self.chunk_size as f32;
        let origin_y = chunk.pos().y as f32 * self.chunk_size as f32;
        let mut drawn = 0;
        for (x, y, id) in chunk.occupied() {
            let Some(tile) = self.tile_type(id) else {
                continue;
            };
            let model = Transform3D::new()
                .translate(rs * (origin_x + x as f32 + 0.5), rs * (origin_y + y as f32 + 0.5), 0.0)
                .scale(rs, rs, rs);
            renderer.batch_quad(model.matrix(), tile.texture)?;
            drawn += 1;
        }
        Ok(drawn)
    }
}

impl Component for TilemapComponent {
    fn init(&mut self, _entity: &EntityView<'_>, _ctx: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update(&mut self, _entity: &EntityView<'_>, ctx: &mut FrameContext<'_>) -> Result<(), ComponentError> {
        let camera = ctx.resources.get::<CameraView>().copied();
        let mut chunks = 0;
        let mut tiles = 0;
        for chunk in self.visible_chunks(camera.as_ref()) {
            ctx.renderer.begin_batch();
            let drawn = self.draw_chunk(&mut *ctx.renderer, chunk);
            ctx.renderer.end_batch();
            tiles += drawn?;
            chunks += 1;
        }
        tracing::trace!(chunks, tiles, total = self.chunks.len(), "tilemap drawn");
        Ok(())
    }

    fn is_unique(&self) -> bool {
        true
    }
}
