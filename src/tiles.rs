//! The row-major tile grid that graphs are rasterised into.

use rayon::prelude::*;

use crate::geom::Rectangle;

/// What occupies a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TileKind {
    /// Walkable, empty space.
    #[default]
    Free,
    /// Part of a wall.
    Wall,
    /// A doorway.
    Door,
    /// Occupied by an object; the tile's texture says which.
    Occupied,
}

/// One cell of the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    /// What occupies the tile.
    pub kind: TileKind,
    /// Texture id for [`TileKind::Occupied`] tiles.
    pub texture: i16,
}

impl Tile {
    /// Create a tile.
    pub const fn new(kind: TileKind, texture: i16) -> Self {
        Self { kind, texture }
    }
}

/// A row-major grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tiles {
    data: Vec<Tile>,
    width: usize,
    height: usize,
}

impl Tiles {
    /// Allocate a grid with every cell set to `init`.
    ///
    /// Rows are disjoint slices of the backing array, so they are initialised
    /// in parallel without synchronisation.
    pub fn new(width: usize, height: usize, init: Tile) -> Self {
        let mut data = vec![Tile::default(); width * height];
        data.par_chunks_mut(width.max(1))
            .for_each(|row| row.fill(init));
        Self {
            data,
            width,
            height,
        }
    }

    /// The tile at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Tile {
        self.data[x + y * self.width]
    }

    /// Overwrite the tile at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, tile: Tile) {
        self.data[x + y * self.width] = tile;
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Draw the perimeter of a rectangle.
    pub fn frame(&mut self, rect: Rectangle, tile: Tile) {
        for x in rect.x0..=rect.x1 {
            self.set(x as usize, rect.y0 as usize, tile);
            self.set(x as usize, rect.y1 as usize, tile);
        }
        for y in rect.y0..=rect.y1 {
            self.set(rect.x0 as usize, y as usize, tile);
            self.set(rect.x1 as usize, y as usize, tile);
        }
    }

    /// Fill a rectangle, borders included.
    pub fn fill(&mut self, rect: Rectangle, tile: Tile) {
        for y in rect.y0..=rect.y1 {
            for x in rect.x0..=rect.x1 {
                self.set(x as usize, y as usize, tile);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grids_are_uniform() {
        let wall = Tile::new(TileKind::Wall, 0);
        let tiles = Tiles::new(7, 3, wall);
        assert_eq!(tiles.width(), 7);
        assert_eq!(tiles.height(), 3);
        for y in 0..3 {
            for x in 0..7 {
                assert_eq!(tiles.get(x, y), wall);
            }
        }
    }

    #[test]
    fn frames_leave_the_inside_untouched() {
        let mut tiles = Tiles::new(5, 5, Tile::default());
        tiles.frame(Rectangle::new(1, 1, 3, 3), Tile::new(TileKind::Wall, 0));
        assert_eq!(tiles.get(1, 1).kind, TileKind::Wall);
        assert_eq!(tiles.get(3, 2).kind, TileKind::Wall);
        assert_eq!(tiles.get(2, 2).kind, TileKind::Free);
        assert_eq!(tiles.get(0, 0).kind, TileKind::Free);
    }

    #[test]
    fn fill_covers_the_borders() {
        let mut tiles = Tiles::new(4, 4, Tile::default());
        tiles.fill(Rectangle::new(1, 1, 2, 2), Tile::new(TileKind::Occupied, 3));
        assert_eq!(tiles.get(1, 1), Tile::new(TileKind::Occupied, 3));
        assert_eq!(tiles.get(2, 2), Tile::new(TileKind::Occupied, 3));
        assert_eq!(tiles.get(3, 3).kind, TileKind::Free);
    }
}
