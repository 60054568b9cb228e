//! Terminal rendering of a tile grid with Unicode box-drawing characters.

use std::io::Write;

use crate::error::{Error, Result};
use crate::geom::Direction;
use crate::tiles::{Tile, TileKind, Tiles};

/// Glyphs for occupied tiles, indexed by texture id.
pub const TEXTURES: [char; 8] = ['.', '#', '@', '&', '%', '+', 'o', '~'];

/// Wall glyphs indexed by the 4-bit mask of wall-or-door neighbours
/// (up = 1, right = 2, down = 4, left = 8). An isolated wall renders as a
/// small square.
const WALLS: [char; 16] = [
    '◻', '║', '═', '╚', '║', '║', '╔', '╠', '═', '╝', '═', '╩', '╗', '╣', '╦', '╬',
];

/// Write the grid to `w`, surrounded by a double-line box.
///
/// Free and door tiles render as spaces (a door's neighbouring walls close
/// around it), walls pick their glyph from the neighbour mask, and occupied
/// tiles show their texture glyph. Texture ids outside the glyph table fail
/// with [`Error::Render`].
pub fn terminal(w: &mut impl Write, tiles: &Tiles) -> Result<()> {
    let mut line = String::with_capacity(tiles.width() + 2);

    line.push('╔');
    for _ in 0..tiles.width() {
        line.push('═');
    }
    line.push('╗');
    writeln!(w, "{line}")?;

    for y in 0..tiles.height() {
        line.clear();
        line.push('║');
        for x in 0..tiles.width() {
            line.push(glyph(tiles, x, y)?);
        }
        line.push('║');
        writeln!(w, "{line}")?;
    }

    line.clear();
    line.push('╚');
    for _ in 0..tiles.width() {
        line.push('═');
    }
    line.push('╝');
    writeln!(w, "{line}")?;
    Ok(())
}

fn glyph(tiles: &Tiles, x: usize, y: usize) -> Result<char> {
    let tile = tiles.get(x, y);
    match tile.kind {
        TileKind::Free | TileKind::Door => Ok(' '),
        TileKind::Wall => Ok(wall_glyph(tiles, x, y)),
        TileKind::Occupied => TEXTURES
            .get(tile.texture as usize)
            .copied()
            .ok_or_else(|| Error::Render(format!("no glyph for texture {}", tile.texture))),
    }
}

fn wall_glyph(tiles: &Tiles, x: usize, y: usize) -> char {
    let mut mask = Direction::empty();
    if x > 0 && connects(tiles.get(x - 1, y)) {
        mask |= Direction::LEFT;
    }
    if x + 1 < tiles.width() && connects(tiles.get(x + 1, y)) {
        mask |= Direction::RIGHT;
    }
    if y > 0 && connects(tiles.get(x, y - 1)) {
        mask |= Direction::UP;
    }
    if y + 1 < tiles.height() && connects(tiles.get(x, y + 1)) {
        mask |= Direction::DOWN;
    }
    WALLS[mask.bits() as usize]
}

/// Doors connect walls across themselves, so they count as neighbours.
fn connects(tile: Tile) -> bool {
    matches!(tile.kind, TileKind::Wall | TileKind::Door)
}

#[cfg(test)]
mod tests {
    use crate::blueprint::Blueprint;
    use crate::build::{build, Order};
    use crate::csp::matcher::CspMatcher;
    use crate::draw::rasterise;
    use crate::geom::Rectangle;
    use crate::rules::catalogue;

    use super::*;

    fn rendered(tiles: &Tiles) -> String {
        let mut out = Vec::new();
        terminal(&mut out, tiles).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn a_wall_ring_closes_into_box_characters() {
        let mut tiles = Tiles::new(4, 3, Tile::default());
        tiles.frame(Rectangle::new(0, 0, 3, 2), Tile::new(TileKind::Wall, 0));
        let expect = ["╔════╗", "║╔══╗║", "║║  ║║", "║╚══╝║", "╚════╝", ""];
        assert_eq!(rendered(&tiles), expect.join("\n"));
    }

    #[test]
    fn lone_walls_and_textures_have_their_own_glyphs() {
        let mut tiles = Tiles::new(3, 1, Tile::default());
        tiles.set(0, 0, Tile::new(TileKind::Wall, 0));
        tiles.set(2, 0, Tile::new(TileKind::Occupied, 1));
        let expect = ["╔═══╗", "║◻ #║", "╚═══╝", ""];
        assert_eq!(rendered(&tiles), expect.join("\n"));
    }

    #[test]
    fn doors_read_as_gaps_between_closing_walls() {
        let mut tiles = Tiles::new(3, 1, Tile::default());
        tiles.set(0, 0, Tile::new(TileKind::Wall, 0));
        tiles.set(1, 0, Tile::new(TileKind::Door, 0));
        tiles.set(2, 0, Tile::new(TileKind::Wall, 0));
        let expect = ["╔═══╗", "║═ ═║", "╚═══╝", ""];
        assert_eq!(rendered(&tiles), expect.join("\n"));
    }

    #[test]
    fn out_of_range_textures_fail() {
        let mut tiles = Tiles::new(1, 1, Tile::default());
        tiles.set(0, 0, Tile::new(TileKind::Occupied, 99));
        let mut out = Vec::new();
        assert!(matches!(
            terminal(&mut out, &tiles).unwrap_err(),
            Error::Render(_)
        ));
    }

    #[test]
    fn a_generated_house_renders_end_to_end() {
        let bp = Blueprint::parse(
            br#"{"Root": {"@": "House", "rect": "[0,0,5,5]",
                "interior": {"@": "Room"}, "exterior": {"@": "NOP"}}}"#,
        )
        .unwrap();
        let g = build(
            &[bp],
            &CspMatcher::new(),
            &catalogue::standard(),
            Order::Lexicographic,
        )
        .unwrap();
        let tiles = rasterise(&g).unwrap();
        let expect = [
            "╔══════╗",
            "║╔════╗║",
            "║║    ║║",
            "║║    ║║",
            "║║    ║║",
            "║║    ║║",
            "║╚══ ═╝║",
            "║      ║",
            "╚══════╝",
            "",
        ];
        assert_eq!(rendered(&tiles), expect.join("\n"));
    }
}
