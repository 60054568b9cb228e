//! Rasterising a finished graph into a tile grid.

use crate::error::{Error, Result};
use crate::geom::{Area, Door};
use crate::graph::{Graph, NodeIndex};
use crate::tiles::{Tile, TileKind, Tiles};

/// Walk the graph and draw every area's walls, objects and doors.
///
/// The root's rectangle defines the canvas. Areas with `render` unset or
/// true get a wall border; areas carrying an `object` are filled with
/// occupied tiles. Doors are drawn after an area's children, overwriting
/// whatever wall tile lies at the door point; hidden doors punch a free
/// tile instead.
pub fn rasterise(g: &Graph) -> Result<Tiles> {
    let root = g
        .node(NodeIndex::ROOT)
        .ok_or_else(|| Error::InvalidGraph("graph has no root".into()))?;
    let rect = root.rect();
    if rect.x0 >= rect.x1 && rect.y0 >= rect.y1 {
        return Err(Error::InvalidGraph(
            "the root rectangle is not set".into(),
        ));
    }
    let mut tiles = Tiles::new((rect.x1 + 1) as usize, (rect.y1 + 1) as usize, Tile::default());
    paint(g, NodeIndex::ROOT, &mut tiles)?;
    Ok(tiles)
}

fn paint(g: &Graph, nidx: NodeIndex, tiles: &mut Tiles) -> Result<()> {
    let node = g
        .node(nidx)
        .ok_or_else(|| Error::InvalidGraph(format!("node {nidx} does not exist")))?;
    let rect = node.rect();
    if nidx != NodeIndex::ROOT && rect.x1 == 0 && rect.y1 == 0 {
        return Err(Error::InvalidGraph(format!(
            "no rectangle was assigned to node {nidx}"
        )));
    }

    if node.walls_visible() {
        tiles.frame(rect, Tile::new(TileKind::Wall, 0));
    }
    if let Some(texture) = node.texture() {
        tiles.fill(rect, Tile::new(TileKind::Occupied, texture as i16));
    }

    for cidx in g.children(nidx) {
        paint(g, cidx, tiles)?;
    }

    for &eidx in node.edges() {
        let Some(edge) = g.edge(eidx) else { continue };
        let pos = edge.pos();
        let kind = if edge.visible() {
            TileKind::Door
        } else {
            TileKind::Free
        };
        tiles.set(pos.x as usize, pos.y as usize, Tile::new(kind, 0));
    }
    Ok(())
}
