use tank_arena_core::{CellCoord, ObstacleOverlay, TerrainView};

const ROUTE_START: char = 'S';
const ROUTE_TARGET: char = 'T';
const ROUTE_STEP: char = '*';
const OBSTACLE: char = 'X';

/// Draws the terrain as text with north at the top.
///
/// Route glyphs take precedence over obstacles, which take precedence over
/// tile glyphs.
#[must_use]
pub(crate) fn render_map(
    view: &TerrainView<'_>,
    overlay: &ObstacleOverlay,
    route: &[CellCoord],
) -> String {
    let (columns, rows) = view.dimensions();
    let mut out = String::with_capacity((columns as usize + 1) * rows as usize);
    for row in (0..rows).rev() {
        for column in 0..columns {
            let cell = CellCoord::new(column, row);
            out.push(glyph(view, overlay, route, cell));
        }
        out.push('\n');
    }
    out
}

fn glyph(
    view: &TerrainView<'_>,
    overlay: &ObstacleOverlay,
    route: &[CellCoord],
    cell: CellCoord,
) -> char {
    if route.first() == Some(&cell) {
        return ROUTE_START;
    }
    if route.last() == Some(&cell) {
        return ROUTE_TARGET;
    }
    if route.contains(&cell) {
        return ROUTE_STEP;
    }
    if overlay.is_occupied(cell) {
        return OBSTACLE;
    }
    view.kind(cell).map_or(' ', |kind| kind.glyph())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_arena_core::TileKind;

    #[test]
    fn north_is_printed_first() {
        let kinds = vec![
            TileKind::Room,
            TileKind::Wall,
            TileKind::Pillar,
            TileKind::WallOpen,
        ];
        let view = TerrainView::new(&kinds, 2, 2);
        let overlay = ObstacleOverlay::new(2, 2);

        assert_eq!(render_map(&view, &overlay, &[]), "@,\n.#\n");
    }

    #[test]
    fn route_and_obstacles_overlay_tiles() {
        let kinds = vec![TileKind::Room; 6];
        let view = TerrainView::new(&kinds, 3, 2);
        let mut overlay = ObstacleOverlay::new(3, 2);
        overlay.occupy(CellCoord::new(2, 1));
        let route = [
            CellCoord::new(0, 0),
            CellCoord::new(1, 0),
            CellCoord::new(2, 0),
        ];

        assert_eq!(render_map(&view, &overlay, &route), "..X\nS*T\n");
    }
}
