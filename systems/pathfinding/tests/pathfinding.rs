use std::collections::{HashMap, VecDeque};

use glam::Vec3;
use tank_arena_core::{
    CellCoord, Direction, ObstacleOverlay, OverlayHost, TerrainView, TileKind, TileLayout,
    WorldType,
};
use tank_arena_system_pathfinding::Pathfinder;
use tank_arena_world::{query, PatternPreset, Terrain, TerrainConfig};

const TILE_SIZE: f32 = 2.0;

/// Three columns by five rows with only the first column open.
fn corridor() -> Vec<TileKind> {
    let mut kinds = vec![TileKind::Wall; 15];
    for row in 0..5 {
        kinds[row * 3] = TileKind::Room;
    }
    kinds
}

fn generated(world_type: WorldType, seed: u64) -> Terrain {
    let config =
        TerrainConfig::new(21, 21, world_type, PatternPreset::Maze1.pattern()).with_seed(seed);
    let mut terrain = Terrain::new();
    let mut events = Vec::new();
    terrain.init_world(&config, &mut events).expect("init");
    terrain.generate_world(None).expect("start");
    terrain.run_generation(&mut events).expect("generate");
    terrain
}

fn bfs_distances(view: &TerrainView<'_>, start: CellCoord) -> HashMap<CellCoord, usize> {
    let mut distances = HashMap::from([(start, 0)]);
    let mut queue = VecDeque::from([start]);
    while let Some(cell) = queue.pop_front() {
        let distance = distances[&cell];
        for direction in Direction::ALL {
            let Some(next) = cell.step(direction) else {
                continue;
            };
            if view.is_open(next) && !distances.contains_key(&next) {
                let _ = distances.insert(next, distance + 1);
                queue.push_back(next);
            }
        }
    }
    distances
}

#[test]
fn straight_corridor_yields_every_cell_in_order() {
    let kinds = corridor();
    let view = TerrainView::new(&kinds, 3, 5);
    let layout = TileLayout::new(3, 5, TILE_SIZE, TILE_SIZE);
    let overlay = ObstacleOverlay::new(3, 5);
    let host = OverlayHost::new(&layout, &overlay);

    let path = Pathfinder::new()
        .find_path(
            &view,
            &host,
            layout.cell_position(CellCoord::new(0, 0)),
            CellCoord::new(0, 4),
        )
        .expect("corridor is open");

    assert_eq!(path.len(), 5);
    let rows: Vec<u32> = path
        .iter()
        .map(|waypoint| layout.cell_under(*waypoint).expect("on grid").row())
        .collect();
    assert_eq!(rows, vec![0, 1, 2, 3, 4]);
    assert!(path.iter().all(|waypoint| waypoint.x == 0.0));
}

#[test]
fn blocked_target_has_no_path() {
    let kinds = corridor();
    let view = TerrainView::new(&kinds, 3, 5);
    let layout = TileLayout::new(3, 5, TILE_SIZE, TILE_SIZE);
    let overlay = ObstacleOverlay::new(3, 5);
    let host = OverlayHost::new(&layout, &overlay);

    let path = Pathfinder::new().find_path(
        &view,
        &host,
        layout.cell_position(CellCoord::new(0, 0)),
        CellCoord::new(2, 4),
    );

    assert_eq!(path, None);
}

#[test]
fn off_grid_start_has_no_path() {
    let kinds = corridor();
    let view = TerrainView::new(&kinds, 3, 5);
    let layout = TileLayout::new(3, 5, TILE_SIZE, TILE_SIZE);
    let overlay = ObstacleOverlay::new(3, 5);
    let host = OverlayHost::new(&layout, &overlay);

    let path = Pathfinder::new().find_path(
        &view,
        &host,
        Vec3::new(-50.0, 0.0, -50.0),
        CellCoord::new(0, 4),
    );

    assert_eq!(path, None);
}

#[test]
fn occupied_corridor_cell_blocks_the_only_route() {
    let kinds = corridor();
    let view = TerrainView::new(&kinds, 3, 5);
    let layout = TileLayout::new(3, 5, TILE_SIZE, TILE_SIZE);
    let mut overlay = ObstacleOverlay::new(3, 5);
    overlay.occupy(CellCoord::new(0, 2));
    let host = OverlayHost::new(&layout, &overlay);
    let mut pathfinder = Pathfinder::new();

    let path = pathfinder.find_path(
        &view,
        &host,
        layout.cell_position(CellCoord::new(0, 0)),
        CellCoord::new(0, 4),
    );
    assert_eq!(path, None);

    overlay.vacate(CellCoord::new(0, 2));
    let host = OverlayHost::new(&layout, &overlay);
    let path = pathfinder.find_path(
        &view,
        &host,
        layout.cell_position(CellCoord::new(0, 0)),
        CellCoord::new(0, 4),
    );
    assert_eq!(path.map(|path| path.len()), Some(5));
}

#[test]
fn blocked_start_has_no_path() {
    let kinds = corridor();
    let view = TerrainView::new(&kinds, 3, 5);

    let path = Pathfinder::new().find_cell_path(
        &view,
        CellCoord::new(1, 0),
        CellCoord::new(0, 4),
        |_| false,
    );

    assert_eq!(path, None);
}

#[test]
fn paths_through_generated_mazes_are_shortest() {
    let mut pathfinder = Pathfinder::new();
    for (world_type, seed) in [
        (WorldType::Prim, 3),
        (WorldType::RadialPrim, 5),
        (WorldType::LinearPrim, 8),
    ] {
        let terrain = generated(world_type, seed);
        let view = query::terrain_view(&terrain);
        let start = query::start_room(&terrain).expect("start room");
        let distances = bfs_distances(&view, start);

        for room in query::room_roots(&terrain) {
            let path = pathfinder
                .find_cell_path(&view, start, room, |_| false)
                .expect("every room is connected");
            assert_eq!(Some(&(path.len() - 1)), distances.get(&room));
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&room));
            for pair in path.windows(2) {
                assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
                assert!(view.is_open(pair[1]));
            }
        }
    }
}

#[test]
fn detours_around_obstacles_in_open_fields_are_shortest() {
    let mut kinds = vec![TileKind::Room; 12 * 9];
    for row in 0..8 {
        kinds[row * 12 + 5] = TileKind::Pillar;
    }
    let view = TerrainView::new(&kinds, 12, 9);
    let start = CellCoord::new(1, 1);
    let target = CellCoord::new(10, 1);

    let path = Pathfinder::new()
        .find_cell_path(&view, start, target, |_| false)
        .expect("the wall has a gap at the top");

    let distances = bfs_distances(&view, start);
    assert_eq!(path.len() - 1, distances[&target]);
    assert!(path.contains(&CellCoord::new(5, 8)));
}

#[test]
fn repeated_searches_are_idempotent() {
    let terrain = generated(WorldType::Prim, 21);
    let view = query::terrain_view(&terrain);
    let start = query::start_room(&terrain).expect("start room");
    let rooms = query::room_roots(&terrain);
    let far = *rooms.last().expect("rooms exist");
    let mut pathfinder = Pathfinder::new();

    let first = pathfinder.find_cell_path(&view, start, far, |_| false);
    let _ = pathfinder.find_cell_path(&view, far, start, |_| false);
    let second = pathfinder.find_cell_path(&view, start, far, |_| false);

    assert!(first.is_some());
    assert_eq!(first, second);
}
