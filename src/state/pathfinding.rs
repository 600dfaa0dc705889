//! Movement-cost search over the board grid.
//!
//! Label-setting Dijkstra without a priority queue: each round scans every
//! node for the cheapest unvisited one. Boards are small, so the O(N²) scan
//! is fine. Entering a tile costs its terrain cost for the mover's class and
//! tiles held by another faction are never entered.

use super::board::{Board, Faction, Position};
use super::catalog::MovementClass;
use super::terrain::INF;

#[derive(Debug, Clone, Copy)]
struct Node {
    cost: u32,
    blocked: bool,
    visited: bool,
    distance: u32,
}

/// One search from a fixed source for a given mover.
struct Search<'a> {
    board: &'a Board,
    nodes: Vec<Node>,
}

impl<'a> Search<'a> {
    fn new(board: &'a Board, source: Position, movement: MovementClass, faction: Faction) -> Self {
        let nodes = board
            .tiles()
            .iter()
            .map(|tile| Node {
                cost: tile.terrain.movement_cost(movement),
                blocked: tile.unit.as_ref().is_some_and(|u| u.faction != faction),
                visited: false,
                distance: if tile.pos == source { 0 } else { INF },
            })
            .collect();
        Self { board, nodes }
    }

    /// Cheapest unvisited, unblocked node that has been reached.
    fn next_node(&self) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.visited && !n.blocked && n.distance != INF)
            .min_by_key(|(_, n)| n.distance)
            .map(|(i, _)| i)
    }

    fn relax_neighbors(&mut self, index: usize) {
        let base = self.nodes[index].distance;
        let pos = Position::new(index % self.board.width, index / self.board.width);
        for neighbor in self.board.neighbors(pos) {
            let n = &mut self.nodes[self.board.index_of(neighbor)];
            if n.visited || n.blocked || n.cost == INF {
                continue;
            }
            let candidate = base.saturating_add(n.cost);
            if candidate < n.distance {
                n.distance = candidate;
            }
        }
    }

    /// Run until `stop_at` is settled or nothing reachable is left.
    fn run(&mut self, stop_at: Option<usize>) {
        while let Some(current) = self.next_node() {
            self.relax_neighbors(current);
            self.nodes[current].visited = true;
            if Some(current) == stop_at {
                return;
            }
        }
    }
}

/// Minimum movement cost from `source` to every tile, row-major.
/// Unreachable tiles hold [`INF`].
pub fn distance_field(
    board: &Board,
    source: Position,
    movement: MovementClass,
    faction: Faction,
) -> Vec<u32> {
    let mut search = Search::new(board, source, movement, faction);
    search.run(None);
    search
        .nodes
        .iter()
        .map(|n| if n.visited { n.distance } else { INF })
        .collect()
}

/// Minimum movement cost from `source` to `target`, or [`INF`].
pub fn distance_to(
    board: &Board,
    source: Position,
    target: Position,
    movement: MovementClass,
    faction: Faction,
) -> u32 {
    let goal = board.index_of(target);
    let mut search = Search::new(board, source, movement, faction);
    search.run(Some(goal));
    let node = search.nodes[goal];
    if node.visited {
        node.distance
    } else {
        INF
    }
}

/// Cost to reach `target` if it fits within `budget`.
///
/// Targets further than `budget` in Manhattan distance are rejected
/// without searching.
pub fn cost_within(
    board: &Board,
    source: Position,
    target: Position,
    movement: MovementClass,
    faction: Faction,
    budget: u32,
) -> Option<u32> {
    if source.distance(&target) > budget {
        return None;
    }
    let cost = distance_to(board, source, target, movement, faction);
    (cost <= budget).then_some(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::{Map, MapTile, Unit};
    use crate::state::catalog::{UnitCatalog, UnitType};
    use crate::state::config::GameConfig;
    use crate::state::terrain::TerrainType;
    use pretty_assertions::assert_eq;

    fn plain_board(width: usize, height: usize) -> Board {
        let map = Map::filled(width, height, TerrainType::Plain, vec![Faction::Red, Faction::Blue]);
        Board::create(&map, &GameConfig::default()).unwrap()
    }

    fn board_from(width: usize, height: usize, terrain: &[TerrainType]) -> Board {
        let mut map = Map::filled(width, height, TerrainType::Plain, vec![Faction::Red, Faction::Blue]);
        map.tiles = terrain.iter().map(|t| MapTile::new(*t)).collect();
        Board::create(&map, &GameConfig::default()).unwrap()
    }

    fn put(board: &mut Board, x: usize, y: usize, faction: Faction) {
        let catalog = UnitCatalog::standard();
        let unit = Unit::new(faction, UnitType::Infantry, catalog.get(UnitType::Infantry));
        board.place_unit(Position::new(x, y), unit).unwrap();
    }

    #[test]
    fn test_open_field_matches_manhattan() {
        let board = plain_board(6, 5);
        let source = Position::new(1, 1);
        let field = distance_field(&board, source, MovementClass::Foot, Faction::Red);
        for tile in board.tiles() {
            assert_eq!(field[board.index_of(tile.pos)], source.distance(&tile.pos));
        }
    }

    #[test]
    fn test_terrain_costs_accumulate() {
        use TerrainType::{Mountain as M, Plain as P};
        let board = board_from(3, 1, &[P, M, P]);
        let cost = distance_to(
            &board,
            Position::new(0, 0),
            Position::new(2, 0),
            MovementClass::Foot,
            Faction::Red,
        );
        assert_eq!(cost, 3);

        let cost = distance_to(
            &board,
            Position::new(0, 0),
            Position::new(2, 0),
            MovementClass::Treads,
            Faction::Red,
        );
        assert_eq!(cost, INF);
    }

    #[test]
    fn test_enemy_blocks_but_ally_does_not() {
        use TerrainType::{Plain as P, Sea as S};
        #[rustfmt::skip]
        let terrain = [
            P, P, P,
            S, P, S,
            P, P, P,
        ];
        let mut board = board_from(3, 3, &terrain);
        put(&mut board, 0, 0, Faction::Red);

        put(&mut board, 1, 1, Faction::Red);
        let through_ally = distance_to(
            &board,
            Position::new(0, 0),
            Position::new(0, 2),
            MovementClass::Foot,
            Faction::Red,
        );
        assert_eq!(through_ally, 4);

        board.take_unit(Position::new(1, 1));
        put(&mut board, 1, 1, Faction::Blue);
        let through_enemy = distance_to(
            &board,
            Position::new(0, 0),
            Position::new(0, 2),
            MovementClass::Foot,
            Faction::Red,
        );
        assert_eq!(through_enemy, INF);

        let field = distance_field(&board, Position::new(0, 0), MovementClass::Foot, Faction::Red);
        assert_eq!(field[board.index_of(Position::new(1, 1))], INF);
    }

    #[test]
    fn test_cost_within_budget() {
        let board = plain_board(8, 8);
        let source = Position::new(0, 0);
        assert_eq!(
            cost_within(&board, source, Position::new(2, 1), MovementClass::Foot, Faction::Red, 3),
            Some(3)
        );
        assert_eq!(
            cost_within(&board, source, Position::new(3, 1), MovementClass::Foot, Faction::Red, 3),
            None
        );
    }

    #[test]
    fn test_source_has_zero_cost() {
        let board = plain_board(3, 3);
        let p = Position::new(1, 1);
        assert_eq!(distance_to(&board, p, p, MovementClass::Air, Faction::Red), 0);
    }

    /// Reachability by flood fill over passable tiles, ignoring cost.
    fn flood_reachable(board: &Board, source: Position, movement: MovementClass) -> Vec<bool> {
        let mut seen = vec![false; board.tiles().len()];
        let mut stack = vec![source];
        seen[board.index_of(source)] = true;
        while let Some(pos) = stack.pop() {
            for next in board.neighbors(pos) {
                let i = board.index_of(next);
                if !seen[i] && board.tile(next).terrain.is_passable_for(movement) {
                    seen[i] = true;
                    stack.push(next);
                }
            }
        }
        seen
    }

    use proptest::prelude::*;

    const W: usize = 6;
    const H: usize = 5;

    fn terrain_strategy() -> impl Strategy<Value = Vec<TerrainType>> {
        proptest::collection::vec(
            proptest::sample::select(vec![
                TerrainType::Plain,
                TerrainType::Wood,
                TerrainType::Mountain,
                TerrainType::Road,
                TerrainType::Sea,
            ]),
            W * H,
        )
    }

    proptest! {
        #[test]
        fn prop_search_is_idempotent(
            terrain in terrain_strategy(),
            sx in 0..W, sy in 0..H
        ) {
            let board = board_from(W, H, &terrain);
            let source = Position::new(sx, sy);
            let first = distance_field(&board, source, MovementClass::Foot, Faction::Red);
            let second = distance_field(&board, source, MovementClass::Foot, Faction::Red);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_field_agrees_with_targeted_search(
            terrain in terrain_strategy(),
            sx in 0..W, sy in 0..H, tx in 0..W, ty in 0..H
        ) {
            let board = board_from(W, H, &terrain);
            let source = Position::new(sx, sy);
            let target = Position::new(tx, ty);
            let field = distance_field(&board, source, MovementClass::Tires, Faction::Red);
            let single = distance_to(&board, source, target, MovementClass::Tires, Faction::Red);
            prop_assert_eq!(field[board.index_of(target)], single);
        }

        #[test]
        fn prop_swapped_endpoints_cost_the_same(
            mut terrain in terrain_strategy(),
            sx in 0..W, sy in 0..H, tx in 0..W, ty in 0..H
        ) {
            // Plain endpoints make entry costs equal in both directions.
            terrain[sx + sy * W] = TerrainType::Plain;
            terrain[tx + ty * W] = TerrainType::Plain;
            let board = board_from(W, H, &terrain);
            let a = Position::new(sx, sy);
            let b = Position::new(tx, ty);
            let there = distance_to(&board, a, b, MovementClass::Foot, Faction::Red);
            let back = distance_to(&board, b, a, MovementClass::Foot, Faction::Red);
            prop_assert_eq!(there, back);
        }

        #[test]
        fn prop_infinite_iff_unreachable(
            terrain in terrain_strategy(),
            sx in 0..W, sy in 0..H
        ) {
            let board = board_from(W, H, &terrain);
            let source = Position::new(sx, sy);
            let field = distance_field(&board, source, MovementClass::Foot, Faction::Red);
            let reachable = flood_reachable(&board, source, MovementClass::Foot);
            for (cost, reached) in field.iter().zip(reachable) {
                prop_assert_eq!(*cost == INF, !reached);
            }
        }
    }
}
