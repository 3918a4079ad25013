//! Tile map collision.
//!
//! Level geometry is a dense grid of square tiles anchored at a world-space
//! origin (the bottom-left corner of tile `(0, 0)`). Row `y = 0` is the bottom
//! row. Bodies are AABBs stored as centre + half extents.
//!
//! Movement is resolved one axis at a time: the AABB is swept along Y against
//! the grid, then along X from the corrected Y. Each sweep stops the box flush
//! against the first solid edge it would cross and never pushes it backwards.

use glam::Vec2;

pub const SOLID_TILE: char = '#';
pub const EMPTY_TILE: char = '.';

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn from_center_size(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            center_x: center.x,
            center_y: center.y,
            half_w: width * 0.5,
            half_h: height * 0.5,
        }
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.half_w
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.half_w
    }

    pub fn bottom(&self) -> f32 {
        self.center_y - self.half_h
    }

    pub fn top(&self) -> f32 {
        self.center_y + self.half_h
    }
}

/// Outcome of a single-axis sweep: the resolved centre coordinate and whether
/// a solid tile stopped (or is touching) the leading edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMove {
    pub center: f32,
    pub blocked: bool,
}

impl AxisMove {
    fn free(center: f32) -> Self {
        Self {
            center,
            blocked: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TileMap {
    pub tile_size: f32,
    pub origin: Vec2,
    pub width: i32,
    pub height: i32,
    solids: Vec<bool>,
}

impl TileMap {
    /// Build from ASCII rows, top row first. `#` is solid, `.` is empty.
    pub fn from_rows(rows: &[String], tile_size: f32, origin: Vec2) -> Result<Self, String> {
        if tile_size <= 0.0 || !tile_size.is_finite() {
            return Err("Tile map: tile_size must be > 0".to_string());
        }
        let Some(first) = rows.first() else {
            return Err("Tile map: rows array is empty".to_string());
        };
        let width = first.chars().count();
        if width == 0 {
            return Err("Tile map: rows must not be empty strings".to_string());
        }

        let height = rows.len();
        let mut solids = vec![false; width * height];
        for (row_index, row) in rows.iter().enumerate() {
            let row_width = row.chars().count();
            if row_width != width {
                return Err(format!(
                    "Tile map: row {row_index} has width {row_width}, expected {width}"
                ));
            }
            let y = height - 1 - row_index;
            for (x, c) in row.chars().enumerate() {
                match c {
                    SOLID_TILE => solids[y * width + x] = true,
                    EMPTY_TILE => {}
                    other => {
                        return Err(format!(
                            "Tile map: unknown tile '{other}' at row {row_index}, column {x}"
                        ));
                    }
                }
            }
        }

        Ok(Self {
            tile_size,
            origin,
            width: width as i32,
            height: height as i32,
            solids,
        })
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return false;
        }
        self.solids[(y * self.width + x) as usize]
    }

    pub fn is_solid_at(&self, world_x: f32, world_y: f32) -> bool {
        self.is_solid(self.world_to_cell_x(world_x), self.world_to_cell_y(world_y))
    }

    /// True when any solid tile intersects the AABB interior.
    pub fn overlaps_solid(&self, aabb: Aabb) -> bool {
        const EPS: f32 = 0.001;
        let x0 = self.world_to_cell_x(aabb.left() + EPS);
        let x1 = self.world_to_cell_x(aabb.right() - EPS);
        let y0 = self.world_to_cell_y(aabb.bottom() + EPS);
        let y1 = self.world_to_cell_y(aabb.top() - EPS);
        (y0..=y1).any(|y| (x0..=x1).any(|x| self.is_solid(x, y)))
    }

    pub fn solid_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.is_solid(x, y))
    }

    pub fn cell_center(&self, x: i32, y: i32) -> Vec2 {
        Vec2::new(
            self.origin.x + (x as f32 + 0.5) * self.tile_size,
            self.origin.y + (y as f32 + 0.5) * self.tile_size,
        )
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.width as f32 * self.tile_size
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y
    }

    pub fn top(&self) -> f32 {
        self.origin.y + self.height as f32 * self.tile_size
    }

    /// Sweep along X. The leading edge is scanned up to its exact candidate
    /// position, so even a sub-millimetre step into a wall reports `blocked`.
    pub fn resolve_axis_x(&self, aabb: Aabb, dx: f32) -> AxisMove {
        if dx == 0.0 {
            return AxisMove::free(aabb.center_x);
        }

        const EPS: f32 = 0.001;
        let mut candidate_x = aabb.center_x + dx;
        let mut blocked = false;
        let y0 = self.world_to_cell_y(aabb.bottom() + EPS);
        let y1 = self.world_to_cell_y(aabb.top() - EPS);

        if dx > 0.0 {
            // Scan every column the leading edge passes through so large steps
            // cannot skip over a one-tile wall.
            let from = self.world_to_cell_x(aabb.right() - EPS);
            let to = self.world_to_cell_x(candidate_x + aabb.half_w);
            'scan: for x in from..=to {
                for y in y0..=y1 {
                    if self.is_solid(x, y) {
                        candidate_x = candidate_x.min(self.cell_left_world(x) - aabb.half_w);
                        blocked = true;
                        break 'scan;
                    }
                }
            }
            candidate_x = candidate_x.max(aabb.center_x);
        } else {
            let from = self.world_to_cell_x(aabb.left() + EPS);
            let to = self.world_to_cell_x(candidate_x - aabb.half_w);
            'scan: for x in (to..=from).rev() {
                for y in y0..=y1 {
                    if self.is_solid(x, y) {
                        candidate_x = candidate_x.max(self.cell_right_world(x) + aabb.half_w);
                        blocked = true;
                        break 'scan;
                    }
                }
            }
            candidate_x = candidate_x.min(aabb.center_x);
        }

        AxisMove {
            center: candidate_x,
            blocked,
        }
    }

    pub fn resolve_axis_y(&self, aabb: Aabb, dy: f32) -> AxisMove {
        if dy == 0.0 {
            return AxisMove::free(aabb.center_y);
        }

        const EPS: f32 = 0.001;
        let mut candidate_y = aabb.center_y + dy;
        let mut blocked = false;
        let x0 = self.world_to_cell_x(aabb.left() + EPS);
        let x1 = self.world_to_cell_x(aabb.right() - EPS);

        if dy > 0.0 {
            let from = self.world_to_cell_y(aabb.top() - EPS);
            let to = self.world_to_cell_y(candidate_y + aabb.half_h);
            'scan: for y in from..=to {
                for x in x0..=x1 {
                    if self.is_solid(x, y) {
                        candidate_y = candidate_y.min(self.cell_bottom_world(y) - aabb.half_h);
                        blocked = true;
                        break 'scan;
                    }
                }
            }
            candidate_y = candidate_y.max(aabb.center_y);
        } else {
            let from = self.world_to_cell_y(aabb.bottom() + EPS);
            let to = self.world_to_cell_y(candidate_y - aabb.half_h);
            'scan: for y in (to..=from).rev() {
                for x in x0..=x1 {
                    if self.is_solid(x, y) {
                        candidate_y = candidate_y.max(self.cell_top_world(y) + aabb.half_h);
                        blocked = true;
                        break 'scan;
                    }
                }
            }
            candidate_y = candidate_y.min(aabb.center_y);
        }

        AxisMove {
            center: candidate_y,
            blocked,
        }
    }

    fn world_to_cell_x(&self, world_x: f32) -> i32 {
        ((world_x - self.origin.x) / self.tile_size).floor() as i32
    }

    fn world_to_cell_y(&self, world_y: f32) -> i32 {
        ((world_y - self.origin.y) / self.tile_size).floor() as i32
    }

    fn cell_left_world(&self, x: i32) -> f32 {
        self.origin.x + x as f32 * self.tile_size
    }

    fn cell_right_world(&self, x: i32) -> f32 {
        self.origin.x + (x + 1) as f32 * self.tile_size
    }

    fn cell_bottom_world(&self, y: i32) -> f32 {
        self.origin.y + y as f32 * self.tile_size
    }

    fn cell_top_world(&self, y: i32) -> f32 {
        self.origin.y + (y + 1) as f32 * self.tile_size
    }
}

#[cfg(test)]
pub(crate) fn map_from(rows: &[&str]) -> TileMap {
    let rows: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
    TileMap::from_rows(&rows, 1.0, Vec2::ZERO).expect("test map should parse")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x: f32, y: f32) -> Aabb {
        Aabb::from_center_size(Vec2::new(x, y), 1.0, 1.0)
    }

    struct MoveResult {
        aabb: Aabb,
        blocked_left: bool,
        blocked_right: bool,
        blocked_down: bool,
        blocked_up: bool,
    }

    /// Y then X, the same order `Entity::update` uses.
    fn move_and_collide(map: &TileMap, aabb: Aabb, dx: f32, dy: f32) -> MoveResult {
        let mut moved = aabb;
        let y = map.resolve_axis_y(aabb, dy);
        moved.center_y = y.center;
        let x = map.resolve_axis_x(moved, dx);
        moved.center_x = x.center;

        MoveResult {
            aabb: moved,
            blocked_left: x.blocked && dx < 0.0,
            blocked_right: x.blocked && dx > 0.0,
            blocked_down: y.blocked && dy < 0.0,
            blocked_up: y.blocked && dy > 0.0,
        }
    }

    #[test]
    fn rows_are_read_top_first() {
        let map = map_from(&["#...", "....", "...#"]);
        assert_eq!(map.width, 4);
        assert_eq!(map.height, 3);
        assert!(map.is_solid(0, 2));
        assert!(map.is_solid(3, 0));
        assert!(!map.is_solid(0, 0));
    }

    #[test]
    fn out_of_bounds_is_not_solid() {
        let map = map_from(&["##", "##"]);
        assert!(!map.is_solid(-1, 0));
        assert!(!map.is_solid(0, 2));
        assert!(!map.is_solid_at(5.0, 0.5));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec!["###".to_string(), "##".to_string()];
        let err = TileMap::from_rows(&rows, 1.0, Vec2::ZERO).expect_err("ragged rows must fail");
        assert!(err.contains("row 1"));
    }

    #[test]
    fn unknown_tile_is_rejected() {
        let rows = vec!["#x#".to_string()];
        let err = TileMap::from_rows(&rows, 1.0, Vec2::ZERO).expect_err("unknown tile must fail");
        assert!(err.contains("unknown tile 'x'"));
    }

    #[test]
    fn non_positive_tile_size_is_rejected() {
        let rows = vec!["#".to_string()];
        assert!(TileMap::from_rows(&rows, 0.0, Vec2::ZERO).is_err());
    }

    #[test]
    fn move_blocks_motion_into_wall() {
        let map = map_from(&["....", "..#.", "...."]);
        let start = unit_box(0.5, 1.5);
        let moved = move_and_collide(&map, start, 3.0, 0.0);
        assert!((moved.aabb.center_x - 1.5).abs() < 0.001);
        assert!(moved.blocked_right);
        assert!(!moved.blocked_left);
    }

    #[test]
    fn fast_move_does_not_tunnel_through_thin_wall() {
        let map = map_from(&["..#......"]);
        let start = unit_box(0.5, 0.5);
        let moved = move_and_collide(&map, start, 6.0, 0.0);
        assert!(moved.aabb.center_x <= 1.5 + 0.001);
        assert!(moved.blocked_right);
    }

    #[test]
    fn falling_body_lands_on_floor() {
        let map = map_from(&["....", "....", "####"]);
        let start = unit_box(1.5, 2.0);
        let moved = move_and_collide(&map, start, 0.0, -2.0);
        assert!((moved.aabb.center_y - 1.5).abs() < 0.001);
        assert!(moved.blocked_down);
        assert!(!moved.blocked_up);
    }

    #[test]
    fn ceiling_blocks_upward_motion() {
        let map = map_from(&["####", "....", "...."]);
        let start = unit_box(1.5, 0.5);
        let moved = move_and_collide(&map, start, 0.0, 3.0);
        assert!((moved.aabb.center_y - 1.5).abs() < 0.001);
        assert!(moved.blocked_up);
    }

    #[test]
    fn move_up_beside_wall_does_not_push_downward() {
        let map = map_from(&["....", "..#.", "####"]);
        let start = unit_box(1.5, 1.5);
        let moved = move_and_collide(&map, start, 0.0, 0.3);
        assert!(moved.aabb.center_y >= start.center_y - 0.0001);
        assert!(!moved.blocked_up);
    }

    #[test]
    fn standing_on_floor_and_walking_keeps_height() {
        let map = map_from(&["....", "####"]);
        let start = unit_box(0.5, 1.5);
        let moved = move_and_collide(&map, start, 0.25, -0.05);
        assert!((moved.aabb.center_y - 1.5).abs() < 0.001);
        assert!((moved.aabb.center_x - 0.75).abs() < 0.001);
        assert!(moved.blocked_down);
    }

    #[test]
    fn tiny_step_into_flush_tile_is_blocked() {
        let map = map_from(&["#...", "####"]);
        let resting = unit_box(1.5, 1.5);

        let down = map.resolve_axis_y(resting, -0.00008);
        assert!(down.blocked);
        assert_eq!(down.center, 1.5);

        let left = map.resolve_axis_x(resting, -0.00008);
        assert!(left.blocked);
        assert_eq!(left.center, 1.5);

        let right = map.resolve_axis_x(resting, 0.00008);
        assert!(!right.blocked);
        assert!(right.center > 1.5);
    }

    #[test]
    fn overlaps_solid_detects_interior_overlap_only() {
        let map = map_from(&["....", "####"]);
        assert!(!map.overlaps_solid(unit_box(1.5, 1.5)));
        assert!(map.overlaps_solid(unit_box(1.5, 1.2)));
    }

    #[test]
    fn solid_cells_and_extents() {
        let map = map_from(&["#.", ".#"]);
        let cells: Vec<_> = map.solid_cells().collect();
        assert_eq!(cells, vec![(1, 0), (0, 1)]);
        assert_eq!(map.right(), 2.0);
        assert_eq!(map.top(), 2.0);
        assert_eq!(map.cell_center(1, 0), Vec2::new(1.5, 0.5));
    }
}
