//! Cell grid: maps positions to loaded cells
//!
//! A position is turned into integer cell coordinates with `ceil(x / size) - 1` on X and
//! `floor(y / size)` on Y, so that a cell owns `(min.x, max.x]` and `[min.y, max.y)`. Float
//! rounding can still put a position that lies right on a cell border on the wrong side,
//! so the grid keeps one ruler per axis with the actual border coordinates of the loaded
//! cells and corrects the integer coordinate against them.

use navmesh_common::{Box2f, CellBox, CellPos, Vec2};

use crate::nav_mesh_types::StitchedCellIdx;

/// Ruler entry with no loaded cell on either side
const NO_BORDER: f32 = f32::MAX;

#[derive(Debug, Clone)]
pub struct NavCellGrid {
    cell_box: CellBox,
    slots: Vec<Option<StitchedCellIdx>>,
    /// `ruler_x[i]` is the border between columns `min.x + i - 1` and `min.x + i`
    ruler_x: Vec<f32>,
    ruler_y: Vec<f32>,
    cell_size: f32,
    inv_cell_size: f32,
}

impl Default for NavCellGrid {
    fn default() -> Self {
        Self {
            cell_box: CellBox::empty(),
            slots: Vec::new(),
            ruler_x: Vec::new(),
            ruler_y: Vec::new(),
            cell_size: 0.0,
            inv_cell_size: 0.0,
        }
    }
}

impl NavCellGrid {
    pub fn cell_box(&self) -> &CellBox {
        &self.cell_box
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size;
        self.inv_cell_size = if cell_size > 0.0 { 1.0 / cell_size } else { 0.0 };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Grows the grid so that it covers `cell_box`, keeping the current slots
    pub fn ensure_contains(&mut self, cell_box: &CellBox) {
        if !cell_box.is_valid() {
            return;
        }
        let mut new_box = self.cell_box;
        new_box.expand_box(cell_box);
        if new_box == self.cell_box {
            return;
        }

        let mut slots = vec![None; new_box.count()];
        if self.cell_box.is_valid() {
            for pos in self.cell_box.iter() {
                slots[new_box.row_major_index(pos)] = self.slots[self.cell_box.row_major_index(pos)];
            }
        }
        log::debug!(
            "Cell grid resized from {:?} to {:?}",
            self.cell_box,
            new_box
        );
        self.cell_box = new_box;
        self.slots = slots;
        self.ruler_x = vec![NO_BORDER; new_box.count_x() as usize + 1];
        self.ruler_y = vec![NO_BORDER; new_box.count_y() as usize + 1];
    }

    pub fn get(&self, pos: CellPos) -> Option<StitchedCellIdx> {
        if !self.cell_box.is_inside(pos) {
            return None;
        }
        self.slots[self.cell_box.row_major_index(pos)]
    }

    /// Sets a slot; `pos` must be inside the grid
    pub fn set(&mut self, pos: CellPos, value: Option<StitchedCellIdx>) {
        if self.cell_box.is_inside(pos) {
            let idx = self.cell_box.row_major_index(pos);
            self.slots[idx] = value;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Rebuilds both rulers from the bounding boxes of the loaded cells
    pub fn rebuild_rulers<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (CellPos, Box2f)>,
    {
        self.ruler_x.iter_mut().for_each(|r| *r = NO_BORDER);
        self.ruler_y.iter_mut().for_each(|r| *r = NO_BORDER);
        if !self.cell_box.is_valid() {
            return;
        }

        for (pos, aabb) in cells {
            if !self.cell_box.is_inside(pos) {
                continue;
            }
            let kx = (pos.x - self.cell_box.min.x) as usize;
            let ky = (pos.y - self.cell_box.min.y) as usize;
            self.ruler_x[kx] = aabb.min.x;
            self.ruler_x[kx + 1] = aabb.max.x;
            self.ruler_y[ky] = aabb.min.y;
            self.ruler_y[ky + 1] = aabb.max.y;
        }
    }

    /// Cell coordinates of a position, corrected against the rulers
    pub fn compute_nav_cell_pos(&self, pos: Vec2) -> CellPos {
        let cx = (pos.x * self.inv_cell_size).ceil() as i32 - 1;
        let cy = (pos.y * self.inv_cell_size).floor() as i32;
        CellPos::new(
            self.correct_cell_pos_on_x(cx, pos.x),
            self.correct_cell_pos_on_y(cy, pos.y),
        )
    }

    fn correct_cell_pos_on_x(&self, cx: i32, x: f32) -> i32 {
        if !self.cell_box.is_valid() {
            return cx;
        }
        let (min, max) = (self.cell_box.min.x, self.cell_box.max.x);
        if cx >= min && cx <= max {
            let k = (cx - min) as usize;
            let (rmin, rmax) = (self.ruler_x[k], self.ruler_x[k + 1]);
            if rmin != NO_BORDER && x <= rmin {
                return cx - 1;
            }
            if rmax != NO_BORDER && x > rmax {
                return cx + 1;
            }
        } else if cx == min - 1 {
            let first = self.ruler_x[0];
            if first != NO_BORDER && x > first {
                return cx + 1;
            }
        } else if cx == max + 1 {
            let last = self.ruler_x[self.ruler_x.len() - 1];
            if last != NO_BORDER && x <= last {
                return cx - 1;
            }
        }
        cx
    }

    fn correct_cell_pos_on_y(&self, cy: i32, y: f32) -> i32 {
        if !self.cell_box.is_valid() {
            return cy;
        }
        let (min, max) = (self.cell_box.min.y, self.cell_box.max.y);
        if cy >= min && cy <= max {
            let k = (cy - min) as usize;
            let (rmin, rmax) = (self.ruler_y[k], self.ruler_y[k + 1]);
            if rmin != NO_BORDER && y < rmin {
                return cy - 1;
            }
            if rmax != NO_BORDER && y >= rmax {
                return cy + 1;
            }
        } else if cy == min - 1 {
            let first = self.ruler_y[0];
            if first != NO_BORDER && y >= first {
                return cy + 1;
            }
        } else if cy == max + 1 {
            let last = self.ruler_y[self.ruler_y.len() - 1];
            if last != NO_BORDER && y < last {
                return cy - 1;
            }
        }
        cy
    }

    /// Loaded part of the cells overlapped by `aabb`
    pub fn cell_box_of_an_aabbox(&self, aabb: &Box2f) -> CellBox {
        let min = self.compute_nav_cell_pos(aabb.min);
        let max = self.compute_nav_cell_pos(aabb.max);
        CellBox::new(min, max).intersect(&self.cell_box)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav_mesh_builder::cell_aabb;

    fn grid_with_cells(cell_size: f32, cells: &[CellPos]) -> NavCellGrid {
        let mut grid = NavCellGrid::default();
        grid.set_cell_size(cell_size);
        let mut cell_box = CellBox::empty();
        for pos in cells {
            cell_box.expand(*pos);
        }
        grid.ensure_contains(&cell_box);
        for (i, pos) in cells.iter().enumerate() {
            grid.set(*pos, Some(i as u32));
        }
        grid.rebuild_rulers(cells.iter().map(|&pos| (pos, cell_aabb(pos, cell_size))));
        grid
    }

    #[test]
    fn test_half_open_cells() {
        let grid = grid_with_cells(10.0, &[CellPos::new(0, 0), CellPos::new(1, 0)]);
        // x = 10 belongs to the west cell, y = 0 to the north one
        assert_eq!(grid.compute_nav_cell_pos(Vec2::new(10.0, 5.0)), CellPos::new(0, 0));
        assert_eq!(grid.compute_nav_cell_pos(Vec2::new(10.001, 5.0)), CellPos::new(1, 0));
        assert_eq!(grid.compute_nav_cell_pos(Vec2::new(5.0, 0.0)), CellPos::new(0, 0));
        assert_eq!(grid.compute_nav_cell_pos(Vec2::new(5.0, -0.001)), CellPos::new(0, -1));
    }

    #[test]
    fn test_rulers_fix_rounding() {
        // 0.1 has no exact float representation: 3 * 0.1 != 0.3
        let cell_size = 0.1;
        let cells: Vec<CellPos> = (0..5).map(|x| CellPos::new(x, 0)).collect();
        let grid = grid_with_cells(cell_size, &cells);

        for &pos in &cells {
            let aabb = cell_aabb(pos, cell_size);
            // Borders resolve like the half-open cell area
            assert_eq!(grid.compute_nav_cell_pos(Vec2::new(aabb.max.x, 0.05)).x, pos.x);
            assert_eq!(grid.compute_nav_cell_pos(Vec2::new(aabb.center().x, aabb.min.y)), pos);
        }
    }

    #[test]
    fn test_mapping_is_consistent_inside_cells() {
        let cell_size = 3.7;
        let cells: Vec<CellPos> = CellBox::new(CellPos::new(-2, -2), CellPos::new(2, 2))
            .iter()
            .collect();
        let grid = grid_with_cells(cell_size, &cells);

        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..2000 {
            let p = Vec2::new(rng.f32() * 18.0 - 9.0, rng.f32() * 18.0 - 9.0);
            let pos = grid.compute_nav_cell_pos(p);
            let aabb = cell_aabb(pos, cell_size);
            assert!(p.x > aabb.min.x && p.x <= aabb.max.x, "{:?} not in {:?}", p, aabb);
            assert!(p.y >= aabb.min.y && p.y < aabb.max.y, "{:?} not in {:?}", p, aabb);

            // Any point strictly inside the returned cell maps back to it
            let inner = aabb.min + (aabb.max - aabb.min) * Vec2::new(rng.f32(), rng.f32()).clamp(
                Vec2::splat(0.01),
                Vec2::splat(0.99),
            );
            assert_eq!(grid.compute_nav_cell_pos(inner), pos);
        }
    }

    #[test]
    fn test_slots_survive_resize() {
        let mut grid = grid_with_cells(1.0, &[CellPos::new(0, 0)]);
        grid.ensure_contains(&CellBox::new(CellPos::new(-1, -1), CellPos::new(1, 1)));
        assert_eq!(grid.get(CellPos::new(0, 0)), Some(0));
        assert_eq!(grid.get(CellPos::new(1, 1)), None);
        assert_eq!(grid.get(CellPos::new(5, 5)), None);
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_cell_box_of_aabb() {
        let cells: Vec<CellPos> = CellBox::new(CellPos::new(0, 0), CellPos::new(3, 3))
            .iter()
            .collect();
        let grid = grid_with_cells(2.0, &cells);
        let cell_box =
            grid.cell_box_of_an_aabbox(&Box2f::new(Vec2::new(1.0, 1.0), Vec2::new(4.5, 2.5)));
        assert_eq!(cell_box, CellBox::new(CellPos::new(0, 0), CellPos::new(2, 1)));

        let clipped =
            grid.cell_box_of_an_aabbox(&Box2f::new(Vec2::splat(-10.0), Vec2::splat(100.0)));
        assert_eq!(clipped, *grid.cell_box());
    }
}
