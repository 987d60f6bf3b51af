use super::{Grid, LayoutError};
use crate::tile::TileId;
use rand::Rng;
use std::collections::HashSet;
use tracing::trace;

impl Grid {
    /// Exchange two tiles of a layer, dragging the source's corridor along
    ///
    /// The move is refused when both cells are spacers, when either cell
    /// holds a dummy (corridor cells only move together with their vertex),
    /// or when the destination vertex has a corridor of its own. A refused
    /// move leaves the grid untouched.
    pub fn swap_tiles(&mut self, layer: usize, row_from: usize, row_to: usize) -> bool {
        if row_from == row_to {
            return false;
        }
        match self.tile_at(layer, row_from) {
            Some(tile) if !tile.is_dummy() => {}
            _ => return false,
        }

        let mut plan = Vec::new();
        if !self.plan_swap(layer, row_from, row_to, &mut plan) {
            trace!("Refused swap of rows {row_from} and {row_to} in layer {layer}");
            return false;
        }

        for layer in plan {
            self.swap_cells(layer, row_from, row_to);
        }
        true
    }

    /// Collect the layers a swap has to touch, without changing anything
    fn plan_swap(
        &self,
        layer: usize,
        row_from: usize,
        row_to: usize,
        plan: &mut Vec<usize>,
    ) -> bool {
        let (Some(source), Some(target)) =
            (self.tile_at(layer, row_from), self.tile_at(layer, row_to))
        else {
            return false;
        };

        if source.is_spacer() && target.is_spacer() {
            return false;
        }
        if target.is_dummy() {
            return false;
        }
        if target.is_domain() && self.dummy_predecessor(target.id).is_some() {
            return false;
        }

        if let Some(pred) = self.dummy_predecessor(source.id) {
            let pred = &self[pred];
            if layer == 0 || pred.layer != layer - 1 || pred.row != row_from {
                return false;
            }
            if !self.plan_swap(layer - 1, row_from, row_to, plan) {
                return false;
            }
        }

        plan.push(layer);
        true
    }

    /// Exchange two rows in every layer
    pub fn swap_row(&mut self, row_from: usize, row_to: usize) {
        for layer in 0..self.layers.len() {
            let len = self.layers[layer].len();
            if row_from < len && row_to < len {
                self.swap_cells(layer, row_from, row_to);
            }
        }
    }

    /// Random local move: swap two tiles of a random layer, or their whole
    /// rows if the tile swap is refused
    pub fn mutate<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        if self.layers.is_empty() {
            return;
        }
        let layer = rng.random_range(0..self.layers.len());
        let rows = self.layers[layer].len();
        if rows < 2 {
            return;
        }

        let row_from = rng.random_range(0..rows);
        let mut row_to = rng.random_range(0..rows - 1);
        if row_to >= row_from {
            row_to += 1;
        }

        if !self.swap_tiles(layer, row_from, row_to) {
            self.swap_row(row_from, row_to);
        }
    }

    /// Move the only vertex without outgoing edges to the top of its layer
    ///
    /// Returns whether the sink sits in row 0 afterwards.
    pub fn promote_sink_to_top(&mut self) -> Result<bool, LayoutError<TileId>> {
        let sinks: Vec<TileId> = self
            .vertices
            .iter()
            .copied()
            .filter(|&vertex| self[vertex].outgoing.is_empty())
            .collect();
        let [sink] = sinks[..] else {
            return Err(LayoutError::NoUniqueSink(sinks.len()));
        };

        let (layer, row) = (self[sink].layer, self[sink].row);
        Ok(row == 0 || self.swap_tiles(layer, row, 0))
    }

    /// Move corridor dummies back onto the row of their vertex
    ///
    /// Vertices with a corridor keep their row, everything else in a
    /// touched layer fills the remaining rows in its current order. Returns
    /// false when two corridors need the same cell, in which case the grid
    /// is left half-realigned and should be dropped.
    pub(crate) fn realign_corridors(&mut self) -> bool {
        let mut required: Vec<Vec<(TileId, usize)>> = vec![Vec::new(); self.layers.len()];
        for &vertex in &self.vertices {
            let corridor = self.corridor(vertex);
            if corridor.is_empty() {
                continue;
            }
            let row = self[vertex].row;
            required[self[vertex].layer].push((vertex, row));
            for dummy in corridor {
                required[self[dummy].layer].push((dummy, row));
            }
        }

        for (layer, required) in required.into_iter().enumerate() {
            if required.iter().all(|&(id, row)| self[id].row == row) {
                continue;
            }

            let mut slots: Vec<Option<TileId>> = vec![None; self.layers[layer].len()];
            for &(id, row) in &required {
                if slots[row].replace(id).is_some() {
                    return false;
                }
            }

            let fixed: HashSet<TileId> = required.iter().map(|&(id, _)| id).collect();
            let mut free = self.layers[layer]
                .iter()
                .copied()
                .filter(|id| !fixed.contains(id))
                .collect::<Vec<_>>()
                .into_iter();
            for slot in slots.iter_mut().filter(|slot| slot.is_none()) {
                *slot = free.next();
            }

            self.set_layer(layer, slots.into_iter().flatten().collect());
        }

        true
    }

    /// Combine two related grids: even layers from `other`, odd ones from `self`
    ///
    /// Both grids must be clones of the same prepared grid. Returns `None`
    /// when they are not, or when the combined corridors collide.
    pub fn crossover(&self, other: &Grid) -> Option<Grid> {
        if self.layers.len() != other.layers.len() {
            return None;
        }

        let mut child = self.clone();
        for layer in (0..self.layers.len()).step_by(2) {
            let ids = &other.layers[layer];
            let compatible = ids.len() == self.layers[layer].len()
                && ids
                    .iter()
                    .all(|&id| child.tile(id).is_some_and(|tile| tile.layer == layer));
            if !compatible {
                return None;
            }
            child.set_layer(layer, ids.clone());
        }

        child.realign_corridors().then_some(child)
    }
}
