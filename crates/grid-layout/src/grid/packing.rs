use super::Grid;
use crate::tile::TileId;
use tracing::{debug, warn};

impl Grid {
    /// Rebuild the rows so that every corridor runs straight into its vertex
    ///
    /// Vertices are placed in insertion order (pinned ones first), each one at
    /// the first row where it and every dummy of its corridor find a spacer.
    /// Rows left with spacers only are deleted afterwards, except those above
    /// the lowest pinned row, which would shift pinned vertices. Returns the
    /// final number of rows.
    pub(crate) fn pack(&mut self) -> usize {
        let rows = self.rows();

        let spacers: Vec<TileId> = self
            .layers
            .iter()
            .flatten()
            .copied()
            .filter(|&id| self[id].is_spacer())
            .collect();
        for spacer in spacers {
            self.remove_tile(spacer);
        }

        let layer_count = self.layers.len();
        self.layers = vec![Vec::new(); layer_count];
        self.pad_rows(rows);

        let pinned_rows = self
            .vertices
            .iter()
            .filter_map(|&vertex| self[vertex].pin())
            .map(|(_, row)| row + 1)
            .max()
            .unwrap_or(0);

        let (pinned, free): (Vec<TileId>, Vec<TileId>) = self
            .vertices
            .iter()
            .copied()
            .partition(|&vertex| self[vertex].pin().is_some());

        for vertex in pinned.into_iter().chain(free) {
            let mut members = vec![vertex];
            members.extend(self.corridor(vertex));

            let row = self.free_row(&members, self[vertex].pin().map(|(_, row)| row));
            for id in members {
                let layer = self[id].layer;
                let spacer = self.set_cell(layer, row, id);
                self.remove_tile(spacer);
            }
        }

        let pruned = self.prune_spacer_rows(pinned_rows);
        debug!(
            "Packed {} layers into {} rows, pruned {pruned} empty rows",
            self.layers.len(),
            self.rows()
        );
        self.rows()
    }

    /// Whether all `members` can move to `row` without displacing anything
    fn fits(&self, members: &[TileId], row: usize) -> bool {
        members.iter().all(|&id| {
            self.tile_at(self[id].layer, row)
                .map_or(false, |tile| tile.is_spacer())
        })
    }

    fn free_row(&mut self, members: &[TileId], preferred: Option<usize>) -> usize {
        if let Some(row) = preferred {
            if row >= self.rows() {
                self.pad_rows(row + 1);
            }
            if self.fits(members, row) {
                return row;
            }
            warn!("Pinned row {row} of {} is taken, placing it elsewhere", members[0]);
        }

        let mut row = 0;
        loop {
            if row >= self.rows() {
                // A fresh row only holds spacers
                self.pad_rows(row + 1);
                return row;
            }
            if self.fits(members, row) {
                return row;
            }
            row += 1;
        }
    }
}
