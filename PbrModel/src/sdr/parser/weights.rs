//! Bone weight table parsing.
//!
//! Three tables follow each other in vertex order:
//! runs of vertices bound to one bone, runs of vertices bound to a bone pair
//! with one 16-bit fraction per vertex, and a sparse list adding a third and
//! fourth influence to already-listed vertices.

use super::ParseContext;
use crate::error::{Error, Result, Warning};
use crate::model::VertexWeights;
use crate::sdr::constants::{
    EXTRA_ENTRY_SIZE, NO_BONE, PAIR_RUN_SIZE, SINGLE_RUN_SIZE, WEIGHT_SCALE, WT_EXTRA,
    WT_EXTRA_COUNT, WT_PAIR_COUNT, WT_PAIR_WEIGHTS, WT_PAIRS, WT_SINGLE, WT_SINGLE_COUNT,
};

/// Largest accepted deviation of a weight sum from 1.0.
pub const WEIGHT_TOLERANCE: f32 = 1e-4;

impl ParseContext<'_> {
    pub(super) fn read_weights(&mut self, table: usize) -> Result<Vec<VertexWeights>> {
        let mut weights: Vec<VertexWeights> = Vec::new();

        let single_count: u16 = self.reader.read_field(table, WT_SINGLE_COUNT)?;
        if let Some(runs) = self.reader.read_ptr(table, WT_SINGLE)? {
            for r in 0..usize::from(single_count) {
                let run = runs + r * SINGLE_RUN_SIZE;
                let count: u16 = self.reader.read_field(run, 0)?;
                let bone: u16 = self.reader.read_field(run, 2)?;
                weights.extend((0..count).map(|_| VertexWeights::from([(bone, 1.0)])));
            }
        }

        let pair_count: u16 = self.reader.read_field(table, WT_PAIR_COUNT)?;
        if let (Some(runs), Some(values)) = (
            self.reader.read_ptr(table, WT_PAIRS)?,
            self.reader.read_ptr(table, WT_PAIR_WEIGHTS)?,
        ) {
            let mut cursor = 0usize;
            for r in 0..usize::from(pair_count) {
                let run = runs + r * PAIR_RUN_SIZE;
                let count: u16 = self.reader.read_field(run, 0)?;
                let first: u16 = self.reader.read_field(run, 2)?;
                let second: u16 = self.reader.read_field(run, 4)?;
                for _ in 0..count {
                    let raw: u16 = self.reader.read_field(values, cursor * 2)?;
                    cursor += 1;
                    let w = f32::from(raw) / WEIGHT_SCALE;
                    let mut map = VertexWeights::new();
                    map.insert(first, w);
                    // both bones stay listed even at weight 0
                    map.insert(second, 1.0 - w);
                    weights.push(map);
                }
            }
        }

        let extra_count: u16 = self.reader.read_field(table, WT_EXTRA_COUNT)?;
        if let Some(entries) = self.reader.read_ptr(table, WT_EXTRA)? {
            for e in 0..usize::from(extra_count) {
                let entry = entries + e * EXTRA_ENTRY_SIZE;
                let vertex: u16 = self.reader.read_field(entry, 0)?;
                let third: u16 = self.reader.read_field(entry, 2)?;
                let fourth: u16 = self.reader.read_field(entry, 4)?;
                let w3 = f32::from(self.reader.read_field::<u16>(entry, 6)?) / WEIGHT_SCALE;
                let w4 = f32::from(self.reader.read_field::<u16>(entry, 8)?) / WEIGHT_SCALE;

                let map = weights.get_mut(usize::from(vertex)).ok_or(Error::DanglingReference {
                    kind: "weighted vertex",
                    address: entry,
                    target: usize::from(vertex),
                })?;
                let scale = 1.0 - w3 - w4;
                map.values_mut().for_each(|w| *w *= scale);
                map.insert(third, w3);
                if fourth != NO_BONE {
                    map.insert(fourth, w4);
                }
            }
        }

        let malformed: Vec<(usize, f32)> = weights
            .iter()
            .enumerate()
            .map(|(vertex, map)| (vertex, map.values().sum::<f32>()))
            .filter(|(_, sum)| (sum - 1.0).abs() > WEIGHT_TOLERANCE)
            .collect();
        for (vertex, sum) in malformed {
            self.warn(Warning::MalformedWeightTable {
                address: table,
                vertex,
                sum,
            });
        }

        Ok(weights)
    }
}
