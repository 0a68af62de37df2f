//! Bone weight table layout.
//!
//! Vertices bound to one bone must form a prefix of the vertex list to land
//! in the single-bone table; every later vertex goes through the two-bone
//! table, with a correction entry for a third and fourth influence.

use super::{SerializeContext, count_u16};
use crate::binary::align_up;
use crate::error::{Error, Result};
use crate::model::VertexWeights;
use crate::sdr::constants::{
    EXTRA_ENTRY_SIZE, NO_BONE, PAIR_RUN_SIZE, SINGLE_RUN_SIZE, WEIGHT_HEADER_SIZE, WEIGHT_SCALE,
    WT_EXTRA, WT_EXTRA_COUNT, WT_PAIR_COUNT, WT_PAIR_VERTICES, WT_PAIR_WEIGHTS, WT_PAIRS, WT_SINGLE,
    WT_SINGLE_COUNT,
};

/// The three weight tables, ready to lay out.
#[derive(Debug, Default, PartialEq)]
pub(super) struct WeightTables {
    /// (vertex count, bone)
    pub singles: Vec<(u16, u16)>,
    /// (vertex count, first bone, second bone)
    pub pairs: Vec<(u16, u16, u16)>,
    /// Fraction of the first bone, one per paired vertex.
    pub pair_weights: Vec<u16>,
    /// (vertex, third bone, fourth bone, third weight, fourth weight)
    pub extras: Vec<(u16, u16, u16, u16, u16)>,
}

fn quantize_weight(w: f32) -> u16 {
    (w.clamp(0.0, 1.0) * WEIGHT_SCALE).round() as u16
}

/// Split per-vertex weight maps into the three on-disk tables.
///
/// # Errors
/// Returns [`Error::InvalidModel`] for a vertex with no influence or more
/// than four.
pub(super) fn build_tables(weights: &[VertexWeights]) -> Result<WeightTables> {
    let mut tables = WeightTables::default();

    let prefix = weights.iter().take_while(|map| map.len() == 1).count();
    for map in &weights[..prefix] {
        let Some(&bone) = map.keys().next() else { continue };
        match tables.singles.last_mut() {
            Some((count, last)) if *last == bone && *count < u16::MAX => *count += 1,
            _ => tables.singles.push((1, bone)),
        }
    }

    for (vertex, map) in weights.iter().enumerate().skip(prefix) {
        let entries: Vec<(u16, f32)> = map.iter().map(|(&b, &w)| (b, w)).collect();
        let (first, second, fraction) = match entries.as_slice() {
            [] => {
                return Err(Error::InvalidModel(format!("vertex {vertex} has an empty weight map")));
            }
            [(bone, _)] => (*bone, if *bone == 0 { 1 } else { 0 }, 1.0),
            [(b0, w0), (b1, w1), ..] if entries.len() <= 4 => {
                let sum = w0 + w1;
                (*b0, *b1, if sum > 0.0 { w0 / sum } else { 1.0 })
            }
            _ => {
                return Err(Error::InvalidModel(format!(
                    "vertex {vertex} has {} bone influences, at most 4 are stored",
                    entries.len()
                )));
            }
        };

        match tables.pairs.last_mut() {
            Some((count, a, b)) if (*a, *b) == (first, second) && *count < u16::MAX => *count += 1,
            _ => tables.pairs.push((1, first, second)),
        }
        tables.pair_weights.push(quantize_weight(fraction));

        if let [_, _, (third, w3), rest @ ..] = entries.as_slice() {
            let (fourth, w4) = rest.first().copied().unwrap_or((NO_BONE, 0.0));
            tables.extras.push((
                count_u16(vertex, "weighted vertices")?,
                *third,
                fourth,
                quantize_weight(*w3),
                quantize_weight(w4),
            ));
        }
    }

    Ok(tables)
}

impl SerializeContext<'_> {
    /// Write the weight tables of one mesh, returning the header address.
    pub(super) fn write_weights(&mut self, weights: &[VertexWeights]) -> Result<usize> {
        let tables = build_tables(weights)?;
        let header = self.allocate(WEIGHT_HEADER_SIZE, 4);

        self.out.write_field(header, WT_SINGLE_COUNT, count_u16(tables.singles.len(), "weight runs")?);
        if !tables.singles.is_empty() {
            let runs = self.allocate(tables.singles.len() * SINGLE_RUN_SIZE, 4);
            for (i, &(count, bone)) in tables.singles.iter().enumerate() {
                self.out.write_at(runs + i * SINGLE_RUN_SIZE, count);
                self.out.write_next(bone);
            }
            self.out.write_ptr(header, WT_SINGLE, runs);
        }

        self.out.write_field(header, WT_PAIR_COUNT, count_u16(tables.pairs.len(), "weight runs")?);
        self.out.write_field(
            header,
            WT_PAIR_VERTICES,
            count_u16(tables.pair_weights.len(), "weighted vertices")?,
        );
        if !tables.pairs.is_empty() {
            let runs = self.allocate(tables.pairs.len() * PAIR_RUN_SIZE, 4);
            for (i, &(count, first, second)) in tables.pairs.iter().enumerate() {
                self.out.write_at(runs + i * PAIR_RUN_SIZE, count);
                self.out.write_next(first);
                self.out.write_next(second);
            }
            self.out.write_ptr(header, WT_PAIRS, runs);

            let values = self.allocate(tables.pair_weights.len() * 2, 4);
            for (i, &w) in tables.pair_weights.iter().enumerate() {
                self.out.write_field(values, i * 2, w);
            }
            self.out.write_ptr(header, WT_PAIR_WEIGHTS, values);
        }

        self.out.write_field(header, WT_EXTRA_COUNT, count_u16(tables.extras.len(), "weight corrections")?);
        if !tables.extras.is_empty() {
            let entries = self.allocate(tables.extras.len() * EXTRA_ENTRY_SIZE, 4);
            for (i, &(vertex, third, fourth, w3, w4)) in tables.extras.iter().enumerate() {
                self.out.write_at(entries + i * EXTRA_ENTRY_SIZE, vertex);
                self.out.write_next(third);
                self.out.write_next(fourth);
                self.out.write_next(w3);
                self.out.write_next(w4);
            }
            self.out.write_ptr(header, WT_EXTRA, entries);
        }

        self.cursor = align_up(self.cursor, 4);
        self.out.reserve_to(self.cursor);
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(u16, f32)]) -> VertexWeights {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_single_prefix_runs_merge() {
        let weights = vec![map(&[(2, 1.0)]), map(&[(2, 1.0)]), map(&[(5, 1.0)])];
        let tables = build_tables(&weights).unwrap();
        assert_eq!(tables.singles, vec![(2, 2), (1, 5)]);
        assert!(tables.pairs.is_empty());
    }

    #[test]
    fn test_single_after_pair_goes_through_pair_table() {
        let weights = vec![map(&[(1, 0.5), (2, 0.5)]), map(&[(0, 1.0)])];
        let tables = build_tables(&weights).unwrap();
        assert!(tables.singles.is_empty());
        assert_eq!(tables.pairs, vec![(1, 1, 2), (1, 0, 1)]);
        assert_eq!(tables.pair_weights, vec![32768, 65535]);
    }

    #[test]
    fn test_zero_weight_partner_kept() {
        let tables = build_tables(&[map(&[(3, 1.0), (7, 0.0)])]).unwrap();
        assert_eq!(tables.pairs, vec![(1, 3, 7)]);
        assert_eq!(tables.pair_weights, vec![65535]);
    }

    #[test]
    fn test_three_bones_add_correction() {
        let tables = build_tables(&[map(&[(0, 0.3), (1, 0.3), (2, 0.4)])]).unwrap();
        assert_eq!(tables.pair_weights, vec![32768]);
        assert_eq!(tables.extras, vec![(0, 2, NO_BONE, quantize_weight(0.4), 0)]);
    }

    #[test]
    fn test_rejects_five_influences() {
        let weights = [map(&[(0, 0.2), (1, 0.2), (2, 0.2), (3, 0.2), (4, 0.2)])];
        assert!(matches!(build_tables(&weights), Err(Error::InvalidModel(_))));
    }

    #[test]
    fn test_rejects_empty_map() {
        assert!(matches!(build_tables(&[VertexWeights::new()]), Err(Error::InvalidModel(_))));
    }
}
