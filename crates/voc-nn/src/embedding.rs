//! Embedding lookup (§4.2).
//!
//! Each table entry is already the pre-multiplied `3*hidden` contribution a
//! quantized sample index makes to a GRU's gate preactivation, so a lookup is
//! a pure accumulate — no matrix multiply at call time.

use voc_core::EmbeddingTable;

pub struct Embedding<'a> {
    table: &'a EmbeddingTable,
}

impl<'a> Embedding<'a> {
    pub fn new(table: &'a EmbeddingTable) -> Self {
        Self { table }
    }

    pub fn hidden(&self) -> usize {
        self.table.hidden
    }

    /// Accumulate band `band`'s contribution for quantized code `code` into
    /// `out` (length `hidden`).
    pub fn accumulate(&self, band: usize, code: usize, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.hidden());
        let contribution = self.table.lookup(band, code);
        for (o, &c) in out.iter_mut().zip(contribution.iter()) {
            *o += c;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_adds_the_looked_up_contribution() {
        // 1 band, codebook of 2, hidden 3
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let table = EmbeddingTable::new(data, 1, 2, 3).unwrap();
        let embed = Embedding::new(&table);
        let mut out = vec![0.0; 3];
        embed.accumulate(0, 1, &mut out);
        assert_eq!(out, vec![4.0, 5.0, 6.0]);
        embed.accumulate(0, 0, &mut out);
        assert_eq!(out, vec![5.0, 7.0, 9.0]);
    }
}
