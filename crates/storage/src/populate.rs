//! Data-set population
//!
//! One-time setup of the shared table: N rows with ids `0..N`, values drawn
//! uniformly from `[0, max_value)`, `modified_by` at the unmodified sentinel.
//! Population replaces whatever the table held before.

use contend_core::{Row, RowId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::table::TableStore;

/// Generate `count` rows with values in `[0, max_value)`
pub fn generate_rows<R: Rng>(count: u32, max_value: f64, rng: &mut R) -> Vec<Row> {
    (0..count)
        .map(|i| Row::new(RowId(i), rng.gen::<f64>() * max_value))
        .collect()
}

/// Fill `store` with `count` freshly generated rows
///
/// Deterministic for a given `seed`. Returns the number of rows inserted.
pub fn populate(store: &TableStore, count: u32, max_value: f64, seed: u64) -> usize {
    let mut rng = StdRng::seed_from_u64(seed);
    let inserted = store.replace_all(generate_rows(count, max_value, &mut rng));
    info!(target: "contend::store", rows = inserted, max_value, "Table populated");
    inserted
}
