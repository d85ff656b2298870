//! Attempts are all-or-nothing, whatever fails

use crate::common::*;
use contend::{AttemptOutcome, IsolationLevel, Statement, Store, StoreTransaction, TransactionalUnit};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A write task blocked at its k-th statement leaves no trace
    #[test]
    fn prop_conflicting_attempt_leaves_table_untouched(
        rows in proptest::collection::btree_set(0u32..50, 1..6),
        fail_at in 0usize..6,
    ) {
        let rows: Vec<u32> = rows.into_iter().collect();
        let fail_at = fail_at % rows.len();
        let store = table(50);
        let before = store.rows();

        // Another transaction holds the row the task reaches at statement `fail_at`
        let mut blocker = store.begin(IsolationLevel::ReadCommitted).unwrap();
        blocker
            .execute(&Statement::PointUpdate {
                id: RowId(rows[fail_at]),
                value: 0.0,
                modified_by: 99,
            })
            .unwrap();

        let unit = TransactionalUnit::new(store.clone());
        let outcome = unit.attempt(&point_write(7, &rows));
        blocker.rollback().unwrap();

        prop_assert!(matches!(outcome, AttemptOutcome::Conflict(_)));
        prop_assert_eq!(store.rows(), before);
        prop_assert_eq!(store.locked_rows(), 0);
    }
}

#[test]
fn test_fatal_mid_task_rolls_back_earlier_statements() {
    let (store, plan) = faulty_table(50);
    let unit = TransactionalUnit::new(store);
    let task = point_write(5, &[1, 2, 3]);

    // Row 3 has been deleted from under the task: statement 3 fails
    let mut rows = unit.store().inner().rows();
    rows.retain(|r| r.id != RowId(3));
    unit.store().inner().replace_all(rows);

    assert!(matches!(
        unit.attempt(&task),
        AttemptOutcome::Fatal(StoreError::RowNotFound(_))
    ));
    let table = unit.store().inner();
    assert_eq!(table.get(RowId(1)).unwrap().modified_by, 0);
    assert_eq!(table.get(RowId(2)).unwrap().modified_by, 0);
    assert_eq!(table.locked_rows(), 0);
    assert_eq!(plan.injected(), 0);
}
