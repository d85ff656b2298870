//! Liveness: once the store stops rejecting, every task finishes

use crate::common::*;

#[test]
fn test_store_rejecting_for_a_while() {
    let (store, plan) = faulty_table(100);
    // Every writer commit fails until 40 rejections have been handed out
    plan.inject(FaultPoint::Commit, FaultTarget::Writers, 40, deadlock());

    let mut tasks: Vec<Task> = (1..=12).map(|i| point_write(i, &[i, i + 20])).collect();
    tasks.push(point_read(13, &[1, 2, 3]));
    tasks.push(scan(14));

    let coordinator = Coordinator::new(store, fast_config()).unwrap();
    let report = coordinator.run(&tasks).unwrap();

    assert_eq!(report.tasks_finished, 14);
    assert_eq!(report.deadlock_count, 40);
    assert_eq!(plan.pending(), 0);
    assert_no_double_commit(&report);

    let table = coordinator.store().inner();
    for i in 1..=12 {
        assert_eq!(table.get(RowId(i)).unwrap().modified_by, i64::from(i));
        assert_eq!(table.get(RowId(i + 20)).unwrap().modified_by, i64::from(i));
    }
}

#[test]
fn test_one_task_starved_by_many_rejections() {
    let (store, plan) = faulty_table(100);
    plan.inject(FaultPoint::Commit, FaultTarget::Modifier(3), 25, deadlock());
    let tasks: Vec<Task> = (1..=6).map(|i| point_write(i, &[i])).collect();

    let report = Coordinator::new(store, fast_config())
        .unwrap()
        .run(&tasks)
        .unwrap();

    assert!(report.all_finished());
    assert_eq!(report.max_retry_count, 25);
    let starved = report.records.iter().find(|r| r.task == TaskId(3)).unwrap();
    assert_eq!(starved.retry.retry_count, 25);
    assert!(matches!(starved.fate, TaskFate::Finished { .. }));
}
