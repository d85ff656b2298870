//! FIFO admission at the fairness arbiter

use contend::FairnessArbiter;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Grants happen in ticket order no matter how threads are scheduled
#[test]
fn test_grant_order_is_ticket_order() {
    let arbiter = Arc::new(FairnessArbiter::new());
    let granted = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let arbiter = Arc::clone(&arbiter);
            let granted = Arc::clone(&granted);
            thread::spawn(move || {
                for _ in 0..25 {
                    let guard = arbiter.acquire();
                    granted.lock().push(guard.ticket());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let granted = granted.lock();
    assert_eq!(granted.len(), 200);
    assert!(granted.windows(2).all(|w| w[0] + 1 == w[1]));
}

/// A waiter queued behind N others is admitted after exactly N grants
#[test]
fn test_wait_bounded_by_queue_ahead() {
    let arbiter = Arc::new(FairnessArbiter::new());
    let holder = arbiter.acquire();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let arbiter_c = Arc::clone(&arbiter);
        handles.push(thread::spawn(move || {
            let guard = arbiter_c.acquire();
            thread::sleep(Duration::from_millis(5));
            guard.ticket()
        }));
        let expected = handles.len() as u64 + 1;
        let deadline = Instant::now() + Duration::from_secs(5);
        while arbiter.outstanding() < expected {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(1));
        }
    }

    let grants_before = arbiter.grants();
    drop(holder);
    let tickets: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(tickets, vec![1, 2, 3, 4]);
    assert_eq!(arbiter.grants() - grants_before, 4);
    assert_eq!(arbiter.queue_len(), 0);
}
