//! Rendezvous ordering and timeout behaviour across real threads.

use gda_events::error::RendezvousError;
use gda_events::sync::{Phase, Rendezvous, WaitingAnswer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const GENEROUS: Duration = Duration::from_secs(10);

#[test]
fn run_guarded_waits_for_release() {
    let rendezvous = Arc::new(Rendezvous::with_timeout(GENEROUS));
    let finished = Arc::new(AtomicBool::new(false));

    let worker = {
        let rendezvous = Arc::clone(&rendezvous);
        let finished = Arc::clone(&finished);
        thread::spawn(move || {
            let outcome = rendezvous.run_guarded();
            finished.store(true, Ordering::SeqCst);
            outcome
        })
    };

    rendezvous.wait_until_called().unwrap();
    assert_eq!(rendezvous.phase(), Phase::Running);

    // Still parked while nobody releases.
    thread::sleep(Duration::from_millis(100));
    assert!(!finished.load(Ordering::SeqCst));

    rendezvous.release();
    assert!(worker.join().unwrap().is_ok());
    assert!(finished.load(Ordering::SeqCst));
    assert_eq!(rendezvous.phase(), Phase::Idle);
}

#[test]
fn release_before_call_has_no_effect() {
    let rendezvous = Arc::new(Rendezvous::with_timeout(GENEROUS));
    rendezvous.release();
    assert_eq!(rendezvous.phase(), Phase::Idle);

    let worker = {
        let rendezvous = Arc::clone(&rendezvous);
        thread::spawn(move || rendezvous.run_guarded_for(Duration::from_millis(200)))
    };

    let outcome = worker.join().unwrap();
    assert!(matches!(
        outcome,
        Err(RendezvousError::Timeout {
            operation: "release",
            ..
        })
    ));
}

#[test]
fn wait_until_called_returns_when_worker_arrives() {
    let rendezvous = Arc::new(Rendezvous::with_timeout(GENEROUS));

    let worker = {
        let rendezvous = Arc::clone(&rendezvous);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            rendezvous.run_guarded()
        })
    };

    let started = Instant::now();
    rendezvous.wait_until_called().unwrap();
    assert!(started.elapsed() < GENEROUS);

    rendezvous.release();
    assert!(worker.join().unwrap().is_ok());
}

#[test]
fn wait_until_called_times_out_without_worker() {
    let rendezvous = Rendezvous::with_timeout(GENEROUS);
    let timeout = Duration::from_millis(150);

    let started = Instant::now();
    let err = rendezvous.wait_until_called_for(timeout).unwrap_err();

    assert!(started.elapsed() >= timeout);
    assert_eq!(
        err,
        RendezvousError::Timeout {
            operation: "call",
            waited: timeout
        }
    );
}

#[test]
fn primitive_is_reusable_across_cycles() {
    let rendezvous = Arc::new(Rendezvous::with_timeout(GENEROUS));

    let worker = {
        let rendezvous = Arc::clone(&rendezvous);
        thread::spawn(move || -> Result<(), RendezvousError> {
            for _ in 0..3 {
                rendezvous.run_guarded()?;
            }
            Ok(())
        })
    };

    for _ in 0..3 {
        rendezvous.wait_until_called().unwrap();
        rendezvous.release();
    }

    assert!(worker.join().unwrap().is_ok());
    assert_eq!(rendezvous.times_called(), 3);
}

#[test]
fn interrupt_fails_parked_worker() {
    let rendezvous = Arc::new(Rendezvous::with_timeout(GENEROUS));

    let worker = {
        let rendezvous = Arc::clone(&rendezvous);
        thread::spawn(move || rendezvous.run_guarded())
    };

    rendezvous.wait_until_called().unwrap();
    rendezvous.interrupt();

    assert_eq!(worker.join().unwrap(), Err(RendezvousError::Interrupted));
    assert_eq!(rendezvous.phase(), Phase::Idle);
}

/// A worker that moves to a start position, runs, then finishes; the test
/// aborts it while the move is in flight.
#[test]
fn waiting_answer_pauses_collaborator_mid_call() {
    let move_answer = Arc::new(WaitingAnswer::with_timeout(true, GENEROUS));
    let aborted = Arc::new(AtomicBool::new(false));

    let worker = {
        let move_answer = Arc::clone(&move_answer);
        let aborted = Arc::clone(&aborted);
        thread::spawn(move || -> Result<&'static str, RendezvousError> {
            let moved = move_answer.answer()?;
            if !moved || aborted.load(Ordering::SeqCst) {
                return Ok("terminated");
            }
            Ok("complete")
        })
    };

    move_answer.wait_until_called().unwrap();
    aborted.store(true, Ordering::SeqCst);
    move_answer.resume();

    assert_eq!(worker.join().unwrap(), Ok("terminated"));
    assert_eq!(move_answer.times_called(), 1);
}
