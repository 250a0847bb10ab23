//! Integration tests for `Countdown`.
//!
//! Every async test runs on a paused Tokio clock, so sleeps resolve as
//! soon as the runtime has nothing else to do and `advance` is exact.

use std::time::Duration;

use partyroom_timer::Countdown;
use tokio::time::{self, timeout};

const FIVE_SECS: Duration = Duration::from_secs(5);

// =========================================================================
// State
// =========================================================================

#[test]
fn test_new_countdown_is_idle() {
    let c = Countdown::new("test");
    assert!(!c.is_armed());
    assert!(!c.is_paused());
    assert_eq!(c.remaining(), None);
    assert_eq!(c.expired_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_arm_and_cancel() {
    let mut c = Countdown::new("test");
    c.arm(FIVE_SECS);
    assert!(c.is_armed());
    assert_eq!(c.remaining(), Some(FIVE_SECS));

    c.cancel();
    assert!(!c.is_armed());
    c.cancel();
    assert!(!c.is_armed());
}

// =========================================================================
// Expiry
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_fires_at_deadline_and_disarms() {
    let mut c = Countdown::new("test");
    let start = time::Instant::now();
    c.arm(FIVE_SECS);

    let expiry = c.wait().await;
    assert_eq!(start.elapsed(), FIVE_SECS);
    assert_eq!(expiry.count, 1);
    assert_eq!(expiry.late_by, Duration::ZERO);
    assert!(!c.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_does_not_fire_early() {
    let mut c = Countdown::new("test");
    c.arm(FIVE_SECS);
    let early = timeout(Duration::from_millis(4_999), c.wait()).await;
    assert!(early.is_err());
    assert!(c.is_armed(), "a dropped wait leaves the countdown armed");

    assert!(timeout(Duration::from_millis(1), c.wait()).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_idle_countdown_pends_forever() {
    let mut c = Countdown::new("test");
    let result = timeout(Duration::from_secs(3600), c.wait()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_countdown_never_fires() {
    let mut c = Countdown::new("test");
    c.arm(FIVE_SECS);
    time::advance(Duration::from_secs(2)).await;
    c.cancel();
    let result = timeout(Duration::from_secs(60), c.wait()).await;
    assert!(result.is_err());
    assert_eq!(c.expired_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rearm_restarts_from_now() {
    let mut c = Countdown::new("test");
    c.arm(FIVE_SECS);
    time::advance(Duration::from_secs(4)).await;

    let start = time::Instant::now();
    c.arm(FIVE_SECS);
    c.wait().await;
    assert_eq!(start.elapsed(), FIVE_SECS);
}

#[tokio::test(start_paused = true)]
async fn test_can_fire_repeatedly() {
    let mut c = Countdown::new("test");
    for expected in 1..=3 {
        c.arm(Duration::from_secs(1));
        assert_eq!(c.wait().await.count, expected);
    }
    assert_eq!(c.expired_count(), 3);
}

// =========================================================================
// Pause / resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_remaining_time() {
    let mut c = Countdown::new("test");
    c.arm(FIVE_SECS);
    time::advance(Duration::from_secs(2)).await;

    c.pause();
    c.pause();
    assert!(c.is_paused());
    assert_eq!(c.remaining(), Some(Duration::from_secs(3)));

    // Time spent paused does not count.
    let frozen = timeout(Duration::from_secs(60), c.wait()).await;
    assert!(frozen.is_err());
    assert_eq!(c.remaining(), Some(Duration::from_secs(3)));

    c.resume();
    assert!(!c.is_paused());
    let start = time::Instant::now();
    c.wait().await;
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume_when_idle_are_noops() {
    let mut c = Countdown::new("test");
    c.pause();
    c.resume();
    assert!(!c.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_arm_while_paused_stays_frozen() {
    let mut c = Countdown::new("test");
    c.arm(FIVE_SECS);
    c.pause();
    c.arm(Duration::from_secs(10));
    assert!(c.is_paused());
    assert_eq!(c.remaining(), Some(Duration::from_secs(10)));
}

// =========================================================================
// select! loop pattern
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut cleanup = Countdown::new("cleanup");
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);

    tokio::spawn(async move {
        time::sleep(Duration::from_secs(1)).await;
        tx.send("finished").await.ok();
        time::sleep(Duration::from_secs(30)).await;
        drop(tx);
    });

    let start = time::Instant::now();
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "finished");
                cleanup.arm(FIVE_SECS);
            }
            _ = cleanup.wait() => break,
        }
    }
    assert_eq!(start.elapsed(), Duration::from_secs(6));
}
