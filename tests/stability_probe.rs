use std::fs::OpenOptions;
use std::io::Write;
use std::time::Duration;

use pomwatch::watch::{StabilityOutcome, StabilityProbe};
use tokio::time::Instant;

fn quick_probe() -> StabilityProbe {
    StabilityProbe::new(
        Duration::from_millis(5),
        Duration::from_millis(60),
        Duration::from_millis(1000),
    )
}

#[tokio::test]
async fn stable_file_is_reported_after_the_stability_window() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("pom.xml");
    std::fs::write(&file, "<project/>").unwrap();

    let start = Instant::now();
    let outcome = quick_probe().wait_until_stable(&file).await;

    assert_eq!(outcome, StabilityOutcome::Stable);
    // Stability requires a continuous unchanged window, so the probe must not
    // return immediately after the first sample.
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn growing_file_delays_stability_until_writes_stop() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("pom.xml");
    std::fs::write(&file, "start").unwrap();

    let writer_path = file.clone();
    let writer = tokio::spawn(async move {
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let mut f = OpenOptions::new().append(true).open(&writer_path).unwrap();
            writeln!(f, "more content").unwrap();
        }
    });

    let start = Instant::now();
    let outcome = quick_probe().wait_until_stable(&file).await;
    writer.await.unwrap();

    assert_eq!(outcome, StabilityOutcome::Stable);
    // The writer keeps the size moving for ~200ms; the stability window can
    // only complete after that.
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn missing_file_times_out_instead_of_crashing() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("never-created.xml");

    let probe = StabilityProbe::new(
        Duration::from_millis(5),
        Duration::from_millis(30),
        Duration::from_millis(150),
    );
    let outcome = probe.wait_until_stable(&file).await;

    assert_eq!(outcome, StabilityOutcome::TimedOut);
}

#[tokio::test]
async fn file_appearing_mid_wait_still_stabilizes() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("pom.xml");

    let writer_path = file.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        std::fs::write(&writer_path, "<project/>").unwrap();
    });

    let outcome = quick_probe().wait_until_stable(&file).await;
    writer.await.unwrap();

    assert_eq!(outcome, StabilityOutcome::Stable);
}

#[tokio::test]
async fn endless_writer_hits_the_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("pom.xml");
    std::fs::write(&file, "start").unwrap();

    let writer_path = file.clone();
    let writer = tokio::spawn(async move {
        for _ in 0..60 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let mut f = OpenOptions::new().append(true).open(&writer_path).unwrap();
            writeln!(f, "x").unwrap();
        }
    });

    let probe = StabilityProbe::new(
        Duration::from_millis(5),
        Duration::from_millis(100),
        Duration::from_millis(300),
    );
    let outcome = probe.wait_until_stable(&file).await;
    writer.abort();

    assert_eq!(outcome, StabilityOutcome::TimedOut);
}
