//! Sender and workers over loopback TCP.

use bytes::Bytes;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};
use zpipe::message::decode_u64;
use zpipe::prelude::*;
use zpipe::reassembly::receive_multipart;

const PAYLOAD: usize = 4096;

fn free_endpoint() -> Endpoint {
    let port = portpicker::pick_unused_port().expect("free port");
    Endpoint::tcp(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

fn fast_reconnect() -> SocketOptions {
    SocketOptions::default()
        .with_reconnect_ivl(Duration::from_millis(10))
        .with_reconnect_ivl_max(Duration::from_millis(100))
}

#[compio::test]
async fn test_single_worker_started_first_counts_everything() {
    zpipe::logging::init_from_env();
    let endpoint = free_endpoint();

    let config = WorkerConfig::new(endpoint)
        .with_options(fast_reconnect())
        .with_poll_timeout(Duration::from_millis(5));
    let mut worker = Worker::connect(0, config);
    let counter = worker.counter_handle();

    // Let the worker fail its first connect attempts.
    compio::time::sleep(Duration::from_millis(30)).await;

    let config = SenderConfig::new(endpoint)
        .with_count(1000)
        .with_payload_size(PAYLOAD);
    let (report, finished) = futures::join!(
        zpipe::sender::run(config),
        compio::time::timeout(Duration::from_secs(10), worker.run_until(1000)),
    );
    let report = report.unwrap();
    assert_eq!(report.sent, 1000);
    assert_eq!(report.failed, 0);

    assert!(finished.is_ok(), "worker did not finish");
    assert_eq!(worker.received(), 1000);
    assert_eq!(counter.load(std::sync::atomic::Ordering::Relaxed), 1000);
}

/// Receive `n` messages, checking each poll succeeds.
async fn collect(pull: &mut PullSocket, n: usize) -> Vec<Vec<Bytes>> {
    let mut messages = Vec::with_capacity(n);
    for _ in 0..n {
        assert!(pull.poll(Duration::from_secs(5)).await.unwrap());
        messages.push(receive_multipart(pull).await.unwrap());
    }
    messages
}

#[compio::test]
async fn test_frames_arrive_whole_and_in_order() {
    let endpoint = free_endpoint();
    let mut pull = PullSocket::connect_with_options(endpoint, fast_reconnect());

    let config = SenderConfig::new(endpoint)
        .with_count(20)
        .with_payload_size(PAYLOAD)
        .with_sender_id(9);
    let (report, messages) = futures::join!(zpipe::sender::run(config), collect(&mut pull, 20));

    for (seq, msg) in messages.iter().enumerate() {
        assert_eq!(msg.len(), 3);
        assert_eq!(decode_u64(&msg[0]), Some(9));
        assert_eq!(decode_u64(&msg[1]), Some(seq as u64));
        assert_eq!(msg[2].len(), PAYLOAD);
    }
    assert_eq!(report.unwrap().sent, 20);
}

#[compio::test]
async fn test_replay_directory_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in [("003", "d"), ("001", "b"), ("000", "a"), ("002", "c")] {
        std::fs::write(dir.path().join(name), body).unwrap();
    }

    let endpoint = free_endpoint();
    let mut pull = PullSocket::connect_with_options(endpoint, fast_reconnect());

    let config = SenderConfig::new(endpoint).with_replay_dir(dir.path());
    let (report, messages) = futures::join!(zpipe::sender::run(config), collect(&mut pull, 4));

    let bodies: Vec<String> = messages
        .iter()
        .map(|msg| {
            assert_eq!(msg.len(), 1);
            String::from_utf8(msg[0].to_vec()).unwrap()
        })
        .collect();
    assert_eq!(bodies, ["a", "b", "c", "d"]);
    assert_eq!(report.unwrap().sent, 4);
}

#[compio::test]
async fn test_dumped_frames_replay_in_order() {
    let dump = tempfile::tempdir().unwrap();
    let endpoint = free_endpoint();

    let config = WorkerConfig::new(endpoint)
        .with_options(fast_reconnect())
        .with_dump_dir(dump.path());
    let mut worker = Worker::connect(0, config);
    let config = SenderConfig::new(endpoint)
        .with_count(5)
        .with_payload_size(64)
        .with_sender_id(4);
    let (report, finished) = futures::join!(
        zpipe::sender::run(config),
        compio::time::timeout(Duration::from_secs(10), worker.run_until(5)),
    );
    assert_eq!(report.unwrap().sent, 5);
    assert!(finished.is_ok(), "worker did not finish");
    assert_eq!(std::fs::read_dir(dump.path()).unwrap().count(), 15);

    // Every dumped frame comes back as a single-frame message.
    let endpoint = free_endpoint();
    let mut pull = PullSocket::connect_with_options(endpoint, fast_reconnect());
    let config = SenderConfig::new(endpoint).with_replay_dir(dump.path());
    let (report, messages) = futures::join!(zpipe::sender::run(config), collect(&mut pull, 15));
    assert_eq!(report.unwrap().sent, 15);

    let frames: Vec<Bytes> = messages.into_iter().flatten().collect();
    assert_eq!(frames.len(), 15);
    for (seq, msg) in frames.chunks(3).enumerate() {
        assert_eq!(decode_u64(&msg[0]), Some(4));
        assert_eq!(decode_u64(&msg[1]), Some(seq as u64));
        assert_eq!(msg[2].len(), 64);
    }
}

#[test]
fn test_pool_of_four_sums_to_count() {
    zpipe::logging::init_from_env();
    let endpoint = free_endpoint();

    let worker = WorkerConfig::new(endpoint).with_options(fast_reconnect());
    let pool = WorkerPool::spawn(PoolConfig::new(4, worker)).unwrap();
    assert_eq!(pool.len(), 4);

    let runtime = compio::runtime::Runtime::new().unwrap();
    let report: zpipe::Result<SendReport> = runtime.block_on(async {
        let mut push = PushSocket::bind(endpoint).await?;
        push.wait_for_peers(4).await?;

        let config = SenderConfig::new(endpoint)
            .with_count(1000)
            .with_payload_size(PAYLOAD);
        Sender::new(push, config).run().await
    });
    assert_eq!(report.unwrap().sent, 1000);

    let deadline = Instant::now() + Duration::from_secs(10);
    while pool.total() < 1000 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    let totals = pool.totals();
    assert_eq!(totals.iter().sum::<u64>(), 1000, "per worker: {totals:?}");
    // All four were connected before the first send, so round-robin spreads
    // the load evenly.
    assert!(totals.iter().all(|&n| n == 250), "per worker: {totals:?}");
}
