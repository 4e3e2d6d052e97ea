//! Integration tests for the peer links.
//!
//! Runs a real sender and receiver over localhost and verifies that
//! readings land in the observation state the way the node wiring expects:
//! distance readings drive the motion flag, angle readings feed the heat
//! policy's input.
//!
//! Run with: `cargo test --test link_integration`

use std::sync::Arc;
use std::time::Duration;

use rangewatch::link::{
    LocalDistanceSource, ReadingChannel, ReadingReceiver, ReadingSender, ReceiverConfig,
    SenderConfig,
};
use rangewatch::observation::{DistanceSample, ObservationState};

/// Bind a receiver on an ephemeral port and start its loop.
async fn start_receiver(
    channel: ReadingChannel,
    state: Arc<ObservationState>,
) -> (u16, tokio::task::JoinHandle<()>) {
    let receiver = ReadingReceiver::bind(ReceiverConfig::new(channel).with_port(0))
        .await
        .expect("bind");
    let port = receiver.local_port();
    let handle = tokio::spawn(async move {
        receiver.run(state).await.expect("receiver setup");
    });
    (port, handle)
}

async fn connect(port: u16) -> ReadingSender {
    let config = SenderConfig::default().with_peer(format!("127.0.0.1:{port}"));
    ReadingSender::connect(&config).await.expect("connect")
}

/// Poll until `predicate` holds or a second has passed.
async fn wait_for(mut predicate: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn distance_readings_reach_the_state_in_order() {
    let state = Arc::new(ObservationState::new());
    let (port, receiver) = start_receiver(ReadingChannel::RemoteDistance, state.clone()).await;

    let mut sender = connect(port).await;
    for value in [0i64, 450, 900] {
        sender.send(value).await.expect("send");
    }
    drop(sender);

    // EOF ends the receiver loop; every line was decoded before it.
    receiver.await.expect("receiver task");
    assert_eq!(state.distance_remote().cm(), 900);
    assert!(!state.motion());
}

#[tokio::test]
async fn motion_boundary_holds_over_the_wire() {
    let state = Arc::new(ObservationState::new());
    let (port, receiver) = start_receiver(ReadingChannel::RemoteDistance, state.clone()).await;

    let mut sender = connect(port).await;
    sender.send(71).await.expect("send");
    assert!(wait_for(|| state.distance_remote().cm() == 71).await);
    assert!(!state.motion(), "71cm is not motion");

    sender.send(70).await.expect("send");
    assert!(wait_for(|| state.motion()).await, "70cm is motion");

    drop(sender);
    receiver.await.expect("receiver task");
}

#[tokio::test]
async fn angle_readings_feed_the_angle_field() {
    let state = Arc::new(ObservationState::new());
    let (port, receiver) = start_receiver(ReadingChannel::Angle, state.clone()).await;

    let mut sender = connect(port).await;
    sender.send(75).await.expect("send");
    assert!(wait_for(|| state.angle() == 75).await);
    assert!(!state.motion(), "angle readings never imply motion");

    drop(sender);
    receiver.await.expect("receiver task");
}

#[tokio::test]
async fn streamed_local_distance_appears_remotely() {
    // Motion-node side: a state whose local distance the sender streams.
    let motion_state = Arc::new(ObservationState::new());
    motion_state.record_local_distance(DistanceSample::from_cm(42));

    // Server side: a state the receiver fills.
    let server_state = Arc::new(ObservationState::new());
    let (port, _receiver) = start_receiver(ReadingChannel::RemoteDistance, server_state.clone()).await;

    let sender = ReadingSender::connect(
        &SenderConfig::default()
            .with_peer(format!("127.0.0.1:{port}"))
            .with_interval(Duration::from_millis(10)),
    )
    .await
    .expect("connect");
    let stream = tokio::spawn(sender.stream_from(Arc::new(LocalDistanceSource::new(
        motion_state.clone(),
    ))));

    assert!(wait_for(|| server_state.distance_remote().cm() == 42).await);
    assert!(server_state.motion(), "42cm is within the motion distance");

    // A fresher local sample follows on the next cadence tick.
    motion_state.record_local_distance(DistanceSample::from_cm(250));
    assert!(wait_for(|| server_state.distance_remote().cm() == 250).await);
    assert!(!server_state.motion());

    stream.abort();
}

#[tokio::test]
async fn peer_close_ends_only_that_channel() {
    let state = Arc::new(ObservationState::new());
    let (distance_port, distance_rx) =
        start_receiver(ReadingChannel::RemoteDistance, state.clone()).await;
    let (angle_port, _angle_rx) = start_receiver(ReadingChannel::Angle, state.clone()).await;

    // Kill the distance peer immediately.
    let sender = connect(distance_port).await;
    drop(sender);
    distance_rx.await.expect("distance receiver task");

    // The angle channel is still alive and consuming.
    let mut angle_sender = connect(angle_port).await;
    angle_sender.send(30).await.expect("send");
    assert!(wait_for(|| state.angle() == 30).await);
}
