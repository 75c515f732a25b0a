mod support;

use std::time::Duration;

use support::FakeGlove;
use tokio::sync::mpsc;
use waive::config::SerialConfig;
use waive::domain::{FoldSet, TeachError};
use waive::{ChannelState, SerialChannel, SerialEvent};

async fn next_event(rx: &mut mpsc::UnboundedReceiver<SerialEvent>) -> SerialEvent {
    tokio::time::timeout(support::WAIT, rx.recv())
        .await
        .expect("Timed out waiting for serial event")
        .expect("Reader dropped its sender")
}

fn channel_with_reader(glove: &FakeGlove) -> (SerialChannel, mpsc::UnboundedReceiver<SerialEvent>) {
    let mut channel = SerialChannel::new(glove.backend(), SerialConfig::default());
    let name = channel.connect().expect("Failed to connect");
    assert_eq!(name, "fake-glove");
    let (tx, rx) = mpsc::unbounded_channel();
    channel
        .start_read_loop(move |event| {
            let _ = tx.send(event);
        })
        .expect("Failed to start read loop");
    (channel, rx)
}

#[tokio::test]
async fn tokens_arrive_in_order() {
    let glove = FakeGlove::default();
    let (channel, mut rx) = channel_with_reader(&glove);
    assert_eq!(channel.state(), ChannelState::Connected);
    assert_eq!(channel.port_name(), Some("fake-glove"));

    glove.send_raw(b"1");
    glove.send_raw(b"45\r\n 12 \n\n0\n");

    for expected in ["145", "12", "0"] {
        assert_eq!(next_event(&mut rx).await, SerialEvent::Token(expected.to_string()));
    }
}

#[tokio::test]
async fn pulse_writes_one_cue_per_finger() {
    let glove = FakeGlove::default();
    let (channel, _rx) = channel_with_reader(&glove);

    let folds = FoldSet::parse_digits("541").expect("valid folds");
    channel
        .writer()
        .pulse(folds, Duration::from_millis(1))
        .await
        .expect("Failed to pulse");
    assert_eq!(glove.cues(), "145");
}

#[tokio::test]
async fn unplugged_device_reports_close() {
    let glove = FakeGlove::default();
    let (channel, mut rx) = channel_with_reader(&glove);

    glove.unplug();
    assert_eq!(next_event(&mut rx).await, SerialEvent::Closed { error: None });
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert!(matches!(
        channel.writer().write(b"1"),
        Err(TeachError::TransportWrite(_))
    ));
}

#[tokio::test]
async fn requested_disconnect_is_silent() {
    let glove = FakeGlove::default();
    let (mut channel, mut rx) = channel_with_reader(&glove);

    channel.disconnect();
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert_eq!(channel.port_name(), None);

    // Reader thread exits without emitting a close and drops its sender
    let rest = tokio::time::timeout(support::WAIT, rx.recv())
        .await
        .expect("reader thread did not stop");
    assert_eq!(rest, None);
}

#[tokio::test]
async fn failed_open_leaves_error_state() {
    let glove = FakeGlove::failing(1);
    let mut channel = SerialChannel::new(glove.backend(), SerialConfig::default());

    let err = channel.connect().expect_err("first open fails");
    assert!(matches!(err, TeachError::Connection(_)));
    assert_eq!(channel.state(), ChannelState::Error);
    assert!(channel.start_read_loop(|_| {}).is_err());

    channel.connect().expect("Failed to reconnect");
    assert_eq!(channel.state(), ChannelState::Connected);
}
