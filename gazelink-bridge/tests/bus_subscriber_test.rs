use gazelink_bridge::{BroadcastBus, BusMessage, BusPublisherPlugin, MessageBus};
use gazelink_core::{BridgeConfig, Frame, GazeCandidate, SessionConfig};
use gazelink_events::{EventBag, Plugin};
use std::sync::Arc;
use std::time::Duration;

fn config() -> BridgeConfig {
    BridgeConfig {
        node_name: "eye_bridge".to_string(),
        ..BridgeConfig::default()
    }
}

#[tokio::test]
async fn test_subscriber_task_receives_gaze() {
    let bus = Arc::new(BroadcastBus::new());
    let mut plugin = BusPublisherPlugin::new(bus.clone(), config(), SessionConfig::default()).unwrap();
    let mut receiver = bus.subscribe("eye_bridge/gaze").unwrap();

    let subscriber = tokio::spawn(async move {
        let mut points = Vec::new();
        while points.len() < 3 {
            match receiver.recv().await {
                Ok(BusMessage::Gaze(msg)) => points.push((msg.gaze.x, msg.gaze.y)),
                Ok(_) => {}
                Err(_) => break,
            }
        }
        points
    });

    let frame = Frame::new(640, 480, 3, 0.0, vec![0u8; 640 * 480 * 3]).unwrap();
    for step in 0..3 {
        let x = step as f64 * 0.25;
        let mut bag = EventBag::new()
            .with_frame(frame.clone())
            .with_gaze(vec![GazeCandidate::new(0.95, (x, 0.5))]);
        plugin.on_cycle(&mut bag).unwrap();
    }

    let points = tokio::time::timeout(Duration::from_secs(5), subscriber)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(points, vec![(0.0, 240.0), (160.0, 240.0), (320.0, 240.0)]);
}

#[tokio::test]
async fn test_lagging_subscriber_sees_lag() {
    let bus = BroadcastBus::new();
    bus.advertise("slow/frame/info", 2).unwrap();
    let mut receiver = bus.subscribe("slow/frame/info").unwrap();

    let frame = Frame::new(2, 2, 3, 0.0, vec![0u8; 12]).unwrap();
    for _ in 0..4 {
        let info = gazelink_bridge::CameraInfoMessage::from_frame(
            &frame,
            gazelink_bridge::Header::new(gazelink_bridge::Time::now(), "frame"),
        );
        bus.publish("slow/frame/info", BusMessage::CameraInfo(info)).unwrap();
    }

    assert!(matches!(
        receiver.recv().await,
        Err(tokio::sync::broadcast::error::RecvError::Lagged(2))
    ));
    assert!(receiver.recv().await.is_ok());
}

#[test]
fn test_messages_serialize_for_external_transports() {
    let bus = Arc::new(BroadcastBus::new());
    let mut plugin = BusPublisherPlugin::new(bus.clone(), config(), SessionConfig::default()).unwrap();
    let mut receiver = bus.subscribe("eye_bridge/frame/info").unwrap();

    let frame = Frame::new(4, 3, 3, 0.0, vec![0u8; 36]).unwrap();
    let mut bag = EventBag::new().with_frame(frame);
    plugin.on_cycle(&mut bag).unwrap();

    let message = receiver.try_recv().unwrap();
    let json: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
    assert_eq!(json["type"], "CameraInfo");
    assert_eq!(json["msg"]["width"], 4);
    assert_eq!(json["msg"]["height"], 3);
}
