use meshhelper::meshtastic::framer::{encode_frame, StreamFramer};
use meshhelper::meshtastic::proto::{
    self, from_radio, mesh_packet, FromRadio, HardwareModel, MeshPacket, PortNum,
};
use meshhelper::meshtastic::{decode_from_radio, encode_text_packet, RadioEvent, BROADCAST_ADDR};
use meshhelper::packet::{PacketCategory, Payload};
use prost::Message;

fn from_radio_packet(port: PortNum, payload: Vec<u8>, rssi: i32, snr: f32) -> Vec<u8> {
    FromRadio {
        id: 1,
        payload_variant: Some(from_radio::PayloadVariant::Packet(MeshPacket {
            from: 0x1a2b3c4d,
            to: BROADCAST_ADDR,
            rx_rssi: rssi,
            rx_snr: snr,
            payload_variant: Some(mesh_packet::PayloadVariant::Decoded(proto::Data {
                portnum: port as i32,
                payload,
                ..Default::default()
            })),
            ..Default::default()
        })),
    }
    .encode_to_vec()
}

fn decode_packet(bytes: &[u8]) -> meshhelper::packet::InboundPacket {
    match decode_from_radio(bytes).expect("decode") {
        RadioEvent::Packet(p) => p,
        other => panic!("Expected Packet, got {:?}", other),
    }
}

#[test]
fn text_message_with_metrics() {
    let bytes = from_radio_packet(PortNum::TextMessageApp, b"Signal:".to_vec(), -85, 4.25);
    let p = decode_packet(&bytes);
    assert_eq!(p.category, PacketCategory::TextMessage);
    assert_eq!(p.sender, "!1a2b3c4d");
    assert_eq!(p.text_payload(), Some("Signal:"));
    assert_eq!(p.metrics.rssi, Some(-85.0));
    assert_eq!(p.metrics.snr, Some(4.25));
}

#[test]
fn zero_metrics_mean_not_reported() {
    let bytes = from_radio_packet(PortNum::TextMessageApp, b"hi".to_vec(), 0, 0.0);
    let p = decode_packet(&bytes);
    assert_eq!(p.metrics.rssi, None);
    assert_eq!(p.metrics.snr, None);
}

#[test]
fn position_is_scaled_to_degrees() {
    let pos = proto::Position {
        latitude_i: Some(515_074_000),
        longitude_i: Some(-1_278_000),
        altitude: Some(35),
        ground_speed: Some(2),
        ground_track: Some(270),
        ..Default::default()
    };
    let bytes = from_radio_packet(PortNum::PositionApp, pos.encode_to_vec(), -100, -3.5);
    let p = decode_packet(&bytes);
    assert_eq!(p.category, PacketCategory::Position);
    match p.payload {
        Some(Payload::Position(r)) => {
            assert!((r.latitude.unwrap() - 51.5074).abs() < 1e-9);
            assert!((r.longitude.unwrap() + 0.1278).abs() < 1e-9);
            assert_eq!(r.altitude, Some(35));
            assert_eq!(r.ground_speed, Some(2));
            assert_eq!(r.ground_track, Some(270));
        }
        other => panic!("Expected position payload, got {:?}", other),
    }
}

#[test]
fn node_info_carries_names_and_hardware() {
    let user = proto::User {
        id: "!1a2b3c4d".into(),
        long_name: "Hill Top".into(),
        short_name: "HT".into(),
        hw_model: HardwareModel::Rak4631 as i32,
    };
    let p = decode_packet(&from_radio_packet(
        PortNum::NodeinfoApp,
        user.encode_to_vec(),
        -70,
        9.0,
    ));
    assert_eq!(p.category, PacketCategory::NodeInfo);
    match p.payload {
        Some(Payload::NodeInfo(n)) => {
            assert_eq!(n.long_name, "Hill Top");
            assert_eq!(n.short_name, "HT");
            assert_eq!(n.hardware_model, "Rak4631");
        }
        other => panic!("Expected node info payload, got {:?}", other),
    }
}

#[test]
fn telemetry_and_alert_categories() {
    let t = decode_packet(&from_radio_packet(PortNum::TelemetryApp, vec![0x08, 0x01], -90, 1.0));
    assert_eq!(t.category, PacketCategory::Telemetry);
    assert_eq!(t.payload, None);
    let a = decode_packet(&from_radio_packet(PortNum::AlertApp, b"smoke".to_vec(), -90, 1.0));
    assert_eq!(a.category, PacketCategory::Alert);
    let o = decode_packet(&from_radio_packet(PortNum::RoutingApp, vec![], -90, 1.0));
    assert_eq!(o.category, PacketCategory::Other);
}

#[test]
fn truncated_position_payload_keeps_category() {
    // sfixed32 field 1 with only two of its four bytes
    let p = decode_packet(&from_radio_packet(PortNum::PositionApp, vec![0x0d, 0x01, 0x02], -90, 1.0));
    assert_eq!(p.category, PacketCategory::Position);
    assert_eq!(p.payload, None);
}

#[test]
fn non_packet_variants() {
    let my_info = FromRadio {
        id: 2,
        payload_variant: Some(from_radio::PayloadVariant::MyInfo(proto::MyNodeInfo {
            my_node_num: 99,
        })),
    };
    assert_eq!(
        decode_from_radio(&my_info.encode_to_vec()).unwrap(),
        RadioEvent::MyNodeNum(99)
    );
    let done = FromRadio {
        id: 3,
        payload_variant: Some(from_radio::PayloadVariant::ConfigCompleteId(1234)),
    };
    assert_eq!(
        decode_from_radio(&done.encode_to_vec()).unwrap(),
        RadioEvent::ConfigComplete(1234)
    );
}

#[test]
fn garbage_frame_is_an_error() {
    assert!(decode_from_radio(&[0xff, 0xff, 0xff]).is_err());
}

#[test]
fn framed_stream_decodes_to_packets() {
    let mut stream = b"DEBUG | boot complete\n".to_vec();
    stream.extend(
        encode_frame(&from_radio_packet(PortNum::TextMessageApp, b"Time:".to_vec(), -60, 7.5))
            .unwrap(),
    );
    let mut framer = StreamFramer::new();
    framer.push(&stream);
    let frames = framer.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(decode_packet(&frames[0]).text_payload(), Some("Time:"));
}

#[test]
fn outbound_text_packet_is_a_reliable_dm() {
    let bytes = encode_text_packet(1, 0x1a2b3c4d, 2, 77, "Distance: 12 meter");
    let msg = proto::ToRadio::decode(bytes.as_slice()).unwrap();
    match msg.payload_variant {
        Some(proto::to_radio::PayloadVariant::Packet(pkt)) => {
            assert_eq!(pkt.to, 0x1a2b3c4d);
            assert_eq!(pkt.channel, 2);
            assert_eq!(pkt.id, 77);
            assert!(pkt.want_ack);
            match pkt.payload_variant {
                Some(mesh_packet::PayloadVariant::Decoded(d)) => {
                    assert_eq!(d.portnum, PortNum::TextMessageApp as i32);
                    assert_eq!(d.payload, b"Distance: 12 meter".to_vec());
                }
                other => panic!("Expected decoded payload, got {:?}", other),
            }
        }
        other => panic!("Expected packet, got {:?}", other),
    }
}
