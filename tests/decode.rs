// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! End-to-end decoding of real captured frames.

use std::net::IpAddr;

use proptest::prelude::*;

use wirecap::wire::{Ipv4Packet, Ipv6Packet};
use wirecap::{decode_frame, IpProto, LinkType, NetworkLayer, ParseError, RawFrame, TransportLayer};

/// An IPv4/TCP packet from an IRC session, captured without link framing.
const IPV4_TCP: [u8; 82] = [
    0x45, 0x00, 0x00, 0x52, 0x76, 0xED, 0x40, 0x00, 0x40, 0x06, 0x56, 0xCF, 0xC0, 0xA8, 0x01,
    0x02, 0xD4, 0xCC, 0xD6, 0x72, 0x0B, 0x20, 0x1A, 0x0B, 0x4D, 0xC8, 0x4E, 0xED, 0x54, 0xF1,
    0x10, 0x72, 0x80, 0x18, 0x1F, 0x4B, 0x6D, 0x2E, 0x00, 0x00, 0x01, 0x01, 0x08, 0x0A, 0x00,
    0xD8, 0xEA, 0x48, 0x82, 0xE4, 0xDA, 0xB0, 0x49, 0x53, 0x4F, 0x4E, 0x20, 0x54, 0x68, 0x75,
    0x6E, 0x66, 0x69, 0x73, 0x63, 0x68, 0x20, 0x53, 0x6D, 0x69, 0x6C, 0x65, 0x79, 0x20, 0x53,
    0x6D, 0x69, 0x6C, 0x65, 0x79, 0x47, 0x0A,
];

/// A telnet session frame, zero-padded at the Ethernet level: the IP total
/// length declares one byte less than the capture holds.
const PADDED_TELNET_FRAME: &str = "001d72c0c8a1ca08138f0008080045c0002de0610000ff0690a8c0a864\
                                   96c0a864190017e6de9af322eaa3bbb65050180ff2bbb900000d0a50313e00";

/// An Ethernet frame carrying an IPv6/UDP DNS query.
const IPV6_UDP_FRAME: &str = "0060970769ea0000860580da86dd60000000002411403ffe05070000000102\
                              0086fffe0580da3ffe0501481900000000000000000042095c00350024f009\
                              0006010000010000000000000669746f6a756e036f72670000ff0001";

fn unhex(s: &str) -> Vec<u8> {
    hex::decode(s.replace(char::is_whitespace, "")).unwrap()
}

#[test]
fn ipv4_header_fields() {
    let packet = Ipv4Packet::parse(&IPV4_TCP).unwrap();
    assert_eq!(packet.version(), 4);
    assert_eq!(packet.ihl(), 5);
    assert_eq!(packet.dscp(), 0);
    assert_eq!(packet.ecn(), 0);
    assert_eq!(packet.total_length(), 82);
    assert_eq!(packet.id(), 30445);
    assert!(packet.dont_fragment());
    assert!(!packet.more_fragments());
    assert_eq!(packet.fragment_offset(), 0);
    assert_eq!(packet.ttl(), 64);
    assert_eq!(packet.proto(), IpProto::Tcp);
    assert_eq!(packet.hdr_checksum(), 22223);
    assert_eq!(packet.src_ip(), "192.168.1.2".parse::<IpAddr>().unwrap());
    assert_eq!(packet.dst_ip(), "212.204.214.114".parse::<IpAddr>().unwrap());
    assert!(packet.options_bytes().is_empty());
    assert_eq!(packet.iter_options().count(), 0);
    assert!(packet.verify_checksum());
}

#[test]
fn ipv4_tcp_full_decode() {
    let frame = RawFrame::new(LinkType::RawIp, &IPV4_TCP);
    let packet = decode_frame(&frame).unwrap();
    assert!(packet.link.is_none());

    let Some(NetworkLayer::Ipv4(ip)) = &packet.network else {
        panic!("expected IPv4");
    };
    let Some(TransportLayer::Tcp(tcp)) = &packet.transport else {
        panic!("expected TCP");
    };
    assert_eq!(tcp.src_port(), 2848);
    assert_eq!(tcp.dst_port(), 6667);
    assert_eq!(tcp.seq_num(), 0x4DC8_4EED);
    assert_eq!(tcp.ack_num(), 0x54F1_1072);
    assert_eq!(tcp.data_offset(), 8);
    assert!(tcp.ack() && tcp.psh());
    assert!(!tcp.syn() && !tcp.fin() && !tcp.rst() && !tcp.urg());
    assert_eq!(tcp.window_size(), 8011);
    assert_eq!(
        tcp.iter_options().collect::<Vec<_>>(),
        vec![wirecap::wire::tcp::TcpOption::Timestamp {
            ts_val: 0x00D8_EA48,
            ts_echo_reply: 0x82E4_DAB0,
        }]
    );
    assert_eq!(tcp.body(), b"ISON Thunfisch Smiley SmileyG\x0A");

    // This capture's TCP checksum was never filled in on the wire (checksum
    // offload); verification reports that without having blocked the decode.
    let (src, dst) = (IpAddr::V4(ip.src_ip()), IpAddr::V4(ip.dst_ip()));
    assert!(!tcp.verify_checksum(src, dst));
}

#[test]
fn padded_ethernet_frame_decodes() {
    let bytes = unhex(PADDED_TELNET_FRAME);
    let frame = RawFrame::new(LinkType::Ethernet, &bytes);
    let packet = decode_frame(&frame).unwrap();

    let link = packet.link.as_ref().unwrap();
    assert_eq!(link.ethertype(), 0x0800);

    let Some(NetworkLayer::Ipv4(ip)) = &packet.network else {
        panic!("expected IPv4");
    };
    assert_eq!(ip.total_length(), 45);
    assert_eq!(ip.ttl(), 255);
    assert_eq!(ip.dscp(), 48);
    assert!(ip.verify_checksum());
    // 46 bytes follow the Ethernet header; the trailing pad byte is dropped.
    assert_eq!(ip.body().len(), 25);

    let Some(TransportLayer::Tcp(tcp)) = &packet.transport else {
        panic!("expected TCP");
    };
    assert_eq!(tcp.src_port(), 23);
    assert_eq!(tcp.dst_port(), 59102);
    assert_eq!(tcp.body(), b"\x0D\x0A\x50\x31\x3E");
    // The TCP checksum only verifies because the pad byte was excluded.
    let (src, dst) = (IpAddr::V4(ip.src_ip()), IpAddr::V4(ip.dst_ip()));
    assert!(tcp.verify_checksum(src, dst));
}

#[test]
fn ipv6_header_fields() {
    let bytes = unhex(IPV6_UDP_FRAME);
    let packet = Ipv6Packet::parse(&bytes[14..]).unwrap();
    assert_eq!(packet.version(), 6);
    assert_eq!(packet.traffic_class(), 0);
    assert_eq!(packet.flow_label(), 0);
    assert_eq!(packet.payload_length(), 36);
    assert_eq!(packet.next_header(), IpProto::Udp);
    assert_eq!(packet.hop_limit(), 64);
    assert_eq!(
        packet.src_ip().octets().to_vec(),
        unhex("3ffe050700000001020086fffe0580da")
    );
    assert_eq!(
        packet.dst_ip().octets().to_vec(),
        unhex("3ffe0501481900000000000000000042")
    );
    assert_eq!(packet.body().len(), 36);
}

#[test]
fn ipv6_udp_full_decode() {
    let bytes = unhex(IPV6_UDP_FRAME);
    let frame = RawFrame::new(LinkType::Ethernet, &bytes);
    let packet = decode_frame(&frame).unwrap();

    let link = packet.link.as_ref().unwrap();
    assert_eq!(link.ethertype(), 0x86DD);
    assert_eq!(link.src_mac(), [0x00, 0x00, 0x86, 0x05, 0x80, 0xDA]);

    let Some(NetworkLayer::Ipv6(ip)) = &packet.network else {
        panic!("expected IPv6");
    };
    let Some(TransportLayer::Udp(udp)) = &packet.transport else {
        panic!("expected UDP");
    };
    assert_eq!(udp.src_port(), 2396);
    assert_eq!(udp.dst_port(), 53);
    assert_eq!(udp.length(), 36);
    assert_eq!(udp.body().len(), 28);
    let (src, dst) = (IpAddr::V6(ip.src_ip()), IpAddr::V6(ip.dst_ip()));
    assert!(udp.verify_checksum(src, dst));
}

#[test]
fn decode_is_pure() {
    for bytes in [&IPV4_TCP[..], &unhex(PADDED_TELNET_FRAME)[14..]] {
        let a = Ipv4Packet::parse(bytes).unwrap();
        let b = Ipv4Packet::parse(bytes).unwrap();
        assert_eq!(a.total_length(), b.total_length());
        assert_eq!(a.id(), b.id());
        assert_eq!(a.fragment_offset(), b.fragment_offset());
        assert_eq!(a.src_ip(), b.src_ip());
        assert_eq!(a.body(), b.body());
    }
}

fn ipv4_fingerprint(
    bytes: &[u8],
) -> Result<(u16, u16, bool, bool, u16, u8, u8, u16, [u8; 4], [u8; 4], Vec<u8>, Vec<u8>), ParseError>
{
    let p = Ipv4Packet::parse(bytes)?;
    Ok((
        p.total_length(),
        p.id(),
        p.dont_fragment(),
        p.more_fragments(),
        p.fragment_offset(),
        p.ttl(),
        p.proto().number(),
        p.hdr_checksum(),
        p.src_ip().octets(),
        p.dst_ip().octets(),
        p.options_bytes().to_vec(),
        p.body().to_vec(),
    ))
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
        let _ = ipv4_fingerprint(&bytes);
        let _ = Ipv6Packet::parse(&bytes);
        let _ = decode_frame(&RawFrame::new(LinkType::Ethernet, &bytes));
        let _ = decode_frame(&RawFrame::new(LinkType::RawIp, &bytes));
    }

    #[test]
    fn decoding_twice_is_identical(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
        prop_assert_eq!(ipv4_fingerprint(&bytes), ipv4_fingerprint(&bytes));
    }

    #[test]
    fn short_ipv4_buffers_are_truncated_errors(len in 0usize..20) {
        prop_assert_eq!(
            Ipv4Packet::parse(&IPV4_TCP[..len]).unwrap_err(),
            ParseError::Truncated { required: 20, available: len }
        );
    }

    #[test]
    fn fragment_offset_is_bounded(bytes in proptest::collection::vec(any::<u8>(), 20..64)) {
        if let Ok(packet) = Ipv4Packet::parse(&bytes) {
            prop_assert!(packet.fragment_offset() <= 8191);
            prop_assert_eq!(
                packet.options_bytes().len(),
                (usize::from(packet.ihl()) - 5) * 4
            );
        }
    }
}
