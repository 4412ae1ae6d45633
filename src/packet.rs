// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Top-level frame decoding: link, network, and transport layers in
//! sequence.
//!
//! [`decode_frame`] is the single entry point. Each decoded layer is
//! accumulated into a [`DecodedPacket`]; running into a protocol with no
//! registered decoder ends the pipeline successfully with the layers decoded
//! so far, while a layer that was identified but fails its own validation
//! fails the whole call.

use tracing::trace;

use crate::error::ParseError;
use crate::ip::IpProto;
use crate::wire::ethernet::EtherType;
use crate::wire::util::high_nibble;
use crate::wire::{EthernetFrame, IcmpPacket, Ipv4Packet, Ipv6Packet, TcpSegment, UdpPacket};

/// The link-layer encapsulation of a captured frame, from the capture
/// front end's numeric link-type code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkType {
    /// Ethernet II / 802.3 framing (pcap linktype 1).
    Ethernet,
    /// No link framing at all: the frame starts at the IP header (pcap
    /// linktype 101).
    RawIp,
    /// A link type this crate has no decoder for.
    Other(u32),
}

impl From<u32> for LinkType {
    fn from(code: u32) -> LinkType {
        match code {
            1 => LinkType::Ethernet,
            101 => LinkType::RawIp,
            code => LinkType::Other(code),
        }
    }
}

/// One captured frame as delivered by a capture front end.
///
/// The decoder borrows the bytes for the duration of one [`decode_frame`]
/// call; every view in the resulting [`DecodedPacket`] points back into this
/// buffer.
#[derive(Copy, Clone)]
pub struct RawFrame<'a> {
    pub link_type: LinkType,
    pub bytes: &'a [u8],
}

impl<'a> RawFrame<'a> {
    pub fn new(link_type: LinkType, bytes: &'a [u8]) -> RawFrame<'a> {
        RawFrame { link_type, bytes }
    }
}

/// The decoded network layer.
#[derive(Debug)]
pub enum NetworkLayer<'a> {
    Ipv4(Ipv4Packet<'a>),
    Ipv6(Ipv6Packet<'a>),
}

impl<'a> NetworkLayer<'a> {
    /// The protocol number of the encapsulated transport layer.
    pub fn proto(&self) -> IpProto {
        match self {
            NetworkLayer::Ipv4(packet) => packet.proto(),
            NetworkLayer::Ipv6(packet) => packet.next_header(),
        }
    }

    /// The transport-layer bytes, bounded by this layer's length field.
    pub fn body(&self) -> &'a [u8] {
        match self {
            NetworkLayer::Ipv4(packet) => packet.body(),
            NetworkLayer::Ipv6(packet) => packet.body(),
        }
    }
}

/// The decoded transport layer.
///
/// One variant per registered transport decoder, so dispatch is a closed,
/// exhaustively matchable set. Protocol numbers without a decoder land in
/// `Unknown`, which carries the undecoded payload and is the successful end
/// of decoding depth, not an error.
#[derive(Debug)]
pub enum TransportLayer<'a> {
    Tcp(TcpSegment<'a>),
    Udp(UdpPacket<'a>),
    Icmpv4(IcmpPacket<'a>),
    Icmpv6(IcmpPacket<'a>),
    Unknown { proto: IpProto, payload: &'a [u8] },
}

impl<'a> TransportLayer<'a> {
    fn parse(proto: IpProto, bytes: &'a [u8]) -> Result<TransportLayer<'a>, ParseError> {
        match proto {
            IpProto::Tcp => Ok(TransportLayer::Tcp(TcpSegment::parse(bytes)?)),
            IpProto::Udp => Ok(TransportLayer::Udp(UdpPacket::parse(bytes)?)),
            IpProto::Icmp => Ok(TransportLayer::Icmpv4(IcmpPacket::parse(bytes)?)),
            IpProto::Icmpv6 => Ok(TransportLayer::Icmpv6(IcmpPacket::parse(bytes)?)),
            proto => {
                trace!(proto = proto.number(), "no transport decoder registered");
                Ok(TransportLayer::Unknown {
                    proto,
                    payload: bytes,
                })
            }
        }
    }
}

/// The linear stack of layers decoded out of one frame.
///
/// Layers are strictly ordered: a transport layer is only ever present when
/// the network layer is, and so on outward. Absent layers mean decoding
/// stopped early because no decoder was registered for what came next; they
/// are never half-populated.
#[derive(Debug, Default)]
pub struct DecodedPacket<'a> {
    pub link: Option<EthernetFrame<'a>>,
    pub network: Option<NetworkLayer<'a>>,
    pub transport: Option<TransportLayer<'a>>,
}

impl<'a> DecodedPacket<'a> {
    /// The deepest byte range no decoder was registered for, if any.
    pub fn residue(&self) -> Option<&'a [u8]> {
        match &self.transport {
            Some(TransportLayer::Unknown { payload, .. }) => Some(payload),
            Some(_) => None,
            None => match &self.network {
                Some(network) => Some(network.body()),
                None => match &self.link {
                    Some(link) => Some(link.body()),
                    None => None,
                },
            },
        }
    }
}

/// Decode one captured frame into its layer stack.
///
/// Runs link, network, and transport decoding in sequence. A frame whose
/// outermost protocols are simply unrecognized (unknown link type, unknown
/// ethertype) decodes successfully to fewer layers; an error is returned only
/// when a layer identified as a given protocol fails that protocol's own
/// validation.
pub fn decode_frame<'a>(frame: &RawFrame<'a>) -> Result<DecodedPacket<'a>, ParseError> {
    let mut packet = DecodedPacket::default();

    let (network_bytes, ethertype) = match frame.link_type {
        LinkType::Ethernet => {
            let eth = EthernetFrame::parse(frame.bytes)?;
            let body = eth.body();
            let ethertype = eth.ethertype_decoded();
            packet.link = Some(eth);
            (body, ethertype)
        }
        LinkType::RawIp => {
            // No link framing: sniff the IP version nibble.
            let ethertype = match frame.bytes.first().map(|b| high_nibble(*b)) {
                Some(4) => EtherType::Ipv4,
                Some(6) => EtherType::Ipv6,
                nibble => {
                    trace!(?nibble, "raw frame with unrecognized version nibble");
                    return Ok(packet);
                }
            };
            (frame.bytes, ethertype)
        }
        LinkType::Other(code) => {
            trace!(code, "no link-layer decoder registered");
            return Ok(packet);
        }
    };

    let network = match ethertype {
        EtherType::Ipv4 => NetworkLayer::Ipv4(Ipv4Packet::parse(network_bytes)?),
        EtherType::Ipv6 => NetworkLayer::Ipv6(Ipv6Packet::parse(network_bytes)?),
        other => {
            trace!(ethertype = ?other, "no network-layer decoder registered");
            return Ok(packet);
        }
    };

    let transport = TransportLayer::parse(network.proto(), network.body())?;
    packet.network = Some(network);
    packet.transport = Some(transport);
    Ok(packet)
}
