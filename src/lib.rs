// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Passive decoding of captured network frames.
//!
//! `wirecap` peels successive encapsulation layers (link, IPv4 or IPv6, and
//! transport) off a flat byte buffer representing one captured frame. It is
//! a decoder, not a capture driver: some front end (a capture file reader, a
//! live-capture API, a test fixture) delivers the bytes and the link-layer
//! type, and gets back a [`DecodedPacket`] of zero-copy header views
//! borrowing from its buffer.
//!
//! ```
//! use wirecap::{decode_frame, LinkType, NetworkLayer, RawFrame, TransportLayer};
//!
//! // An IPv4/UDP datagram with no link framing.
//! let bytes = [
//!     0x45, 0x00, 0x00, 0x1E, 0x00, 0x01, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0x0A, 0x00,
//!     0x00, 0x01, 0x0A, 0x00, 0x00, 0x02, // IPv4: 10.0.0.1 -> 10.0.0.2, proto 17
//!     0x12, 0x34, 0x00, 0x35, 0x00, 0x0A, 0x00, 0x00, 0x68, 0x69, // UDP to port 53
//! ];
//! let packet = decode_frame(&RawFrame::new(LinkType::RawIp, &bytes))?;
//! let Some(NetworkLayer::Ipv4(ip)) = &packet.network else { unreachable!() };
//! assert_eq!(ip.ttl(), 64);
//! let Some(TransportLayer::Udp(udp)) = &packet.transport else { unreachable!() };
//! assert_eq!(udp.dst_port(), 53);
//! assert_eq!(udp.body(), b"hi");
//! # Ok::<(), wirecap::ParseError>(())
//! ```
//!
//! Decoding is pure and synchronous: no shared state, no I/O, no retained
//! references past the call. Unrecognized protocol numbers are the natural
//! end of decoding depth, not errors; see [`TransportLayer::Unknown`].
//! Checksums are surfaced and verifiable on demand but never gate a decode.

pub mod error;
pub mod ip;
pub mod packet;
pub mod wire;

pub use crate::error::ParseError;
pub use crate::ip::IpProto;
pub use crate::packet::{
    decode_frame, DecodedPacket, LinkType, NetworkLayer, RawFrame, TransportLayer,
};
