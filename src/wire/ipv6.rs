// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::net::Ipv6Addr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::ParseError;
use crate::ip::IpProto;
use crate::wire::util::{flow_label, high_nibble, traffic_class};

const HEADER_SIZE: usize = 40;

// Header has the same memory layout (thanks to repr(C, packed)) as the fixed
// IPv6 header. Note that it is *not* safe to have the types of any of the
// fields be anything other than u8 or [u8; x] since network byte order (big
// endian) may not be the same as the endianness of the computer we're running
// on, and since repr(packed) is only safe with values with no alignment
// requirements.
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
struct Header {
    version_tc_flow: [u8; 4],
    payload_len: [u8; 2],
    next_hdr: u8,
    hop_limit: u8,
    src_ip: [u8; 16],
    dst_ip: [u8; 16],
}

impl Header {
    fn version(&self) -> u8 {
        high_nibble(self.version_tc_flow[0])
    }
}

/// An IPv6 packet.
///
/// An `Ipv6Packet` shares its underlying memory with the byte slice it was
/// parsed from, meaning that no copying or extra allocation is necessary.
///
/// Extension headers are not walked: they count towards the payload length
/// and are left inside [`Ipv6Packet::body`], with the first next-header value
/// surfaced for dispatch. A dispatcher that grows decoders for
/// extension-header protocol numbers can recurse into the body itself.
#[derive(Debug)]
pub struct Ipv6Packet<'a> {
    header: &'a Header,
    body: &'a [u8],
}

impl<'a> Ipv6Packet<'a> {
    /// Parse an IPv6 packet.
    ///
    /// A payload length larger than the bytes actually captured is accepted
    /// and the body bounded to what is available, mirroring the IPv4
    /// decoder's treatment of truncated captures; surplus bytes beyond the
    /// declared payload are pad and are dropped.
    pub fn parse(bytes: &'a [u8]) -> Result<Ipv6Packet<'a>, ParseError> {
        // See for details: https://en.wikipedia.org/wiki/IPv6_packet

        let (header, rest) =
            Header::ref_from_prefix(bytes).map_err(|_| ParseError::Truncated {
                required: HEADER_SIZE,
                available: bytes.len(),
            })?;
        if header.version() != 6 {
            return Err(ParseError::InvalidVersion {
                expected: 6,
                found: header.version(),
            });
        }

        let payload_len = usize::from(u16::from_be_bytes(header.payload_len));
        let body = &rest[..payload_len.min(rest.len())];

        Ok(Ipv6Packet { header, body })
    }

    /// The payload following the fixed 40-byte header, extension headers
    /// included, bounded by the payload length.
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn version(&self) -> u8 {
        self.header.version()
    }

    /// The 8 traffic-class bits following the version nibble.
    pub fn traffic_class(&self) -> u8 {
        traffic_class(self.header.version_tc_flow[0], self.header.version_tc_flow[1])
    }

    /// The 20-bit flow label.
    pub fn flow_label(&self) -> u32 {
        flow_label(
            self.header.version_tc_flow[1],
            self.header.version_tc_flow[2],
            self.header.version_tc_flow[3],
        )
    }

    /// The declared length of everything after the fixed header.
    pub fn payload_length(&self) -> u16 {
        u16::from_be_bytes(self.header.payload_len)
    }

    /// The protocol number of the first encapsulated header.
    pub fn next_header(&self) -> IpProto {
        IpProto::from(self.header.next_hdr)
    }

    pub fn hop_limit(&self) -> u8 {
        self.header.hop_limit
    }

    pub fn src_ip(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.header.src_ip)
    }

    pub fn dst_ip(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.header.dst_ip)
    }
}
