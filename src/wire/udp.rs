// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::net::IpAddr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::ParseError;
use crate::ip::IpProto;
use crate::wire::util::pseudo_header_checksum;

const HEADER_SIZE: usize = 8;

// Header has the same memory layout (thanks to repr(C, packed)) as a UDP
// header. Thus, we can simply reinterpret the bytes of the UDP header as a
// Header and then safely access its fields. Note, however, that it is *not*
// safe to have the types of any of the fields be anything other than u8 or
// [u8; x] since network byte order (big endian) may not be the same as the
// endianness of the computer we're running on, and since repr(packed) is only
// safe with values with no alignment requirements.
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
struct Header {
    src_port: [u8; 2],
    dst_port: [u8; 2],
    length: [u8; 2],
    checksum: [u8; 2],
}

/// A UDP packet.
///
/// A `UdpPacket` shares its underlying memory with the byte slice it was
/// parsed from, meaning that no copying or extra allocation is necessary.
#[derive(Debug)]
pub struct UdpPacket<'a> {
    header: &'a Header,
    body: &'a [u8],
}

impl<'a> UdpPacket<'a> {
    /// Parse a UDP packet.
    ///
    /// The length field bounds the body the same way the IP layers bound
    /// theirs: bytes past the declared length are pad and are dropped, and a
    /// declared length running past the captured bytes leaves the body
    /// bounded to what is available.
    pub fn parse(bytes: &'a [u8]) -> Result<UdpPacket<'a>, ParseError> {
        // See for details: https://en.wikipedia.org/wiki/User_Datagram_Protocol#Packet_structure

        let (header, rest) =
            Header::ref_from_prefix(bytes).map_err(|_| ParseError::Truncated {
                required: HEADER_SIZE,
                available: bytes.len(),
            })?;
        let packet_len = usize::from(u16::from_be_bytes(header.length));
        if packet_len < HEADER_SIZE {
            return Err(ParseError::InvalidHeaderLength {
                declared: packet_len,
                minimum: HEADER_SIZE,
            });
        }
        let body = &rest[..(packet_len - HEADER_SIZE).min(rest.len())];

        Ok(UdpPacket { header, body })
    }

    /// Recompute the checksum over the pseudo-header, header, and body and
    /// compare it against the wire value.
    ///
    /// An IPv4 sender may legitimately omit the checksum by sending zero;
    /// such packets verify as true since there is nothing to compare. A
    /// computed checksum of zero is transmitted as 0xFFFF, which the ones'
    /// complement sum already accounts for.
    pub fn verify_checksum(&self, src_ip: IpAddr, dst_ip: IpAddr) -> bool {
        if !self.checksummed() {
            return matches!(src_ip, IpAddr::V4(_));
        }
        pseudo_header_checksum(
            src_ip,
            dst_ip,
            IpProto::Udp,
            &[self.header.as_bytes(), self.body],
        ) == Some(0)
    }

    /// Whether the sender computed a checksum at all.
    ///
    /// IPv6 requires the checksum; a zero checksum is only meaningful on
    /// IPv4.
    pub fn checksummed(&self) -> bool {
        u16::from_be_bytes(self.header.checksum) != 0
    }

    /// The datagram payload, bounded by the length field.
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes(self.header.src_port)
    }

    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes(self.header.dst_port)
    }

    /// The declared length of header plus payload.
    pub fn length(&self) -> u16 {
        u16::from_be_bytes(self.header.length)
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(self.header.checksum)
    }
}
