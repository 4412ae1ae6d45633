// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::ParseError;
use crate::wire::util::Checksum;

const HEADER_SIZE: usize = 8;

/// ICMP echo request.
pub const TYPE_ECHO_REQUEST: u8 = 8;
/// ICMP echo reply.
pub const TYPE_ECHO_REPLY: u8 = 0;
/// ICMPv6 echo request.
pub const TYPE_ECHO_REQUEST_V6: u8 = 128;
/// ICMPv6 echo reply.
pub const TYPE_ECHO_REPLY_V6: u8 = 129;

// Header has the same memory layout (thanks to repr(C, packed)) as the fixed
// portion shared by all ICMP messages. The interpretation of the last four
// bytes depends on the message type; for echo messages they are the
// identifier and sequence number. Note that it is *not* safe to have the
// types of any of the fields be anything other than u8 or [u8; x] since
// network byte order (big endian) may not be the same as the endianness of
// the computer we're running on, and since repr(packed) is only safe with
// values with no alignment requirements.
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
struct Header {
    msg_type: u8,
    code: u8,
    checksum: [u8; 2],
    rest_of_header: [u8; 4],
}

/// An ICMP or ICMPv6 message.
///
/// An `IcmpPacket` shares its underlying memory with the byte slice it was
/// parsed from, meaning that no copying or extra allocation is necessary.
/// Both protocols use the same fixed header layout; the type-number spaces
/// differ, which the caller disambiguates via the IP protocol number that
/// led here.
#[derive(Debug)]
pub struct IcmpPacket<'a> {
    header: &'a Header,
    body: &'a [u8],
}

impl<'a> IcmpPacket<'a> {
    /// Parse an ICMP message.
    pub fn parse(bytes: &'a [u8]) -> Result<IcmpPacket<'a>, ParseError> {
        // See for details: https://en.wikipedia.org/wiki/Internet_Control_Message_Protocol#Datagram_structure

        let (header, body) =
            Header::ref_from_prefix(bytes).map_err(|_| ParseError::Truncated {
                required: HEADER_SIZE,
                available: bytes.len(),
            })?;
        Ok(IcmpPacket { header, body })
    }

    /// Recompute the ICMPv4 checksum over the whole message and compare it
    /// against the wire value.
    ///
    /// ICMPv6 includes an IP pseudo-header in its checksum, which this does
    /// not cover.
    pub fn verify_checksum(&self) -> bool {
        let mut c = Checksum::new();
        c.add_bytes(self.header.as_bytes());
        c.add_bytes(self.body);
        c.sum() == 0
    }

    pub fn msg_type(&self) -> u8 {
        self.header.msg_type
    }

    pub fn code(&self) -> u8 {
        self.header.code
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(self.header.checksum)
    }

    /// The type-specific four bytes following the checksum.
    pub fn rest_of_header(&self) -> [u8; 4] {
        self.header.rest_of_header
    }

    /// Whether this is an echo request or reply, in either ICMP version.
    pub fn is_echo(&self) -> bool {
        matches!(
            self.header.msg_type,
            TYPE_ECHO_REQUEST | TYPE_ECHO_REPLY | TYPE_ECHO_REQUEST_V6 | TYPE_ECHO_REPLY_V6
        )
    }

    /// The echo identifier, for echo messages.
    pub fn echo_id(&self) -> Option<u16> {
        self.is_echo().then(|| {
            u16::from_be_bytes([self.header.rest_of_header[0], self.header.rest_of_header[1]])
        })
    }

    /// The echo sequence number, for echo messages.
    pub fn echo_seq(&self) -> Option<u16> {
        self.is_echo().then(|| {
            u16::from_be_bytes([self.header.rest_of_header[2], self.header.rest_of_header[3]])
        })
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }
}
