// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::ParseError;
use crate::wire::util::read_u16;

/// Minimum bytes consumed by an untagged Ethernet header.
pub const HEADER_LEN: usize = 14;

// HeaderPrefix has the same memory layout (thanks to repr(C, packed)) as the
// leading MAC pair of an Ethernet header. Note that it is *not* safe to have
// the types of any of the fields be anything other than u8 or [u8; x] since
// network byte order (big endian) may not be the same as the endianness of
// the computer we're running on, and since repr(packed) is only safe with
// values with no alignment requirements.
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
struct HeaderPrefix {
    dst_mac: [u8; 6],
    src_mac: [u8; 6],
}

const TPID_8021Q: u16 = 0x8100;
const TPID_8021AD: u16 = 0x88a8;

// 802.3 uses the two bytes after the MACs as a payload length instead of an
// ethertype; values of 1536 and up are ethertypes.
const MAX_8023_LENGTH: u16 = 1500;

/// The network protocol identified by an Ethernet frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Ipv6,
    Arp,
    /// An 802.3 length field rather than a protocol identifier.
    Length(u16),
    Other(u16),
}

impl From<u16> for EtherType {
    fn from(value: u16) -> EtherType {
        match value {
            v if v <= MAX_8023_LENGTH => EtherType::Length(v),
            0x0800 => EtherType::Ipv4,
            0x0806 => EtherType::Arp,
            0x86DD => EtherType::Ipv6,
            v => EtherType::Other(v),
        }
    }
}

/// An 802.1Q or 802.1ad VLAN tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VlanTag {
    Tag8021Q(u16),
    Tag8021Ad(u16),
}

/// An Ethernet frame.
///
/// An `EthernetFrame` shares its underlying memory with the byte slice it was
/// parsed from, meaning that no copying or extra allocation is necessary.
#[derive(Debug)]
pub struct EthernetFrame<'a> {
    hdr_prefix: &'a HeaderPrefix,
    tag: Option<VlanTag>,
    ethertype: u16,
    body: &'a [u8],
}

impl<'a> EthernetFrame<'a> {
    /// Parse an Ethernet frame.
    ///
    /// When the frame carries an 802.3 length field instead of an ethertype,
    /// the body is truncated to the declared length: physical media pad short
    /// frames, and the padding is not payload. Ethernet II frames have no
    /// length field, so the full remainder is passed through and bounding is
    /// left to the network layer.
    pub fn parse(bytes: &'a [u8]) -> Result<EthernetFrame<'a>, ParseError> {
        // See for details: https://en.wikipedia.org/wiki/Ethernet_frame#Frame_%E2%80%93_data_link_layer

        let (hdr_prefix, rest) =
            HeaderPrefix::ref_from_prefix(bytes).map_err(|_| ParseError::Truncated {
                required: HEADER_LEN,
                available: bytes.len(),
            })?;

        let ethertype = read_u16(rest, 0).map_err(|_| ParseError::Truncated {
            required: HEADER_LEN,
            available: bytes.len(),
        })?;

        // "The IEEE 802.1Q tag or IEEE 802.1ad tag, if present, is a
        // four-octet field... The first two octets of the tag are called the
        // Tag Protocol IDentifier and double as the EtherType field
        // indicating that the frame is either 802.1Q or 802.1ad tagged."
        // - Wikipedia
        let (tag, ethertype, body) = match ethertype {
            TPID_8021Q | TPID_8021AD => {
                let tci = read_u16(rest, 2).map_err(|_| ParseError::Truncated {
                    required: HEADER_LEN + 4,
                    available: bytes.len(),
                })?;
                let inner = read_u16(rest, 4).map_err(|_| ParseError::Truncated {
                    required: HEADER_LEN + 4,
                    available: bytes.len(),
                })?;
                let tag = if ethertype == TPID_8021Q {
                    VlanTag::Tag8021Q(tci)
                } else {
                    VlanTag::Tag8021Ad(tci)
                };
                (Some(tag), inner, &rest[6..])
            }
            ethertype => (None, ethertype, &rest[2..]),
        };

        // 802.3 length framing: everything beyond the declared length is pad.
        let body = match EtherType::from(ethertype) {
            EtherType::Length(len) => &body[..body.len().min(len as usize)],
            _ => body,
        };

        Ok(EthernetFrame {
            hdr_prefix,
            tag,
            ethertype,
            body,
        })
    }

    pub fn src_mac(&self) -> [u8; 6] {
        self.hdr_prefix.src_mac
    }

    pub fn dst_mac(&self) -> [u8; 6] {
        self.hdr_prefix.dst_mac
    }

    /// The raw two bytes following the MAC pair (and VLAN tag, if any).
    pub fn ethertype(&self) -> u16 {
        self.ethertype
    }

    /// The decoded ethertype, distinguishing 802.3 length framing.
    pub fn ethertype_decoded(&self) -> EtherType {
        EtherType::from(self.ethertype)
    }

    pub fn tag(&self) -> Option<VlanTag> {
        self.tag
    }

    /// The encapsulated payload, with any 802.3 pad bytes dropped.
    pub fn body(&self) -> &'a [u8] {
        self.body
    }
}
