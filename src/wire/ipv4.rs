// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::net::Ipv4Addr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::ParseError;
use crate::ip::{IpProto, Ipv4Option};
use crate::wire::util::{
    dont_fragment, dscp, ecn, fragment_offset, high_nibble, low_nibble, more_fragments, Checksum,
    Options,
};

use self::options::Ipv4OptionImpl;

const HEADER_PREFIX_SIZE: usize = 20;

// HeaderPrefix has the same memory layout (thanks to repr(C, packed)) as an
// IPv4 header. Thus, we can simply reinterpret the bytes of the IPv4 header
// as a HeaderPrefix and then safely access its fields. Note, however, that it
// is *not* safe to have the types of any of the fields be anything other than
// u8 or [u8; x] since network byte order (big endian) may not be the same as
// the endianness of the computer we're running on, and since repr(packed) is
// only safe with values with no alignment requirements.
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
struct HeaderPrefix {
    version_ihl: u8,
    dscp_ecn: u8,
    total_len: [u8; 2],
    id: [u8; 2],
    flags_frag_off: [u8; 2],
    ttl: u8,
    proto: u8,
    hdr_checksum: [u8; 2],
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
}

impl HeaderPrefix {
    fn version(&self) -> u8 {
        high_nibble(self.version_ihl)
    }

    fn ihl(&self) -> u8 {
        low_nibble(self.version_ihl)
    }
}

/// An IPv4 packet.
///
/// An `Ipv4Packet` shares its underlying memory with the byte slice it was
/// parsed from, meaning that no copying or extra allocation is necessary.
#[derive(Debug)]
pub struct Ipv4Packet<'a> {
    hdr_prefix: &'a HeaderPrefix,
    options: Options<'a, Ipv4OptionImpl>,
    body: &'a [u8],
}

impl<'a> Ipv4Packet<'a> {
    /// Parse an IPv4 packet.
    ///
    /// The header checksum is extracted but not validated here; call
    /// [`Ipv4Packet::verify_checksum`] to recompute and compare it. A total
    /// length larger than the bytes actually captured is accepted and the
    /// body bounded to what is available, since link-layer captures routinely
    /// cut packets short; bytes beyond the total length are treated as pad
    /// and dropped.
    pub fn parse(bytes: &'a [u8]) -> Result<Ipv4Packet<'a>, ParseError> {
        // See for details: https://en.wikipedia.org/wiki/IPv4#Header

        let (hdr_prefix, rest) =
            HeaderPrefix::ref_from_prefix(bytes).map_err(|_| ParseError::Truncated {
                required: HEADER_PREFIX_SIZE,
                available: bytes.len(),
            })?;
        if hdr_prefix.version() != 4 {
            return Err(ParseError::InvalidVersion {
                expected: 4,
                found: hdr_prefix.version(),
            });
        }

        let hdr_bytes = usize::from(hdr_prefix.ihl()) * 4;
        if hdr_bytes < HEADER_PREFIX_SIZE {
            return Err(ParseError::InvalidHeaderLength {
                declared: hdr_bytes,
                minimum: HEADER_PREFIX_SIZE,
            });
        }
        if hdr_bytes > bytes.len() {
            return Err(ParseError::Truncated {
                required: hdr_bytes,
                available: bytes.len(),
            });
        }

        let total_len = usize::from(u16::from_be_bytes(hdr_prefix.total_len));
        if total_len < hdr_bytes {
            return Err(ParseError::InvalidHeaderLength {
                declared: total_len,
                minimum: hdr_bytes,
            });
        }

        let (options, after) = rest.split_at(hdr_bytes - HEADER_PREFIX_SIZE);
        let options = Options::parse(options).map_err(|_| ParseError::MalformedOptions)?;
        let body_len = (total_len - hdr_bytes).min(after.len());
        let body = &after[..body_len];

        Ok(Ipv4Packet {
            hdr_prefix,
            options,
            body,
        })
    }

    /// Recompute the header checksum and compare it against the wire value.
    ///
    /// The ones' complement sum of the whole header, checksum field included,
    /// is zero exactly when the checksum is correct.
    pub fn verify_checksum(&self) -> bool {
        let mut c = Checksum::new();
        c.add_bytes(self.hdr_prefix.as_bytes());
        c.add_bytes(self.options.bytes());
        c.sum() == 0
    }

    pub fn iter_options(&self) -> impl Iterator<Item = Ipv4Option> + 'a {
        self.options.iter()
    }

    /// The raw bytes of the options region, `(IHL * 4) - 20` bytes long.
    pub fn options_bytes(&self) -> &'a [u8] {
        self.options.bytes()
    }

    /// The bytes following the header, bounded by the total length.
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn version(&self) -> u8 {
        self.hdr_prefix.version()
    }

    /// Header length in 32-bit words.
    pub fn ihl(&self) -> u8 {
        self.hdr_prefix.ihl()
    }

    pub fn dscp(&self) -> u8 {
        dscp(self.hdr_prefix.dscp_ecn)
    }

    pub fn ecn(&self) -> u8 {
        ecn(self.hdr_prefix.dscp_ecn)
    }

    pub fn total_length(&self) -> u16 {
        u16::from_be_bytes(self.hdr_prefix.total_len)
    }

    pub fn id(&self) -> u16 {
        u16::from_be_bytes(self.hdr_prefix.id)
    }

    pub fn dont_fragment(&self) -> bool {
        dont_fragment(u16::from_be_bytes(self.hdr_prefix.flags_frag_off))
    }

    pub fn more_fragments(&self) -> bool {
        more_fragments(u16::from_be_bytes(self.hdr_prefix.flags_frag_off))
    }

    /// Fragment offset in 8-byte units.
    pub fn fragment_offset(&self) -> u16 {
        fragment_offset(u16::from_be_bytes(self.hdr_prefix.flags_frag_off))
    }

    pub fn ttl(&self) -> u8 {
        self.hdr_prefix.ttl
    }

    /// The protocol number of the encapsulated layer.
    pub fn proto(&self) -> IpProto {
        IpProto::from(self.hdr_prefix.proto)
    }

    pub fn hdr_checksum(&self) -> u16 {
        u16::from_be_bytes(self.hdr_prefix.hdr_checksum)
    }

    pub fn src_ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.hdr_prefix.src_ip)
    }

    pub fn dst_ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.hdr_prefix.dst_ip)
    }
}

mod options {
    use crate::ip::{Ipv4Option, Ipv4OptionInner};
    use crate::wire::util::OptionImpl;

    const OPTION_DATA_MAX: usize = 38;

    #[derive(Debug)]
    pub struct Ipv4OptionImpl;

    impl OptionImpl for Ipv4OptionImpl {
        type Output = Ipv4Option;
        type Error = ();

        fn parse(kind: u8, data: &[u8]) -> Result<Option<Ipv4Option>, ()> {
            let copied = kind & (1 << 7) > 0;
            if data.len() > OPTION_DATA_MAX {
                return Err(());
            }
            let len = data.len();
            let mut d = [0u8; OPTION_DATA_MAX];
            d[..len].copy_from_slice(data);
            Ok(Some(Ipv4Option {
                copied,
                inner: Ipv4OptionInner::Unrecognized {
                    kind,
                    len: len as u8,
                    data: d,
                },
            }))
        }
    }
}
