// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub use self::checksum::*;
pub use self::field::*;
pub use self::options::*;

mod field {
    use byteorder::{BigEndian, ByteOrder};

    use crate::error::ParseError;

    /// Read a big-endian `u16` at `offset`, checking bounds.
    pub fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, ParseError> {
        let end = offset.checked_add(2).ok_or(ParseError::Truncated {
            required: usize::MAX,
            available: bytes.len(),
        })?;
        if end > bytes.len() {
            return Err(ParseError::Truncated {
                required: end,
                available: bytes.len(),
            });
        }
        Ok(BigEndian::read_u16(&bytes[offset..]))
    }

    /// Read a big-endian `u32` at `offset`, checking bounds.
    pub fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, ParseError> {
        let end = offset.checked_add(4).ok_or(ParseError::Truncated {
            required: usize::MAX,
            available: bytes.len(),
        })?;
        if end > bytes.len() {
            return Err(ParseError::Truncated {
                required: end,
                available: bytes.len(),
            });
        }
        Ok(BigEndian::read_u32(&bytes[offset..]))
    }

    pub fn high_nibble(b: u8) -> u8 {
        b >> 4
    }

    pub fn low_nibble(b: u8) -> u8 {
        b & 0x0F
    }

    /// DSCP portion of the IPv4 type-of-service byte.
    pub fn dscp(tos: u8) -> u8 {
        tos >> 2
    }

    /// ECN portion of the IPv4 type-of-service byte.
    pub fn ecn(tos: u8) -> u8 {
        tos & 0x03
    }

    // The IPv4 flags/fragment-offset field packs, from the top bit down: a
    // reserved bit, don't-fragment, more-fragments, and a 13-bit offset in
    // 8-byte units.

    pub fn dont_fragment(flags_frag_off: u16) -> bool {
        flags_frag_off & (1 << 14) != 0
    }

    pub fn more_fragments(flags_frag_off: u16) -> bool {
        flags_frag_off & (1 << 13) != 0
    }

    pub fn fragment_offset(flags_frag_off: u16) -> u16 {
        flags_frag_off & 0x1FFF
    }

    /// IPv6 traffic class: the 8 bits following the version nibble, split
    /// across the first two header bytes.
    pub fn traffic_class(b0: u8, b1: u8) -> u8 {
        (b0 << 4) | (b1 >> 4)
    }

    /// IPv6 flow label: the low 20 bits of the first four header bytes.
    pub fn flow_label(b1: u8, b2: u8, b3: u8) -> u32 {
        (u32::from(b1 & 0x0F) << 16) | (u32::from(b2) << 8) | u32::from(b3)
    }

    #[cfg(test)]
    mod tests {
        use proptest::prelude::*;

        use super::*;

        #[test]
        fn bounded_reads() {
            let bytes = [0xDE, 0xAD, 0xBE, 0xEF];
            assert_eq!(read_u16(&bytes, 0).unwrap(), 0xDEAD);
            assert_eq!(read_u16(&bytes, 2).unwrap(), 0xBEEF);
            assert_eq!(read_u32(&bytes, 0).unwrap(), 0xDEADBEEF);
            assert!(read_u16(&bytes, 3).is_err());
            assert!(read_u32(&bytes, 1).is_err());
            assert!(read_u16(&[], 0).is_err());
        }

        #[test]
        fn nibbles() {
            assert_eq!(high_nibble(0x45), 4);
            assert_eq!(low_nibble(0x45), 5);
            assert_eq!(high_nibble(0x60), 6);
        }

        #[test]
        fn tos_split() {
            // DSCP 46 (EF), ECN 1
            assert_eq!(dscp(0xB9), 46);
            assert_eq!(ecn(0xB9), 1);
            assert_eq!(dscp(0x00), 0);
            assert_eq!(ecn(0x00), 0);
        }

        #[test]
        fn flags_and_offset() {
            // DF set, offset 0: the common 0x4000 pattern
            assert!(dont_fragment(0x4000));
            assert!(!more_fragments(0x4000));
            assert_eq!(fragment_offset(0x4000), 0);
            // MF set with a nonzero offset
            assert!(!dont_fragment(0x2001));
            assert!(more_fragments(0x2001));
            assert_eq!(fragment_offset(0x2001), 1);
            // The reserved top bit influences nothing
            assert!(!dont_fragment(0x8000));
            assert!(!more_fragments(0x8000));
            assert_eq!(fragment_offset(0x8000), 0);
        }

        #[test]
        fn traffic_class_straddles_bytes() {
            // 0x6E A0 ... : version 6, traffic class 0xEA
            assert_eq!(traffic_class(0x6E, 0xA0), 0xEA);
            assert_eq!(traffic_class(0x60, 0x00), 0);
        }

        #[test]
        fn flow_label_straddles_bytes() {
            assert_eq!(flow_label(0x0F, 0xFF, 0xFF), 0xF_FFFF);
            assert_eq!(flow_label(0xF1, 0x23, 0x45), 0x1_2345);
            assert_eq!(flow_label(0x00, 0x00, 0x00), 0);
        }

        proptest! {
            #[test]
            fn fragment_offset_is_13_bits(field in any::<u16>()) {
                prop_assert!(fragment_offset(field) <= 8191);
            }

            #[test]
            fn flag_bits_are_independent(field in any::<u16>()) {
                let cleared = field & !(0b11 << 13);
                prop_assert!(!dont_fragment(cleared));
                prop_assert!(!more_fragments(cleared));
                prop_assert_eq!(fragment_offset(cleared), fragment_offset(field));
            }

            #[test]
            fn flow_label_is_20_bits(b1 in any::<u8>(), b2 in any::<u8>(), b3 in any::<u8>()) {
                prop_assert!(flow_label(b1, b2, b3) < (1 << 20));
            }
        }
    }
}

mod checksum {
    use std::net::IpAddr;

    use byteorder::{BigEndian, ByteOrder};

    use crate::ip::IpProto;

    /// The ones' complement checksum used by IPv4, TCP, UDP, and ICMP.
    ///
    /// This checksum operates by computing the ones' complement of the ones'
    /// complement sum of successive 16-bit words of the input.
    pub struct Checksum(u32);

    impl Checksum {
        /// Initialize a new checksum.
        pub fn new() -> Self {
            Checksum(0)
        }

        /// Add bytes to the checksum.
        ///
        /// If `bytes` does not contain an even number of bytes, a single zero
        /// byte will be added to the end before updating the checksum.
        pub fn add_bytes(&mut self, mut bytes: &[u8]) {
            while bytes.len() > 1 {
                self.0 += u32::from(BigEndian::read_u16(bytes));
                bytes = &bytes[2..];
            }
            if bytes.len() == 1 {
                self.0 += u32::from(BigEndian::read_u16(&[bytes[0], 0]));
            }
        }

        /// Compute the checksum of all data added so far.
        ///
        /// Calling `sum` does *not* reset the checksum. More bytes may be
        /// added after calling `sum`, and they will be added to the checksum
        /// as expected.
        pub fn sum(&self) -> u16 {
            let mut sum = self.0;
            while (sum >> 16) != 0 {
                sum = (sum >> 16) + (sum & 0xFFFF);
            }
            !sum as u16
        }
    }

    impl Default for Checksum {
        fn default() -> Self {
            Checksum::new()
        }
    }

    /// Checksum bytes.
    ///
    /// `checksum` is a shorthand for
    ///
    /// ```rust
    /// # use wirecap::wire::util::Checksum;
    /// # let bytes = [];
    /// let mut c = Checksum::new();
    /// c.add_bytes(&bytes);
    /// c.sum();
    /// ```
    pub fn checksum(bytes: &[u8]) -> u16 {
        let mut c = Checksum::new();
        c.add_bytes(bytes);
        c.sum()
    }

    /// Checksum a transport segment together with its IP pseudo-header.
    ///
    /// `parts` are the segment bytes in order (header, options, body). The
    /// pseudo-header layout differs between IPv4 (8-bit zero pad, protocol,
    /// 16-bit length) and IPv6 (32-bit length, 24-bit zero pad, next header);
    /// which one is used follows the address family of `src` and `dst`.
    ///
    /// Returns `None` for a mixed v4/v6 address pair, which has no defined
    /// pseudo-header.
    pub fn pseudo_header_checksum(
        src: IpAddr,
        dst: IpAddr,
        proto: IpProto,
        parts: &[&[u8]],
    ) -> Option<u16> {
        let total_len: usize = parts.iter().map(|p| p.len()).sum();
        let mut c = Checksum::new();
        match (src, dst) {
            (IpAddr::V4(src), IpAddr::V4(dst)) => {
                c.add_bytes(&src.octets());
                c.add_bytes(&dst.octets());
                c.add_bytes(&[0, proto.number()]);
                let mut len = [0; 2];
                BigEndian::write_u16(&mut len, total_len as u16);
                c.add_bytes(&len);
            }
            (IpAddr::V6(src), IpAddr::V6(dst)) => {
                c.add_bytes(&src.octets());
                c.add_bytes(&dst.octets());
                let mut len = [0; 4];
                BigEndian::write_u32(&mut len, total_len as u32);
                c.add_bytes(&len);
                c.add_bytes(&[0, 0, 0, proto.number()]);
            }
            _ => return None,
        }
        for part in parts {
            c.add_bytes(part);
        }
        Some(c.sum())
    }

}

mod options {
    use std::fmt::Debug;
    use std::marker::PhantomData;

    /// A parsed set of header options.
    ///
    /// `Options` represents a validated set of options from a TCP or IPv4
    /// header, borrowed from the packet it was parsed out of.
    #[derive(Debug)]
    pub struct Options<'a, O> {
        bytes: &'a [u8],
        _marker: PhantomData<O>,
    }

    /// An iterator over header options.
    ///
    /// `OptionIter` is an iterator over packet header options stored in the
    /// format used by IPv4 and TCP, where each option is either a single kind
    /// byte or a kind byte, a length byte, and length - 2 data bytes.
    ///
    /// In both IPv4 and TCP, the only single-byte options are End of Options
    /// List (EOL) and No Operation (NOP), both of which are handled internally
    /// by `OptionIter`. Thus, the caller only needs to be able to parse
    /// multi-byte options.
    pub struct OptionIter<'a, O> {
        bytes: &'a [u8],
        idx: usize,
        _marker: PhantomData<O>,
    }

    /// Errors returned from parsing options.
    ///
    /// `OptionParseErr` is either `Internal`, which indicates a malformed
    /// sequence of options (a length field of less than 2 or one larger than
    /// the remaining bytes in the options region), or `External`, which
    /// indicates that the `OptionImpl::parse` callback returned an error.
    #[derive(Debug, PartialEq, Eq)]
    pub enum OptionParseErr<E> {
        Internal,
        External(E),
    }

    /// An implementation of an options parser.
    ///
    /// `OptionImpl` provides the per-protocol callback used to construct an
    /// `Options` or `OptionIter`.
    pub trait OptionImpl {
        type Output;
        type Error;

        /// Parse an option.
        ///
        /// `parse` takes a kind byte and the variable-length data associated
        /// with it and returns `Ok(Some(o))` if the option parsed as `o`,
        /// `Ok(None)` if the kind byte was unrecognized, and `Err(err)` if the
        /// kind byte was recognized but `data` was malformed for that option
        /// kind. Unrecognized kinds are safe to skip thanks to the length
        /// byte.
        ///
        /// `parse` must be deterministic, or else `Options::parse` cannot
        /// guarantee that future iterations will not produce errors (and
        /// panic).
        fn parse(kind: u8, data: &[u8]) -> Result<Option<Self::Output>, Self::Error>;
    }

    impl<'a, O> Options<'a, O>
    where
        O: OptionImpl,
    {
        /// Parse a set of options.
        ///
        /// `parse` performs a single pass over all of the options to verify
        /// that they are well-formed. Once `parse` returns successfully, the
        /// resulting `Options` can be used to construct infallible iterators.
        pub fn parse(bytes: &'a [u8]) -> Result<Options<'a, O>, OptionParseErr<O::Error>> {
            // A single pass up front means iteration afterwards cannot fail,
            // so long as O::parse is deterministic.
            while next::<O>(bytes, &mut 0)?.is_some() {}
            Ok(Options {
                bytes,
                _marker: PhantomData,
            })
        }

        /// The raw bytes backing this options region.
        pub fn bytes(&self) -> &'a [u8] {
            self.bytes
        }

        /// Create an iterator over options.
        ///
        /// Since the options were validated in `parse`, the iterator is
        /// infallible.
        pub fn iter(&self) -> OptionIter<'a, O> {
            OptionIter {
                bytes: self.bytes,
                idx: 0,
                _marker: PhantomData,
            }
        }
    }

    impl<'a, O> Iterator for OptionIter<'a, O>
    where
        O: OptionImpl,
        O::Error: Debug,
    {
        type Item = O::Output;

        fn next(&mut self) -> Option<O::Output> {
            next::<O>(self.bytes, &mut self.idx)
                .expect("already-validated options should not fail to parse")
        }
    }

    // End of Options List in both IPv4 and TCP
    const END_OF_OPTIONS: u8 = 0;
    // NOP in both IPv4 and TCP
    const NOP: u8 = 1;

    fn next<O>(bytes: &[u8], idx: &mut usize) -> Result<Option<O::Output>, OptionParseErr<O::Error>>
    where
        O: OptionImpl,
    {
        // For an explanation of this format, see the "Options" section of
        // https://en.wikipedia.org/wiki/Transmission_Control_Protocol#TCP_segment_structure
        loop {
            let bytes = &bytes[*idx..];
            if bytes.is_empty() {
                return Ok(None);
            }
            if bytes[0] == END_OF_OPTIONS {
                return Ok(None);
            }
            if bytes[0] == NOP {
                *idx += 1;
                continue;
            }
            if bytes.len() < 2 {
                return Err(OptionParseErr::Internal);
            }
            let len = bytes[1] as usize;
            if len < 2 || len > bytes.len() {
                return Err(OptionParseErr::Internal);
            }
            *idx += len;
            match O::parse(bytes[0], &bytes[2..len]) {
                Ok(Some(o)) => return Ok(Some(o)),
                Ok(None) => {}
                Err(err) => return Err(OptionParseErr::External(err)),
            }
        }
    }

}
