// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::net::IpAddr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::ParseError;
use crate::ip::IpProto;
use crate::wire::util::{high_nibble, pseudo_header_checksum, Options};

use self::options::TcpOptionImpl;

const HEADER_PREFIX_SIZE: usize = 20;

// HeaderPrefix has the same memory layout (thanks to repr(C, packed)) as a
// TCP header. Thus, we can simply reinterpret the bytes of the TCP header as
// a HeaderPrefix and then safely access its fields. Note, however, that it is
// *not* safe to have the types of any of the fields be anything other than u8
// or [u8; x] since network byte order (big endian) may not be the same as the
// endianness of the computer we're running on, and since repr(packed) is only
// safe with values with no alignment requirements.
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
struct HeaderPrefix {
    src_port: [u8; 2],
    dst_port: [u8; 2],
    seq_num: [u8; 4],
    ack_num: [u8; 4],
    data_off_reserved_ns: u8,
    flags: u8,
    window_size: [u8; 2],
    checksum: [u8; 2],
    urg_ptr: [u8; 2],
}

impl HeaderPrefix {
    fn data_off(&self) -> u8 {
        high_nibble(self.data_off_reserved_ns)
    }
}

const URG_MASK: u8 = 1 << 5;
const ACK_MASK: u8 = 1 << 4;
const PSH_MASK: u8 = 1 << 3;
const RST_MASK: u8 = 1 << 2;
const SYN_MASK: u8 = 1 << 1;
const FIN_MASK: u8 = 1;

/// A TCP option as parsed out of a segment header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TcpOption {
    Mss(u16),
    WindowScale(u8),
    SackPermitted,
    Sack {
        blocks: [TcpSackBlock; 4],
        num_blocks: u8,
    },
    Timestamp {
        ts_val: u32,
        ts_echo_reply: u32,
    },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TcpSackBlock {
    pub left_edge: u32,
    pub right_edge: u32,
}

/// A TCP segment.
///
/// A `TcpSegment` shares its underlying memory with the byte slice it was
/// parsed from, meaning that no copying or extra allocation is necessary.
#[derive(Debug)]
pub struct TcpSegment<'a> {
    hdr_prefix: &'a HeaderPrefix,
    options: Options<'a, TcpOptionImpl>,
    body: &'a [u8],
}

impl<'a> TcpSegment<'a> {
    /// Parse a TCP segment.
    ///
    /// The checksum is extracted but not validated here; call
    /// [`TcpSegment::verify_checksum`] with the enclosing IP header's
    /// addresses to recompute and compare it.
    pub fn parse(bytes: &'a [u8]) -> Result<TcpSegment<'a>, ParseError> {
        // See for details: https://en.wikipedia.org/wiki/Transmission_Control_Protocol#TCP_segment_structure

        let (hdr_prefix, rest) =
            HeaderPrefix::ref_from_prefix(bytes).map_err(|_| ParseError::Truncated {
                required: HEADER_PREFIX_SIZE,
                available: bytes.len(),
            })?;

        let hdr_bytes = usize::from(hdr_prefix.data_off()) * 4;
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

        let (options, body) = rest.split_at(hdr_bytes - HEADER_PREFIX_SIZE);
        let options = Options::parse(options).map_err(|_| ParseError::MalformedOptions)?;

        Ok(TcpSegment {
            hdr_prefix,
            options,
            body,
        })
    }

    /// Recompute the checksum over the pseudo-header and the whole segment
    /// and compare it against the wire value.
    ///
    /// `src_ip` and `dst_ip` come from the enclosing IPv4 or IPv6 header; a
    /// mixed address pair verifies as false.
    pub fn verify_checksum(&self, src_ip: IpAddr, dst_ip: IpAddr) -> bool {
        pseudo_header_checksum(
            src_ip,
            dst_ip,
            IpProto::Tcp,
            &[self.hdr_prefix.as_bytes(), self.options.bytes(), self.body],
        ) == Some(0)
    }

    pub fn iter_options(&self) -> impl Iterator<Item = TcpOption> + 'a {
        self.options.iter()
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes(self.hdr_prefix.src_port)
    }

    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes(self.hdr_prefix.dst_port)
    }

    pub fn seq_num(&self) -> u32 {
        u32::from_be_bytes(self.hdr_prefix.seq_num)
    }

    pub fn ack_num(&self) -> u32 {
        u32::from_be_bytes(self.hdr_prefix.ack_num)
    }

    /// Header length in 32-bit words.
    pub fn data_offset(&self) -> u8 {
        self.hdr_prefix.data_off()
    }

    fn get_flag(&self, mask: u8) -> bool {
        self.hdr_prefix.flags & mask > 0
    }

    pub fn urg(&self) -> bool {
        self.get_flag(URG_MASK)
    }

    pub fn ack(&self) -> bool {
        self.get_flag(ACK_MASK)
    }

    pub fn psh(&self) -> bool {
        self.get_flag(PSH_MASK)
    }

    pub fn rst(&self) -> bool {
        self.get_flag(RST_MASK)
    }

    pub fn syn(&self) -> bool {
        self.get_flag(SYN_MASK)
    }

    pub fn fin(&self) -> bool {
        self.get_flag(FIN_MASK)
    }

    pub fn window_size(&self) -> u16 {
        u16::from_be_bytes(self.hdr_prefix.window_size)
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(self.hdr_prefix.checksum)
    }

    pub fn urg_ptr(&self) -> u16 {
        u16::from_be_bytes(self.hdr_prefix.urg_ptr)
    }
}

mod options {
    use std::mem;

    use byteorder::{BigEndian, ByteOrder};

    use super::{TcpOption, TcpSackBlock};
    use crate::wire::util::OptionImpl;

    fn parse_sack_block(bytes: &[u8]) -> TcpSackBlock {
        TcpSackBlock {
            left_edge: BigEndian::read_u32(bytes),
            right_edge: BigEndian::read_u32(&bytes[4..]),
        }
    }

    const OPTION_KIND_MSS: u8 = 2;
    const OPTION_KIND_WINDOW_SCALE: u8 = 3;
    const OPTION_KIND_SACK_PERMITTED: u8 = 4;
    const OPTION_KIND_SACK: u8 = 5;
    const OPTION_KIND_TIMESTAMP: u8 = 8;

    #[derive(Debug)]
    pub struct TcpOptionImpl;

    impl OptionImpl for TcpOptionImpl {
        type Output = TcpOption;
        type Error = ();

        fn parse(kind: u8, data: &[u8]) -> Result<Option<TcpOption>, ()> {
            match kind {
                OPTION_KIND_MSS => {
                    if data.len() != 2 {
                        Err(())
                    } else {
                        Ok(Some(TcpOption::Mss(BigEndian::read_u16(data))))
                    }
                }
                OPTION_KIND_WINDOW_SCALE => {
                    if data.len() != 1 {
                        Err(())
                    } else {
                        Ok(Some(TcpOption::WindowScale(data[0])))
                    }
                }
                OPTION_KIND_SACK_PERMITTED => {
                    if !data.is_empty() {
                        Err(())
                    } else {
                        Ok(Some(TcpOption::SackPermitted))
                    }
                }
                OPTION_KIND_SACK => match data.len() {
                    8 | 16 | 24 | 32 => {
                        let num_blocks = data.len() / mem::size_of::<TcpSackBlock>();
                        let mut blocks = [TcpSackBlock::default(); 4];
                        for (i, block) in blocks.iter_mut().take(num_blocks).enumerate() {
                            *block = parse_sack_block(&data[i * 8..]);
                        }
                        Ok(Some(TcpOption::Sack {
                            blocks,
                            num_blocks: num_blocks as u8,
                        }))
                    }
                    _ => Err(()),
                },
                OPTION_KIND_TIMESTAMP => {
                    if data.len() != 8 {
                        Err(())
                    } else {
                        let ts_val = BigEndian::read_u32(data);
                        let ts_echo_reply = BigEndian::read_u32(&data[4..]);
                        Ok(Some(TcpOption::Timestamp {
                            ts_val,
                            ts_echo_reply,
                        }))
                    }
                }
                _ => Ok(None),
            }
        }
    }
}
