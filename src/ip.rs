// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! IP protocol numbers and IPv4 option types.

/// An IP protocol or next header number.
///
/// For IPv4, this is the protocol number. For IPv6, this is the next header
/// number. The variants enumerate every protocol a transport decoder is
/// registered for; anything else lands in `Other` and ends decoding depth
/// without failing it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IpProto {
    Icmp,
    Tcp,
    Udp,
    Icmpv6,
    Other(u8),
}

impl IpProto {
    const ICMP: u8 = 1;
    const TCP: u8 = 6;
    const UDP: u8 = 17;
    const ICMPV6: u8 = 58;

    /// The wire value of this protocol number.
    pub fn number(self) -> u8 {
        match self {
            IpProto::Icmp => Self::ICMP,
            IpProto::Tcp => Self::TCP,
            IpProto::Udp => Self::UDP,
            IpProto::Icmpv6 => Self::ICMPV6,
            IpProto::Other(n) => n,
        }
    }
}

impl From<u8> for IpProto {
    fn from(n: u8) -> IpProto {
        match n {
            Self::ICMP => IpProto::Icmp,
            Self::TCP => IpProto::Tcp,
            Self::UDP => IpProto::Udp,
            Self::ICMPV6 => IpProto::Icmpv6,
            n => IpProto::Other(n),
        }
    }
}

impl std::fmt::Display for IpProto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpProto::Icmp => write!(f, "ICMP"),
            IpProto::Tcp => write!(f, "TCP"),
            IpProto::Udp => write!(f, "UDP"),
            IpProto::Icmpv6 => write!(f, "ICMPv6"),
            IpProto::Other(n) => write!(f, "protocol {n}"),
        }
    }
}

/// An IPv4 header option.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ipv4Option {
    /// Whether this option is copied into all fragments.
    pub copied: bool,
    pub inner: Ipv4OptionInner,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ipv4OptionInner {
    // The maximum IPv4 header is 60 bytes, the fixed prefix is 20, and the
    // kind and length bytes take 2 more, leaving at most 38 bytes of data.
    Unrecognized { kind: u8, len: u8, data: [u8; 38] },
}
