// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Deserialization of wire formats.
//!
//! This module provides deserialization of the various wire formats this
//! crate decodes. Where possible, it uses lifetimes and immutability to allow
//! for safe zero-copy parsing.

pub mod ethernet;
pub mod icmp;
pub mod ipv4;
pub mod ipv6;
pub mod tcp;
pub mod udp;
pub mod util;

pub use self::ethernet::EthernetFrame;
pub use self::icmp::IcmpPacket;
pub use self::ipv4::Ipv4Packet;
pub use self::ipv6::Ipv6Packet;
pub use self::tcp::TcpSegment;
pub use self::udp::UdpPacket;
