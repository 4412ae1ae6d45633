// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Errors surfaced by the per-protocol decoders.
//!
//! Every decoder maps its failure modes into [`ParseError`]. An unrecognized
//! protocol number is deliberately *not* represented here: running out of
//! registered decoders ends the pipeline successfully (see
//! [`crate::packet::TransportLayer::Unknown`]), it does not fail it.

use thiserror::Error;

/// A structural decoding failure in one protocol layer.
///
/// A `ParseError` means a layer that *was* identified as a given protocol
/// failed its own validation. It aborts the remainder of the decode call for
/// that frame only; other frames are unaffected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A fixed header or a declared header length does not fit in the bytes
    /// actually available.
    #[error("truncated: need {required} bytes, have {available}")]
    Truncated {
        /// Bytes the header layout requires.
        required: usize,
        /// Bytes present in the slice handed to the decoder.
        available: usize,
    },

    /// The version nibble does not match the decoder that was invoked.
    #[error("invalid version: expected {expected}, found {found}")]
    InvalidVersion {
        /// Version the decoder handles.
        expected: u8,
        /// Version found in the header.
        found: u8,
    },

    /// A length field is internally inconsistent, e.g. an IPv4 IHL below 5 or
    /// a total length smaller than the header it describes.
    #[error("invalid header length: declared {declared} bytes, minimum {minimum}")]
    InvalidHeaderLength {
        /// Length the header claims, in bytes.
        declared: usize,
        /// Smallest length that would be consistent.
        minimum: usize,
    },

    /// A kind/length-encoded option inside an otherwise valid header is
    /// malformed (an inner length of < 2 or one running past the options
    /// region).
    #[error("malformed header options")]
    MalformedOptions,
}
