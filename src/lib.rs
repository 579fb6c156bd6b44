// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Bitstream frame codec for the XC6SLX9.
//!
//! Transforms between an in-memory device model and the flat configuration
//! frame buffer, in both directions: [`write_model`] encodes the model's
//! I/O blocks, logic LUTs, and routing switches into an all-zero buffer, and
//! [`extract_model`] rebuilds the model from a buffer while zeroing every bit
//! it consumed, so that leftovers mark unrecognized encodings. Serializing
//! the buffer into the chip's on-wire container format is downstream of this
//! crate.

mod codec;
mod frames;
mod iob;
mod logic;
mod routing;
pub mod xc6;

use remain::sorted;
use thiserror::Error;

pub use crate::codec::extract_model;
pub use crate::codec::write_model;
pub use crate::frames::BitPos;
pub use crate::frames::FrameBits;
pub use crate::routing::MAX_YX_SWITCHES;

#[sorted]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("frame buffer is {got} bytes, expected {expected}")]
    BufferSize { expected: usize, got: usize },
    #[error("default bit not set: {0}")]
    DefaultBitClear(BitPos),
    #[error("boolean expression: {0}")]
    Expression(#[from] boolexpr::Error),
    #[error("device model: {0}")]
    Model(#[from] fpga_model::Error),
    #[error("no {role:?} logic device in tile y{y} x{x}")]
    NoLogicDevice {
        y: usize,
        x: usize,
        role: fpga_model::LogicRole,
    },
    #[error("switch {from} -> {to} at y{y} x{x} not in the model")]
    SwitchNotInModel {
        y: usize,
        x: usize,
        from: String,
        to: String,
    },
    #[error("more than {MAX_YX_SWITCHES} switches in one extract")]
    SwitchOverflow,
    #[error("tile row y{0} has no frame address")]
    UnaddressableRow(usize),
    #[error("no I/O site {0} in the model")]
    UnknownSite(String),
}

pub type Result<T> = std::result::Result<T, Error>;
