// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Tiles, switches, and the row/column classification flags.

use bitflags::bitflags;

use crate::devices::IobDevice;
use crate::devices::LogicDevice;
use crate::wires::WireId;

bitflags! {
    /// Per-switch state bits. The numeric values are part of the model's
    /// on-disk and in-memory contract and must not change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SwitchFlags: u32 {
        /// The switch is enabled and belongs to a net.
        const USED = 1 << 31;
        /// The switch can be driven from either end.
        const BIDIRECTIONAL = 1 << 30;
    }
}

bitflags! {
    /// Column classification checks, combined with OR logic.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ColFlags: u32 {
        /// Any routing column, including the left/right I/O and center ones.
        const ROUTING = 0x0000_0010;
        /// Fabric logic column.
        const FABRIC_LOGIC = 0x0000_0200;
        /// The center logic column.
        const CENTER_LOGIC = 0x0000_4000;
        /// Fabric logic column carrying X+M devices.
        const LOGIC_XM = 0x0040_0000;
        /// Fabric logic column carrying X+L devices.
        const LOGIC_XL = 0x0080_0000;
    }
}

bitflags! {
    /// Row classification checks, combined with OR logic.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RowFlags: u16 {
        /// The chip's center register row.
        const CHIP_HORIZ_REGS = 0x0004;
        /// The horizontal-clock row in the middle of a configuration row.
        const ROW_HORIZ_AXIS = 0x0008;
    }
}

/// A directed programmable interconnect point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switch {
    pub from: WireId,
    pub to: WireId,
    pub flags: SwitchFlags,
}

impl Switch {
    pub fn is_used(&self) -> bool {
        self.flags.contains(SwitchFlags::USED)
    }

    pub fn is_bidir(&self) -> bool {
        self.flags.contains(SwitchFlags::BIDIRECTIONAL)
    }
}

/// One grid position. Only the device and switch lists the frame codec
/// touches are modelled; connection points and static wiring are not.
#[derive(Debug, Default)]
pub struct Tile {
    pub logic: Vec<LogicDevice>,
    pub iobs: Vec<IobDevice>,
    pub switches: Vec<Switch>,
}
