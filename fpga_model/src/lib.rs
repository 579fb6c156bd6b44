// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! In-memory device model of a Spartan-6 class FPGA.
//!
//! This crate carries the model-facing interface the bitstream frame codec
//! consumes: a tile grid with logic and I/O block devices, directed routing
//! switches over interned wire names, the switch-to-frame-bit position
//! database, and single-switch nets. Building a full chip model (wire graph,
//! connection points, floorplan text) is out of scope; the construction
//! helpers here cover what tools and tests need to assemble one.

mod devices;
mod tiles;
mod wires;

use remain::sorted;
use thiserror::Error;

pub use crate::devices::BypassMux;
pub use crate::devices::IMux;
pub use crate::devices::IO_LVCMOS33;
pub use crate::devices::IobDevice;
pub use crate::devices::LogicDevice;
pub use crate::devices::LogicRole;
pub use crate::devices::LutLetter;
pub use crate::devices::Slew;
pub use crate::devices::Suspend;
pub use crate::tiles::ColFlags;
pub use crate::tiles::RowFlags;
pub use crate::tiles::Switch;
pub use crate::tiles::SwitchFlags;
pub use crate::tiles::Tile;
pub use crate::wires::WireId;
pub use crate::wires::WireSet;

/// I/O tile rows above the fabric.
pub const TOP_IO_TILES: usize = 2;
/// I/O tile rows below the fabric.
pub const BOT_IO_TILES: usize = 2;
/// Tile positions per configuration row, including the HCLK position.
pub const ROW_POSITIONS: usize = 17;
/// The mid-row horizontal-clock position. It carries no device bits.
pub const HCLK_POS: usize = 8;

#[sorted]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("no {role:?} logic device in tile y{y} x{x}")]
    NoSuchDevice { y: usize, x: usize, role: LogicRole },
    #[error("no net {0}")]
    NoSuchNet(usize),
    #[error("no switch {idx} in tile y{y} x{x}")]
    NoSuchSwitch { y: usize, x: usize, idx: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// An I/O block site: a stable name bound to a tile position and the device
/// index within that tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IobSite {
    pub name: String,
    pub y: usize,
    pub x: usize,
    pub type_idx: usize,
}

/// A net, modelled as the list of switches it owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Net {
    pub switches: Vec<(usize, usize, usize)>,
}

/// One record of the routing bit-position database: the frame bits that
/// enable the directed switch `from -> to` in a routing tile.
///
/// `minor == 20` places the 2-bit selector at `two_bits_o`/`two_bits_o + 1`
/// and the one-bit at `one_bit_o` within that single frame; any other minor
/// splits the selector across `minor` (MSB) and `minor + 1` (LSB) at bit
/// `two_bits_o / 2` and puts the one-bit in `minor + (one_bit_o & 1)` at bit
/// `one_bit_o / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingBitPos {
    pub from: WireId,
    pub to: WireId,
    pub bidir: bool,
    pub minor: u8,
    pub two_bits_o: u16,
    pub two_bits_val: u8,
    pub one_bit_o: u16,
}

/// The device model: a `y_height * x_width` tile grid plus the global wire
/// registry, bit-position database, and net list.
///
/// The vertical layout is fixed by the chip family: `TOP_IO_TILES` I/O rows,
/// `num_rows` configuration rows of `ROW_POSITIONS` tiles each (numbered
/// bottom-up), one center register row between the two halves, and
/// `BOT_IO_TILES` I/O rows.
#[derive(Debug)]
pub struct Model {
    x_width: usize,
    num_rows: usize,
    tiles: Vec<Tile>,
    col_flags: Vec<ColFlags>,
    x_major: Vec<usize>,
    wires: WireSet,
    bitpos: Vec<RoutingBitPos>,
    iob_sites: Vec<IobSite>,
    nets: Vec<Net>,
}

impl Model {
    pub fn new(x_width: usize, num_rows: usize) -> Self {
        let y_height = TOP_IO_TILES + num_rows * ROW_POSITIONS + 1 + BOT_IO_TILES;
        let mut tiles = Vec::new();
        tiles.resize_with(y_height * x_width, Tile::default);
        Self {
            x_width,
            num_rows,
            tiles,
            col_flags: vec![ColFlags::empty(); x_width],
            x_major: vec![0; x_width],
            wires: WireSet::default(),
            bitpos: Vec::new(),
            iob_sites: Vec::new(),
            nets: Vec::new(),
        }
    }

    pub fn x_width(&self) -> usize {
        self.x_width
    }

    pub fn y_height(&self) -> usize {
        TOP_IO_TILES + self.num_rows * ROW_POSITIONS + 1 + BOT_IO_TILES
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn center_regs_y(&self) -> usize {
        TOP_IO_TILES + (self.num_rows / 2) * ROW_POSITIONS
    }

    fn tile(&self, y: usize, x: usize) -> &Tile {
        &self.tiles[y * self.x_width + x]
    }

    fn tile_mut(&mut self, y: usize, x: usize) -> &mut Tile {
        &mut self.tiles[y * self.x_width + x]
    }

    /// Classifies column `x` and assigns its configuration major.
    pub fn set_col(&mut self, x: usize, flags: ColFlags, major: usize) {
        self.col_flags[x] = flags;
        self.x_major[x] = major;
    }

    /// True if column `x` matches any of the checks in `flags`.
    pub fn is_atx(&self, flags: ColFlags, x: usize) -> bool {
        self.col_flags[x].intersects(flags)
    }

    /// True if row `y` matches any of the checks in `flags`.
    pub fn is_aty(&self, flags: RowFlags, y: usize) -> bool {
        if flags.contains(RowFlags::CHIP_HORIZ_REGS) && y == self.center_regs_y() {
            return true;
        }
        if flags.contains(RowFlags::ROW_HORIZ_AXIS) {
            if let Some((_, row_pos)) = self.pos_in_row(y) {
                if row_pos == HCLK_POS {
                    return true;
                }
            }
        }
        false
    }

    /// Maps tile row `y` to `(row, row_pos)`, or `None` for the I/O rings and
    /// the center register row. Configuration rows are numbered bottom-up;
    /// `row_pos` runs top-down within the row and includes `HCLK_POS`.
    pub fn pos_in_row(&self, y: usize) -> Option<(usize, usize)> {
        if y < TOP_IO_TILES {
            return None;
        }
        let regs_y = self.center_regs_y();
        if y == regs_y {
            return None;
        }
        let mut fy = y - TOP_IO_TILES;
        if y > regs_y {
            fy -= 1;
        }
        if fy >= self.num_rows * ROW_POSITIONS {
            return None;
        }
        let row = self.num_rows - 1 - fy / ROW_POSITIONS;
        Some((row, fy % ROW_POSITIONS))
    }

    /// The configuration major of column `x`.
    pub fn x_major(&self, x: usize) -> usize {
        self.x_major[x]
    }

    pub fn wires(&self) -> &WireSet {
        &self.wires
    }

    // I/O block sites and devices.

    /// Registers an I/O site named `name` and its device in tile `(y, x)`.
    /// Returns the type index of the new device within the tile.
    pub fn add_iob_site(&mut self, name: &str, y: usize, x: usize) -> usize {
        let tile = self.tile_mut(y, x);
        let type_idx = tile.iobs.len();
        tile.iobs.push(IobDevice::default());
        self.iob_sites.push(IobSite {
            name: name.to_string(),
            y,
            x,
            type_idx,
        });
        type_idx
    }

    pub fn iob_sites(&self) -> &[IobSite] {
        &self.iob_sites
    }

    pub fn find_iob(&self, name: &str) -> Option<&IobSite> {
        self.iob_sites.iter().find(|site| site.name == name)
    }

    pub fn iob_device(&self, y: usize, x: usize, type_idx: usize) -> Option<&IobDevice> {
        self.tile(y, x).iobs.get(type_idx)
    }

    pub fn iob_device_mut(&mut self, y: usize, x: usize, type_idx: usize) -> Option<&mut IobDevice> {
        self.tile_mut(y, x).iobs.get_mut(type_idx)
    }

    // Logic devices.

    pub fn add_logic_device(&mut self, y: usize, x: usize, role: LogicRole) {
        self.tile_mut(y, x).logic.push(LogicDevice::new(role));
    }

    pub fn logic_device(&self, y: usize, x: usize, role: LogicRole) -> Option<&LogicDevice> {
        self.tile(y, x).logic.iter().find(|dev| dev.role == role)
    }

    pub fn logic_device_mut(
        &mut self,
        y: usize,
        x: usize,
        role: LogicRole,
    ) -> Option<&mut LogicDevice> {
        self.tile_mut(y, x)
            .logic
            .iter_mut()
            .find(|dev| dev.role == role)
    }

    pub fn has_logic_device(&self, y: usize, x: usize, role: LogicRole) -> bool {
        self.logic_device(y, x, role).is_some()
    }

    pub fn has_any_logic_device(&self, y: usize, x: usize) -> bool {
        !self.tile(y, x).logic.is_empty()
    }

    /// Stores a LUT expression on a logic device and marks it instantiated.
    pub fn set_lut(
        &mut self,
        y: usize,
        x: usize,
        role: LogicRole,
        letter: LutLetter,
        expr: &str,
    ) -> Result<()> {
        let dev = self
            .logic_device_mut(y, x, role)
            .ok_or(Error::NoSuchDevice { y, x, role })?;
        dev.instantiated = true;
        dev.luts[letter as usize] = Some(expr.to_string());
        Ok(())
    }

    // Switches.

    /// Adds a switch `from -> to` to tile `(y, x)`, interning both wire
    /// names. Returns the switch index within the tile.
    pub fn add_switch(&mut self, y: usize, x: usize, from: &str, to: &str, bidir: bool) -> usize {
        let from = self.wires.intern(from);
        let to = self.wires.intern(to);
        let flags = if bidir {
            SwitchFlags::BIDIRECTIONAL
        } else {
            SwitchFlags::empty()
        };
        let tile = self.tile_mut(y, x);
        tile.switches.push(Switch { from, to, flags });
        tile.switches.len() - 1
    }

    pub fn switches(&self, y: usize, x: usize) -> &[Switch] {
        &self.tile(y, x).switches
    }

    pub fn switch(&self, y: usize, x: usize, idx: usize) -> Option<&Switch> {
        self.tile(y, x).switches.get(idx)
    }

    pub fn switch_mut(&mut self, y: usize, x: usize, idx: usize) -> Option<&mut Switch> {
        self.tile_mut(y, x).switches.get_mut(idx)
    }

    /// Finds the switch `from -> to` in tile `(y, x)`.
    pub fn switch_lookup(&self, y: usize, x: usize, from: WireId, to: WireId) -> Option<usize> {
        self.tile(y, x)
            .switches
            .iter()
            .position(|sw| sw.from == from && sw.to == to)
    }

    // Routing bit-position database.

    /// Appends one bit-position record, interning the wire names.
    #[allow(clippy::too_many_arguments)]
    pub fn add_bitpos(
        &mut self,
        from: &str,
        to: &str,
        bidir: bool,
        minor: u8,
        two_bits_o: u16,
        two_bits_val: u8,
        one_bit_o: u16,
    ) {
        let from = self.wires.intern(from);
        let to = self.wires.intern(to);
        self.bitpos.push(RoutingBitPos {
            from,
            to,
            bidir,
            minor,
            two_bits_o,
            two_bits_val,
            one_bit_o,
        });
    }

    pub fn bitpos(&self) -> &[RoutingBitPos] {
        &self.bitpos
    }

    // Nets.

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    pub fn net_new(&mut self) -> usize {
        self.nets.push(Net::default());
        self.nets.len() - 1
    }

    /// Adds switch `(y, x, idx)` to a net and marks the switch used.
    pub fn net_add_switch(&mut self, net: usize, y: usize, x: usize, idx: usize) -> Result<()> {
        if net >= self.nets.len() {
            return Err(Error::NoSuchNet(net));
        }
        let sw = self
            .switch_mut(y, x, idx)
            .ok_or(Error::NoSuchSwitch { y, x, idx })?;
        sw.flags |= SwitchFlags::USED;
        self.nets[net].switches.push((y, x, idx));
        Ok(())
    }
}
