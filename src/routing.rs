// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Routing-switch codec, driven by the model's bit-position database.
//!
//! A bit-position record enables one directed switch through a 2-bit
//! selector plus a single bit. With `minor == 20` all three live in that one
//! frame: the selector at `two_bits_o` (MSB) and `two_bits_o + 1` (LSB), the
//! single bit at `one_bit_o`. Otherwise the selector is split across the
//! `minor`/`minor + 1` pair at bit `two_bits_o / 2` (MSB in `minor`) and the
//! single bit sits in `minor + (one_bit_o & 1)` at bit `one_bit_o / 2`. A
//! switch is present iff the selector equals `two_bits_val` and the single
//! bit is set.

use fpga_model::BOT_IO_TILES;
use fpga_model::ColFlags;
use fpga_model::Model;
use fpga_model::RoutingBitPos;
use fpga_model::RowFlags;
use fpga_model::TOP_IO_TILES;
use log::warn;

use crate::frames::BitPos;
use crate::frames::FrameBits;
use crate::xc6;
use crate::Error;
use crate::Result;

/// Soft cap on switches collected by one extract pass.
pub const MAX_YX_SWITCHES: usize = 1024;

/// Fully extracted switches pointing into the model, collected for later
/// processing into nets.
#[derive(Default)]
pub struct ExtractState {
    switches: Vec<(usize, usize, usize)>,
}

impl ExtractState {
    fn record(&mut self, y: usize, x: usize, idx: usize) -> Result<()> {
        if self.switches.len() >= MAX_YX_SWITCHES {
            return Err(Error::SwitchOverflow);
        }
        self.switches.push((y, x, idx));
        Ok(())
    }

    pub fn into_switches(self) -> Vec<(usize, usize, usize)> {
        self.switches
    }
}

/// First device bit of tile `y` within its frames.
fn start_in_frame(model: &Model, y: usize) -> Result<(usize, usize)> {
    let (row, row_pos) = model.pos_in_row(y).ok_or(Error::UnaddressableRow(y))?;
    let byte_off = xc6::tile_frame_byte(row_pos).ok_or(Error::UnaddressableRow(y))?;
    Ok((row, byte_off * 8))
}

fn bitpos_is_set(
    bits: &FrameBits,
    model: &Model,
    y: usize,
    x: usize,
    pos: &RoutingBitPos,
) -> Result<bool> {
    let (row, start) = start_in_frame(model, y)?;
    let major = model.x_major(x);
    let minor = pos.minor as usize;
    let at = |minor: usize, bit: usize| bits.get(BitPos { row, major, minor, bit });

    let (two_bits_val, one_bit) = if minor == 20 {
        (
            (at(minor, start + pos.two_bits_o as usize) as u8) << 1
                | at(minor, start + pos.two_bits_o as usize + 1) as u8,
            at(minor, start + pos.one_bit_o as usize),
        )
    } else {
        (
            (at(minor, start + pos.two_bits_o as usize / 2) as u8) << 1
                | at(minor + 1, start + pos.two_bits_o as usize / 2) as u8,
            at(
                minor + (pos.one_bit_o & 1) as usize,
                start + pos.one_bit_o as usize / 2,
            ),
        )
    };
    Ok(two_bits_val == pos.two_bits_val && one_bit)
}

fn bitpos_set_bits(
    bits: &mut FrameBits,
    model: &Model,
    y: usize,
    x: usize,
    pos: &RoutingBitPos,
) -> Result<()> {
    let (row, start) = start_in_frame(model, y)?;
    let major = model.x_major(x);
    let minor = pos.minor as usize;

    if minor == 20 {
        if pos.two_bits_val & 0x02 != 0 {
            bits.set(BitPos { row, major, minor, bit: start + pos.two_bits_o as usize });
        }
        if pos.two_bits_val & 0x01 != 0 {
            bits.set(BitPos { row, major, minor, bit: start + pos.two_bits_o as usize + 1 });
        }
        bits.set(BitPos { row, major, minor, bit: start + pos.one_bit_o as usize });
    } else {
        if pos.two_bits_val & 0x02 != 0 {
            bits.set(BitPos { row, major, minor, bit: start + pos.two_bits_o as usize / 2 });
        }
        if pos.two_bits_val & 0x01 != 0 {
            bits.set(BitPos {
                row,
                major,
                minor: minor + 1,
                bit: start + pos.two_bits_o as usize / 2,
            });
        }
        bits.set(BitPos {
            row,
            major,
            minor: minor + (pos.one_bit_o & 1) as usize,
            bit: start + pos.one_bit_o as usize / 2,
        });
    }
    Ok(())
}

fn bitpos_clear_bits(
    bits: &mut FrameBits,
    model: &Model,
    y: usize,
    x: usize,
    pos: &RoutingBitPos,
) -> Result<()> {
    let (row, start) = start_in_frame(model, y)?;
    let major = model.x_major(x);
    let minor = pos.minor as usize;

    if minor == 20 {
        bits.clear(BitPos { row, major, minor, bit: start + pos.two_bits_o as usize });
        bits.clear(BitPos { row, major, minor, bit: start + pos.two_bits_o as usize + 1 });
        bits.clear(BitPos { row, major, minor, bit: start + pos.one_bit_o as usize });
    } else {
        bits.clear(BitPos { row, major, minor, bit: start + pos.two_bits_o as usize / 2 });
        bits.clear(BitPos {
            row,
            major,
            minor: minor + 1,
            bit: start + pos.two_bits_o as usize / 2,
        });
        bits.clear(BitPos {
            row,
            major,
            minor: minor + (pos.one_bit_o & 1) as usize,
            bit: start + pos.one_bit_o as usize / 2,
        });
    }
    Ok(())
}

/// Finds the bit-position record for switch `idx` of tile `(y, x)`, honoring
/// bidirectional records in either orientation.
fn find_bitpos(model: &Model, y: usize, x: usize, idx: usize) -> Option<usize> {
    let sw = model.switch(y, x, idx)?;
    for (i, pos) in model.bitpos().iter().enumerate() {
        if pos.from == sw.from && pos.to == sw.to {
            return Some(i);
        }
        if pos.bidir && pos.from == sw.to && pos.to == sw.from {
            if !sw.is_bidir() {
                warn!(
                    "routing: bidirectional record matches unidirectional switch {} -> {} at y{y} x{x}",
                    model.wires().name(sw.from),
                    model.wires().name(sw.to)
                );
            }
            return Some(i);
        }
    }
    warn!(
        "routing: switch {} -> {} at y{y} x{x} not in the bit-position database",
        model.wires().name(sw.from),
        model.wires().name(sw.to)
    );
    None
}

fn routing_tile(model: &Model, y: usize, x: usize) -> bool {
    model.is_atx(ColFlags::ROUTING, x)
        && y >= TOP_IO_TILES
        && y < model.y_height() - BOT_IO_TILES
        && !model.is_aty(RowFlags::ROW_HORIZ_AXIS | RowFlags::CHIP_HORIZ_REGS, y)
}

pub fn write_switches(bits: &mut FrameBits, model: &Model) -> Result<()> {
    for x in 0..model.x_width() {
        for y in 0..model.y_height() {
            if !routing_tile(model, y, x) {
                continue;
            }
            for idx in 0..model.switches(y, x).len() {
                let Some(sw) = model.switch(y, x, idx) else {
                    continue;
                };
                if !sw.is_used() {
                    continue;
                }
                let Some(i) = find_bitpos(model, y, x, idx) else {
                    continue;
                };
                let pos = model.bitpos()[i];
                bitpos_set_bits(bits, model, y, x, &pos)?;
            }
        }
    }
    Ok(())
}

fn extract_routing_switches(
    es: &mut ExtractState,
    model: &Model,
    bits: &mut FrameBits,
    y: usize,
    x: usize,
) -> Result<()> {
    for i in 0..model.bitpos().len() {
        let pos = model.bitpos()[i];
        if !bitpos_is_set(bits, model, y, x, &pos)? {
            continue;
        }

        let idx = model
            .switch_lookup(y, x, pos.from, pos.to)
            .ok_or_else(|| Error::SwitchNotInModel {
                y,
                x,
                from: model.wires().name(pos.from).to_string(),
                to: model.wires().name(pos.to).to_string(),
            })?;
        // TODO: also try the reverse orientation of bidir records here.
        if let Some(sw) = model.switch(y, x, idx) {
            if sw.is_bidir() {
                warn!("routing: extracted switch {idx} at y{y} x{x} is bidirectional");
            }
            if sw.is_used() {
                warn!("routing: extracted switch {idx} at y{y} x{x} already used");
            }
        }
        es.record(y, x, idx)?;
        bitpos_clear_bits(bits, model, y, x, &pos)?;
    }
    Ok(())
}

pub fn extract_switches(
    es: &mut ExtractState,
    model: &Model,
    bits: &mut FrameBits,
) -> Result<()> {
    for x in 0..model.x_width() {
        for y in 0..model.y_height() {
            if routing_tile(model, y, x) {
                extract_routing_switches(es, model, bits, y, x)?;
            }
        }
    }
    Ok(())
}
