// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Logic codec: the four six-input LUTs of the M and X devices of a logic
//! tile.
//!
//! A LUT slot owns 64 bits interleaved across a pair of minor frames, in the
//! 8 device bytes of its tile (A/B in the upper 4 bytes, C/D in the lower).
//! The frame-side word is the truth table with every minterm index XOR'd by
//! the slot's input-inversion mask; `flip_b0` folds an extra inversion of
//! input 1 into that mask.

use fpga_model::BOT_IO_TILES;
use fpga_model::ColFlags;
use fpga_model::LogicRole;
use fpga_model::LutLetter;
use fpga_model::Model;
use fpga_model::TOP_IO_TILES;
use log::warn;

use crate::frames::FrameBits;
use crate::xc6;
use crate::Error;
use crate::Result;

/// FF-mux word of an instantiated X device in its default configuration,
/// stored as a u64 at frame 26. 21, 22, 36 and 37 are not really default and
/// can go off with the FFMUXes (AFFMUX=b37, BFFMUX=b36, CFFMUX=b22,
/// DFFMUX=b21); only this combination is supported.
const XDEV_GATE_WORD: u64 = 0x0000_00B0_0060_0086;

/// The FF-mux word bits that must be set for the X device to be recognized.
const XDEV_GATE_REQUIRED: [u32; 8] = [1, 2, 7, 21, 22, 36, 37, 39];

/// Frame minor carrying the X-device FF-mux word.
const XDEV_GATE_MINOR: usize = 26;

struct LutSlot {
    role: LogicRole,
    letter: LutLetter,
    /// First minor of the slot's frame pair.
    minor: usize,
    /// Upper or lower 4 device bytes.
    high_half: bool,
    /// Input-inversion mask over the six minterm index bits.
    invert: u8,
    flip_b0: bool,
}

#[rustfmt::skip]
const LUT_SLOTS: [LutSlot; 8] = [
    LutSlot { role: LogicRole::M, letter: LutLetter::A, minor: 24, high_half: true, invert: 0b010010, flip_b0: true },
    LutSlot { role: LogicRole::M, letter: LutLetter::B, minor: 21, high_half: true, invert: 0b101011, flip_b0: true },
    LutSlot { role: LogicRole::M, letter: LutLetter::C, minor: 24, high_half: false, invert: 0b010010, flip_b0: true },
    LutSlot { role: LogicRole::M, letter: LutLetter::D, minor: 21, high_half: false, invert: 0b101011, flip_b0: true },
    LutSlot { role: LogicRole::X, letter: LutLetter::A, minor: 27, high_half: true, invert: 0b011011, flip_b0: false },
    LutSlot { role: LogicRole::X, letter: LutLetter::B, minor: 29, high_half: true, invert: 0b011011, flip_b0: false },
    LutSlot { role: LogicRole::X, letter: LutLetter::C, minor: 27, high_half: false, invert: 0b100010, flip_b0: false },
    LutSlot { role: LogicRole::X, letter: LutLetter::D, minor: 29, high_half: false, invert: 0b100010, flip_b0: false },
];

/// Maps between the frame-side LUT word and its truth table. The mapping is
/// an XOR of the minterm index, so it is its own inverse.
fn permute_lut(word: u64, slot: &LutSlot) -> u64 {
    let xor = usize::from(slot.invert) ^ usize::from(slot.flip_b0);
    let mut out = 0;
    for i in 0..64 {
        if word >> i & 1 != 0 {
            out |= 1u64 << (i ^ xor);
        }
    }
    out
}

fn slot(role: LogicRole, letter: LutLetter) -> &'static LutSlot {
    &LUT_SLOTS[match role {
        LogicRole::M => 0,
        LogicRole::L => unreachable!("L devices have no LUT slots"),
        LogicRole::X => 4,
    } + letter as usize]
}

fn slot_byte_off(slot: &LutSlot, byte_off: usize) -> usize {
    byte_off + if slot.high_half { 4 } else { 0 }
}

fn gate_word_ok(gate: u64) -> bool {
    if XDEV_GATE_REQUIRED.iter().any(|&bit| gate & 1 << bit == 0) {
        return false;
    }
    gate & !XDEV_GATE_WORD == 0
}

pub fn extract_logic(model: &mut Model, bits: &mut FrameBits) -> Result<()> {
    for x in 0..model.x_width() {
        if !model.is_atx(ColFlags::FABRIC_LOGIC | ColFlags::CENTER_LOGIC, x) {
            continue;
        }
        for y in TOP_IO_TILES..model.y_height() - BOT_IO_TILES {
            if !model.has_logic_device(y, x, LogicRole::M) {
                continue;
            }
            let Some((row, row_pos)) = model.pos_in_row(y) else {
                warn!("logic: device tile y{y} x{x} outside any row");
                continue;
            };
            let Some(byte_off) = xc6::tile_frame_byte(row_pos) else {
                warn!("logic: device tile y{y} x{x} on the hclk position");
                continue;
            };
            let major = model.x_major(x);

            // M device.
            for letter in LutLetter::ALL {
                let slot = slot(LogicRole::M, letter);
                let off = slot_byte_off(slot, byte_off);
                if bits.u32_at(row, major, slot.minor, off) == 0
                    && bits.u32_at(row, major, slot.minor + 1, off) == 0
                {
                    continue;
                }
                let table = permute_lut(bits.lut64(row, major, slot.minor, off * 8), slot);
                if table == 0 {
                    continue;
                }
                model.set_lut(y, x, LogicRole::M, letter, &boolexpr::render(table))?;
                bits.set_u32_at(row, major, slot.minor, off, 0);
                bits.set_u32_at(row, major, slot.minor + 1, off, 0);
            }

            // X device, behind its FF-mux gate word.
            let gate = bits.u64_at(row, major, XDEV_GATE_MINOR, byte_off);
            if gate == 0 {
                continue;
            }
            if !gate_word_ok(gate) {
                warn!("logic: unsupported ff-mux word {gate:#018x} at y{y} x{x}");
                continue;
            }
            if !model.has_logic_device(y, x, LogicRole::X) {
                return Err(Error::NoLogicDevice { y, x, role: LogicRole::X });
            }
            bits.set_u64_at(row, major, XDEV_GATE_MINOR, byte_off, 0);

            for letter in LutLetter::ALL {
                let slot = slot(LogicRole::X, letter);
                let off = slot_byte_off(slot, byte_off);
                let table = permute_lut(bits.lut64(row, major, slot.minor, off * 8), slot);
                if table == 0 {
                    continue;
                }
                model.set_lut(y, x, LogicRole::X, letter, &boolexpr::render(table))?;
                bits.set_u32_at(row, major, slot.minor, off, 0);
                bits.set_u32_at(row, major, slot.minor + 1, off, 0);
            }
        }
    }
    Ok(())
}

pub fn write_logic(bits: &mut FrameBits, model: &Model) -> Result<()> {
    for x in 0..model.x_width() {
        let xm_col = model.is_atx(ColFlags::LOGIC_XM, x);
        if !xm_col && !model.is_atx(ColFlags::LOGIC_XL, x) {
            continue;
        }
        for y in TOP_IO_TILES..model.y_height() - BOT_IO_TILES {
            if !model.has_any_logic_device(y, x) {
                continue;
            }
            let Some((row, row_pos)) = model.pos_in_row(y) else {
                warn!("logic: device tile y{y} x{x} outside any row");
                continue;
            };
            let Some(byte_off) = xc6::tile_frame_byte(row_pos) else {
                warn!("logic: device tile y{y} x{x} on the hclk position");
                continue;
            };
            let major = model.x_major(x);

            if xm_col {
                if let Some(dev) = model.logic_device(y, x, LogicRole::X) {
                    if dev.instantiated {
                        bits.set_u64_at(row, major, XDEV_GATE_MINOR, byte_off, XDEV_GATE_WORD);

                        for letter in [LutLetter::A, LutLetter::B, LutLetter::C] {
                            if dev.lut(letter).is_some_and(|expr| !expr.is_empty()) {
                                warn!("logic: X {letter:?} lut not supported at y{y} x{x}");
                            }
                        }
                        if let Some(expr) = dev.lut(LutLetter::D).filter(|expr| !expr.is_empty()) {
                            let table = boolexpr::parse(expr)?;
                            let slot = slot(LogicRole::X, LutLetter::D);
                            bits.set_lut64(
                                row,
                                major,
                                slot.minor,
                                slot_byte_off(slot, byte_off) * 8,
                                permute_lut(table, slot),
                            );
                        }
                    }
                }
                if let Some(dev) = model.logic_device(y, x, LogicRole::M) {
                    if dev.instantiated {
                        warn!("logic: M device not supported at y{y} x{x}");
                    }
                }
            } else {
                for role in [LogicRole::X, LogicRole::L] {
                    if let Some(dev) = model.logic_device(y, x, role) {
                        if dev.instantiated {
                            warn!("logic: {role:?} device in an XL column not supported at y{y} x{x}");
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tile y2 is row 3, position 0 in a 4-row model.
    const Y: usize = 2;
    const X_COL: usize = 1;
    const MAJOR: usize = 2;

    fn xm_model() -> Model {
        let mut model = Model::new(4, 4);
        model.set_col(
            X_COL,
            ColFlags::FABRIC_LOGIC | ColFlags::LOGIC_XM,
            MAJOR,
        );
        model.add_logic_device(Y, X_COL, LogicRole::M);
        model.add_logic_device(Y, X_COL, LogicRole::X);
        model
    }

    #[test]
    fn permute_is_involutive() {
        for slot in &LUT_SLOTS {
            let word = 0x0123_4567_89AB_CDEF;
            assert_eq!(permute_lut(permute_lut(word, slot), slot), word);
        }
    }

    #[test]
    fn x_d_lut_round_trip() {
        let mut model = xm_model();
        model
            .set_lut(Y, X_COL, LogicRole::X, LutLetter::D, "A1*A2")
            .unwrap();
        let mut bits = FrameBits::new();
        write_logic(&mut bits, &model).unwrap();

        // The gate word is written verbatim and the frame pair holds the
        // permuted truth table at the tile's byte offset.
        assert_eq!(bits.u64_at(3, MAJOR, XDEV_GATE_MINOR, 0), XDEV_GATE_WORD);
        let slot = slot(LogicRole::X, LutLetter::D);
        let table = boolexpr::parse("A1*A2").unwrap();
        assert_eq!(
            bits.lut64(3, MAJOR, slot.minor, 0),
            permute_lut(table, slot)
        );

        let mut decoded = xm_model();
        extract_logic(&mut decoded, &mut bits).unwrap();
        assert!(bits.is_all_zero());
        let dev = decoded.logic_device(Y, X_COL, LogicRole::X).unwrap();
        assert!(dev.instantiated);
        let expr = dev.lut(LutLetter::D).unwrap();
        assert_eq!(boolexpr::parse(expr), Ok(table));
    }

    #[test]
    fn m_luts_decode() {
        let mut bits = FrameBits::new();
        let table = boolexpr::parse("~A3+A6").unwrap();
        for letter in LutLetter::ALL {
            let slot = slot(LogicRole::M, letter);
            bits.set_lut64(
                3,
                MAJOR,
                slot.minor,
                slot_byte_off(slot, 0) * 8,
                permute_lut(table, slot),
            );
        }

        let mut model = xm_model();
        extract_logic(&mut model, &mut bits).unwrap();
        assert!(bits.is_all_zero());
        let dev = model.logic_device(Y, X_COL, LogicRole::M).unwrap();
        for letter in LutLetter::ALL {
            assert_eq!(boolexpr::parse(dev.lut(letter).unwrap()), Ok(table));
        }
    }

    #[test]
    fn bad_gate_word_skips_x_device() {
        let mut bits = FrameBits::new();
        // Bit 1 of the required set is missing.
        bits.set_u64_at(3, MAJOR, XDEV_GATE_MINOR, 0, XDEV_GATE_WORD & !0x2);
        let mut model = xm_model();
        extract_logic(&mut model, &mut bits).unwrap();
        assert!(!model.logic_device(Y, X_COL, LogicRole::X).unwrap().instantiated);
        // The unrecognized word is left as residual.
        assert_eq!(bits.u64_at(3, MAJOR, XDEV_GATE_MINOR, 0), XDEV_GATE_WORD & !0x2);

        // A stray bit outside the allowed mask also skips the device.
        bits.set_u64_at(3, MAJOR, XDEV_GATE_MINOR, 0, XDEV_GATE_WORD | 1 << 5);
        extract_logic(&mut model, &mut bits).unwrap();
        assert!(!model.logic_device(Y, X_COL, LogicRole::X).unwrap().instantiated);
    }

    #[test]
    fn gate_word_without_x_device_fails() {
        let mut bits = FrameBits::new();
        bits.set_u64_at(3, MAJOR, XDEV_GATE_MINOR, 0, XDEV_GATE_WORD);
        let mut model = Model::new(4, 4);
        model.set_col(X_COL, ColFlags::FABRIC_LOGIC | ColFlags::LOGIC_XM, MAJOR);
        model.add_logic_device(Y, X_COL, LogicRole::M);
        assert_eq!(
            extract_logic(&mut model, &mut bits),
            Err(Error::NoLogicDevice {
                y: Y,
                x: X_COL,
                role: LogicRole::X
            })
        );
    }

    #[test]
    fn hclk_tile_is_skipped() {
        // y10 is the hclk position of the top row.
        let mut model = Model::new(4, 4);
        model.set_col(X_COL, ColFlags::FABRIC_LOGIC | ColFlags::LOGIC_XM, MAJOR);
        model.add_logic_device(10, X_COL, LogicRole::M);
        model.add_logic_device(10, X_COL, LogicRole::X);
        model
            .set_lut(10, X_COL, LogicRole::X, LutLetter::D, "A1")
            .unwrap();
        let mut bits = FrameBits::new();
        write_logic(&mut bits, &model).unwrap();
        assert!(bits.is_all_zero());
        extract_logic(&mut model, &mut bits).unwrap();
    }

    #[test]
    fn unsupported_x_luts_write_nothing() {
        let mut model = xm_model();
        model
            .set_lut(Y, X_COL, LogicRole::X, LutLetter::A, "A1")
            .unwrap();
        let mut bits = FrameBits::new();
        write_logic(&mut bits, &model).unwrap();
        // Only the gate word appears.
        assert_eq!(bits.u64_at(3, MAJOR, XDEV_GATE_MINOR, 0), XDEV_GATE_WORD);
        bits.set_u64_at(3, MAJOR, XDEV_GATE_MINOR, 0, 0);
        assert!(bits.is_all_zero());
    }
}
