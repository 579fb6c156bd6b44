// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! I/O block codec: one 8-byte entry per bonded pad.

use fpga_model::BypassMux;
use fpga_model::IMux;
use fpga_model::IO_LVCMOS33;
use fpga_model::Model;
use fpga_model::Slew;
use fpga_model::Suspend;
use log::debug;
use log::warn;

use crate::frames::FrameBits;
use crate::xc6;
use crate::Error;
use crate::Result;

/// Bit 7 of entry word 0 is ignored when matching; it has been seen toggling
/// with the state of the output net.
const W0_IGNORE_MASK: u32 = 0xFFFF_FF7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IobKind {
    Output,
    Input,
}

struct IobPattern {
    kind: IobKind,
    /// Word 0 as written on encode.
    w0_write: u32,
    /// Word 0 after `W0_IGNORE_MASK`, as matched on decode.
    w0_match: u32,
    w1: u32,
}

/// The two entry shapes this codec version supports, indexed by `IobKind`.
const IOB_PATTERNS: [IobPattern; 2] = [
    IobPattern {
        kind: IobKind::Output,
        w0_write: 0x0000_0180,
        w0_match: 0x0000_0100,
        w1: 0x0600_1100,
    },
    IobPattern {
        kind: IobKind::Input,
        w0_write: 0x0000_0107,
        w0_match: 0x0000_0107,
        w1: 0x0B00_2400,
    },
];

fn pattern(kind: IobKind) -> &'static IobPattern {
    let pat = &IOB_PATTERNS[kind as usize];
    debug_assert_eq!(pat.kind, kind);
    pat
}

pub fn write_iobs(bits: &mut FrameBits, model: &Model) -> Result<()> {
    for site in model.iob_sites() {
        let Some(dev) = model.iob_device(site.y, site.x, site.type_idx) else {
            continue;
        };
        if !dev.instantiated {
            continue;
        }
        let Some(part_idx) = xc6::iob_part_index(&site.name) else {
            warn!(
                "iob: site {} at y{} x{} is not a bonded pad",
                site.name, site.y, site.x
            );
            continue;
        };
        if dev.o_used {
            let pat = pattern(IobKind::Output);
            bits.set_iob_entry(part_idx, pat.w0_write, pat.w1);
        } else if dev.i_mux == Some(IMux::I) {
            let pat = pattern(IobKind::Input);
            bits.set_iob_entry(part_idx, pat.w0_write, pat.w1);
        } else {
            debug!(
                "iob: configuration of site {} at y{} x{} not supported",
                site.name, site.y, site.x
            );
        }
    }
    Ok(())
}

pub fn extract_iobs(model: &mut Model, bits: &mut FrameBits) -> Result<()> {
    for (part_idx, &name) in xc6::IOB_SITES.iter().enumerate() {
        let (w0, w1) = bits.iob_entry(part_idx);
        if w0 == 0 && w1 == 0 {
            continue;
        }
        let site = model
            .find_iob(name)
            .ok_or_else(|| Error::UnknownSite(name.to_string()))?;
        let (y, x, type_idx) = (site.y, site.x, site.type_idx);
        let Some(dev) = model.iob_device_mut(y, x, type_idx) else {
            warn!("iob: no device for site {name} at y{y} x{x}");
            continue;
        };

        let w0_masked = w0 & W0_IGNORE_MASK;
        if w0_masked == pattern(IobKind::Output).w0_match && w1 == pattern(IobKind::Output).w1 {
            dev.instantiated = true;
            dev.ostandard = Some(IO_LVCMOS33.to_string());
            dev.drive_strength = Some(12);
            dev.o_used = true;
            dev.slew = Some(Slew::Slow);
            dev.suspend = Some(Suspend::ThreeState);
            bits.set_iob_entry(part_idx, 0, 0);
        } else if w0_masked == pattern(IobKind::Input).w0_match && w1 == pattern(IobKind::Input).w1
        {
            dev.instantiated = true;
            dev.istandard = Some(IO_LVCMOS33.to_string());
            dev.bypass_mux = Some(BypassMux::I);
            dev.i_mux = Some(IMux::I);
            bits.set_iob_entry(part_idx, 0, 0);
        } else {
            // Leave the entry in place; it will surface as residual bytes.
            warn!("iob: unrecognized entry {w0:#010x} {w1:#010x} at site {name}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpga_model::IobDevice;

    fn model_with_site(name: &str) -> (Model, usize) {
        let mut model = Model::new(4, 4);
        let type_idx = model.add_iob_site(name, 0, 1);
        (model, type_idx)
    }

    #[test]
    fn output_site_round_trip() {
        let (mut model, type_idx) = model_with_site("P1");
        {
            let dev = model.iob_device_mut(0, 1, type_idx).unwrap();
            dev.instantiated = true;
            dev.o_used = true;
        }
        let mut bits = FrameBits::new();
        write_iobs(&mut bits, &model).unwrap();
        assert_eq!(bits.iob_entry(0), (0x0000_0180, 0x0600_1100));

        let (mut decoded, type_idx) = model_with_site("P1");
        extract_iobs(&mut decoded, &mut bits).unwrap();
        assert!(bits.is_all_zero());
        assert_eq!(
            decoded.iob_device(0, 1, type_idx).unwrap(),
            &IobDevice {
                instantiated: true,
                o_used: true,
                ostandard: Some(IO_LVCMOS33.to_string()),
                drive_strength: Some(12),
                slew: Some(Slew::Slow),
                suspend: Some(Suspend::ThreeState),
                ..Default::default()
            }
        );
    }

    #[test]
    fn input_site_round_trip() {
        let (mut model, type_idx) = model_with_site("P2");
        {
            let dev = model.iob_device_mut(0, 1, type_idx).unwrap();
            dev.instantiated = true;
            dev.i_mux = Some(IMux::I);
        }
        let mut bits = FrameBits::new();
        write_iobs(&mut bits, &model).unwrap();
        assert_eq!(bits.iob_entry(1), (0x0000_0107, 0x0B00_2400));

        let (mut decoded, type_idx) = model_with_site("P2");
        extract_iobs(&mut decoded, &mut bits).unwrap();
        assert!(bits.is_all_zero());
        let dev = decoded.iob_device(0, 1, type_idx).unwrap();
        assert!(dev.instantiated);
        assert_eq!(dev.istandard.as_deref(), Some(IO_LVCMOS33));
        assert_eq!(dev.bypass_mux, Some(BypassMux::I));
        assert_eq!(dev.i_mux, Some(IMux::I));
    }

    #[test]
    fn word0_bit7_is_ignored_on_decode() {
        let (mut model, type_idx) = model_with_site("P1");
        let mut bits = FrameBits::new();
        bits.set_iob_entry(0, 0x0000_0100, 0x0600_1100);
        extract_iobs(&mut model, &mut bits).unwrap();
        assert!(model.iob_device(0, 1, type_idx).unwrap().o_used);
        assert!(bits.is_all_zero());
    }

    #[test]
    fn unrecognized_entry_is_left_in_place() {
        let (mut model, type_idx) = model_with_site("P1");
        let mut bits = FrameBits::new();
        bits.set_iob_entry(0, 0xDEAD_BEEF, 0x0000_0001);
        extract_iobs(&mut model, &mut bits).unwrap();
        assert!(!model.iob_device(0, 1, type_idx).unwrap().instantiated);
        assert_eq!(bits.iob_entry(0), (0xDEAD_BEEF, 0x0000_0001));
    }

    #[test]
    fn entry_without_model_site_fails() {
        let mut model = Model::new(4, 4);
        let mut bits = FrameBits::new();
        bits.set_iob_entry(3, 0x0000_0107, 0x0B00_2400);
        assert!(matches!(
            extract_iobs(&mut model, &mut bits),
            Err(Error::UnknownSite(name)) if name == "P5"
        ));
    }

    #[test]
    fn uninstantiated_devices_are_skipped() {
        let (model, _) = model_with_site("P1");
        let mut bits = FrameBits::new();
        write_iobs(&mut bits, &model).unwrap();
        assert!(bits.is_all_zero());
    }
}
