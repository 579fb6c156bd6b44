// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Top-level codec entry points.

use fpga_model::Model;
use log::warn;

use crate::frames::FrameBits;
use crate::iob;
use crate::logic;
use crate::routing;
use crate::routing::ExtractState;
use crate::xc6;
use crate::Error;
use crate::Result;

/// Encodes `model` into `bits`. The buffer is expected to be all zero; the
/// result is exactly the default bits plus the encoding of the model.
pub fn write_model(bits: &mut FrameBits, model: &Model) -> Result<()> {
    for pos in xc6::DEFAULT_BITS {
        bits.set(pos);
    }
    routing::write_switches(bits, model)?;
    iob::write_iobs(bits, model)?;
    logic::write_logic(bits, model)?;
    Ok(())
}

/// Decodes `bits` into `model`, zeroing every consumed bit. Bytes left
/// non-zero afterwards carry encodings this codec does not recognize.
///
/// The switch decoder runs after the I/O and logic decoders because it
/// asserts that the switches it finds are not yet used; the collected
/// switches then become one single-switch net each.
pub fn extract_model(model: &mut Model, bits: &mut FrameBits) -> Result<()> {
    for pos in xc6::DEFAULT_BITS {
        if !bits.get(pos) {
            return Err(Error::DefaultBitClear(pos));
        }
        bits.clear(pos);
    }

    iob::extract_iobs(model, bits)?;
    logic::extract_logic(model, bits)?;

    let mut es = ExtractState::default();
    routing::extract_switches(&mut es, model, bits)?;

    if !model.nets().is_empty() {
        warn!("extract: model already carries nets");
    }
    for (y, x, idx) in es.into_switches() {
        let net = model.net_new();
        model.net_add_switch(net, y, x, idx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_model_round_trip() {
        let mut model = Model::new(4, 4);
        let mut bits = FrameBits::new();
        write_model(&mut bits, &model).unwrap();

        // Exactly the five default bits are set.
        for pos in xc6::DEFAULT_BITS {
            assert!(bits.get(pos));
            bits.clear(pos);
        }
        assert!(bits.is_all_zero());

        write_model(&mut bits, &model).unwrap();
        extract_model(&mut model, &mut bits).unwrap();
        assert!(bits.is_all_zero());
        assert!(model.nets().is_empty());
    }

    #[test]
    fn cleared_default_bit_fails_decode() {
        let mut model = Model::new(4, 4);
        let mut bits = FrameBits::new();
        write_model(&mut bits, &model).unwrap();
        bits.clear(xc6::DEFAULT_BITS[1]);
        assert_eq!(
            extract_model(&mut model, &mut bits),
            Err(Error::DefaultBitClear(xc6::DEFAULT_BITS[1]))
        );
    }

    #[test]
    fn write_is_idempotent() {
        let mut model = Model::new(4, 4);
        model.set_col(1, fpga_model::ColFlags::ROUTING, 2);
        let idx = model.add_switch(5, 1, "A", "B", false);
        model.add_bitpos("A", "B", false, 20, 10, 0b11, 30);
        if let Some(sw) = model.switch_mut(5, 1, idx) {
            sw.flags |= fpga_model::SwitchFlags::USED;
        }

        let mut once = FrameBits::new();
        write_model(&mut once, &model).unwrap();
        let mut twice = FrameBits::new();
        write_model(&mut twice, &model).unwrap();
        write_model(&mut twice, &model).unwrap();
        assert_eq!(once.as_bytes(), twice.as_bytes());
    }
}
