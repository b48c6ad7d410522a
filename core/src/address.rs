//! Bank/slot arithmetic. Every index computation in the crate goes through
//! here so that single edits and bulk operations can't disagree.

use std::ops::RangeInclusive;
use crate::error::{PresetError, Result};
use crate::model::{Bank, ControlClass, Transport};

/// Byte offset of the record with the 1-based `index`
pub fn offset(class: ControlClass, index: usize) -> Result<usize> {
    let layout = class.layout();
    if index < 1 || index > layout.count {
        return Err(PresetError::out_of_range("index", index, 1, layout.count));
    }
    Ok(layout.base + (index - 1) * layout.size)
}

/// 1-based absolute index of the 0-based `slot` in the 0-based `bank`
pub fn index(class: ControlClass, bank: Bank, slot: usize) -> Result<usize> {
    let layout = class.layout();
    let Some(bank_size) = layout.bank_size else {
        return Err(PresetError::out_of_range("bank", bank.0, 0, 0));
    };
    let banks = layout.bank_count();
    if bank.0 >= banks {
        return Err(PresetError::out_of_range("bank", bank.0, 0, banks - 1));
    }
    if slot >= bank_size {
        return Err(PresetError::out_of_range("slot", slot, 0, bank_size - 1));
    }
    Ok(bank.0 * bank_size + slot + 1)
}

/// Absolute indices covered by a bank
pub fn bank_range(class: ControlClass, bank: Bank) -> Result<RangeInclusive<usize>> {
    let first = index(class, bank, 0)?;
    let bank_size = class.layout().bank_size.unwrap_or(1);
    Ok(first ..= index(class, bank, bank_size - 1)?)
}

pub fn all_range(class: ControlClass) -> RangeInclusive<usize> {
    1 ..= class.count()
}

/// 1-based record index of a transport button, in name order
pub fn transport_index(transport: Transport) -> usize {
    transport.index()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets() {
        assert_eq!(offset(ControlClass::Knob, 1).unwrap(), 0x2fd);
        assert_eq!(offset(ControlClass::Knob, 2).unwrap(), 0x2fd + 9);
        assert_eq!(offset(ControlClass::Pad, 64).unwrap(), 0x3d + 63 * 11);
        assert_eq!(offset(ControlClass::Transport, 5).unwrap(), 0x59d + 4 * 13);
        assert_eq!(offset(ControlClass::Transport, transport_index(Transport::Enter)).unwrap(), 0x59d);
        assert_eq!(transport_index(Transport::Down), 5);
    }

    #[test]
    fn offsets_out_of_range() {
        for class in ControlClass::ALL {
            assert!(matches!(offset(class, 0), Err(PresetError::OutOfRange { .. })));
            assert!(matches!(offset(class, class.count() + 1), Err(PresetError::OutOfRange { .. })));
        }
    }

    #[test]
    fn bank_slot_matches_absolute_index() {
        for class in ControlClass::ALL {
            let Some(bank_size) = class.layout().bank_size else { continue };
            for b in 0 .. class.banks() {
                for s in 0 .. bank_size {
                    let i = index(class, Bank(b), s).unwrap();
                    assert_eq!(i, b * bank_size + s + 1);
                    assert_eq!(offset(class, i).unwrap(),
                               class.layout().base + (b * bank_size + s) * class.layout().size);
                }
            }
        }
    }

    #[test]
    fn bank_slot_out_of_range() {
        assert!(index(ControlClass::Pad, Bank(4), 0).is_err());
        assert!(index(ControlClass::Pad, Bank(0), 16).is_err());
        assert!(index(ControlClass::Knob, Bank(3), 0).is_err());
        assert!(index(ControlClass::Knob, Bank(0), 8).is_err());
        assert!(index(ControlClass::Transport, Bank(0), 0).is_err());
    }

    #[test]
    fn ranges() {
        assert_eq!(bank_range(ControlClass::Pad, Bank(1)).unwrap(), 17 ..= 32);
        assert_eq!(bank_range(ControlClass::Switch, Bank(2)).unwrap(), 17 ..= 24);
        assert_eq!(all_range(ControlClass::Fader), 1 ..= 24);
    }
}
