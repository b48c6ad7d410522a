//! Edits spanning many records. Everything here goes through
//! `Preset::control` / `Preset::set_control` and never touches the
//! buffer directly.
//!
//! None of these are transactional: an error after the first write comes
//! back as `PresetError::Partial` and the records already written stay
//! written.

use log::*;
use maplit::btreemap;
use crate::address;
use crate::codec::{Field, Value};
use crate::error::{PresetError, Result};
use crate::model::{Bank, ControlClass};
use crate::preset::Preset;
use crate::tables::{is_white_key, MAX_NOTE};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BankSelect {
    All,
    Bank(Bank),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoteMapping {
    Chromatic,
    /// White keys only
    Diatonic,
}

/// Copy every record of bank `src` onto bank `dst`
pub fn clone_bank(preset: &mut Preset, class: ControlClass, src: Bank, dst: Bank) -> Result<usize> {
    let src_range = address::bank_range(class, src)?;
    let dst_range = address::bank_range(class, dst)?;
    if src == dst {
        return Err(PresetError::invalid("bank", format!("cannot clone bank {} onto itself", src)));
    }

    let mut written = 0;
    for (from, to) in src_range.zip(dst_range) {
        preset.control(class, from)
            .and_then(|fields| preset.set_control(class, to, &fields))
            .map_err(|e| PresetError::partial(written, e))?;
        written += 1;
    }
    info!("Cloned {} bank {} -> {}", class, src, dst);
    Ok(written)
}

/// Set the channel of every record in the selection, leaving other fields alone
pub fn set_channel(preset: &mut Preset, class: ControlClass, select: BankSelect, channel: &Value) -> Result<usize> {
    let range = match select {
        BankSelect::All => address::all_range(class),
        BankSelect::Bank(bank) => address::bank_range(class, bank)?
    };
    let updates = btreemap! { Field::Channel => channel.clone() };

    let mut written = 0;
    for index in range {
        preset.set_control(class, index, &updates)
            .map_err(|e| PresetError::partial(written, e))?;
        written += 1;
    }
    info!("Set {} channel to {} on {} records", class, channel, written);
    Ok(written)
}

/// The notes assigned to consecutive slots, `None` past the MIDI range
pub fn note_sequence(start: u8, count: usize, mapping: NoteMapping) -> Vec<Option<u8>> {
    let mut note = start as i32;
    let mut notes = Vec::with_capacity(count);
    for i in 0 .. count {
        match mapping {
            NoteMapping::Chromatic => {
                if i > 0 {
                    note += 1;
                }
            }
            NoteMapping::Diatonic => {
                if i > 0 {
                    note += 1;
                }
                while !is_white_key(note) {
                    note += 1;
                }
            }
        }
        notes.push((0 ..= MAX_NOTE as i32).contains(&note).then(|| note as u8));
    }
    notes
}

/// Turn every pad of `bank` into a note pad, starting at `start`. Pads
/// whose note would fall past 127 are left as they are.
pub fn map_pad_notes(preset: &mut Preset, bank: Bank, start: u8, mapping: NoteMapping) -> Result<usize> {
    let class = ControlClass::Pad;
    let range = address::bank_range(class, bank)?;
    let notes = note_sequence(start, range.clone().count(), mapping);

    let mut written = 0;
    for (index, note) in range.zip(notes) {
        let Some(note) = note else {
            debug!("{} {}: note out of range, left unchanged", class, class.label(index));
            continue;
        };
        let updates = btreemap! {
            Field::Type => Value::from("Note"),
            Field::Note => Value::from(note),
        };
        preset.set_control(class, index, &updates)
            .map_err(|e| PresetError::partial(written, e))?;
        written += 1;
    }
    info!("Mapped {} pads of bank {} ({:?})", written, bank, mapping);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldMap;
    use crate::preset::tests::sample_preset;
    use crate::tables::{note_name, note_number};

    fn notes_of(preset: &Preset, bank: Bank) -> Vec<Value> {
        address::bank_range(ControlClass::Pad, bank).unwrap()
            .map(|i| preset.control(ControlClass::Pad, i).unwrap()[&Field::Note].clone())
            .collect()
    }

    fn without(mut fields: FieldMap, field: Field) -> FieldMap {
        fields.remove(&field);
        fields
    }

    #[test]
    fn diatonic_from_c3() {
        let mut p = sample_preset();
        let start = note_number("C3").unwrap();
        assert_eq!(map_pad_notes(&mut p, Bank(0), start, NoteMapping::Diatonic).unwrap(), 16);

        let expected = [
            "C3", "D3", "E3", "F3", "G3", "A3", "B3", "C4",
            "D4", "E4", "F4", "G4", "A4", "B4", "C5", "D5"
        ];
        let expected = expected.iter().map(|n| Value::from(*n)).collect::<Vec<_>>();
        assert_eq!(notes_of(&p, Bank(0)), expected);
    }

    #[test]
    fn diatonic_advances_to_white_key() {
        let notes = note_sequence(note_number("C#3").unwrap(), 3, NoteMapping::Diatonic);
        let names = notes.iter().map(|n| n.and_then(note_name).unwrap()).collect::<Vec<_>>();
        assert_eq!(names, vec!["D3", "E3", "F3"]);
    }

    #[test]
    fn chromatic_from_60() {
        let mut p = sample_preset();
        map_pad_notes(&mut p, Bank(2), 60, NoteMapping::Chromatic).unwrap();
        let expected = (60 ..= 75u8).map(|n| Value::from(note_name(n).unwrap())).collect::<Vec<_>>();
        assert_eq!(notes_of(&p, Bank(2)), expected);
    }

    #[test]
    fn no_wrap_past_127() {
        let mut p = sample_preset();
        let before = p.clone();
        assert_eq!(map_pad_notes(&mut p, Bank(3), 120, NoteMapping::Chromatic).unwrap(), 8);

        for (slot, index) in address::bank_range(ControlClass::Pad, Bank(3)).unwrap().enumerate() {
            let pad = p.control(ControlClass::Pad, index).unwrap();
            if slot < 8 {
                assert_eq!(pad[&Field::Note], Value::from(note_name(120 + slot as u8).unwrap()));
            } else {
                assert_eq!(pad, before.control(ControlClass::Pad, index).unwrap());
            }
        }

        let notes = note_sequence(126, 3, NoteMapping::Diatonic);
        assert_eq!(notes, vec![Some(127), None, None]);
        let notes = note_sequence(124, 4, NoteMapping::Diatonic);
        assert_eq!(notes, vec![Some(124), Some(125), Some(127), None]);
    }

    #[test]
    fn mapping_switches_pads_to_note() {
        let mut p = sample_preset();
        let updates = btreemap! { Field::Type => Value::from("ProgramChange") };
        p.set_control(ControlClass::Pad, 1, &updates).unwrap();

        map_pad_notes(&mut p, Bank(0), 48, NoteMapping::Chromatic).unwrap();
        let pad = p.control(ControlClass::Pad, 1).unwrap();
        assert_eq!(pad[&Field::Type], Value::from("Note"));
        assert_eq!(pad[&Field::Note], Value::from("C3"));
    }

    #[test]
    fn clone_idempotence() {
        let mut p = sample_preset();
        let original = p.clone();

        clone_bank(&mut p, ControlClass::Pad, Bank(0), Bank(1)).unwrap();
        for slot in 0 .. 16 {
            assert_eq!(p.control_at(ControlClass::Pad, Bank(1), slot).unwrap(),
                       original.control_at(ControlClass::Pad, Bank(0), slot).unwrap());
        }
        // bank C untouched
        assert_eq!(notes_of(&p, Bank(2)), notes_of(&original, Bank(2)));

        clone_bank(&mut p, ControlClass::Pad, Bank(1), Bank(0)).unwrap();
        for slot in 0 .. 16 {
            assert_eq!(p.control_at(ControlClass::Pad, Bank(0), slot).unwrap(),
                       original.control_at(ControlClass::Pad, Bank(0), slot).unwrap());
        }
    }

    #[test]
    fn clone_rejects_same_bank() {
        let mut p = sample_preset();
        let r = clone_bank(&mut p, ControlClass::Knob, Bank(1), Bank(1));
        assert!(matches!(r, Err(PresetError::InvalidValue { .. })));
        assert_eq!(p, sample_preset());

        let r = clone_bank(&mut p, ControlClass::Knob, Bank(0), Bank(3));
        assert!(matches!(r, Err(PresetError::OutOfRange { .. })));
        assert_eq!(p, sample_preset());
    }

    #[test]
    fn clone_bad_bank_onto_itself() {
        let mut p = sample_preset();
        let r = clone_bank(&mut p, ControlClass::Pad, Bank(200), Bank(200));
        assert!(matches!(r, Err(PresetError::OutOfRange { .. })));
        assert_eq!(p, sample_preset());
    }

    #[test]
    fn channel_on_all_pads() {
        let mut p = sample_preset();
        let before = p.clone();
        let n = set_channel(&mut p, ControlClass::Pad, BankSelect::All, &Value::from("USBA5")).unwrap();
        assert_eq!(n, 64);
        for i in address::all_range(ControlClass::Pad) {
            let pad = p.control(ControlClass::Pad, i).unwrap();
            assert_eq!(pad[&Field::Channel], Value::from("USBA5"));
            assert_eq!(without(pad, Field::Channel),
                       without(before.control(ControlClass::Pad, i).unwrap(), Field::Channel));
        }
    }

    #[test]
    fn channel_on_one_bank() {
        let mut p = sample_preset();
        set_channel(&mut p, ControlClass::Knob, BankSelect::Bank(Bank(1)), &Value::from("USBB2")).unwrap();
        for i in address::all_range(ControlClass::Knob) {
            let expected = if (9 ..= 16).contains(&i) { "USBB2" } else { "USBA1" };
            assert_eq!(p.control(ControlClass::Knob, i).unwrap()[&Field::Channel], Value::from(expected));
        }
    }

    #[test]
    fn invalid_channel_changes_nothing() {
        let mut p = sample_preset();
        let r = set_channel(&mut p, ControlClass::Pad, BankSelect::All, &Value::from("USBC1"));
        assert!(matches!(r, Err(PresetError::InvalidValue { .. })));
        assert_eq!(p, sample_preset());
    }

    #[test]
    fn interrupted_bulk_edit_is_partial() {
        // image ends inside the 3rd switch record of bank A
        let mut data = sample_preset().into_raw();
        data.truncate(address::offset(ControlClass::Switch, 3).unwrap() + 4);
        let mut p = Preset::from_bytes(data);

        let r = set_channel(&mut p, ControlClass::Switch, BankSelect::Bank(Bank(0)), &Value::from("USBA3"));
        match r {
            Err(PresetError::Partial { written, source }) => {
                assert_eq!(written, 2);
                assert!(matches!(*source, PresetError::BufferTooShort { .. }));
            }
            r => panic!("expected partial error, got {:?}", r),
        }
        assert_eq!(p.control(ControlClass::Switch, 2).unwrap()[&Field::Channel], Value::from("USBA3"));
    }
}
