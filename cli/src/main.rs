pub mod opts;

use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::*;
use log::*;
use simple_logger::SimpleLogger;

use mpk_core::address;
use mpk_core::bulk::{self, BankSelect, NoteMapping};
use mpk_core::codec::{self, FieldMap, Value};
use mpk_core::config::{self, ModelConfig, PRESET_NUM};
use mpk_core::midi_io::*;
use mpk_core::model::{Bank, ControlClass, Transport};
use mpk_core::preset::Preset;
use mpk_core::tables::{note_number, MAX_NOTE};
use mpk_core::transfer;

use opts::*;

/// Resolve "12", "B4" or "Enter" to a 1-based record index
fn parse_control(class: ControlClass, s: &str) -> Result<usize> {
    let s = s.trim();
    if class == ControlClass::Transport {
        if let std::result::Result::Ok(t) = s.parse::<Transport>() {
            return Ok(address::transport_index(t));
        }
    }
    if let std::result::Result::Ok(index) = s.parse::<usize>() {
        address::offset(class, index)?;
        return Ok(index);
    }
    let mut chars = s.chars();
    let bank = chars.next().and_then(Bank::from_letter);
    let slot = chars.as_str().parse::<usize>().ok();
    match (bank, slot) {
        (Some(bank), Some(slot)) if slot >= 1 => Ok(address::index(class, bank, slot - 1)?),
        _ => bail!("Unrecognized {} {:?}", class, s)
    }
}

fn parse_fields(fields: &[String]) -> Result<FieldMap> {
    let mut pairs = vec![];
    for f in fields {
        let (name, value) = f.split_once('=')
            .with_context(|| format!("Expected field=value, got {:?}", f))?;
        let value = value.parse::<Value>().unwrap_or_else(|never| match never {});
        pairs.push((name.to_string(), value));
    }
    let map = codec::fields_from_pairs(pairs);
    if map.is_empty() {
        bail!("No known fields given");
    }
    Ok(map)
}

fn parse_note(s: &str) -> Result<u8> {
    let note = note_number(s)
        .or_else(|| s.trim().parse::<u8>().ok().filter(|n| *n <= MAX_NOTE));
    note.with_context(|| format!("Unrecognized note {:?}", s))
}

fn format_fields(fields: &FieldMap) -> String {
    fields.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_control(preset: &Preset, class: ControlClass, index: usize, raw: bool) -> Result<()> {
    let fields = preset.control(class, index)?;
    println!("{:<6} {}", class.label(index), format_fields(&fields));
    if raw {
        println!("{:<6} {:02x?}", "", preset.record(class, index)?);
    }
    Ok(())
}

fn load(file: &Path) -> Result<Preset> {
    let preset = Preset::load_file(file)
        .with_context(|| format!("Failed to load preset from {:?}", file))?;
    if !preset.is_complete() {
        warn!("{:?} does not contain a complete preset", file);
    }
    Ok(preset)
}

fn save(preset: &Preset, file: &Path, save_as: Option<PathBuf>) -> Result<()> {
    let path = save_as.unwrap_or_else(|| file.to_path_buf());
    preset.save_file(&path)
        .with_context(|| format!("Failed to save preset to {:?}", path))
}

fn model_config(opts: &Opts) -> Result<Option<&'static ModelConfig>> {
    let Some(name) = &opts.model else {
        return Ok(None);
    };
    let config = config::config_for_name(name)
        .with_context(|| {
            let names = config::configs().iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
            format!("Unknown model {:?}, expected one of {}", name, names.join(", "))
        })?;
    Ok(Some(config))
}

/// An explicit port wins over the model's preset port
fn port_selector(port: &Option<String>, model: Option<&ModelConfig>,
                 for_model: fn(&ModelConfig) -> PortSelector, dir: &str) -> Result<PortSelector> {
    match (port, model) {
        (Some(port), _) => port.parse(),
        (None, Some(m)) => Ok(for_model(m)),
        (None, None) => bail!("Either --{} or --model must be given", dir)
    }
}

fn open_in(opts: &Opts, model: Option<&ModelConfig>) -> Result<BoxedMidiIn> {
    let selector = port_selector(&opts.input, model, PortSelector::input_for, "input")?;
    Ok(box_midi_in(MidiInPort::open(&selector)?))
}

fn open_out(opts: &Opts, model: Option<&ModelConfig>) -> Result<BoxedMidiOut> {
    let selector = port_selector(&opts.output, model, PortSelector::output_for, "output")?;
    Ok(box_midi_out(MidiOutPort::open(&selector)?))
}

/// 1-based preset number as typed by the user
fn preset_number(n: usize) -> Result<usize> {
    if n < 1 || n > PRESET_NUM {
        bail!("Preset number {} out of range 1..={}", n, PRESET_NUM);
    }
    Ok(n - 1)
}

fn report_partial(result: mpk_core::error::Result<usize>, what: &str) -> Result<usize> {
    result.map_err(|e| {
        if e.is_partial() {
            error!("{} was interrupted, the preset is only partially modified", what);
        }
        anyhow::Error::from(e).context(format!("{} failed", what))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let opts: Opts = Opts::parse();
    let model = model_config(&opts)?;

    match &opts.command {
        Command::Info { file } => {
            let preset = load(file)?;
            let meta = preset.meta()?;
            println!("Model:  {}", meta.model);
            println!("Name:   {}", meta.name);
            println!("Number: {}", meta.number as usize + 1);
            println!("Size:   {} bytes", preset.len());
        }
        Command::List { file, class, bank, raw } => {
            let preset = load(file)?;
            let range = match bank {
                Some(b) => address::bank_range(*class, *b)?,
                None => address::all_range(*class)
            };
            for index in range {
                print_control(&preset, *class, index, *raw)?;
            }
        }
        Command::Get { file, class, control } => {
            let preset = load(file)?;
            let index = parse_control(*class, control)?;
            print_control(&preset, *class, index, false)?;
        }
        Command::Set { file, class, control, fields, save_as } => {
            let mut preset = load(file)?;
            let index = parse_control(*class, control)?;
            let updates = parse_fields(fields)?;
            preset.set_control(*class, index, &updates)?;
            print_control(&preset, *class, index, false)?;
            save(&preset, file, save_as.clone())?;
        }
        Command::Clone { file, class, src, dst, save_as } => {
            let mut preset = load(file)?;
            let n = report_partial(bulk::clone_bank(&mut preset, *class, *src, *dst), "Bank clone")?;
            println!("Copied {} {} records from bank {} to bank {}", n, class, src, dst);
            save(&preset, file, save_as.clone())?;
        }
        Command::Channel { file, class, channel, bank, save_as } => {
            let mut preset = load(file)?;
            let select = bank.map(BankSelect::Bank).unwrap_or(BankSelect::All);
            let channel = Value::from(channel.as_str());
            let n = report_partial(bulk::set_channel(&mut preset, *class, select, &channel), "Channel change")?;
            println!("Set channel {} on {} {} records", channel, n, class);
            save(&preset, file, save_as.clone())?;
        }
        Command::MapNotes { file, bank, start, diatonic, save_as } => {
            let mut preset = load(file)?;
            let mapping = if *diatonic { NoteMapping::Diatonic } else { NoteMapping::Chromatic };
            let start = parse_note(start)?;
            let n = report_partial(bulk::map_pad_notes(&mut preset, *bank, start, mapping), "Note mapping")?;
            println!("Mapped {} pads in bank {}", n, bank);
            save(&preset, file, save_as.clone())?;
        }
        Command::Meta { file, name, number, save_as } => {
            let mut preset = load(file)?;
            let name = match name {
                Some(name) => name.clone(),
                None => preset.name()?
            };
            let number = match number {
                Some(n) => preset_number(*n)?,
                None => preset.number()? as usize
            };
            preset.set_meta(&name, number)?;
            println!("{} #{}", preset.name()?, number + 1);
            save(&preset, file, save_as.clone())?;
        }
        Command::Ports => {
            println!("MIDI inputs:");
            for (i, name) in MidiInPort::ports()?.iter().enumerate() {
                println!("  {}: {}", i, name);
            }
            println!("MIDI outputs:");
            for (i, name) in MidiOutPort::ports()?.iter().enumerate() {
                println!("  {}: {}", i, name);
            }
        }
        Command::Receive { file, preset, timeout } => {
            let timeout = timeout.map(Duration::from_secs);
            let midi_in = open_in(&opts, model)?;
            let received = match preset {
                Some(n) => {
                    let number = preset_number(*n)? as u8;
                    let model = model.context("--model is required to request a preset")?;
                    let mut midi_out = open_out(&opts, Some(model))?;
                    transfer::request_preset(midi_in, &mut midi_out, model.id, number, timeout).await?
                }
                None => {
                    println!("Waiting for a preset, send it from the controller...");
                    transfer::receive_preset(midi_in, timeout).await?
                }
            };
            let meta = received.meta()?;
            println!("Received {} preset {:?} #{}", meta.model, meta.name, meta.number as usize + 1);
            received.save_file(file)
                .with_context(|| format!("Failed to save preset to {:?}", file))?;
        }
        Command::Send { file } => {
            let preset = load(file)?;
            let mut midi_out = open_out(&opts, model)?;
            transfer::send_preset(&mut midi_out, &preset)?;
            println!("Sent {:?} ({} bytes)", preset.name()?, preset.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_addresses() {
        assert_eq!(parse_control(ControlClass::Pad, "12").unwrap(), 12);
        assert_eq!(parse_control(ControlClass::Pad, "B4").unwrap(), 20);
        assert_eq!(parse_control(ControlClass::Knob, "c8").unwrap(), 24);
        assert_eq!(parse_control(ControlClass::Transport, "Down").unwrap(), 5);
        assert_eq!(parse_control(ControlClass::Transport, "2").unwrap(), 2);
        assert!(parse_control(ControlClass::Pad, "65").is_err());
        assert!(parse_control(ControlClass::Pad, "E1").is_err());
        assert!(parse_control(ControlClass::Pad, "A0").is_err());
        assert!(parse_control(ControlClass::Switch, "Enter").is_err());
    }

    #[test]
    fn field_arguments() {
        let fields = parse_fields(&["type=Note".to_string(), "note=C3".to_string(), "foo=1".to_string()]).unwrap();
        assert_eq!(format_fields(&fields), "type=Note note=C3");
        assert!(parse_fields(&["note".to_string()]).is_err());
        assert!(parse_fields(&["foo=1".to_string()]).is_err());
    }

    #[test]
    fn notes_and_numbers() {
        assert_eq!(parse_note("C3").unwrap(), 48);
        assert_eq!(parse_note("60").unwrap(), 60);
        assert!(parse_note("128").is_err());
        assert_eq!(preset_number(1).unwrap(), 0);
        assert!(preset_number(0).is_err());
        assert!(preset_number(31).is_err());
    }

    #[test]
    fn port_selection() {
        let mpk249 = config::config_for_name("MPK249");
        let input = port_selector(&None, mpk249, PortSelector::input_for, "input").unwrap();
        assert_eq!(input, PortSelector::Name("MIDIIN4 (MPK249)".into()));
        let given = port_selector(&Some("24:3".into()), mpk249, PortSelector::input_for, "input").unwrap();
        assert_eq!(given, PortSelector::Address("24:3".into()));
        assert!(port_selector(&None, None, PortSelector::output_for, "output").is_err());
    }
}
