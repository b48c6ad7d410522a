use std::time::Duration;
use anyhow::*;
use log::*;
use crate::midi::MidiMessage;
use crate::midi_io::{BoxedMidiIn, BoxedMidiOut, MidiOut};
use crate::preset::Preset;
use crate::receiver::{self, ReceiverHandle};

async fn wait(handle: ReceiverHandle, timeout: Option<Duration>) -> Result<Preset> {
    let preset = match timeout {
        Some(t) => handle.wait_timeout(t).await,
        None => handle.wait().await
    }.context("No preset received")?;

    if !preset.is_complete() {
        warn!("Received a short preset dump ({} bytes)", preset.len());
    }
    Ok(preset)
}

/// Wait for a preset dump the user triggers on the device
pub async fn receive_preset(midi_in: BoxedMidiIn, timeout: Option<Duration>) -> Result<Preset> {
    let handle = receiver::spawn(midi_in);
    wait(handle, timeout).await
}

/// Ask the controller for a stored preset (0-based) and wait for the dump.
/// The receiver is running before the request goes out, so a fast reply
/// can't be missed.
pub async fn request_preset(midi_in: BoxedMidiIn, midi_out: &mut BoxedMidiOut,
                            model: u8, preset: u8, timeout: Option<Duration>) -> Result<Preset> {
    let mut handle = receiver::spawn(midi_in);

    let request = MidiMessage::PresetDumpRequest { model, preset }.to_bytes();
    info!("Requesting preset {} from {:?}", preset as usize + 1, midi_out.name());
    if let Err(e) = midi_out.send(&request) {
        handle.cancel();
        handle.wait().await.ok();
        return Err(e).context("Failed to send preset request");
    }

    wait(handle, timeout).await
}

/// Send the whole image to the controller in one message
pub fn send_preset(midi_out: &mut BoxedMidiOut, preset: &Preset) -> Result<()> {
    let msg = MidiMessage::from_bytes(preset.raw().to_vec())
        .with_context(|| format!("Preset image ({} bytes) is not an Akai preset dump", preset.len()))?;
    if !matches!(msg, MidiMessage::PresetDump { .. }) {
        bail!("Preset image is a preset request, not a dump");
    }
    let data = msg.to_bytes();
    midi_out.send(&data)
        .with_context(|| format!("Failed to send preset to {:?}", midi_out.name()))?;
    info!("Sent preset ({} bytes) to {:?}", data.len(), midi_out.name());
    Ok(())
}
