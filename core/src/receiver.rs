//! Background reception of one preset dump.
//!
//! The worker owns the MIDI input until it finishes, then hands the new
//! preset over in a single message. It always closes the input and
//! always reports exactly once, either `Ready` or `Aborted`.

use std::time::Duration;
use log::*;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use crate::config::MIN_PRESET_SIZE;
use crate::error::{PresetError, Result};
use crate::midi::MidiMessage;
use crate::midi_io::{BoxedMidiIn, MidiIn};
use crate::preset::Preset;
use crate::sysex::{is_realtime, Reassembler};

/// Anything this long is not a preset dump
const MAX_DUMP_SIZE: usize = MIN_PRESET_SIZE * 2;

#[derive(Debug, PartialEq)]
pub enum Reception {
    Ready(Preset),
    Aborted,
}

pub struct ReceiverHandle {
    cancel: Option<oneshot::Sender<()>>,
    result: oneshot::Receiver<Reception>,
    join: JoinHandle<()>,
}

pub fn spawn(mut midi_in: BoxedMidiIn) -> ReceiverHandle {
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    let (result_tx, result_rx) = oneshot::channel::<Reception>();

    let join = tokio::spawn(async move {
        let name = midi_in.name();
        info!("Preset receiver on {:?} start", name);

        let mut reassembler = Reassembler::with_limit(MAX_DUMP_SIZE);
        let reception = loop {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => {
                    reassembler.abort();
                    break Reception::Aborted;
                }
                msg = midi_in.recv() => {
                    match msg {
                        Some(bytes) if !bytes.is_empty() && bytes.iter().all(|b| is_realtime(*b)) => {
                            trace!("real-time message {:02x?} skipped", bytes);
                        }
                        Some(bytes) => {
                            match reassembler.feed(&bytes).map(MidiMessage::from_bytes) {
                                Some(Ok(MidiMessage::PresetDump { data, .. })) =>
                                    break Reception::Ready(Preset::from_bytes(data)),
                                Some(Ok(msg)) =>
                                    debug!("Ignoring {:?} while waiting for a preset", msg),
                                Some(Err(e)) =>
                                    warn!("Ignoring SysEx message: {}", e),
                                None => {}
                            }
                        }
                        None => {
                            warn!("MIDI input {:?} closed while waiting for a preset", name);
                            reassembler.abort();
                            break Reception::Aborted;
                        }
                    }
                }
            }
        };

        midi_in.close();
        match &reception {
            Reception::Ready(preset) => info!("Received preset ({} bytes)", preset.len()),
            Reception::Aborted => info!("Preset reception aborted"),
        }
        result_tx.send(reception)
            .unwrap_or_else(|_| warn!("Preset receiver result dropped"));
        info!("Preset receiver on {:?} finish", name);
    });

    ReceiverHandle { cancel: Some(cancel_tx), result: result_rx, join }
}

impl ReceiverHandle {
    /// Ask the worker to stop. Has no effect once it has finished.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            tx.send(()).ok();
        }
    }

    /// Wait for the preset. This can wait forever if the device never
    /// sends one; see `wait_timeout`.
    pub async fn wait(mut self) -> Result<Preset> {
        let reception = (&mut self.result).await;
        self.finish(reception).await
    }

    /// Like `wait`, but cancels the worker after `timeout`
    pub async fn wait_timeout(mut self, timeout: Duration) -> Result<Preset> {
        let reception = match tokio::time::timeout(timeout, &mut self.result).await {
            Ok(reception) => reception,
            Err(_) => {
                warn!("No preset received within {:?}, giving up", timeout);
                self.cancel();
                (&mut self.result).await
            }
        };
        self.finish(reception).await
    }

    async fn finish(self, reception: std::result::Result<Reception, oneshot::error::RecvError>) -> Result<Preset> {
        let ReceiverHandle { cancel, join, .. } = self;
        join.await.unwrap_or_else(|e| error!("Preset receiver failed: {}", e));
        // the worker treats a dropped sender as a cancel request
        drop(cancel);

        match reception {
            Ok(Reception::Ready(preset)) => Ok(preset),
            Ok(Reception::Aborted) | Err(_) => Err(PresetError::FrameAbandoned),
        }
    }
}
