//! MIDI ports used to exchange presets with the controller.
//!
//! Presets travel as SysEx, which midir drops by default, so inputs are
//! opened with SysEx enabled. Clock and active sensing stay filtered:
//! the controller may interleave them with a dump.

use std::fmt;
use std::str::FromStr;
use midir::*;
use anyhow::*;
use regex::Regex;
use async_trait::async_trait;
use log::*;
use tokio::sync::mpsc;
use crate::config::ModelConfig;
use crate::sysex::is_realtime;

#[async_trait]
pub trait MidiIn {
    fn name(&self) -> String;
    async fn recv(&mut self) -> Option<Vec<u8>>;
    fn close(&mut self);
}

pub trait MidiOut {
    fn name(&self) -> String;
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
    fn close(&mut self);
}

pub type BoxedMidiIn = Box<dyn MidiIn + Send>;
pub type BoxedMidiOut = Box<dyn MidiOut + Send>;

pub fn box_midi_in<T: MidiIn + Send + 'static>(x: T) -> BoxedMidiIn {
    Box::new(x)
}

pub fn box_midi_out<T: MidiOut + Send + 'static>(x: T) -> BoxedMidiOut {
    Box::new(x)
}

const CLIENT_NAME: &str = "mpk preset editor";

/// Which port to open, as given on the command line or taken from the
/// model table
#[derive(Clone, Debug, PartialEq)]
pub enum PortSelector {
    /// Position in the port list
    Index(usize),
    /// ALSA-style "client:port", matched against the end of the port name
    Address(String),
    /// Part of the port name, e.g. "MIDIIN4 (MPK249)"
    Name(String),
}

impl PortSelector {
    pub fn input_for(config: &ModelConfig) -> Self {
        PortSelector::Name(config.in_port.clone())
    }

    pub fn output_for(config: &ModelConfig) -> Self {
        PortSelector::Name(config.out_port.clone())
    }

    /// Position of the selected port in `names`. Name matches take the
    /// first port, address matches the last.
    pub fn find(&self, names: &[String]) -> Option<usize> {
        match self {
            PortSelector::Index(i) => (*i < names.len()).then_some(*i),
            PortSelector::Address(addr) => names.iter().rposition(|n| n.ends_with(addr.as_str())),
            PortSelector::Name(part) => names.iter().position(|n| n.contains(part.as_str())),
        }
    }
}

impl FromStr for PortSelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let index_re = Regex::new(r"^\d+$")?;
        let address_re = Regex::new(r"^\d+:\d+$")?;

        let s = s.trim();
        if s.is_empty() {
            bail!("Empty MIDI port name");
        }
        if index_re.is_match(s) {
            let n = s.parse::<usize>()
                .with_context(|| format!("Unrecognized MIDI port index {:?}", s))?;
            return Ok(PortSelector::Index(n));
        }
        if address_re.is_match(s) {
            return Ok(PortSelector::Address(s.to_string()));
        }
        Ok(PortSelector::Name(s.to_string()))
    }
}

impl fmt::Display for PortSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSelector::Index(i) => write!(f, "port #{}", i),
            PortSelector::Address(addr) => write!(f, "port at {}", addr),
            PortSelector::Name(part) => write!(f, "port matching {:?}", part),
        }
    }
}

fn port_names<T: MidiIO>(midi: &T) -> Result<Vec<String>> {
    midi.ports().iter()
        .map(|port| midi.port_name(port))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| anyhow!("Error getting port names: {}", err))
}

fn select_port<T: MidiIO>(midi: &T, dir: &str, selector: &PortSelector) -> Result<T::Port> {
    let names = port_names(midi)?;
    for (i, name) in names.iter().enumerate() {
        debug!("midi {} {}: {:?}", dir, i, name);
    }
    let found = selector.find(&names)
        .and_then(|i| midi.ports().into_iter().nth(i));
    let Some(port) = found else {
        bail!("MIDI {} {} not found", dir, selector);
    };
    Ok(port)
}

/// Controller input. Real-time messages are dropped before they reach
/// the channel.
pub struct MidiInPort {
    name: String,
    conn: Option<MidiInputConnection<()>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MidiInPort {
    pub fn open(selector: &PortSelector) -> Result<Self> {
        let mut midi_in = MidiInput::new(CLIENT_NAME)?;
        midi_in.ignore(Ignore::TimeAndActiveSense);

        let port = select_port(&midi_in, "input", selector)?;
        let name = midi_in.port_name(&port)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let conn = midi_in.connect(&port, "preset in", move |ts, data, _| {
            if data.first().map_or(true, |b| is_realtime(*b)) {
                return;
            }
            trace!("<< {:02x?} len={} ts={}", data, data.len(), ts);
            if tx.send(data.to_vec()).is_err() {
                debug!("preset input gone, {} bytes dropped", data.len());
            }
        }, ())
            .map_err(|e| anyhow!("Failed to connect to MIDI input {:?}: {}", name, e))?;
        info!("MIDI input {:?} open", name);

        Ok(MidiInPort { name, conn: Some(conn), rx })
    }

    pub fn ports() -> Result<Vec<String>> {
        port_names(&MidiInput::new(CLIENT_NAME)?)
    }
}

#[async_trait]
impl MidiIn for MidiInPort {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            debug!("closing input {:?}", self.name);
            conn.close();
        }
        self.rx.close();
    }
}

impl Drop for MidiInPort {
    fn drop(&mut self) {
        self.close();
    }
}

/// Controller output
pub struct MidiOutPort {
    name: String,
    conn: Option<MidiOutputConnection>,
}

impl MidiOutPort {
    pub fn open(selector: &PortSelector) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;

        let port = select_port(&midi_out, "output", selector)?;
        let name = midi_out.port_name(&port)?;
        let conn = midi_out.connect(&port, "preset out")
            .map_err(|e| anyhow!("Failed to connect to MIDI output {:?}: {}", name, e))?;
        info!("MIDI output {:?} open", name);

        Ok(MidiOutPort { name, conn: Some(conn) })
    }

    pub fn ports() -> Result<Vec<String>> {
        port_names(&MidiOutput::new(CLIENT_NAME)?)
    }
}

impl MidiOut for MidiOutPort {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        trace!(">> {:02x?} len={}", bytes, bytes.len());
        let Some(conn) = self.conn.as_mut() else {
            bail!("MIDI output {:?} already closed", self.name);
        };
        conn.send(bytes)
            .map_err(|e| anyhow!("Failed to send to {:?}: {}", self.name, e))
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            debug!("closing output {:?}", self.name);
            conn.close();
        }
    }
}

impl Drop for MidiOutPort {
    fn drop(&mut self) {
        self.close()
    }
}
