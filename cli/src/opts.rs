use std::path::PathBuf;
use mpk_core::model::{Bank, ControlClass};
pub use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(name = "mpk-cli", version, about = "Akai MPK2 series preset editor")]
pub struct Opts {
    /// MIDI input port: index, "client:port" address or part of the port name
    #[clap(short, long, global = true)]
    pub input: Option<String>,

    /// MIDI output port: index, "client:port" address or part of the port name
    #[clap(short, long, global = true)]
    pub output: Option<String>,

    /// Controller model (MPK225, MPK249, MPK261), used to find its preset ports
    #[clap(short, long, global = true)]
    pub model: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show model, name and number of a preset file
    Info {
        file: PathBuf,
    },

    /// List every control of a class
    List {
        file: PathBuf,
        /// knob, fader, pad, switch or transport
        class: ControlClass,
        /// Only this bank
        #[clap(short, long)]
        bank: Option<Bank>,
        /// Also show the raw record bytes
        #[clap(long)]
        raw: bool,
    },

    /// Show one control
    Get {
        file: PathBuf,
        class: ControlClass,
        /// Absolute index ("12"), bank and slot ("B4") or transport name ("Enter")
        control: String,
    },

    /// Change fields of one control, e.g. `type=Note note=C3`
    Set {
        file: PathBuf,
        class: ControlClass,
        control: String,
        #[clap(required = true)]
        fields: Vec<String>,
        /// Write the result here instead of over FILE
        #[clap(long)]
        save_as: Option<PathBuf>,
    },

    /// Copy one bank onto another
    Clone {
        file: PathBuf,
        class: ControlClass,
        src: Bank,
        dst: Bank,
        #[clap(long)]
        save_as: Option<PathBuf>,
    },

    /// Set the MIDI channel of a whole bank, or of all banks
    Channel {
        file: PathBuf,
        class: ControlClass,
        /// Common, USBA1..USBA16 or USBB1..USBB16
        channel: String,
        #[clap(short, long)]
        bank: Option<Bank>,
        #[clap(long)]
        save_as: Option<PathBuf>,
    },

    /// Assign consecutive notes to the 16 pads of a bank
    MapNotes {
        file: PathBuf,
        bank: Bank,
        /// First note, by name ("C3") or number
        start: String,
        /// White keys only
        #[clap(long)]
        diatonic: bool,
        #[clap(long)]
        save_as: Option<PathBuf>,
    },

    /// Change preset name and number
    Meta {
        file: PathBuf,
        #[clap(long)]
        name: Option<String>,
        /// 1..30
        #[clap(long)]
        number: Option<usize>,
        #[clap(long)]
        save_as: Option<PathBuf>,
    },

    /// List MIDI ports
    Ports,

    /// Receive a preset from the controller and save it
    Receive {
        file: PathBuf,
        /// Request this stored preset (1..30) instead of waiting for a manual send
        #[clap(short, long)]
        preset: Option<usize>,
        /// Give up after this many seconds
        #[clap(short, long)]
        timeout: Option<u64>,
    },

    /// Send a preset file to the controller
    Send {
        file: PathBuf,
    },
}
