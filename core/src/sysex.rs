//! Reassembly of a SysEx message delivered in arbitrary chunks

use log::*;

pub const SYSEX_START: u8 = 0xf0;
pub const SYSEX_END: u8 = 0xf7;

#[derive(Clone, Debug, PartialEq)]
pub enum State {
    Idle,
    Assembling(Vec<u8>),
    Aborted,
}

/// Real-time status bytes (clock, start/stop, active sensing, reset) may
/// be sent in the middle of a SysEx message
pub fn is_realtime(byte: u8) -> bool {
    byte >= 0xf8
}

/// Collects chunks from the first one starting with 0xF0 until one ends
/// with 0xF7 and hands out the whole message once.
#[derive(Debug)]
pub struct Reassembler {
    state: State,
    limit: Option<usize>,
}

impl Default for Reassembler {
    fn default() -> Self {
        Reassembler { state: State::Idle, limit: None }
    }
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A message growing past `limit` bytes is dropped and the machine
    /// goes back to Idle
    pub fn with_limit(limit: usize) -> Self {
        Reassembler { state: State::Idle, limit: Some(limit) }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn is_aborted(&self) -> bool {
        self.state == State::Aborted
    }

    /// Returns the complete message when `chunk` finishes it
    pub fn feed(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        match self.state {
            State::Aborted => {
                trace!("aborted, dropping {} bytes", chunk.len());
                None
            }
            State::Idle => {
                if chunk.first() != Some(&SYSEX_START) {
                    warn!("Ignoring {} bytes outside of a SysEx message", chunk.len());
                    return None;
                }
                self.state = State::Assembling(Vec::new());
                self.append(chunk)
            }
            State::Assembling(_) => self.append(chunk)
        }
    }

    fn append(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        let State::Assembling(buffer) = &mut self.state else {
            return None;
        };
        buffer.extend_from_slice(chunk);
        if let Some(limit) = self.limit.filter(|l| buffer.len() > *l) {
            warn!("Dropping SysEx message longer than {} bytes", limit);
            self.state = State::Idle;
            return None;
        }
        if buffer.last() != Some(&SYSEX_END) {
            return None;
        }
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Assembling(buffer) => {
                debug!("SysEx message complete: {} bytes", buffer.len());
                Some(buffer)
            }
            _ => None
        }
    }

    /// Drop any partial message. Further chunks are ignored until `reset`.
    pub fn abort(&mut self) {
        if let State::Assembling(buffer) = &self.state {
            debug!("Abandoning partial SysEx message ({} bytes)", buffer.len());
        }
        self.state = State::Aborted;
    }

    pub fn reset(&mut self) {
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_message() {
        let mut r = Reassembler::new();
        assert_eq!(r.feed(&[0xf0, 0x47, 0x00]), None);
        assert!(matches!(r.state(), State::Assembling(_)));
        assert_eq!(r.feed(&[0x24, 0x6d]), None);
        assert_eq!(r.feed(&[0x01, 0xf7]), Some(vec![0xf0, 0x47, 0x00, 0x24, 0x6d, 0x01, 0xf7]));
        assert_eq!(r.state(), &State::Idle);
    }

    #[test]
    fn single_chunk_message() {
        let mut r = Reassembler::new();
        assert_eq!(r.feed(&[0xf0, 0xf7]), Some(vec![0xf0, 0xf7]));
    }

    #[test]
    fn noise_outside_frame_is_dropped() {
        let mut r = Reassembler::new();
        assert_eq!(r.feed(&[]), None);
        assert_eq!(r.feed(&[0xb0, 0x07, 0x40]), None);
        assert_eq!(r.feed(&[0x12, 0xf7]), None);
        assert_eq!(r.state(), &State::Idle);
        assert_eq!(r.feed(&[0xf0, 0x01]), None);
        assert_eq!(r.feed(&[0xf7]), Some(vec![0xf0, 0x01, 0xf7]));
    }

    #[test]
    fn assembling_takes_any_bytes() {
        let mut r = Reassembler::new();
        r.feed(&[0xf0]);
        // an embedded 0xf7 that isn't the last byte doesn't end the message
        assert_eq!(r.feed(&[0xf7, 0x00]), None);
        assert_eq!(r.feed(&[]), None);
        assert_eq!(r.feed(&[0xf0, 0xf7]), Some(vec![0xf0, 0xf7, 0x00, 0xf0, 0xf7]));
    }

    #[test]
    fn oversized_message_is_dropped() {
        let mut r = Reassembler::with_limit(4);
        assert_eq!(r.feed(&[0xf0, 0x01, 0x02]), None);
        assert_eq!(r.feed(&[0x03, 0x04]), None);
        assert_eq!(r.state(), &State::Idle);
        // the tail of the dropped message is noise
        assert_eq!(r.feed(&[0x05, 0xf7]), None);
        assert_eq!(r.feed(&[0xf0, 0x01, 0x02, 0xf7]), Some(vec![0xf0, 0x01, 0x02, 0xf7]));
    }

    #[test]
    fn realtime_bytes() {
        assert!(is_realtime(0xf8));
        assert!(is_realtime(0xfe));
        assert!(!is_realtime(SYSEX_END));
        assert!(!is_realtime(0x47));
    }

    #[test]
    fn delivers_once() {
        let mut r = Reassembler::new();
        let chunks: [&[u8]; 4] = [&[0xf0, 0x01], &[0xf7], &[0x02], &[0xf7]];
        let delivered = chunks.iter().filter_map(|c| r.feed(c)).count();
        assert_eq!(delivered, 1);
    }

    #[test]
    fn abort_mid_message() {
        let mut r = Reassembler::new();
        r.feed(&[0xf0, 0x01]);
        r.abort();
        assert!(r.is_aborted());
        assert_eq!(r.feed(&[0x02, 0xf7]), None);
        assert_eq!(r.feed(&[0xf0, 0xf7]), None);

        r.reset();
        assert_eq!(r.feed(&[0xf0, 0xf7]), Some(vec![0xf0, 0xf7]));
    }
}
