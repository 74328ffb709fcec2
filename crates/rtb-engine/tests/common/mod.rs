//! Scripted collaborators shared by the engine integration tests.
//!
//! Each mock is a cheap handle over `Arc<Mutex<_>>`: one clone goes into
//! the machine's [`Peripherals`], the test keeps the other to script
//! inputs and inspect what happened.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rtb_engine::{Controller, Peripherals, Relay, Status};
use rtb_protocol::{Digirom, ResultSegment};

// =========================================================================
// Toy
// =========================================================================

#[derive(Debug, Clone)]
pub struct Executed {
    pub command: String,
    pub show_feedback: bool,
}

#[derive(Default)]
struct ToyState {
    script: VecDeque<Vec<ResultSegment>>,
    executed: Vec<Executed>,
}

/// Answers each execute with the next scripted result; an exhausted
/// script answers with an empty result (the toy is silent).
#[derive(Clone, Default)]
pub struct ScriptedToy(Arc<Mutex<ToyState>>);

impl ScriptedToy {
    pub fn answer(&self, result: Vec<ResultSegment>) {
        self.0.lock().unwrap().script.push_back(result);
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.0.lock().unwrap().executed.clone()
    }

    pub fn execute_count(&self) -> usize {
        self.0.lock().unwrap().executed.len()
    }

    /// Commands run with feedback on, i.e. replays of a peer message.
    pub fn replays(&self) -> Vec<String> {
        self.executed()
            .into_iter()
            .filter(|e| e.show_feedback)
            .map(|e| e.command)
            .collect()
    }
}

impl Controller for ScriptedToy {
    fn execute(&mut self, digirom: &mut Digirom, show_feedback: bool) {
        let mut state = self.0.lock().unwrap();
        state.executed.push(Executed {
            command: digirom.to_string(),
            show_feedback,
        });
        digirom.result = state.script.pop_front().unwrap_or_default();
    }
}

// =========================================================================
// Relay
// =========================================================================

#[derive(Default)]
struct LinkState {
    inbound: VecDeque<String>,
    sent: Vec<String>,
}

/// In-memory relay: the test pushes peer messages, the machine's sends
/// are recorded.
#[derive(Clone, Default)]
pub struct QueueRelay(Arc<Mutex<LinkState>>);

impl QueueRelay {
    pub fn deliver(&self, message: &str) {
        self.0.lock().unwrap().inbound.push_back(message.to_string());
    }

    pub fn sent(&self) -> Vec<String> {
        self.0.lock().unwrap().sent.clone()
    }
}

impl Relay for QueueRelay {
    fn send(&mut self, message: &str) {
        self.0.lock().unwrap().sent.push(message.to_string());
    }

    fn receive(&mut self) -> Option<String> {
        self.0.lock().unwrap().inbound.pop_front()
    }
}

/// Two relays wired back to back: what one sends, the other receives.
pub struct CrossedRelay {
    outbox: Arc<Mutex<VecDeque<String>>>,
    inbox: Arc<Mutex<VecDeque<String>>>,
}

impl CrossedRelay {
    pub fn pair() -> (Self, Self) {
        let a = Arc::new(Mutex::new(VecDeque::new()));
        let b = Arc::new(Mutex::new(VecDeque::new()));
        (
            Self {
                outbox: a.clone(),
                inbox: b.clone(),
            },
            Self { outbox: b, inbox: a },
        )
    }
}

impl Relay for CrossedRelay {
    fn send(&mut self, message: &str) {
        self.outbox.lock().unwrap().push_back(message.to_string());
    }

    fn receive(&mut self) -> Option<String> {
        self.inbox.lock().unwrap().pop_front()
    }
}

// =========================================================================
// Status
// =========================================================================

#[derive(Clone, Default)]
pub struct StatusLog(Arc<Mutex<Vec<(Status, bool)>>>);

impl StatusLog {
    pub fn sink(&self) -> impl FnMut(Status, bool) + Send + use<> {
        let log = self.0.clone();
        move |status, changed| log.lock().unwrap().push((status, changed))
    }

    pub fn entries(&self) -> Vec<(Status, bool)> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

// =========================================================================
// Harness
// =========================================================================

/// One device's collaborators plus the handles to drive them.
#[derive(Clone, Default)]
pub struct Device {
    pub toy: ScriptedToy,
    pub relay: QueueRelay,
    pub status: StatusLog,
}

impl Device {
    pub fn peripherals(&self) -> Peripherals {
        Peripherals::new(self.toy.clone(), self.relay.clone(), self.status.sink())
    }
}

// =========================================================================
// Results
// =========================================================================

/// `n` alternating received/sent 2-byte words; even indices are
/// `0x1000 + i`, odd ones `0x2000 + i`.
pub fn words(n: u16) -> Vec<ResultSegment> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                ResultSegment::received((0x1000 + i).to_be_bytes())
            } else {
                ResultSegment::sent((0x2000 + i).to_be_bytes())
            }
        })
        .collect()
}

/// A 20-byte Talis payload: `seed, seed+1, …`.
pub fn talis_payload(seed: u8) -> Vec<u8> {
    (0..20).map(|i| seed.wrapping_add(i)).collect()
}

pub fn upper_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
