//! Scripted card service shared by the integration tests

#![allow(dead_code, unreachable_pub)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ffi::{CStr, CString};
use std::rc::Rc;
use std::time::{Duration, Instant};

use nfc_tagid_core::{
    ActiveProtocol, Bytes, CardService, Clock, Protocol, ReaderState, ReaderStatus, ServiceError,
    ShareMode, TagReader,
};

pub const READER: &CStr = c"ACS ACR122U PICC Interface 00 00";
pub const ATR: &[u8] = &[0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F, 0x0C, 0xA0];

/// Tag reader over `service` driven by the service's manual clock
pub fn tag_reader(service: &MockService) -> TagReader<&MockService, ManualClock> {
    TagReader::new(service).with_clock(service.clock())
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// One scripted answer to a status query
#[derive(Debug, Clone)]
pub enum Step {
    /// The reader reports `status` after `after`, unless the query times out first
    Event(ReaderStatus, Duration),
    /// The query fails after `after`
    Fail(ServiceError, Duration),
}

/// Behaviour of the mock for one test
#[derive(Debug, Clone)]
pub struct Script {
    pub establish: Result<(), ServiceError>,
    pub release: Result<(), ServiceError>,
    pub list_len: Option<Result<usize, ServiceError>>,
    pub readers: Result<Vec<u8>, ServiceError>,
    pub steps: VecDeque<Step>,
    pub connect: Result<Option<Protocol>, ServiceError>,
    pub disconnect: Result<(), ServiceError>,
    pub transmit: Result<Vec<u8>, ServiceError>,
}

impl Default for Script {
    fn default() -> Self {
        let mut readers = READER.to_bytes().to_vec();
        readers.extend_from_slice(&[0, 0]);
        Self {
            establish: Ok(()),
            release: Ok(()),
            list_len: None,
            readers: Ok(readers),
            steps: VecDeque::from([Step::Event(ReaderStatus::Present, Duration::ZERO)]),
            connect: Ok(Some(Protocol::T1)),
            disconnect: Ok(()),
            transmit: Ok(vec![0x04, 0xA1, 0xB2, 0xC3, 0x90, 0x00]),
        }
    }
}

impl Script {
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps = steps.into_iter().collect();
        self
    }

    pub fn with_readers(mut self, names: &[&str]) -> Self {
        let mut buffer = Vec::new();
        for name in names {
            buffer.extend_from_slice(name.as_bytes());
            buffer.push(0);
        }
        buffer.push(0);
        self.readers = Ok(buffer);
        self
    }
}

/// What the mock saw
#[derive(Debug, Default, Clone)]
pub struct Counters {
    pub established: usize,
    pub released: usize,
    pub connected: usize,
    pub disconnected: usize,
    pub live_contexts: Vec<u32>,
    pub live_cards: Vec<u32>,
    pub status_queries: Vec<Duration>,
    pub queried_readers: Vec<CString>,
    pub connected_readers: Vec<CString>,
    pub share_modes: Vec<ShareMode>,
    pub commands: Vec<Vec<u8>>,
    pub protocols: Vec<ActiveProtocol>,
    /// Contexts released while a card was still connected
    pub out_of_order_releases: usize,
}

#[derive(Debug)]
pub struct MockContext(u32);

#[derive(Debug)]
pub struct MockCard(u32);

#[derive(Debug)]
pub struct MockService {
    script: RefCell<Script>,
    clock: ManualClock,
    counters: RefCell<Counters>,
    next_id: Cell<u32>,
}

impl MockService {
    pub fn new(script: Script) -> Self {
        Self::with_clock(script, ManualClock::new())
    }

    pub fn with_clock(script: Script, clock: ManualClock) -> Self {
        Self {
            script: RefCell::new(script),
            clock,
            counters: RefCell::new(Counters::default()),
            next_id: Cell::new(1),
        }
    }

    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    pub fn counters(&self) -> Counters {
        self.counters.borrow().clone()
    }

    /// Every acquired handle was released exactly once
    pub fn assert_balanced(&self) {
        let c = self.counters.borrow();
        assert_eq!(c.established, c.released, "context leak: {c:?}");
        assert_eq!(c.connected, c.disconnected, "card leak: {c:?}");
        assert!(c.live_contexts.is_empty(), "context leak: {c:?}");
        assert!(c.live_cards.is_empty(), "card leak: {c:?}");
        assert_eq!(c.out_of_order_releases, 0, "release order: {c:?}");
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl CardService for MockService {
    type Context = MockContext;
    type Card = MockCard;

    fn establish_context(&self) -> Result<Self::Context, ServiceError> {
        self.script.borrow().establish.clone()?;
        let id = self.next_id();
        let mut c = self.counters.borrow_mut();
        c.established += 1;
        c.live_contexts.push(id);
        Ok(MockContext(id))
    }

    fn release_context(&self, context: Self::Context) -> Result<(), ServiceError> {
        let mut c = self.counters.borrow_mut();
        let pos = c
            .live_contexts
            .iter()
            .position(|&id| id == context.0)
            .expect("released a context that is not live");
        c.live_contexts.remove(pos);
        c.released += 1;
        if !c.live_cards.is_empty() {
            c.out_of_order_releases += 1;
        }
        self.script.borrow().release.clone()
    }

    fn reader_list_len(&self, _context: &Self::Context) -> Result<usize, ServiceError> {
        let script = self.script.borrow();
        match &script.list_len {
            Some(len) => len.clone(),
            None => script.readers.as_ref().map(Vec::len).map_err(Clone::clone),
        }
    }

    fn fill_reader_list(
        &self,
        _context: &Self::Context,
        buffer: &mut [u8],
    ) -> Result<(), ServiceError> {
        let script = self.script.borrow();
        let readers = script.readers.as_ref().map_err(Clone::clone)?;
        if buffer.len() < readers.len() {
            return Err(ServiceError::InsufficientBuffer);
        }
        buffer[..readers.len()].copy_from_slice(readers);
        Ok(())
    }

    fn get_status_change(
        &self,
        _context: &Self::Context,
        timeout: Duration,
        state: &mut ReaderState,
    ) -> Result<(), ServiceError> {
        {
            let mut c = self.counters.borrow_mut();
            c.status_queries.push(timeout);
            c.queried_readers.push(state.reader().to_owned());
        }

        let step = self.script.borrow_mut().steps.pop_front();
        match step {
            Some(Step::Event(status, after)) if after <= timeout => {
                self.clock.advance(after);
                let atr = if status == ReaderStatus::Present {
                    Bytes::from_static(ATR)
                } else {
                    Bytes::new()
                };
                state.set_event(status, atr);
                Ok(())
            }
            Some(Step::Event(status, after)) => {
                // Not reached within this query; keep it for the next one
                self.clock.advance(timeout);
                self.script
                    .borrow_mut()
                    .steps
                    .push_front(Step::Event(status, after - timeout));
                Err(ServiceError::Timeout)
            }
            Some(Step::Fail(err, after)) => {
                self.clock.advance(after.min(timeout));
                Err(err)
            }
            None => {
                self.clock.advance(timeout);
                Err(ServiceError::Timeout)
            }
        }
    }

    fn connect(
        &self,
        _context: &Self::Context,
        reader: &CStr,
        share_mode: ShareMode,
    ) -> Result<(Self::Card, Option<Protocol>), ServiceError> {
        {
            let mut c = self.counters.borrow_mut();
            c.connected_readers.push(reader.to_owned());
            c.share_modes.push(share_mode);
        }
        let protocol = self.script.borrow().connect.clone()?;
        let id = self.next_id();
        let mut c = self.counters.borrow_mut();
        c.connected += 1;
        c.live_cards.push(id);
        Ok((MockCard(id), protocol))
    }

    fn disconnect(&self, card: Self::Card) -> Result<(), ServiceError> {
        let mut c = self.counters.borrow_mut();
        let pos = c
            .live_cards
            .iter()
            .position(|&id| id == card.0)
            .expect("disconnected a card that is not live");
        c.live_cards.remove(pos);
        c.disconnected += 1;
        self.script.borrow().disconnect.clone()
    }

    fn transmit(
        &self,
        _card: &Self::Card,
        protocol: ActiveProtocol,
        command: &[u8],
        response: &mut [u8],
    ) -> Result<usize, ServiceError> {
        {
            let mut c = self.counters.borrow_mut();
            c.commands.push(command.to_vec());
            c.protocols.push(protocol);
        }
        let answer = self.script.borrow().transmit.clone()?;
        if answer.len() > response.len() {
            return Err(ServiceError::InsufficientBuffer);
        }
        response[..answer.len()].copy_from_slice(&answer);
        Ok(answer.len())
    }
}
