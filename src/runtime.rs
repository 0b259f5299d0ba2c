use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};

/// One external trigger, as the main loop sees it: a keypress, a terminal
/// resize, or the tick that advances the countdown and the result flash.
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Where key/resize events come from. Production reads crossterm on a
/// background thread; tests feed a plain channel, so the event loop runs
/// without a TTY.
pub trait QuizEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for the next event.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

pub struct CrosstermEventSource {
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || Self::pump(tx));
        Self { rx }
    }

    fn pump(tx: Sender<QuizEvent>) {
        loop {
            let sent = match event::read() {
                Ok(Event::Key(key)) => tx.send(QuizEvent::Key(key)),
                Ok(Event::Resize(_, _)) => tx.send(QuizEvent::Resize),
                Ok(_) => Ok(()),
                // terminal is gone; nothing left to read
                Err(_) => break,
            };
            if sent.is_err() {
                // receiver dropped, the app is shutting down
                break;
            }
        }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-backed source for headless tests.
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }

    /// A source plus the sender that feeds it.
    pub fn pair() -> (Sender<QuizEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Single-threaded driver: each `step` blocks for at most one tick interval
/// and yields exactly one trigger. Input silence becomes the tick, so the
/// countdown and the flash TTL advance even while nobody types.
pub struct Runner<E: QuizEventSource> {
    events: E,
    tick_every: Duration,
}

impl<E: QuizEventSource> Runner<E> {
    pub fn new(events: E, tick_every: Duration) -> Self {
        Self { events, tick_every }
    }

    pub fn step(&self) -> QuizEvent {
        match self.events.recv_timeout(self.tick_every) {
            Ok(ev) => ev,
            // timed out or the source hung up; either way the clock moves on
            Err(_) => QuizEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_becomes_a_tick() {
        let (_tx, source) = TestEventSource::pair();
        let runner = Runner::new(source, Duration::from_millis(1));
        assert!(matches!(runner.step(), QuizEvent::Tick));
    }

    #[test]
    fn queued_events_come_through_in_order() {
        let (tx, source) = TestEventSource::pair();
        tx.send(QuizEvent::Resize).unwrap();
        tx.send(QuizEvent::Tick).unwrap();
        let runner = Runner::new(source, Duration::from_millis(10));

        assert!(matches!(runner.step(), QuizEvent::Resize));
        assert!(matches!(runner.step(), QuizEvent::Tick));
    }

    #[test]
    fn disconnected_source_degrades_to_ticks() {
        let (tx, source) = TestEventSource::pair();
        drop(tx);
        let runner = Runner::new(source, Duration::from_millis(1));
        assert!(matches!(runner.step(), QuizEvent::Tick));
    }
}
