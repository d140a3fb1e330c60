//! Event types consumed by the runtime loop and the async sources that
//! produce them.
//!
//! Every producer pushes into one bounded `mpsc` channel and exits either when
//! the channel closes or when the shared [`StopSignal`] fires.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const EVENT_CHANNEL_CAP: usize = 1024;

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Input(InputEvent),
    /// Periodic timer; drives highlight refresh, git polling and redraw.
    Tick,
    /// Wakes the loop without other meaning (posted by background work).
    Wakeup,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct KeyModifiers: u8 {
        const CTRL  = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const SHIFT = 0b0000_0100;
        /// Command / super key.
        const CMD   = 0b0000_1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    pub fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CTRL)
    }

    pub fn alt(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::ALT)
    }

    pub fn shift(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::SHIFT)
    }

    /// Printable character carried by the event, ignoring shift.
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c)
                if !self
                    .mods
                    .intersects(KeyModifiers::CTRL | KeyModifiers::ALT | KeyModifiers::CMD) =>
            {
                Some(c)
            }
            _ => None,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub column: u16,
    pub row: u16,
    pub mods: KeyModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    LeftDown,
    ScrollUp,
    ScrollDown,
}

/// Owner side of the shared stop signal. Dropping it also stops listeners.
#[derive(Debug)]
pub struct StopSignal {
    tx: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct StopListener {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn listener(&self) -> StopListener {
        StopListener {
            rx: self.tx.subscribe(),
        }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopListener {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once stop was requested (or the signal owner went away).
    pub async fn stopped(&mut self) {
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Trait implemented by any async event producer.
pub trait AsyncEventSource: Send + 'static {
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when
    /// sending fails or when `stop` fires.
    fn spawn(self: Box<Self>, tx: Sender<Event>, stop: StopListener) -> JoinHandle<()>;
}

#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn all registered sources. Each receives its own sender clone and
    /// listener; the registry is empty afterwards.
    pub fn spawn_all(&mut self, tx: &Sender<Event>, stop: &StopSignal) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            tracing::info!(target: "runtime.events", source = src.name(), "spawning event source");
            out.push(src.spawn(tx.clone(), stop.listener()));
        }
        out
    }
}

/// Emits `Event::Tick` every interval.
pub struct TickEventSource {
    interval: Duration,
}

impl TickEventSource {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>, mut stop: StopListener) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = stop.stopped() => break,
                    _ = interval.tick() => {
                        if tx.send(Event::Tick).await.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(target: "runtime.events", source = "tick", "stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct OnceSource;

    impl AsyncEventSource for OnceSource {
        fn name(&self) -> &'static str {
            "once"
        }
        fn spawn(self: Box<Self>, tx: Sender<Event>, _stop: StopListener) -> JoinHandle<()> {
            tokio::spawn(async move {
                let _ = tx.send(Event::Wakeup).await;
            })
        }
    }

    #[test]
    fn printable_ignores_shift_only() {
        assert_eq!(KeyEvent::char('a').printable(), Some('a'));
        assert_eq!(KeyEvent::shift(KeyCode::Char('A')).printable(), Some('A'));
        assert_eq!(KeyEvent::ctrl('a').printable(), None);
        assert_eq!(KeyEvent::plain(KeyCode::Enter).printable(), None);
    }

    #[tokio::test]
    async fn registry_spawns_and_emits() {
        let (tx, mut rx) = mpsc::channel::<Event>(8);
        let stop = StopSignal::new();
        let mut reg = EventSourceRegistry::new();
        reg.register(OnceSource);
        reg.register(TickEventSource::new(Duration::from_millis(10)));
        let handles = reg.spawn_all(&tx, &stop);
        assert!(reg.is_empty());

        let (mut got_wakeup, mut got_tick) = (false, false);
        let deadline = tokio::time::Instant::now() + Duration::from_millis(500);
        while (!got_wakeup || !got_tick) && tokio::time::Instant::now() < deadline {
            if let Ok(Some(ev)) = tokio::time::timeout(Duration::from_millis(20), rx.recv()).await {
                match ev {
                    Event::Wakeup => got_wakeup = true,
                    Event::Tick => got_tick = true,
                    _ => {}
                }
            }
        }
        assert!(got_wakeup);
        assert!(got_tick);

        stop.stop();
        for handle in handles {
            tokio::time::timeout(Duration::from_millis(200), handle)
                .await
                .expect("source did not stop")
                .expect("source panicked");
        }
    }

    #[tokio::test]
    async fn listener_sees_stop_issued_before_waiting() {
        let stop = StopSignal::new();
        let mut listener = stop.listener();
        stop.stop();
        assert!(listener.is_stopped());
        tokio::time::timeout(Duration::from_millis(50), listener.stopped())
            .await
            .expect("stop not observed");
    }
}
