use std::io;

use core_events::{AsyncEventSource, Event, StopListener};
use crossterm::event::{Event as CEvent, EventStream};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, trace, warn};

use crate::map_event;

/// Reads the terminal through `crossterm::EventStream`.
#[derive(Debug, Default)]
pub struct CrosstermInputSource;

impl CrosstermInputSource {
    pub fn new() -> Self {
        Self
    }
}

impl AsyncEventSource for CrosstermInputSource {
    fn name(&self) -> &'static str {
        "input"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>, stop: StopListener) -> JoinHandle<()> {
        tokio::spawn(async move {
            let reason = InputTask::new(tx, EventStream::new(), stop).run().await;
            debug!(target: "input", reason = reason.as_str(), "input source finished");
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExitReason {
    Stopped,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Stopped => "stopped",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

/// Forwards mapped events from any crossterm-shaped stream.
pub(crate) struct InputTask<S> {
    sender: Sender<Event>,
    stream: S,
    stop: StopListener,
}

impl<S> InputTask<S>
where
    S: Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    pub(crate) fn new(sender: Sender<Event>, stream: S, stop: StopListener) -> Self {
        Self {
            sender,
            stream,
            stop,
        }
    }

    pub(crate) async fn run(mut self) -> ExitReason {
        info!(target: "input", "input task started");
        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = self.stop.stopped() => break ExitReason::Stopped,
                next = self.stream.next() => next,
            };
            let raw = match next {
                None => break ExitReason::StreamEnded,
                Some(Err(err)) => {
                    warn!(target: "input", error_kind = ?err.kind(), "input stream error");
                    break ExitReason::StreamError;
                }
                Some(Ok(raw)) => raw,
            };
            let Some(input) = map_event(raw) else {
                continue;
            };
            trace!(target: "input", ?input, "input event");
            if self.sender.send(Event::Input(input)).await.is_err() {
                break ExitReason::ChannelClosed;
            }
        };
        info!(target: "input", reason = reason.as_str(), "input task stopped");
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::{InputEvent, KeyEvent, StopSignal};
    use crossterm::event::{KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyModifiers as CMods};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn press(c: char) -> io::Result<CEvent> {
        Ok(CEvent::Key(CKeyEvent::new(CKeyCode::Char(c), CMods::NONE)))
    }

    #[tokio::test]
    async fn forwards_mapped_events_until_stream_ends() {
        let (tx, mut rx) = mpsc::channel(8);
        let stop = StopSignal::new();
        let events = vec![
            press('a'),
            Ok(CEvent::FocusGained),
            Ok(CEvent::Resize(10, 5)),
            press('b'),
        ];
        let reason = InputTask::new(tx, tokio_stream::iter(events), stop.listener())
            .run()
            .await;
        assert_eq!(reason, ExitReason::StreamEnded);

        let mut got = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            got.push(ev);
        }
        assert_eq!(
            got,
            vec![
                Event::Input(InputEvent::Key(KeyEvent::char('a'))),
                Event::Input(InputEvent::Resize(10, 5)),
                Event::Input(InputEvent::Key(KeyEvent::char('b'))),
            ]
        );
    }

    #[tokio::test]
    async fn stream_error_ends_the_task() {
        let (tx, _rx) = mpsc::channel(8);
        let stop = StopSignal::new();
        let events = vec![press('a'), Err(io::Error::other("tty gone")), press('b')];
        let reason = InputTask::new(tx, tokio_stream::iter(events), stop.listener())
            .run()
            .await;
        assert_eq!(reason, ExitReason::StreamError);
    }

    #[tokio::test]
    async fn closed_channel_ends_the_task() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let stop = StopSignal::new();
        let reason = InputTask::new(tx, tokio_stream::iter(vec![press('a')]), stop.listener())
            .run()
            .await;
        assert_eq!(reason, ExitReason::ChannelClosed);
    }

    #[tokio::test]
    async fn stop_signal_wins_over_a_pending_stream() {
        let (tx, _rx) = mpsc::channel(8);
        let stop = StopSignal::new();
        let task = InputTask::new(tx, tokio_stream::pending(), stop.listener());
        let handle = tokio::spawn(task.run());
        stop.stop();
        let reason = tokio::time::timeout(Duration::from_millis(200), handle)
            .await
            .expect("task did not stop")
            .expect("task panicked");
        assert_eq!(reason, ExitReason::Stopped);
    }
}
