//! Event bus.
//!
//! Terminal input, timers, backend results and notifications are all
//! normalised into one `AppEvent` enum on a tokio unbounded channel. The main
//! loop is the single consumer and the only place `AppState` is mutated.
//!
//! Render (33 ms) and logic ticks (250 ms) run on independent intervals.

use std::time::Duration;

use catcheck_core::notify::Notification;
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::api::ApiEvent;

#[derive(Debug)]
pub enum AppEvent {
    /// Key press; release and repeat events are filtered out.
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Logic tick (250 ms): expires notifications, advances the spinner.
    Tick,
    /// Triggers exactly one `terminal.draw()`.
    Render,
    /// Periodic sheet refresh is due.
    RefreshDue,
    /// Outcome of a backend call made by the API worker.
    Api(Box<ApiEvent>),
    Notify(Notification),
    Quit,
}

impl From<ApiEvent> for AppEvent {
    fn from(event: ApiEvent) -> Self {
        AppEvent::Api(Box::new(event))
    }
}

/// Sender and receiver of the event channel. `tx` is cloned into every
/// producer; `rx` belongs to the main loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the task that feeds terminal input and the two timers into `tx`.
///
/// The crossterm stream is fused so a terminated input stream is never polled
/// again. Send errors mean the loop is gone and are ignored.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = tick_tick => {
                    let _ = tx.send(AppEvent::Tick);
                }
                _ = render_tick => {
                    let _ = tx.send(AppEvent::Render);
                }
                maybe_event = crossterm_event => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            let _ = tx.send(AppEvent::Key(key));
                        }
                        Some(Ok(Event::Resize(w, h))) => {
                            let _ = tx.send(AppEvent::Resize(w, h));
                        }
                        Some(Ok(Event::Mouse(mouse))) => {
                            let _ = tx.send(AppEvent::Mouse(mouse));
                        }
                        Some(Err(e)) => {
                            tracing::warn!("terminal input error: {}", e);
                        }
                        None => {
                            let _ = tx.send(AppEvent::Quit);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}
