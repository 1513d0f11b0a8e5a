use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::error::LayerError;
use crate::layer::{EditableLayer, LayerKind};
use crate::orchestrator::{LoadOutcome, WriteReport};

/// Application events
#[derive(Debug)]
pub enum Event {
  /// A line typed at the prompt
  Input(String),
  /// Stdin reached end of file
  InputClosed,
  /// A spawned load finished
  Loaded {
    layer: LayerKind,
    result: Result<LoadOutcome, LayerError>,
  },
  /// A spawned write finished, including its reload
  Written {
    layer: EditableLayer,
    result: Result<WriteReport, LayerError>,
  },
  /// A spawned login finished; `retry` is reloaded on success
  LoggedIn {
    accepted: bool,
    retry: Option<LayerKind>,
  },
  /// Background notice for the console
  Info(String),
  /// Background failure that has no better home
  Error(String),
}

/// Event handler that produces events from stdin lines and spawned tasks
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  /// Spawn the stdin reader; each line becomes an [`Event::Input`].
  pub fn spawn_input(&self) {
    let input_tx = self.tx.clone();
    tokio::spawn(async move {
      let mut lines = BufReader::new(tokio::io::stdin()).lines();
      loop {
        match lines.next_line().await {
          Ok(Some(line)) => {
            if input_tx.send(Event::Input(line)).is_err() {
              break;
            }
          }
          Ok(None) => {
            let _ = input_tx.send(Event::InputClosed);
            break;
          }
          Err(e) => {
            let _ = input_tx.send(Event::Error(format!("stdin: {}", e)));
            let _ = input_tx.send(Event::InputClosed);
            break;
          }
        }
      }
    });
  }

  /// Sender for spawned tasks
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
