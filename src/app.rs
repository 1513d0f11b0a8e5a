use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cache::{CacheStore, RegionKey};
use crate::commands::{self, Action, COMMANDS};
use crate::config::Config;
use crate::environment::EnvironmentAdapters;
use crate::error::LayerError;
use crate::event::{Event, EventHandler};
use crate::http::{ReqwestTransport, Transport};
use crate::layer::{EditableLayer, LayerKind};
use crate::orchestrator::{LayerOrchestrator, LayerState, LoadOutcome, LoadSource, WriteReport};
use crate::region::{self, REGIONS};
use crate::registry::FeatureRegistries;
use crate::ui::ConsoleRenderer;
use crate::wfs::{Condition, FeatureDraft, LayerFilter, LonLat, SessionAuth, WfsClient};

/// Longest slice of a rejected write response echoed to the console
const RAW_RESPONSE_PREVIEW: usize = 400;

/// Main application state
pub struct App {
  /// Layer coordination; shared with spawned loads
  orchestrator: Arc<LayerOrchestrator>,

  /// Feature-server session
  auth: Arc<SessionAuth>,

  /// Event channel; taken by `run`
  events: Option<EventHandler>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Set once an automatic login was attempted, so a rejected session does not loop
  auto_login_tried: bool,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, region: RegionKey) -> Result<Self> {
    if region::resolve(&region).is_empty() {
      return Err(eyre!(
        "Unknown region '{}' (expected one of: {})",
        region,
        REGIONS.join(", ")
      ));
    }

    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
    let adapters = EnvironmentAdapters::new(transport.clone(), &config.environment)?;
    let wfs = WfsClient::new(transport.clone(), &config.feature_server)?;
    let auth = SessionAuth::new(transport, &config.feature_server)?;

    let orchestrator = LayerOrchestrator::new(
      CacheStore::shared(config.cache.duration()),
      FeatureRegistries::new(),
      adapters,
      wfs,
      Arc::new(ConsoleRenderer::new()),
      region,
    );

    let events = EventHandler::new();
    let event_tx = events.sender();

    Ok(Self {
      orchestrator: Arc::new(orchestrator),
      auth: Arc::new(auth),
      events: Some(events),
      event_tx,
      auto_login_tried: false,
      should_quit: false,
    })
  }

  /// Load one layer, print it and return. Logs in once from the
  /// environment if the feature server asks for it.
  pub async fn load_once(&self, layer: LayerKind, pairs: &[(String, String)]) -> Result<()> {
    if !pairs.is_empty() {
      let editable = layer
        .editable()
        .ok_or_else(|| eyre!("Layer {} does not take filters", layer))?;
      let filter = LayerFilter::from_pairs(editable, pairs).map_err(|e| eyre!(e))?;
      self.orchestrator.set_filter(filter);
    }

    let outcome = match self.orchestrator.activate(layer).await {
      Err(e) if e.is_auth_required() => {
        let credentials = Config::credentials()
          .ok_or_else(|| eyre!("{}; set GEODASH_USERNAME and GEODASH_PASSWORD", e))?;
        if !self
          .auth
          .login(&credentials.username, &credentials.password)
          .await?
        {
          return Err(eyre!("Feature server rejected the login"));
        }
        self.orchestrator.load(layer).await?
      }
      other => other?,
    };

    if let LoadOutcome::Rendered { records, source, .. } = outcome {
      info!(%layer, records, source = source_label(source), "one-shot load finished");
    }
    Ok(())
  }

  pub async fn run(&mut self) -> Result<()> {
    let mut events = self
      .events
      .take()
      .ok_or_else(|| eyre!("Session already ran"))?;
    events.spawn_input();

    println!("geodash: type 'help' for commands, 'quit' to exit");
    self.prompt();

    // Main loop
    while !self.should_quit {
      let Some(event) = events.next().await else {
        break;
      };
      self.handle_event(event);
    }

    Ok(())
  }

  fn prompt(&self) {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "geodash [{}]> ", self.orchestrator.region());
    let _ = out.flush();
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Input(line) => {
        self.handle_input(&line);
        if !self.should_quit {
          self.prompt();
        }
      }
      Event::InputClosed => self.should_quit = true,
      Event::Loaded { layer, result } => self.report_load(layer, result),
      Event::Written { layer, result } => self.report_write(layer, result),
      Event::LoggedIn { accepted, retry } => {
        if !accepted {
          eprintln!("Login rejected");
          return;
        }
        println!("Logged in");
        if let Some(layer) = retry {
          self.spawn_load(layer, move |o| async move { o.load(layer).await });
        }
      }
      Event::Info(msg) => println!("{}", msg),
      Event::Error(msg) => eprintln!("Error: {}", msg),
    }
  }

  fn handle_input(&mut self, line: &str) {
    if line.trim().is_empty() {
      return;
    }

    let action = match commands::parse(line) {
      Ok(action) => action,
      Err(e) => {
        eprintln!("{}", e);
        let head = line.split_whitespace().next().unwrap_or_default();
        let suggestions = commands::get_suggestions(head);
        if let Some(best) = suggestions.first() {
          eprintln!("did you mean: {}", best.usage);
        }
        return;
      }
    };

    debug!(?action, "executing command");
    if let Err(e) = self.execute(action) {
      eprintln!("{}", e);
    }
  }

  fn execute(&mut self, action: Action) -> std::result::Result<(), String> {
    match action {
      Action::On(layer) => {
        let verb = if self.orchestrator.state(layer) == LayerState::Loaded {
          "reloading"
        } else {
          "loading"
        };
        println!("{}: {}", layer, verb);
        self.spawn_load(layer, move |o| async move { o.activate(layer).await });
      }
      Action::Off(layer) => {
        if !self.orchestrator.is_active(layer) {
          println!("{}: not active", layer);
        }
        self.orchestrator.deactivate(layer);
      }
      Action::Region(None) => {
        let current = self.orchestrator.region();
        for name in REGIONS {
          let marker = if current.as_str() == *name { "*" } else { " " };
          println!("{} {}", marker, name);
        }
      }
      Action::Region(Some(region)) => {
        let orchestrator = self.orchestrator.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          for (layer, result) in orchestrator.set_region(region).await {
            let _ = tx.send(Event::Loaded { layer, result });
          }
        });
      }
      Action::Filter { layer, pairs } => {
        let kind = LayerKind::from(layer);
        if pairs.is_empty() {
          self.spawn_load(kind, move |o| async move { o.clear_filter(layer).await });
        } else {
          let filter = LayerFilter::from_pairs(layer, &pairs)?;
          self.spawn_load(kind, move |o| async move { o.apply_filter(filter).await });
        }
      }
      Action::Get { layer, id: None } => {
        let ids = self.orchestrator.feature_ids(layer);
        if ids.is_empty() {
          println!("{}: nothing loaded (try 'on {}')", layer, layer);
        }
        for id in ids {
          println!("{}", id);
        }
      }
      Action::Get { layer, id: Some(id) } => {
        let feature = self
          .orchestrator
          .feature(layer.into(), &id)
          .map_err(|e| e.to_string())?;
        println!("{}", id);
        let mut keys: Vec<_> = feature.properties.keys().collect();
        keys.sort();
        for key in keys {
          println!("  {:<16} {}", key, feature.property(key).unwrap_or_default());
        }
        if let Some(at) = feature.point() {
          println!("  {:<16} {}, {}", "location", at.lon, at.lat);
        }
      }
      Action::Create { layer, at, pairs } => {
        let at = LonLat::new(at.0, at.1).map_err(|e| e.to_string())?;
        let mut draft = FeatureDraft::empty(layer);
        draft.apply_pairs(&pairs)?;
        self.spawn_write(layer, move |o| async move { o.create(&draft, at).await });
      }
      Action::Update {
        layer,
        id,
        at,
        pairs,
      } => {
        let feature = self
          .orchestrator
          .feature(layer.into(), &id)
          .map_err(|e| e.to_string())?;
        let at = match at {
          Some((lon, lat)) => LonLat::new(lon, lat).map_err(|e| e.to_string())?,
          None => feature
            .point()
            .ok_or_else(|| format!("{} has no point geometry; give <lon> <lat>", id))?,
        };
        let mut draft = FeatureDraft::from_feature(layer, &feature);
        draft.apply_pairs(&pairs)?;
        self.spawn_write(layer, move |o| async move { o.update(&id, &draft, at).await });
      }
      Action::Delete { layer, id } => {
        let editable = layer
          .editable()
          .ok_or_else(|| LayerError::NotEditable(layer).to_string())?;
        self.spawn_write(editable, move |o| async move { o.delete(layer, &id).await });
      }
      Action::CacheStatus => {
        for (class, entries) in self.orchestrator.cache_status() {
          println!("{:<12} {} entries", class, entries);
        }
      }
      Action::CacheClear(layer) => {
        let class = match layer {
          Some(layer) => Some(
            layer
              .resource_class()
              .ok_or_else(|| format!("layer {} is never cached", layer))?,
          ),
          None => None,
        };
        self.orchestrator.clear_cache(class);
        println!("cache cleared");
      }
      Action::Login(credentials) => {
        let (username, password) = match credentials {
          Some(pair) => pair,
          None => {
            let c = Config::credentials()
              .ok_or("usage: login <user> <password> (or set GEODASH_USERNAME and GEODASH_PASSWORD)")?;
            (c.username, c.password)
          }
        };
        self.auto_login_tried = false;
        self.spawn_login(username, password, None);
      }
      Action::Logout => {
        let auth = self.auth.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          let event = match auth.logout().await {
            Ok(()) => Event::Info("Logged out".to_string()),
            Err(e) => Event::Error(e.to_string()),
          };
          let _ = tx.send(event);
        });
      }
      Action::Status => {
        println!("region: {}", self.orchestrator.region());
        for status in self.orchestrator.statuses() {
          let mut line = format!(
            "{:<10} {:<3} {:<8} {:>5} records",
            status.layer,
            if status.active { "on" } else { "off" },
            status.state,
            status.records,
          );
          if status.unindexed > 0 {
            line.push_str(&format!(" ({} without id)", status.unindexed));
          }
          if status.filtered {
            let terms: Vec<String> = self
              .orchestrator
              .filter(status.layer)
              .map(|f| f.conditions().iter().map(condition_label).collect())
              .unwrap_or_default();
            line.push_str(&format!("  [filter {}]", terms.join(" ")));
          }
          println!("{}", line);
        }
        let auth = self.auth.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          let session = if auth.check().await {
            "authenticated"
          } else {
            "anonymous"
          };
          let _ = tx.send(Event::Info(format!("session: {}", session)));
        });
      }
      Action::Help => {
        for cmd in COMMANDS {
          println!("{:<62} {}", cmd.usage, cmd.description);
        }
        println!("layers: {}", LayerKind::ALL.map(LayerKind::name).join(", "));
      }
      Action::Quit => self.should_quit = true,
    }
    Ok(())
  }

  fn spawn_load<F, Fut>(&self, layer: LayerKind, job: F)
  where
    F: FnOnce(Arc<LayerOrchestrator>) -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<LoadOutcome, LayerError>> + Send + 'static,
  {
    let orchestrator = self.orchestrator.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let result = job(orchestrator).await;
      let _ = tx.send(Event::Loaded { layer, result });
    });
  }

  fn spawn_write<F, Fut>(&self, layer: EditableLayer, job: F)
  where
    F: FnOnce(Arc<LayerOrchestrator>) -> Fut + Send + 'static,
    Fut: Future<Output = std::result::Result<WriteReport, LayerError>> + Send + 'static,
  {
    let orchestrator = self.orchestrator.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let result = job(orchestrator).await;
      let _ = tx.send(Event::Written { layer, result });
    });
  }

  fn spawn_login(&self, username: String, password: String, retry: Option<LayerKind>) {
    let auth = self.auth.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let event = match auth.login(&username, &password).await {
        Ok(accepted) => Event::LoggedIn { accepted, retry },
        Err(e) => Event::Error(e.to_string()),
      };
      let _ = tx.send(event);
    });
  }

  /// Route an auth-required failure to a login with environment credentials,
  /// at most once until the user logs in by hand.
  fn route_to_login(&mut self, retry: Option<LayerKind>) {
    match Config::credentials() {
      Some(c) if !self.auto_login_tried => {
        self.auto_login_tried = true;
        println!("Logging in as {}", c.username);
        self.spawn_login(c.username, c.password, retry);
      }
      _ => eprintln!("Use 'login <user> <password>' to authenticate"),
    }
  }

  fn report_load(&mut self, layer: LayerKind, result: std::result::Result<LoadOutcome, LayerError>) {
    match result {
      Ok(outcome) => report_outcome(&outcome),
      Err(e) if e.is_auth_required() => {
        eprintln!("{}: authentication required", layer);
        self.route_to_login(Some(layer));
      }
      Err(e) => eprintln!("Error: {}", e),
    }
  }

  fn report_write(&mut self, layer: EditableLayer, result: std::result::Result<WriteReport, LayerError>) {
    let report = match result {
      Ok(report) => report,
      Err(e) if e.is_auth_required() => {
        eprintln!("{}: authentication required, write not sent", layer);
        self.route_to_login(None);
        return;
      }
      Err(e) => {
        eprintln!("Error: {}", e);
        return;
      }
    };

    if !report.outcome.success {
      let raw = &report.outcome.raw_response;
      let preview: String = raw.chars().take(RAW_RESPONSE_PREVIEW).collect();
      eprintln!(
        "{}: write rejected (HTTP {})\n{}",
        layer, report.outcome.status, preview
      );
      return;
    }

    println!("{}: write committed (HTTP {})", layer, report.outcome.status);
    match report.reload {
      Some(Ok(outcome)) => report_outcome(&outcome),
      Some(Err(e)) => eprintln!("{}: reload failed: {}", layer, e),
      None => {}
    }
  }
}

fn report_outcome(outcome: &LoadOutcome) {
  match outcome {
    LoadOutcome::Rendered {
      layer,
      source,
      records,
    } => println!("{}: {} records from {}", layer, records, source_label(*source)),
    LoadOutcome::Superseded { layer } => debug!(%layer, "load superseded"),
  }
}

fn condition_label(condition: &Condition) -> String {
  match condition {
    Condition::Like { property, term } => format!("{}~{}", property, term),
    Condition::Equals { property, value } => format!("{}={}", property, value),
  }
}

fn source_label(source: LoadSource) -> &'static str {
  match source {
    LoadSource::Network => "network",
    LoadSource::Cache => "cache",
  }
}
