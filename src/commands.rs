//! Available commands, autocomplete and argument parsing

use crate::cache::RegionKey;
use crate::layer::{EditableLayer, LayerKind};
use crate::region::REGIONS;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "on",
    aliases: &["show", "activate"],
    usage: "on <layer>",
    description: "Activate and load a layer",
  },
  Command {
    name: "off",
    aliases: &["hide", "deactivate"],
    usage: "off <layer>",
    description: "Deactivate a layer",
  },
  Command {
    name: "region",
    aliases: &["r"],
    usage: "region [name]",
    description: "Switch region or list regions",
  },
  Command {
    name: "filter",
    aliases: &["f", "search"],
    usage: "filter <hospitals|students> [key=value ...]",
    description: "Filter an editable layer; no criteria clears it",
  },
  Command {
    name: "get",
    aliases: &["g", "ls"],
    usage: "get <hospitals|students> [id]",
    description: "List loaded feature ids or show one feature",
  },
  Command {
    name: "create",
    aliases: &["c", "add", "new"],
    usage: "create <hospitals|students> <lon> <lat> key=value ...",
    description: "Insert a feature",
  },
  Command {
    name: "update",
    aliases: &["u", "edit"],
    usage: "update <hospitals|students> <id> [<lon> <lat>] key=value ...",
    description: "Update a loaded feature",
  },
  Command {
    name: "delete",
    aliases: &["d", "rm"],
    usage: "delete <hospitals|students> <id>",
    description: "Delete a loaded feature",
  },
  Command {
    name: "cache",
    aliases: &["cc"],
    usage: "cache [clear [layer]]",
    description: "Show cache entries or clear them",
  },
  Command {
    name: "login",
    aliases: &["auth"],
    usage: "login [user password]",
    description: "Log in to the feature server",
  },
  Command {
    name: "logout",
    aliases: &[],
    usage: "logout",
    description: "End the feature-server session",
  },
  Command {
    name: "status",
    aliases: &["st", "layers"],
    usage: "status",
    description: "Show layer states",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "List commands",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit geodash",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  On(LayerKind),
  Off(LayerKind),
  /// `None` lists the known regions
  Region(Option<RegionKey>),
  /// Empty `pairs` clears the filter
  Filter {
    layer: EditableLayer,
    pairs: Vec<(String, String)>,
  },
  Get {
    layer: EditableLayer,
    id: Option<String>,
  },
  Create {
    layer: EditableLayer,
    at: (f64, f64),
    pairs: Vec<(String, String)>,
  },
  /// `at: None` keeps the feature's current location
  Update {
    layer: EditableLayer,
    id: String,
    at: Option<(f64, f64)>,
    pairs: Vec<(String, String)>,
  },
  Delete {
    layer: LayerKind,
    id: String,
  },
  CacheStatus,
  /// `None` clears every namespace
  CacheClear(Option<LayerKind>),
  Login(Option<(String, String)>),
  Logout,
  Status,
  Help,
  Quit,
}

/// Parse one input line. Only exact names, aliases or an unambiguous
/// name prefix select a command.
pub fn parse(line: &str) -> Result<Action, String> {
  let words = split_words(line)?;
  let Some((head, args)) = words.split_first() else {
    return Err("empty command".to_string());
  };
  let cmd = resolve(head)?;

  match cmd.name {
    "on" => Ok(Action::On(layer_arg(args, cmd)?)),
    "off" => Ok(Action::Off(layer_arg(args, cmd)?)),
    "region" => match args {
      [] => Ok(Action::Region(None)),
      [name] => {
        let name = name.to_lowercase();
        if REGIONS.contains(&name.as_str()) {
          Ok(Action::Region(Some(RegionKey::new(name))))
        } else {
          Err(format!("unknown region '{}' (expected one of: {})", name, REGIONS.join(", ")))
        }
      }
      _ => Err(usage(cmd)),
    },
    "filter" => {
      let (layer, rest) = editable_arg(args, cmd)?;
      Ok(Action::Filter {
        layer,
        pairs: pairs(rest)?,
      })
    }
    "get" => {
      let (layer, rest) = editable_arg(args, cmd)?;
      match rest {
        [] => Ok(Action::Get { layer, id: None }),
        [id] => Ok(Action::Get {
          layer,
          id: Some(id.clone()),
        }),
        _ => Err(usage(cmd)),
      }
    }
    "create" => {
      let (layer, rest) = editable_arg(args, cmd)?;
      let Some((at, rest)) = coordinates(rest)? else {
        return Err(usage(cmd));
      };
      Ok(Action::Create {
        layer,
        at,
        pairs: pairs(rest)?,
      })
    }
    "update" => {
      let (layer, rest) = editable_arg(args, cmd)?;
      let Some((id, rest)) = rest.split_first() else {
        return Err(usage(cmd));
      };
      let (at, rest) = match coordinates(rest)? {
        Some((at, rest)) => (Some(at), rest),
        None => (None, rest),
      };
      Ok(Action::Update {
        layer,
        id: id.clone(),
        at,
        pairs: pairs(rest)?,
      })
    }
    "delete" => match args {
      [layer, id] => Ok(Action::Delete {
        layer: layer.parse()?,
        id: id.clone(),
      }),
      _ => Err(usage(cmd)),
    },
    "cache" => match args {
      [] => Ok(Action::CacheStatus),
      [verb] if verb == "clear" => Ok(Action::CacheClear(None)),
      [verb, layer] if verb == "clear" => Ok(Action::CacheClear(Some(layer.parse()?))),
      _ => Err(usage(cmd)),
    },
    "login" => match args {
      [] => Ok(Action::Login(None)),
      [user, password] => Ok(Action::Login(Some((user.clone(), password.clone())))),
      _ => Err(usage(cmd)),
    },
    "logout" => Ok(Action::Logout),
    "status" => Ok(Action::Status),
    "help" => Ok(Action::Help),
    "quit" => Ok(Action::Quit),
    other => Err(format!("unhandled command '{}'", other)),
  }
}

fn resolve(word: &str) -> Result<&'static Command, String> {
  let word = word.to_lowercase();
  if let Some(cmd) = COMMANDS
    .iter()
    .find(|c| c.name == word || c.aliases.contains(&word.as_str()))
  {
    return Ok(cmd);
  }

  let prefixed: Vec<_> = COMMANDS.iter().filter(|c| c.name.starts_with(&word)).collect();
  match prefixed.as_slice() {
    [cmd] => Ok(*cmd),
    [] => Err(format!("unknown command '{}' (try 'help')", word)),
    many => Err(format!(
      "ambiguous command '{}': {}",
      word,
      many.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
    )),
  }
}

fn usage(cmd: &Command) -> String {
  format!("usage: {}", cmd.usage)
}

fn layer_arg(args: &[String], cmd: &Command) -> Result<LayerKind, String> {
  match args {
    [layer] => layer.parse(),
    _ => Err(usage(cmd)),
  }
}

fn editable_arg<'a>(args: &'a [String], cmd: &Command) -> Result<(EditableLayer, &'a [String]), String> {
  let Some((layer, rest)) = args.split_first() else {
    return Err(usage(cmd));
  };
  let kind: LayerKind = layer.parse()?;
  let editable = kind
    .editable()
    .ok_or_else(|| format!("layer {} is not editable", kind))?;
  Ok((editable, rest))
}

/// Leading `<lon> <lat>` if the first two words are numbers.
fn coordinates(args: &[String]) -> Result<Option<((f64, f64), &[String])>, String> {
  match args {
    [lon, lat, rest @ ..] => match (lon.parse::<f64>(), lat.parse::<f64>()) {
      (Ok(lon), Ok(lat)) => Ok(Some(((lon, lat), rest))),
      (Ok(_), Err(_)) => Err(format!("invalid latitude '{}'", lat)),
      _ => Ok(None),
    },
    _ => Ok(None),
  }
}

fn pairs(args: &[String]) -> Result<Vec<(String, String)>, String> {
  args
    .iter()
    .map(|arg| {
      arg
        .split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", arg))
    })
    .collect()
}

/// Whitespace-separated words; double quotes group, e.g. `name="Bang Rak"`.
fn split_words(line: &str) -> Result<Vec<String>, String> {
  let mut words = Vec::new();
  let mut current = String::new();
  let mut in_word = false;
  let mut quoted = false;

  for c in line.chars() {
    match c {
      '"' => {
        quoted = !quoted;
        in_word = true;
      }
      c if c.is_whitespace() && !quoted => {
        if in_word {
          words.push(std::mem::take(&mut current));
          in_word = false;
        }
      }
      c => {
        current.push(c);
        in_word = true;
      }
    }
  }

  if quoted {
    return Err("unterminated quote".to_string());
  }
  if in_word {
    words.push(current);
  }
  Ok(words)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pair(k: &str, v: &str) -> (String, String) {
    (k.to_string(), v.to_string())
  }

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("region");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "region");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("rm");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "delete");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("fil");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "filter");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("gout");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "logout");
  }

  #[test]
  fn test_parse_toggle_and_region() {
    assert_eq!(parse("on aqi"), Ok(Action::On(LayerKind::AirQuality)));
    assert_eq!(parse("hide quakes"), Ok(Action::Off(LayerKind::Earthquakes)));
    assert_eq!(
      parse("region North"),
      Ok(Action::Region(Some(RegionKey::new("north"))))
    );
    assert_eq!(parse("r"), Ok(Action::Region(None)));
    assert!(parse("region atlantis").is_err());
  }

  #[test]
  fn test_parse_filter_with_quoted_value() {
    assert_eq!(
      parse(r#"filter hospitals name="Bang Rak" district=Pathum"#),
      Ok(Action::Filter {
        layer: EditableLayer::Hospitals,
        pairs: vec![pair("name", "Bang Rak"), pair("district", "Pathum")],
      })
    );
    assert_eq!(
      parse("filter students"),
      Ok(Action::Filter {
        layer: EditableLayer::Students,
        pairs: vec![],
      })
    );
    assert!(parse("filter weather name=x").is_err());
    assert!(parse(r#"filter hospitals name="open"#).is_err());
  }

  #[test]
  fn test_parse_writes() {
    assert_eq!(
      parse("create hospitals 100.5 13.7 name_th=ทดสอบ"),
      Ok(Action::Create {
        layer: EditableLayer::Hospitals,
        at: (100.5, 13.7),
        pairs: vec![pair("name_th", "ทดสอบ")],
      })
    );
    assert_eq!(
      parse("update students students.3 faculty=Science"),
      Ok(Action::Update {
        layer: EditableLayer::Students,
        id: "students.3".to_string(),
        at: None,
        pairs: vec![pair("faculty", "Science")],
      })
    );
    assert_eq!(
      parse("delete weather x"),
      Ok(Action::Delete {
        layer: LayerKind::Weather,
        id: "x".to_string(),
      })
    );
    assert!(parse("create hospitals name_th=x").is_err());
    assert!(parse("create hospitals 100.5 north").is_err());
  }

  #[test]
  fn test_parse_rejects_unknown_and_ambiguous() {
    assert!(parse("").is_err());
    assert!(parse("teleport").is_err());
    // "lo" prefixes both login and logout
    assert!(parse("lo").is_err());
    assert_eq!(parse("stat"), Ok(Action::Status));
  }

  #[test]
  fn test_parse_cache() {
    assert_eq!(parse("cache"), Ok(Action::CacheStatus));
    assert_eq!(parse("cache clear"), Ok(Action::CacheClear(None)));
    assert_eq!(
      parse("cache clear uv"),
      Ok(Action::CacheClear(Some(LayerKind::UvIndex)))
    );
  }
}
