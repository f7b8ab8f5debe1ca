// file: src/parser/normalizer.rs
// description: raw honeypot payload normalization into the canonical event schema
// reference: cowrie and opencanary json log formats

use crate::models::Event;
use crate::models::event::parse_timestamp;
use serde_json::{Map, Value};
use tracing::debug;

/// OpenCanary logtypes that record a login attempt (ftp, http, ssh, telnet,
/// mysql, mssql).
const OPENCANARY_LOGIN_LOGTYPES: &[i64] = &[2000, 3001, 4002, 6001, 8001, 9001, 9002];

const GENERIC_IP_KEYS: &[&str] = &["ip", "src_ip", "remote_addr", "remote_host", "src", "peer"];
const OPENCANARY_IP_KEYS: &[&str] = &["src_host", "remote_addr", "ip"];
const USERNAME_KEYS: &[&str] = &["username", "user", "login"];
const PASSWORD_KEYS: &[&str] = &["password", "pass"];
const DOMAIN_KEYS: &[&str] = &["domain", "hostname"];
const PORT_KEYS: &[&str] = &["dst_port", "port"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Cowrie,
    OpenCanary,
    Generic,
}

pub struct EventNormalizer;

impl EventNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Maps a raw sensor payload onto [`Event`]. Never fails: anything that
    /// is not a JSON object, or carries no recognizable fields, becomes an
    /// `unknown`/`generic` event with empty data.
    pub fn normalize(&self, raw: &Value) -> Event {
        let Value::Object(obj) = raw else {
            debug!("Raw payload is not an object, storing as generic");
            return Event::new(Event::UNKNOWN_SOURCE, Event::GENERIC_TYPE);
        };

        let (source, kind) = detect_source(obj);
        let eventid = first_string(obj, &["eventid"])
            .unwrap_or_default()
            .to_lowercase();

        let mut data = Map::new();
        let event_type = match kind {
            SensorKind::Cowrie => self.map_cowrie(obj, &eventid, &mut data),
            SensorKind::OpenCanary => self.map_opencanary(obj, &eventid, &mut data),
            SensorKind::Generic => self.map_generic(obj, &eventid, &mut data),
        };

        if let Some(domain) = first_string(obj, DOMAIN_KEYS) {
            data.insert("domain".to_string(), Value::String(domain));
        }
        if let Some(port) = first_port(obj) {
            data.insert("port".to_string(), Value::from(port));
        }

        let event = Event::new(source, event_type).with_data(data);
        with_identity(event, obj)
    }

    /// Accepts a record that is already in canonical shape, filling only
    /// what is missing.
    pub fn from_submission(&self, payload: &Value) -> Event {
        let Value::Object(obj) = payload else {
            return Event::new(Event::UNKNOWN_SOURCE, Event::GENERIC_TYPE);
        };

        let source = first_string(obj, &["source"]).unwrap_or_else(|| Event::UNKNOWN_SOURCE.into());
        let event_type = first_string(obj, &["type"]).unwrap_or_else(|| Event::GENERIC_TYPE.into());
        let data = match obj.get("data") {
            Some(Value::Object(data)) => data.clone(),
            _ => Map::new(),
        };

        let event = Event::new(source, event_type).with_data(data);
        with_identity(event, obj)
    }

    fn map_cowrie(&self, obj: &Map<String, Value>, eventid: &str, data: &mut Map<String, Value>) -> String {
        insert_first(data, "ip", obj, &["src_ip"]);
        insert_first(data, "username", obj, &["username"]);
        insert_first(data, "password", obj, &["password"]);
        insert_first(data, "session", obj, &["session"]);
        insert_first(data, "input", obj, &["input"]);
        if !eventid.is_empty() {
            data.insert("eventid".to_string(), Value::String(eventid.to_string()));
        }

        let event_type = if eventid.contains("login.failed") {
            "auth_failed"
        } else if eventid.contains("login.success") {
            "auth_success"
        } else if eventid.contains("command.input") {
            "command"
        } else if eventid.contains("session.connect") {
            "connect"
        } else {
            Event::GENERIC_TYPE
        };
        event_type.to_string()
    }

    fn map_opencanary(
        &self,
        obj: &Map<String, Value>,
        eventid: &str,
        data: &mut Map<String, Value>,
    ) -> String {
        let logdata = match obj.get("logdata") {
            Some(Value::Object(logdata)) => Some(logdata),
            _ => None,
        };

        insert_first(data, "ip", obj, OPENCANARY_IP_KEYS);

        let username = first_string(obj, &["username", "user"])
            .or_else(|| logdata.and_then(|l| first_string(l, &["USERNAME", "username"])));
        if let Some(username) = username {
            data.insert("username".to_string(), Value::String(username));
        }
        let password = first_string(obj, PASSWORD_KEYS)
            .or_else(|| logdata.and_then(|l| first_string(l, &["PASSWORD", "password"])));
        if let Some(password) = password {
            data.insert("password".to_string(), Value::String(password));
        }

        let logtype = obj.get("logtype").and_then(Value::as_i64);
        if let Some(logtype) = logtype {
            data.insert("logtype".to_string(), Value::from(logtype));
        }
        if let Some(node_id) = first_string(obj, &["node_id"]) {
            data.insert("node_id".to_string(), Value::String(node_id));
        }

        let is_login = logtype.is_some_and(|t| OPENCANARY_LOGIN_LOGTYPES.contains(&t));
        if eventid.contains("login.failed") || is_login {
            "auth_failed".to_string()
        } else {
            Event::GENERIC_TYPE.to_string()
        }
    }

    fn map_generic(&self, obj: &Map<String, Value>, eventid: &str, data: &mut Map<String, Value>) -> String {
        insert_first(data, "ip", obj, GENERIC_IP_KEYS);
        insert_first(data, "username", obj, USERNAME_KEYS);
        insert_first(data, "password", obj, PASSWORD_KEYS);

        if let Some(explicit) = first_string(obj, &["type", "event_type"]) {
            return explicit;
        }
        if eventid.contains("login.failed") {
            "auth_failed".to_string()
        } else {
            Event::GENERIC_TYPE.to_string()
        }
    }
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit `source` wins; otherwise the sensor is recognized by its
/// characteristic fields.
pub fn detect_source(obj: &Map<String, Value>) -> (String, SensorKind) {
    let label = match first_string(obj, &["source"]) {
        Some(explicit) => explicit.trim().to_lowercase(),
        None => infer_source(obj).to_string(),
    };

    let kind = match label.as_str() {
        "cowrie" => SensorKind::Cowrie,
        "opencanary" => SensorKind::OpenCanary,
        _ => SensorKind::Generic,
    };
    (label, kind)
}

fn infer_source(obj: &Map<String, Value>) -> &'static str {
    let eventid = obj.get("eventid").and_then(Value::as_str).unwrap_or_default();
    let node_id = obj.get("node_id").and_then(Value::as_str).unwrap_or_default();

    if eventid.to_lowercase().contains("cowrie") {
        "cowrie"
    } else if node_id.to_lowercase().starts_with("opencanary")
        || (obj.contains_key("logtype") && obj.contains_key("src_host"))
    {
        "opencanary"
    } else {
        Event::UNKNOWN_SOURCE
    }
}

fn with_identity(mut event: Event, obj: &Map<String, Value>) -> Event {
    if let Some(id) = first_string(obj, &["id"]) {
        event = event.with_id(id);
    }
    if let Some(ts) = first_string(obj, &["ts", "timestamp"]).and_then(|raw| parse_timestamp(&raw)) {
        event = event.with_timestamp(ts);
    }
    event
}

/// First non-empty string (or number, stringified) under any of `keys`.
fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn first_port(obj: &Map<String, Value>) -> Option<u64> {
    PORT_KEYS.iter().find_map(|key| match obj.get(*key) {
        Some(Value::Number(n)) => n.as_u64().filter(|p| *p <= u64::from(u16::MAX)),
        Some(Value::String(s)) => s.trim().parse::<u16>().ok().map(u64::from),
        _ => None,
    })
}

fn insert_first(data: &mut Map<String, Value>, field: &str, obj: &Map<String, Value>, keys: &[&str]) {
    if let Some(value) = first_string(obj, keys) {
        data.insert(field.to_string(), Value::String(value));
    }
}
