//! The command layer: a name -> builder registry dispatching on the first
//! element of a parsed RESP Array, mirroring the teacher's per-command
//! struct + `read`/`execute` split (grounded on `rdis::engine` and, for
//! contract shape, the original Go `model/cmd` package).

mod echo;
mod get;
mod info;
mod ping;
mod set;

pub use ping::send_ping_and_verify;

use crate::config::Config;
use crate::resp::{RespError, Value};
use crate::store::Store;
use std::collections::HashMap;
use std::sync::OnceLock;

/// A parsed, ready-to-run client command. `read` validates and populates
/// fields from the command array's trailing elements (index 0, the name,
/// has already been consumed by dispatch); `execute` performs the effect
/// against the shared store/config and returns the response object.
///
/// Unlike the spec contract this is adapted from, `execute` does not take
/// a writer and cannot itself fail with an I/O error: under the
/// actor-based concurrency model (see `crate::engine`) commands run
/// inside the single task that owns the `Store`, never touching a socket,
/// so there is no I/O boundary to cross or lock to hold across it.
pub trait Command: std::fmt::Debug + Send {
    fn read(&mut self, args: &[Value]) -> Result<(), RespError>;
    fn execute(&self, store: &mut Store, config: &Config, now_ms: i64) -> Value;
}

type Builder = fn() -> Box<dyn Command>;

fn registry() -> &'static HashMap<&'static str, Builder> {
    static REGISTRY: OnceLock<HashMap<&'static str, Builder>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<&'static str, Builder> = HashMap::new();
        map.insert("PING", || Box::new(ping::Ping::default()));
        map.insert("ECHO", || Box::new(echo::Echo::default()));
        map.insert("GET", || Box::new(get::Get::default()));
        map.insert("SET", || Box::new(set::Set::default()));
        map.insert("INFO", || Box::new(info::Info::default()));
        let mut seen = std::collections::HashSet::new();
        for name in map.keys() {
            assert!(seen.insert(*name), "duplicate command name {}", name);
        }
        map
    })
}

/// Parses a top-level command Array: extracts element 0, coerces it via
/// `as_string`, uppercases it, looks up the builder, and dispatches `read`
/// with the full argument array (so each command's `read` can re-validate
/// its own element 0 alongside the rest, matching the original contract).
pub fn parse_command(value: &Value) -> Result<Box<dyn Command>, RespError> {
    let elements = match value {
        Value::Array(items) => items,
        _ => {
            return Err(RespError::Syntax(
                "a command must be a RESP Array".to_string(),
            ))
        }
    };
    if elements.is_empty() {
        return Err(RespError::Syntax(
            "at least one argument is required".to_string(),
        ));
    }
    let name = elements[0]
        .as_string()
        .ok_or_else(|| RespError::Syntax("command name must be string-capable".to_string()))?
        .to_uppercase();
    let builder = registry()
        .get(name.as_str())
        .ok_or_else(|| RespError::Syntax(format!("unknown command '{}'", name)))?;
    let mut command = builder();
    command.read(elements)?;
    Ok(command)
}
