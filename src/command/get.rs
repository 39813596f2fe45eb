use super::echo::string_capable_bytes;
use super::Command;
use crate::config::Config;
use crate::resp::{RespError, Value};
use crate::store::Store;
use bytes::Bytes;

#[derive(Debug, Default)]
pub struct Get {
    key: Vec<u8>,
}

impl Command for Get {
    fn read(&mut self, args: &[Value]) -> Result<(), RespError> {
        if args.len() != 2 {
            return Err(RespError::Syntax(
                "GET accepts exactly two elements".to_string(),
            ));
        }
        self.key = string_capable_bytes(&args[1])
            .ok_or_else(|| RespError::Syntax("GET key must be string-capable".to_string()))?;
        Ok(())
    }

    /// `Store::get` already performs the lazy-eviction comparison; GET's
    /// only job is to wrap its result as a (possibly null) BulkString.
    fn execute(&self, store: &mut Store, _config: &Config, now_ms: i64) -> Value {
        match store.get(&self.key, now_ms) {
            Some(bytes) => Value::BulkString(Some(Bytes::from(bytes))),
            None => Value::BulkString(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(key: &[u8]) -> Get {
        let mut cmd = Get::default();
        cmd.read(&[
            Value::SimpleString("GET".to_string()),
            Value::BulkString(Some(Bytes::copy_from_slice(key))),
        ])
        .unwrap();
        cmd
    }

    #[test]
    fn missing_key_returns_null() {
        let mut store = Store::new();
        let config = Config::new(None);
        assert_eq!(
            cmd(b"missing").execute(&mut store, &config, 0),
            Value::BulkString(None)
        );
    }

    #[test]
    fn present_key_returns_its_bytes() {
        let mut store = Store::new();
        store.put(b"k".to_vec(), b"v".to_vec(), crate::store::NO_EXPIRY);
        let config = Config::new(None);
        assert_eq!(
            cmd(b"k").execute(&mut store, &config, 0),
            Value::BulkString(Some(Bytes::from_static(b"v")))
        );
    }

    #[test]
    fn expired_key_returns_null() {
        let mut store = Store::new();
        store.put(b"k".to_vec(), b"v".to_vec(), 100);
        let config = Config::new(None);
        assert_eq!(
            cmd(b"k").execute(&mut store, &config, 200),
            Value::BulkString(None)
        );
    }

    #[test]
    fn rejects_wrong_arity() {
        let mut cmd = Get::default();
        assert!(cmd.read(&[Value::SimpleString("GET".to_string())]).is_err());
    }
}
