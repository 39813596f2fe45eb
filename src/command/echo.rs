use super::Command;
use crate::config::Config;
use crate::resp::{RespError, Value};
use crate::store::Store;
use bytes::Bytes;

#[derive(Debug, Default)]
pub struct Echo {
    message: Vec<u8>,
}

impl Command for Echo {
    fn read(&mut self, args: &[Value]) -> Result<(), RespError> {
        if args.len() != 2 {
            return Err(RespError::Syntax(
                "ECHO accepts exactly two elements".to_string(),
            ));
        }
        self.message = string_capable_bytes(&args[1])
            .ok_or_else(|| RespError::Syntax("ECHO message must be string-capable".to_string()))?;
        Ok(())
    }

    fn execute(&self, _store: &mut Store, _config: &Config, _now_ms: i64) -> Value {
        Value::BulkString(Some(Bytes::from(self.message.clone())))
    }
}

/// Shared by ECHO/GET/SET: coerces anything `as_string`-capable down to
/// its raw bytes, without requiring the argument also be valid UTF-8 as a
/// BulkString payload (a non-UTF8 BulkString is not `as_string`-capable,
/// but a BulkString's own raw bytes are always usable as a key/value).
pub(super) fn string_capable_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::SimpleString(s) => Some(s.clone().into_bytes()),
        Value::SimpleError(s) => Some(s.clone().into_bytes()),
        Value::BulkString(Some(b)) => Some(b.to_vec()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_the_message() {
        let mut cmd = Echo::default();
        cmd.read(&[
            Value::SimpleString("ECHO".to_string()),
            Value::BulkString(Some(Bytes::from_static(b"hello"))),
        ])
        .unwrap();
        let mut store = Store::new();
        let config = Config::new(None);
        assert_eq!(
            cmd.execute(&mut store, &config, 0),
            Value::BulkString(Some(Bytes::from_static(b"hello")))
        );
    }

    #[test]
    fn rejects_wrong_arity() {
        let mut cmd = Echo::default();
        assert!(cmd.read(&[Value::SimpleString("ECHO".to_string())]).is_err());
    }

    #[test]
    fn rejects_non_string_capable_argument() {
        let mut cmd = Echo::default();
        let err = cmd
            .read(&[Value::SimpleString("ECHO".to_string()), Value::Integer(5)])
            .unwrap_err();
        assert!(matches!(err, RespError::Syntax(_)));
    }
}
