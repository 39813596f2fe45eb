use super::echo::string_capable_bytes;
use super::Command;
use crate::config::Config;
use crate::resp::{RespError, Value};
use crate::store::{Store, NO_EXPIRY};

#[derive(Debug, Default)]
pub struct Set {
    key: Vec<u8>,
    value: Vec<u8>,
    px_ms: Option<i64>,
}

impl Command for Set {
    fn read(&mut self, args: &[Value]) -> Result<(), RespError> {
        match args.len() {
            3 => {}
            5 => {}
            4 => {
                return Err(RespError::Syntax(
                    "SET with an option requires exactly 5 elements".to_string(),
                ))
            }
            _ => {
                return Err(RespError::Syntax(
                    "SET accepts 3 or 5 elements".to_string(),
                ))
            }
        }
        self.key = string_capable_bytes(&args[1])
            .ok_or_else(|| RespError::Syntax("SET key must be string-capable".to_string()))?;
        self.value = string_capable_bytes(&args[2])
            .ok_or_else(|| RespError::Syntax("SET value must be string-capable".to_string()))?;
        if args.len() == 5 {
            let option = args[3]
                .as_string()
                .ok_or_else(|| RespError::Syntax("SET option must be string-capable".to_string()))?
                .to_uppercase();
            if option != "PX" {
                return Err(RespError::Syntax(format!(
                    "unrecognized SET option '{}'",
                    option
                )));
            }
            self.px_ms = Some(parse_integer_argument(&args[4])?);
        } else {
            self.px_ms = None;
        }
        Ok(())
    }

    fn execute(&self, store: &mut Store, _config: &Config, now_ms: i64) -> Value {
        let expires_at_ms = match self.px_ms {
            Some(px) => now_ms.saturating_add(px),
            None => NO_EXPIRY,
        };
        store.put(self.key.clone(), self.value.clone(), expires_at_ms);
        Value::SimpleString("OK".to_string())
    }
}

fn parse_integer_argument(value: &Value) -> Result<i64, RespError> {
    if let Some(i) = value.as_int64() {
        return Ok(i);
    }
    if let Some(s) = value.as_string() {
        return s
            .parse::<i64>()
            .map_err(|_| RespError::Syntax(format!("PX argument is not an integer: {:?}", s)));
    }
    Err(RespError::Syntax(
        "PX argument must be an integer or string-capable".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn key_value(key: &str, value: &str) -> [Value; 3] {
        [
            Value::SimpleString("SET".to_string()),
            Value::BulkString(Some(Bytes::copy_from_slice(key.as_bytes()))),
            Value::BulkString(Some(Bytes::copy_from_slice(value.as_bytes()))),
        ]
    }

    #[test]
    fn three_args_sets_without_expiry() {
        let mut cmd = Set::default();
        cmd.read(&key_value("k", "v")).unwrap();
        let mut store = Store::new();
        let config = Config::new(None);
        assert_eq!(
            cmd.execute(&mut store, &config, 0),
            Value::SimpleString("OK".to_string())
        );
        assert_eq!(store.get(b"k", i64::MAX - 1), Some(b"v".to_vec()));
    }

    #[test]
    fn four_args_is_syntax_error() {
        let mut args = key_value("k", "v").to_vec();
        args.push(Value::SimpleString("PX".to_string()));
        let mut cmd = Set::default();
        assert!(cmd.read(&args).is_err());
    }

    #[test]
    fn px_option_sets_deadline_relative_to_now() {
        let mut args = key_value("k", "v").to_vec();
        args.push(Value::SimpleString("px".to_string()));
        args.push(Value::Integer(100));
        let mut cmd = Set::default();
        cmd.read(&args).unwrap();
        let mut store = Store::new();
        let config = Config::new(None);
        cmd.execute(&mut store, &config, 1000);
        assert_eq!(store.get(b"k", 1099), Some(b"v".to_vec()));
        assert_eq!(store.get(b"k", 1100), None);
    }

    #[test]
    fn unknown_option_is_syntax_error() {
        let mut args = key_value("k", "v").to_vec();
        args.push(Value::SimpleString("EX".to_string()));
        args.push(Value::Integer(100));
        let mut cmd = Set::default();
        assert!(cmd.read(&args).is_err());
    }
}
