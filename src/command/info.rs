use super::Command;
use crate::config::Config;
use crate::resp::{RespError, Value};
use crate::store::Store;
use bytes::Bytes;

#[derive(Debug, Default)]
pub struct Info;

impl Command for Info {
    fn read(&mut self, args: &[Value]) -> Result<(), RespError> {
        if args.len() != 2 {
            return Err(RespError::Syntax(
                "INFO accepts exactly two elements".to_string(),
            ));
        }
        let section = args[1]
            .as_string()
            .ok_or_else(|| RespError::Syntax("INFO section must be string-capable".to_string()))?;
        if section != "replication" {
            return Err(RespError::Syntax(format!(
                "unsupported INFO section '{}'",
                section
            )));
        }
        Ok(())
    }

    fn execute(&self, _store: &mut Store, config: &Config, _now_ms: i64) -> Value {
        Value::BulkString(Some(Bytes::from(config.info_replication_body().into_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MASTER_REPLID;

    #[test]
    fn reports_master_replication_fields() {
        let mut cmd = Info::default();
        cmd.read(&[
            Value::SimpleString("INFO".to_string()),
            Value::BulkString(Some(Bytes::from_static(b"replication"))),
        ])
        .unwrap();
        let mut store = Store::new();
        let config = Config::new(None);
        let expected = format!(
            "role:master\r\nmaster_replid:{}\r\nmaster_repl_offset:0\r\n",
            MASTER_REPLID
        );
        assert_eq!(
            cmd.execute(&mut store, &config, 0),
            Value::BulkString(Some(Bytes::from(expected.into_bytes())))
        );
    }

    #[test]
    fn rejects_unsupported_section() {
        let mut cmd = Info::default();
        let err = cmd
            .read(&[
                Value::SimpleString("INFO".to_string()),
                Value::BulkString(Some(Bytes::from_static(b"server"))),
            ])
            .unwrap_err();
        assert!(matches!(err, RespError::Syntax(_)));
    }
}
