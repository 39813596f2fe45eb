use crate::command::Command;
use crate::config::Config;
use crate::resp::{RespError, Value};
use crate::store::Store;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot};

/// One command in flight: the parsed command plus the channel its result
/// is delivered back on.
struct Request {
    command: Box<dyn Command>,
    reply: oneshot::Sender<Value>,
}

/// Owns the `Store` exclusively. Every connection talks to it only
/// through an `EngineHandle`, so `put`/`get`/`delete` are trivially
/// atomic with respect to each other without a lock: there is exactly
/// one task ever touching the store, and it never awaits an I/O
/// operation while holding it (grounded on the teacher's
/// `RedisEngine`/`RedisEngineApi` actor pair in `rdis::types`/`rdis::engine`).
pub struct Engine {
    store: Store,
    config: Arc<Config>,
    receiver: mpsc::Receiver<Request>,
}

/// A cheaply-cloneable front for the engine's channel. Every connection
/// task holds one.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<Request>,
}

impl Engine {
    /// Channel depth mirrors the teacher's fixed-capacity `mpsc` bound;
    /// a bounded channel applies natural backpressure to bursty clients
    /// rather than letting request backlog grow without limit.
    const CHANNEL_CAPACITY: usize = 1024;

    pub fn new(config: Arc<Config>) -> (Engine, EngineHandle) {
        let (sender, receiver) = mpsc::channel(Self::CHANNEL_CAPACITY);
        (
            Engine {
                store: Store::new(),
                config,
                receiver,
            },
            EngineHandle { sender },
        )
    }

    /// Drains requests until every `EngineHandle` clone is dropped and the
    /// channel closes; this is the engine task's entire body.
    pub async fn run(mut self) {
        while let Some(Request { command, reply }) = self.receiver.recv().await {
            let now_ms = current_unix_millis();
            let value = command.execute(&mut self.store, &self.config, now_ms);
            // The connection task may have gone away (client disconnect
            // mid-request); a dropped reply receiver is not an engine
            // failure.
            let _ = reply.send(value);
        }
    }
}

impl EngineHandle {
    /// Sends `command` to the engine and awaits its response. Fails with
    /// `RespError::ServerStop` if the engine task is gone, which only
    /// happens during shutdown.
    pub async fn dispatch(&self, command: Box<dyn Command>) -> Result<Value, RespError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(Request {
                command,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RespError::ServerStop)?;
        reply_rx.await.map_err(|_| RespError::ServerStop)
    }
}

fn current_unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_command;

    #[tokio::test]
    async fn set_then_get_round_trips_through_the_actor() {
        let (engine, handle) = Engine::new(Arc::new(Config::new(None)));
        tokio::spawn(engine.run());

        let set = parse_command(&Value::Array(vec![
            Value::SimpleString("SET".to_string()),
            Value::BulkString(Some(bytes::Bytes::from_static(b"k"))),
            Value::BulkString(Some(bytes::Bytes::from_static(b"v"))),
        ]))
        .unwrap();
        let response = handle.dispatch(set).await.unwrap();
        assert_eq!(response, Value::SimpleString("OK".to_string()));

        let get = parse_command(&Value::Array(vec![
            Value::SimpleString("GET".to_string()),
            Value::BulkString(Some(bytes::Bytes::from_static(b"k"))),
        ]))
        .unwrap();
        let response = handle.dispatch(get).await.unwrap();
        assert_eq!(
            response,
            Value::BulkString(Some(bytes::Bytes::from_static(b"v")))
        );
    }

    #[tokio::test]
    async fn concurrent_clients_observe_atomic_put_get() {
        let (engine, handle) = Engine::new(Arc::new(Config::new(None)));
        tokio::spawn(engine.run());

        let mut tasks = Vec::new();
        for i in 0..16u8 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                let key = format!("k{}", i).into_bytes();
                let set = parse_command(&Value::Array(vec![
                    Value::SimpleString("SET".to_string()),
                    Value::BulkString(Some(bytes::Bytes::from(key.clone()))),
                    Value::BulkString(Some(bytes::Bytes::from(i.to_string().into_bytes()))),
                ]))
                .unwrap();
                handle.dispatch(set).await.unwrap();

                let get = parse_command(&Value::Array(vec![
                    Value::SimpleString("GET".to_string()),
                    Value::BulkString(Some(bytes::Bytes::from(key))),
                ]))
                .unwrap();
                handle.dispatch(get).await.unwrap()
            }));
        }
        for (i, task) in tasks.into_iter().enumerate() {
            let value = task.await.unwrap();
            assert_eq!(
                value,
                Value::BulkString(Some(bytes::Bytes::from(i.to_string().into_bytes())))
            );
        }
    }
}
