/// Fixed replication id reported by a master. Not derived from anything at
/// runtime, matching spec.md's fixed 40-hex-character constant.
pub const MASTER_REPLID: &str = "8371b4fb1155b71f4a04d3e1bc3e18c4a990aeeb";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Slave,
}

/// Replication configuration, built once at process start from CLI flags
/// and read thereafter by INFO and the follower handshake. Does not carry
/// the server's own listen address/port: those are consumed directly by
/// `main`/`server` and are not part of the replication data model spec.md
/// defines here.
#[derive(Debug, Clone)]
pub struct Config {
    pub role: Role,
    pub master_replid: String,
    pub master_repl_offset: u64,
    pub replicaof_address: String,
    pub replicaof_port: i64,
}

impl Config {
    /// `replicaof` carries `(host, port)` as parsed from the CLI's
    /// two-value `--replicaof` flag, if given. A non-empty host with a
    /// positive port selects the slave role; anything else is a master
    /// with the fixed replid and a zero offset.
    pub fn new(replicaof: Option<(String, i64)>) -> Self {
        match replicaof {
            Some((host, port)) if !host.is_empty() && port > 0 => Config {
                role: Role::Slave,
                master_replid: MASTER_REPLID.to_string(),
                master_repl_offset: 0,
                replicaof_address: host,
                replicaof_port: port,
            },
            _ => Config {
                role: Role::Master,
                master_replid: MASTER_REPLID.to_string(),
                master_repl_offset: 0,
                replicaof_address: String::new(),
                replicaof_port: 0,
            },
        }
    }

    pub fn is_follower(&self) -> bool {
        self.role == Role::Slave
    }

    /// Formats the `role`/`master_replid`/`master_repl_offset` lines INFO
    /// replication reports, in the field order spec.md §4.3 specifies.
    /// A slave reports only its role line, matching "iterates
    /// configuration fields in the order {role, then if master: ...}".
    pub fn info_replication_body(&self) -> String {
        match self.role {
            Role::Master => format!(
                "role:master\r\nmaster_replid:{}\r\nmaster_repl_offset:{}\r\n",
                self.master_replid, self.master_repl_offset
            ),
            Role::Slave => "role:slave\r\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_replicaof_is_master() {
        let cfg = Config::new(None);
        assert_eq!(cfg.role, Role::Master);
        assert_eq!(cfg.master_replid, MASTER_REPLID);
        assert_eq!(cfg.master_repl_offset, 0);
    }

    #[test]
    fn non_positive_port_is_master() {
        let cfg = Config::new(Some(("10.0.0.1".to_string(), 0)));
        assert_eq!(cfg.role, Role::Master);
    }

    #[test]
    fn valid_replicaof_is_slave() {
        let cfg = Config::new(Some(("10.0.0.1".to_string(), 6380)));
        assert_eq!(cfg.role, Role::Slave);
        assert!(cfg.is_follower());
    }

    #[test]
    fn master_info_body_matches_wire_format() {
        let cfg = Config::new(None);
        assert_eq!(
            cfg.info_replication_body(),
            format!(
                "role:master\r\nmaster_replid:{}\r\nmaster_repl_offset:0\r\n",
                MASTER_REPLID
            )
        );
    }
}
