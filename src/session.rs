//! Connection state machine.
//!
//! A session reacts to decoded frontend messages by appending backend
//! messages to an output buffer, in the exact order clients expect, and
//! telling the transport whether to keep the connection open. It performs
//! no I/O itself, so the whole request/response logic is testable without a
//! socket.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{Error, Result, sqlstate};
use crate::opts::ServerOpts;
use crate::protocol::backend::{
    write_authentication_ok, write_backend_key_data, write_bind_complete, write_command_complete,
    write_data_row, write_empty_query_response, write_error_response,
    write_parameter_description, write_parameter_status, write_parse_complete,
    write_ready_for_query, write_row_description, write_ssl_refusal,
};
use crate::protocol::frontend::FrontendMessage;
use crate::protocol::types::{FieldDescription, TransactionStatus};
use crate::table::{Row, Table};

/// `SELECT <cols> FROM <table>` — the only statement shape this server
/// executes. The column list is captured but ignored; the adapter decides
/// what to return.
static SELECT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*SELECT\s+(.+?)\s+FROM\s+(\w+)").expect("SELECT pattern compiles")
});

/// What the transport should do after one message has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Flush the output buffer and keep reading.
    Continue,
    /// Flush the output buffer, then close the transport.
    Close,
}

/// A prepared statement recorded by Parse and consumed by Execute.
#[derive(Debug, Clone)]
struct Prepared {
    query: String,
    fields: Vec<FieldDescription>,
}

/// Per-connection protocol state.
pub struct Session<T> {
    table: Arc<T>,
    opts: ServerOpts,
    pid: u32,
    secret_key: u32,
    prepared: Option<Prepared>,
    ready_since_sync: bool,
}

impl<T: Table> Session<T> {
    /// Create a session for one connection.
    pub fn new(table: Arc<T>, opts: ServerOpts) -> Self {
        Self {
            table,
            opts,
            pid: std::process::id(),
            secret_key: rand::random(),
            prepared: None,
            ready_since_sync: false,
        }
    }

    /// React to one frontend message.
    ///
    /// Recoverable request errors are converted to an ErrorResponse plus
    /// `ReadyForQuery('E')` and the session stays open. An `Err` return is
    /// fatal: the caller must stop writing and close the transport.
    pub fn handle(&mut self, message: FrontendMessage<'_>, out: &mut Vec<u8>) -> Result<Flow> {
        let simple_query = matches!(message, FrontendMessage::Query(_));
        match self.react(message, out) {
            Ok(flow) => Ok(flow),
            Err(err) => match err.client_report() {
                Some((code, text)) => {
                    tracing::debug!(code, error = %text, "rejecting request");
                    write_error_response(out, "ERROR", code, &text);
                    write_ready_for_query(out, TransactionStatus::Failed);
                    // A failed extended cycle is already fenced here, so the
                    // Sync the client still owes must not fence again. A
                    // simple-query cycle ends with its own fence and leaves
                    // the next Sync untouched.
                    self.ready_since_sync = !simple_query;
                    Ok(Flow::Continue)
                }
                None => Err(err),
            },
        }
    }

    fn react(&mut self, message: FrontendMessage<'_>, out: &mut Vec<u8>) -> Result<Flow> {
        match message {
            FrontendMessage::SslRequest => {
                write_ssl_refusal(out);
            }
            FrontendMessage::Startup(startup) => {
                tracing::debug!(parameters = ?startup.parameters, "startup");
                self.write_startup_sequence(out);
            }
            FrontendMessage::Query(query) => {
                self.handle_query(query, out)?;
            }
            FrontendMessage::Parse { query } => {
                self.prepared = Some(Prepared {
                    query: query.to_string(),
                    fields: self.table.columns().to_vec(),
                });
                write_parse_complete(out);
            }
            FrontendMessage::Bind => {
                write_bind_complete(out);
            }
            FrontendMessage::Describe { kind, .. } => {
                let fields = self.current_fields();
                if kind == b'S' {
                    write_parameter_description(out, &[]);
                }
                write_row_description(out, &fields);
            }
            FrontendMessage::Execute => {
                self.handle_execute(out)?;
            }
            FrontendMessage::Flush => {
                // Nothing to emit; the transport flushes after every batch.
            }
            FrontendMessage::Sync => {
                if !self.ready_since_sync {
                    write_ready_for_query(out, TransactionStatus::Idle);
                }
                self.ready_since_sync = false;
            }
            FrontendMessage::Terminate => {
                return Ok(Flow::Close);
            }
        }
        Ok(Flow::Continue)
    }

    fn write_startup_sequence(&mut self, out: &mut Vec<u8>) {
        write_authentication_ok(out);
        for (name, value) in self.opts.startup_parameters() {
            write_parameter_status(out, name, value);
        }
        write_backend_key_data(out, self.pid, self.secret_key);
        write_ready_for_query(out, TransactionStatus::Idle);
    }

    fn handle_query(&mut self, query: &str, out: &mut Vec<u8>) -> Result<()> {
        if query.trim().is_empty() {
            write_empty_query_response(out);
            write_ready_for_query(out, TransactionStatus::Idle);
            return Ok(());
        }

        let rows = self.select_rows(query)?;
        let fields = self.table.columns();
        write_row_description(out, fields);
        for row in &rows {
            write_data_row(out, fields, row)?;
        }
        write_command_complete(out, &format!("SELECT {}", rows.len()));
        write_ready_for_query(out, TransactionStatus::Idle);
        Ok(())
    }

    fn handle_execute(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let (fields, rows) = match self.prepared.clone() {
            Some(prepared) => (prepared.fields, self.select_rows(&prepared.query)?),
            None => (self.table.columns().to_vec(), self.table.rows(None)?),
        };
        for row in &rows {
            write_data_row(out, &fields, row)?;
        }
        write_command_complete(out, &format!("SELECT {}", rows.len()));
        Ok(())
    }

    fn current_fields(&self) -> Vec<FieldDescription> {
        match &self.prepared {
            Some(prepared) => prepared.fields.clone(),
            None => self.table.columns().to_vec(),
        }
    }

    /// Recognise `SELECT ... FROM <table>`, check the table name, and fetch
    /// rows from the adapter.
    fn select_rows(&self, query: &str) -> Result<Vec<Row>> {
        let Some(captures) = SELECT_PATTERN.captures(query) else {
            let statement = query.split_whitespace().next().unwrap_or_default();
            if statement.eq_ignore_ascii_case("select") {
                return Err(Error::rejected(
                    sqlstate::SYNTAX_ERROR,
                    format!("cannot parse query: {query}"),
                ));
            }
            return Err(Error::rejected(
                sqlstate::FEATURE_NOT_SUPPORTED,
                format!("unsupported statement: {statement}"),
            ));
        };

        let target = &captures[2];
        if let Some(declared) = self.table.name()
            && !declared.eq_ignore_ascii_case(target)
        {
            return Err(Error::rejected(
                sqlstate::UNDEFINED_TABLE,
                format!("relation \"{target}\" does not exist"),
            ));
        }

        self.table.rows(Some(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frontend::{Decode, FrontendDecoder};
    use crate::protocol::types::oid;
    use crate::table::MemoryTable;
    use crate::value::{Numeric, Value};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn users_table() -> MemoryTable {
        MemoryTable::new(
            vec![
                FieldDescription::text("id"),
                FieldDescription::text("name"),
            ],
            vec![
                vec![Value::I32(1), Value::from("John")],
                vec![Value::I32(2), Value::from("Jane")],
                vec![Value::I32(3), Value::from("Joe")],
            ],
        )
        .unwrap()
        .with_name("users")
    }

    fn session_for(table: MemoryTable) -> Session<MemoryTable> {
        Session::new(Arc::new(table), ServerOpts::default())
    }

    // Split an output buffer into (tag, payload) frames.
    fn split_messages(mut data: &[u8]) -> Vec<(u8, Vec<u8>)> {
        let mut messages = Vec::new();
        while !data.is_empty() {
            let tag = data[0];
            let len = i32::from_be_bytes([data[1], data[2], data[3], data[4]]) as usize;
            messages.push((tag, data[5..1 + len].to_vec()));
            data = &data[1 + len..];
        }
        messages
    }

    fn tags(data: &[u8]) -> Vec<u8> {
        split_messages(data).iter().map(|(tag, _)| *tag).collect()
    }

    #[test]
    fn test_ssl_request_answered_with_single_byte() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        let flow = session.handle(FrontendMessage::SslRequest, &mut out).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(out, [0x4E]);
    }

    #[test]
    fn test_startup_sequence_order() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        let startup = crate::protocol::frontend::startup::StartupMessage::parse(
            crate::protocol::frontend::startup::PROTOCOL_VERSION_3_0,
            b"user\0test\0\0",
        )
        .unwrap();
        session
            .handle(FrontendMessage::Startup(startup), &mut out)
            .unwrap();

        let messages = split_messages(&out);
        let order: Vec<u8> = messages.iter().map(|(tag, _)| *tag).collect();
        assert_eq!(order, [b'R', b'S', b'S', b'S', b'S', b'K', b'Z']);

        // AuthenticationOk carries the zero auth type.
        assert_eq!(messages[0].1, [0, 0, 0, 0]);
        // First parameter is server_version.
        assert!(messages[1].1.starts_with(b"server_version\0"));
        // Final fence reports idle.
        assert_eq!(messages[6].1, [b'I']);
    }

    #[test]
    fn test_simple_select_text() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        session
            .handle(FrontendMessage::Query("SELECT id, name FROM users"), &mut out)
            .unwrap();

        let messages = split_messages(&out);
        let order: Vec<u8> = messages.iter().map(|(tag, _)| *tag).collect();
        assert_eq!(order, [b'T', b'D', b'D', b'D', b'C', b'Z']);

        // First row: text cells "1" and "John".
        assert_eq!(
            messages[1].1,
            b"\0\x02\0\0\0\x011\0\0\0\x04John".to_vec()
        );
        // Row count in the command tag matches the emitted DataRows.
        assert_eq!(messages[4].1, b"SELECT 3\0".to_vec());
        assert_eq!(messages[5].1, [b'I']);
    }

    #[test]
    fn test_select_binary_int4_column() {
        let table = MemoryTable::new(
            vec![FieldDescription::binary("id", oid::INT4)],
            vec![vec![Value::I32(1)]],
        )
        .unwrap();
        let mut session = session_for(table);
        let mut out = Vec::new();
        session
            .handle(FrontendMessage::Query("SELECT id FROM t"), &mut out)
            .unwrap();

        let messages = split_messages(&out);
        assert_eq!(messages[1].0, b'D');
        assert_eq!(messages[1].1, [0, 1, 0, 0, 0, 4, 0, 0, 0, 1]);
    }

    #[test]
    fn test_select_numeric_binary_column() {
        let table = MemoryTable::new(
            vec![FieldDescription::binary("interest", oid::NUMERIC)],
            vec![vec![Value::Numeric(Numeric::Finite(
                Decimal::from_str("3.50").unwrap(),
            ))]],
        )
        .unwrap();
        let mut session = session_for(table);
        let mut out = Vec::new();
        session
            .handle(FrontendMessage::Query("SELECT interest FROM t"), &mut out)
            .unwrap();

        let messages = split_messages(&out);
        assert_eq!(
            messages[1].1,
            [0, 1, 0, 0, 0, 12, 0, 2, 0, 0, 0, 0, 0, 2, 0, 3, 0x13, 0x88]
        );
    }

    #[test]
    fn test_non_select_rejected() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        let flow = session
            .handle(
                FrontendMessage::Query("UPDATE users SET name = 'X'"),
                &mut out,
            )
            .unwrap();

        assert_eq!(flow, Flow::Continue);
        let messages = split_messages(&out);
        assert_eq!(tags(&out), [b'E', b'Z']);
        let payload = &messages[0].1;
        assert!(payload.starts_with(b"SERROR\0"));
        assert!(
            payload
                .windows(7)
                .any(|window| window == b"C0A000\0")
        );
        // The fence after an error reports the failed status.
        assert_eq!(messages[1].1, [b'E']);
    }

    #[test]
    fn test_table_mismatch_rejected() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        session
            .handle(FrontendMessage::Query("SELECT id FROM orders"), &mut out)
            .unwrap();

        let messages = split_messages(&out);
        assert_eq!(messages[0].0, b'E');
        assert!(
            messages[0]
                .1
                .windows(7)
                .any(|window| window == b"C42P01\0")
        );
    }

    #[test]
    fn test_table_name_case_insensitive() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        session
            .handle(FrontendMessage::Query("select id from USERS"), &mut out)
            .unwrap();
        assert_eq!(tags(&out)[0], b'T');
    }

    #[test]
    fn test_empty_query() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        session
            .handle(FrontendMessage::Query("   "), &mut out)
            .unwrap();
        assert_eq!(tags(&out), [b'I', b'Z']);
    }

    #[test]
    fn test_extended_flow_order() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();

        session
            .handle(
                FrontendMessage::Parse {
                    query: "SELECT id, name FROM users",
                },
                &mut out,
            )
            .unwrap();
        session.handle(FrontendMessage::Bind, &mut out).unwrap();
        session
            .handle(
                FrontendMessage::Describe {
                    kind: b'S',
                    name: "",
                },
                &mut out,
            )
            .unwrap();
        session.handle(FrontendMessage::Execute, &mut out).unwrap();
        session.handle(FrontendMessage::Sync, &mut out).unwrap();

        let messages = split_messages(&out);
        let order: Vec<u8> = messages.iter().map(|(tag, _)| *tag).collect();
        assert_eq!(
            order,
            [b'1', b'2', b't', b'T', b'D', b'D', b'D', b'C', b'Z']
        );
        // ParameterDescription declares zero parameters.
        assert_eq!(messages[2].1, [0, 0]);
        // The cycle ends idle.
        assert_eq!(messages[8].1, [b'I']);
    }

    #[test]
    fn test_describe_portal_omits_parameter_description() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        session
            .handle(
                FrontendMessage::Describe {
                    kind: b'P',
                    name: "",
                },
                &mut out,
            )
            .unwrap();
        assert_eq!(tags(&out), [b'T']);
    }

    #[test]
    fn test_sync_after_error_is_deduplicated() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        session
            .handle(
                FrontendMessage::Parse {
                    query: "DROP TABLE users",
                },
                &mut out,
            )
            .unwrap();
        session.handle(FrontendMessage::Execute, &mut out).unwrap();
        // Execute raised the error and already fenced with ReadyForQuery('E').
        assert_eq!(tags(&out), [b'1', b'E', b'Z']);

        let before = out.len();
        session.handle(FrontendMessage::Sync, &mut out).unwrap();
        assert_eq!(out.len(), before, "Sync must not emit a second fence");

        // The next Sync starts a fresh cycle and fences normally.
        session.handle(FrontendMessage::Sync, &mut out).unwrap();
        assert_eq!(tags(&out[before..]), [b'Z']);
    }

    #[test]
    fn test_sync_after_simple_query_still_fences() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        session
            .handle(FrontendMessage::Query("SELECT id FROM users"), &mut out)
            .unwrap();
        let before = out.len();
        session.handle(FrontendMessage::Sync, &mut out).unwrap();
        assert_eq!(tags(&out[before..]), [b'Z']);
    }

    #[test]
    fn test_execute_without_parse_uses_table_defaults() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        session.handle(FrontendMessage::Execute, &mut out).unwrap();
        session.handle(FrontendMessage::Sync, &mut out).unwrap();
        assert_eq!(tags(&out), [b'D', b'D', b'D', b'C', b'Z']);
    }

    #[test]
    fn test_flush_emits_nothing() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        session.handle(FrontendMessage::Flush, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_terminate_closes_without_output() {
        let mut session = session_for(users_table());
        let mut out = Vec::new();
        let flow = session.handle(FrontendMessage::Terminate, &mut out).unwrap();
        assert_eq!(flow, Flow::Close);
        assert!(out.is_empty());
    }

    #[test]
    fn test_decoder_and_session_end_to_end() {
        // Drive the whole pipeline the way the transport does: bytes in,
        // bytes out, buffer compaction in between.
        let mut decoder = FrontendDecoder::new();
        let mut session = session_for(users_table());

        let mut inbound = Vec::new();
        inbound.extend_from_slice(&8_i32.to_be_bytes());
        inbound.extend_from_slice(
            &crate::protocol::frontend::startup::PROTOCOL_VERSION_3_0.to_be_bytes(),
        );
        inbound.push(b'Q');
        inbound.extend_from_slice(&((4 + "SELECT id FROM users\0".len()) as i32).to_be_bytes());
        inbound.extend_from_slice(b"SELECT id FROM users\0");

        let mut out = Vec::new();
        let mut offset = 0;
        loop {
            match decoder.decode(&inbound[offset..]).unwrap() {
                Decode::Message { message, consumed } => {
                    session.handle(message, &mut out).unwrap();
                    offset += consumed;
                }
                Decode::Skipped { consumed } => offset += consumed,
                Decode::Incomplete => break,
            }
        }

        let order = tags(&out);
        assert_eq!(
            order,
            [b'R', b'S', b'S', b'S', b'S', b'K', b'Z', b'T', b'D', b'D', b'D', b'C', b'Z']
        );
    }
}
