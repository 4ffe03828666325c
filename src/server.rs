//! TCP serving layer.
//!
//! One task per connection; the task owns its session state exclusively and
//! suspends only at transport reads and writes. All codec work happens
//! synchronously between those points.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;
use crate::opts::ServerOpts;
use crate::protocol::frontend::{Decode, FrontendDecoder};
use crate::session::{Flow, Session};
use crate::table::Table;

/// A listening wiretable server.
pub struct Server<T> {
    listener: TcpListener,
    table: Arc<T>,
    opts: ServerOpts,
}

impl<T: Table + 'static> Server<T> {
    /// Bind the listening socket. `opts.port` of 0 binds an ephemeral port;
    /// use [`Server::local_addr`] to discover it.
    pub async fn bind(table: T, opts: ServerOpts) -> Result<Self> {
        let addr = format!("{}:{}", opts.host, opts.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        Ok(Self {
            listener,
            table: Arc::new(table),
            opts,
        })
    }

    /// The bound socket address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve connections until the task is cancelled.
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let table = Arc::clone(&self.table);
            let opts = self.opts.clone();
            tokio::spawn(async move {
                tracing::info!(%peer, "connection established");
                match serve_connection(stream, table, opts).await {
                    Ok(()) => tracing::info!(%peer, "connection closed"),
                    Err(err) => tracing::error!(%peer, error = %err, "connection failed"),
                }
            });
        }
    }
}

/// Drive one connection: read bytes, decode frames, let the session emit
/// its responses, flush them before touching the next frontend message.
///
/// Returning an error closes the transport with nothing further written,
/// which is the required reaction to malformed frames and encoder
/// precondition violations.
async fn serve_connection<T: Table>(
    mut stream: TcpStream,
    table: Arc<T>,
    opts: ServerOpts,
) -> Result<()> {
    stream.set_nodelay(true)?;

    let mut decoder = FrontendDecoder::new();
    let mut session = Session::new(table, opts);
    let mut inbound: Vec<u8> = Vec::with_capacity(8192);
    let mut outbound: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            // Client went away without Terminate.
            return Ok(());
        }
        inbound.extend_from_slice(&chunk[..n]);

        let mut consumed_total = 0;
        let mut close = false;
        loop {
            match decoder.decode(&inbound[consumed_total..])? {
                Decode::Incomplete => break,
                Decode::Skipped { consumed } => consumed_total += consumed,
                Decode::Message { message, consumed } => {
                    let flow = session.handle(message, &mut outbound)?;
                    consumed_total += consumed;
                    if !outbound.is_empty() {
                        stream.write_all(&outbound).await?;
                        stream.flush().await?;
                        outbound.clear();
                    }
                    if flow == Flow::Close {
                        close = true;
                        break;
                    }
                }
            }
        }
        inbound.drain(..consumed_total);

        if close {
            return Ok(());
        }
    }
}
