//! A loopback transport: calls multiplexed over one TCP stream as length-prefixed stdcode frames.
//!
//! No node serves this framing. It stands up local servers for tests and tooling, so it is only
//! built with the `testing` feature.

use async_trait::async_trait;
use log::{debug, trace};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use smol::net::{TcpListener, TcpStream};
use smol::prelude::*;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use crate::{Channel, ChannelState, Dialer, Endpoint, NetError, Result, StatusCode};

#[derive(Serialize, Deserialize, Debug)]
struct RequestFrame {
    id: u64,
    method: String,
    payload: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug)]
struct ResponseFrame {
    id: u64,
    kind: String,
    body: Vec<u8>,
}

const KIND_OK: &str = "Ok";
const KIND_NO_METHOD: &str = "NoMethod";
const KIND_ERR: &str = "Err";

/// Largest encoded frame either side sends or accepts.
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Writes `frame` as a big-endian `u32` length followed by its stdcode encoding.
async fn write_frame<W, T>(conn: &mut W, frame: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = stdcode::serialize(frame).map_err(|e| NetError::Codec(e.to_string()))?;
    if body.len() > MAX_FRAME_SIZE {
        return Err(NetError::Codec(format!(
            "outgoing frame of {} bytes exceeds {}",
            body.len(),
            MAX_FRAME_SIZE
        )));
    }
    let mut buf = Vec::with_capacity(4 + body.len());
    buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
    buf.extend_from_slice(&body);
    conn.write_all(&buf).await.map_err(NetError::Network)?;
    conn.flush().await.map_err(NetError::Network)
}

/// Reads one frame written by [`write_frame`]. The length is checked before the body is buffered.
async fn read_frame<R, T>(conn: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len = [0u8; 4];
    conn.read_exact(&mut len).await.map_err(NetError::Network)?;
    let len = u32::from_be_bytes(len) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(NetError::Codec(format!(
            "incoming frame of {} bytes exceeds {}",
            len, MAX_FRAME_SIZE
        )));
    }
    let mut body = vec![0u8; len];
    conn.read_exact(&mut body).await.map_err(NetError::Network)?;
    stdcode::deserialize(&body).map_err(|e| NetError::Codec(e.to_string()))
}

/// Dials plain-TCP endpoints and multiplexes calls over one stream per channel.
///
/// TLS is not negotiated: `grpcs://` endpoints are refused, and need a TLS-capable [`Dialer`].
#[derive(Clone, Debug, Default)]
pub struct FramedDialer;

#[async_trait]
impl Dialer for FramedDialer {
    async fn dial(&self, endpoint: &Endpoint) -> Result<Arc<dyn Channel>> {
        if endpoint.tls {
            return Err(NetError::InvalidEndpoint(format!(
                "{}: the framed transport does not support TLS",
                endpoint
            )));
        }
        let stream = TcpStream::connect(endpoint.authority())
            .await
            .map_err(NetError::Network)?;
        stream.set_nodelay(true).map_err(NetError::Network)?;
        Ok(Arc::new(FramedChannel::new(stream)))
    }
}

type Pending = Arc<Mutex<HashMap<u64, async_oneshot::Sender<ResponseFrame>>>>;

const STATE_READY: u8 = 0;
const STATE_SHUTDOWN: u8 = 2;

/// One TCP stream carrying many concurrent calls, matched to responses by request id.
pub struct FramedChannel {
    writer: smol::lock::Mutex<TcpStream>,
    pending: Pending,
    next_id: AtomicU64,
    state: Arc<AtomicU8>,
    // cancels the reader when the channel drops
    _reader: smol::Task<()>,
}

impl FramedChannel {
    pub fn new(stream: TcpStream) -> Self {
        let pending: Pending = Default::default();
        let state = Arc::new(AtomicU8::new(STATE_READY));
        let reader = smolscale::spawn(read_loop(stream.clone(), pending.clone(), state.clone()));
        FramedChannel {
            writer: smol::lock::Mutex::new(stream),
            pending,
            next_id: AtomicU64::new(1),
            state,
            _reader: reader,
        }
    }

    fn shut_down(&self) {
        self.state.store(STATE_SHUTDOWN, Ordering::SeqCst);
        self.pending.lock().clear();
    }
}

async fn read_loop(mut stream: TcpStream, pending: Pending, state: Arc<AtomicU8>) {
    let err = loop {
        let frame: ResponseFrame = match read_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(err) => break err,
        };
        let waiter = pending.lock().remove(&frame.id);
        match waiter {
            Some(mut waiter) => {
                let _ = waiter.send(frame);
            }
            None => trace!("dropping response to abandoned call {}", frame.id),
        }
    };
    debug!("framed channel reader stopped: {}", err);
    state.store(STATE_SHUTDOWN, Ordering::SeqCst);
    // dropping the senders fails every waiting call
    pending.lock().clear();
}

/// Removes a call's pending entry if the call is abandoned before its response arrives.
struct PendingGuard<'a> {
    pending: &'a Pending,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.id);
    }
}

#[async_trait]
impl Channel for FramedChannel {
    fn state(&self) -> ChannelState {
        match self.state.load(Ordering::SeqCst) {
            STATE_READY => ChannelState::Ready,
            _ => ChannelState::Shutdown,
        }
    }

    async fn unary(&self, method: &str, request: Vec<u8>) -> Result<Vec<u8>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (send, recv) = async_oneshot::oneshot();
        self.pending.lock().insert(id, send);
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };
        // checked after registering, since the reader flags shutdown before draining `pending`
        if self.state() == ChannelState::Shutdown {
            return Err(NetError::ChannelClosed);
        }
        let frame = RequestFrame {
            id,
            method: method.to_owned(),
            payload: request,
        };
        {
            let mut writer = self.writer.lock().await;
            match write_frame(&mut *writer, &frame).await {
                Ok(()) => {}
                // nothing reached the wire, so the stream is still usable
                Err(err @ NetError::Codec(_)) => return Err(err),
                Err(err) => {
                    self.shut_down();
                    return Err(err);
                }
            }
        }
        let response = recv.await.map_err(|_| NetError::ChannelClosed)?;
        match response.kind.as_str() {
            KIND_OK => Ok(response.body),
            KIND_NO_METHOD => Err(NetError::status(StatusCode::Unimplemented, method)),
            _ => Err(NetError::status(
                StatusCode::Unknown,
                String::from_utf8_lossy(&response.body),
            )),
        }
    }
}

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

type MethodHandler = Arc<dyn Fn(Vec<u8>) -> BoxFuture<std::result::Result<Vec<u8>, String>> + Send + Sync>;

/// Serves framed calls by method path.
#[derive(Clone, Default)]
pub struct FramedServer {
    methods: HashMap<String, MethodHandler>,
}

impl FramedServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler of one method path.
    pub fn register<F, Fut>(&mut self, method: &str, handler: F)
    where
        F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Vec<u8>, String>> + Send + 'static,
    {
        self.methods
            .insert(method.to_owned(), Arc::new(move |req| Box::pin(handler(req))));
    }

    /// Accepts connections until the listener fails.
    pub async fn run(self, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((conn, addr)) => {
                    trace!("accepted framed connection from {}", addr);
                    let server = self.clone();
                    smolscale::spawn(async move {
                        if let Err(err) = server.handle(conn).await {
                            debug!("framed connection from {} ended: {}", addr, err);
                        }
                    })
                    .detach();
                }
                Err(err) => {
                    debug!("exiting listener due to {:?}", err);
                    return;
                }
            }
        }
    }

    async fn handle(&self, conn: TcpStream) -> Result<()> {
        let writer = Arc::new(smol::lock::Mutex::new(conn.clone()));
        let mut reader = conn;
        loop {
            let req: RequestFrame = read_frame(&mut reader).await?;
            let writer = writer.clone();
            let handler = self.methods.get(&req.method).cloned();
            // calls on one connection are answered out of order, as they finish
            smolscale::spawn(async move {
                let response = match handler {
                    None => ResponseFrame {
                        id: req.id,
                        kind: KIND_NO_METHOD.into(),
                        body: vec![],
                    },
                    Some(handler) => match handler(req.payload).await {
                        Ok(body) => ResponseFrame {
                            id: req.id,
                            kind: KIND_OK.into(),
                            body,
                        },
                        Err(msg) => ResponseFrame {
                            id: req.id,
                            kind: KIND_ERR.into(),
                            body: msg.into_bytes(),
                        },
                    },
                };
                let mut writer = writer.lock().await;
                if let Err(err) = write_frame(&mut *writer, &response).await {
                    debug!("could not answer call {}: {}", response.id, err);
                }
            })
            .detach();
        }
    }
}
