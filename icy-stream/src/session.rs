//! Session lifecycle and the decode loop
//!
//! An [`IcySession`] owns the connection and a single decode task. The task is
//! the only writer of demuxer state: it reads from the source, feeds the
//! [`Demuxer`], and hands each frame to the matching event queue. Queue sends
//! wait for capacity, so a slow consumer stalls decoding instead of losing
//! chunks.
//!
//! Shutdown goes through a [`CancellationToken`] that is raced against both the
//! pending read and any pending queue send, so `close()` returns promptly even
//! while the server is silent or a consumer has stopped reading.

use icy_parser::HeaderSet;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

use crate::config::SessionConfig;
use crate::demuxer::{Demuxer, Frame};
use crate::error::{Result, StreamError};
use crate::event::{AudioChunk, MetadataUpdate};
use crate::request::StreamUrl;

/// Sending halves of the subscribed event queues, owned by the decode task.
struct EventSinks {
    headers: Option<mpsc::Sender<HeaderSet>>,
    chunks: Option<mpsc::Sender<AudioChunk>>,
    metadata: Option<mpsc::Sender<MetadataUpdate>>,
    errors: Option<oneshot::Sender<StreamError>>,
}

/// A connection to one ICY stream.
///
/// # Example
///
/// ```no_run
/// use icy_stream::{IcySession, SessionConfig};
///
/// # async fn run() -> icy_stream::Result<()> {
/// let mut session = IcySession::new(
///     "http://radio.example:8000/stream",
///     SessionConfig::metadata_only(),
/// )?;
/// let mut metadata = session.take_metadata().expect("subscribed");
///
/// session.open().await?;
/// while let Some(update) = metadata.recv().await {
///     println!("{}", update.stream_title().unwrap_or_default());
/// }
/// session.close().await
/// # }
/// ```
pub struct IcySession {
    url: StreamUrl,
    config: SessionConfig,
    cancel: CancellationToken,
    /// Moved into the decode task on start
    sinks: Option<EventSinks>,
    header_rx: Option<mpsc::Receiver<HeaderSet>>,
    chunk_rx: Option<mpsc::Receiver<AudioChunk>>,
    metadata_rx: Option<mpsc::Receiver<MetadataUpdate>>,
    error_rx: Option<oneshot::Receiver<StreamError>>,
    /// Resolves to the fatal error nobody received, if any
    task: Option<JoinHandle<Option<StreamError>>>,
}

impl IcySession {
    /// Create a session for `url`. Nothing is connected until [`open`](Self::open).
    ///
    /// One bounded queue is created for every category the config subscribes
    /// to; retrieve the receivers with the `take_*` methods. A subscribed
    /// queue that is never drained eventually stalls decoding, so leave
    /// unwanted categories out of the config or drop their receivers.
    pub fn new(url: &str, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let url = StreamUrl::parse(url)?;

        let (headers, header_rx) = queue(config.header_queue);
        let (chunks, chunk_rx) = queue(config.chunk_queue);
        let (metadata, metadata_rx) = queue(config.metadata_queue);
        let (errors, error_rx) = if config.error_channel {
            let (tx, rx) = oneshot::channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        Ok(Self {
            url,
            config,
            cancel: CancellationToken::new(),
            sinks: Some(EventSinks {
                headers,
                chunks,
                metadata,
                errors,
            }),
            header_rx,
            chunk_rx,
            metadata_rx,
            error_rx,
            task: None,
        })
    }

    pub fn url(&self) -> &StreamUrl {
        &self.url
    }

    /// Receiver for the header set. Yields at most one value.
    pub fn take_headers(&mut self) -> Option<mpsc::Receiver<HeaderSet>> {
        self.header_rx.take()
    }

    /// Receiver for audio chunks, in stream order.
    pub fn take_chunks(&mut self) -> Option<mpsc::Receiver<AudioChunk>> {
        self.chunk_rx.take()
    }

    /// Receiver for non-empty, well-formed metadata blocks.
    pub fn take_metadata(&mut self) -> Option<mpsc::Receiver<MetadataUpdate>> {
        self.metadata_rx.take()
    }

    /// Receiver for the fatal error that ended the session, if any.
    ///
    /// Resolves with `Err(RecvError)` when the session ends without a fatal
    /// error.
    pub fn take_errors(&mut self) -> Option<oneshot::Receiver<StreamError>> {
        self.error_rx.take()
    }

    /// Token that closes the session when cancelled. Safe to move to other
    /// threads or tasks.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Connect, send the ICY request and start decoding.
    ///
    /// Connection failures are returned here and not through the error queue.
    pub async fn open(&mut self) -> Result<()> {
        if self.sinks.is_none() {
            return Err(StreamError::AlreadyStarted);
        }

        let addr = self.url.authority();
        debug!(%addr, "Connecting to ICY stream");

        let connect = TcpStream::connect((self.url.host(), self.url.port()));
        let mut stream = match timeout(self.config.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(StreamError::Connect { addr, source }),
            Err(_) => return Err(StreamError::ConnectTimeout(addr)),
        };

        stream.write_all(&self.url.request_bytes()).await?;
        info!(%addr, target = self.url.target(), "Connected to ICY stream");

        self.start(stream)
    }

    /// Start decoding an already established byte source.
    ///
    /// The source must already be positioned at the start of the ICY
    /// response. Must be called from within a Tokio runtime.
    pub fn start<S>(&mut self, source: S) -> Result<()>
    where
        S: AsyncRead + Send + Unpin + 'static,
    {
        let sinks = self.sinks.take().ok_or(StreamError::AlreadyStarted)?;

        let task = DecodeTask {
            source,
            demuxer: Demuxer::with_max_header_size(self.config.max_header_size),
            sinks,
            cancel: self.cancel.clone(),
            read_timeout: self.config.read_timeout,
            read_buffer_size: self.config.read_buffer_size,
        };
        let span = info_span!("icy_session", addr = %self.url.authority());
        self.task = Some(tokio::spawn(task.run().instrument(span)));
        Ok(())
    }

    /// Whether the decode task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop decoding and wait for the decode task to finish.
    ///
    /// Returns the fatal error that ended the session if it could not be
    /// delivered through the error queue, either because none was subscribed
    /// or because its receiver was dropped.
    pub async fn close(&mut self) -> Result<()> {
        self.cancel.cancel();

        let Some(task) = self.task.take() else {
            return Ok(());
        };
        match task.await {
            Ok(None) => Ok(()),
            Ok(Some(error)) => Err(error),
            Err(e) => Err(StreamError::TaskFailed(e.to_string())),
        }
    }
}

impl Drop for IcySession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn queue<T>(capacity: Option<usize>) -> (Option<mpsc::Sender<T>>, Option<mpsc::Receiver<T>>) {
    match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity);
            (Some(tx), Some(rx))
        }
        None => (None, None),
    }
}

enum ReadOutcome {
    Data,
    Eof,
    Cancelled,
}

/// State owned exclusively by the decode task.
struct DecodeTask<S> {
    source: S,
    demuxer: Demuxer,
    sinks: EventSinks,
    cancel: CancellationToken,
    read_timeout: Option<Duration>,
    read_buffer_size: usize,
}

impl<S> DecodeTask<S>
where
    S: AsyncRead + Send + Unpin + 'static,
{
    /// Run until cancelled or a fatal error; yields the error if undelivered.
    async fn run(mut self) -> Option<StreamError> {
        let error = match self.decode_loop().await {
            Ok(()) => {
                info!(chunks = self.demuxer.chunks_decoded(), "ICY session closed");
                return None;
            }
            Err(error) => error,
        };

        error!(%error, state = %self.demuxer.state(), "ICY session failed");
        match self.sinks.errors.take() {
            Some(errors) => errors.send(error).err(),
            None => Some(error),
        }
    }

    async fn decode_loop(&mut self) -> Result<()> {
        loop {
            let at_eof = match self.read().await? {
                ReadOutcome::Data => false,
                ReadOutcome::Eof => true,
                ReadOutcome::Cancelled => return Ok(()),
            };

            while let Some(frame) = self.demuxer.next_frame(at_eof)? {
                if !self.dispatch(frame).await {
                    return Ok(());
                }
            }
        }
    }

    /// Read whatever the source has into the demuxer buffer.
    async fn read(&mut self) -> Result<ReadOutcome> {
        let buffer = self.demuxer.buffer_mut();
        buffer.reserve(self.read_buffer_size);

        let source = &mut self.source;
        let read_timeout = self.read_timeout;
        let read = async move {
            match read_timeout {
                Some(limit) => timeout(limit, source.read_buf(buffer))
                    .await
                    .map_err(|_| StreamError::ReadTimeout)?
                    .map_err(StreamError::from),
                None => source.read_buf(buffer).await.map_err(StreamError::from),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Ok(ReadOutcome::Cancelled),
            result = read => match result? {
                0 => Ok(ReadOutcome::Eof),
                _ => Ok(ReadOutcome::Data),
            },
        }
    }

    /// Hand a frame to its queue. Returns false if cancelled while waiting.
    async fn dispatch(&mut self, frame: Frame) -> bool {
        // Chunk numbering is zero-based; chunks_decoded already counts this one
        let last_chunk = self.demuxer.chunks_decoded().saturating_sub(1);

        match frame {
            Frame::Headers(headers) => {
                info!(
                    station = headers.station_name().unwrap_or("<unnamed>"),
                    chunk_size = self.demuxer.chunk_size().unwrap_or(0),
                    "ICY headers received"
                );
                deliver(&mut self.sinks.headers, headers, &self.cancel, "headers").await
            }
            Frame::Chunk(data) => {
                trace!(sequence = last_chunk, len = data.len(), "Audio chunk");
                let chunk = AudioChunk {
                    sequence: last_chunk,
                    data,
                };
                deliver(&mut self.sinks.chunks, chunk, &self.cancel, "chunks").await
            }
            Frame::Metadata(metadata) => {
                let update = MetadataUpdate {
                    after_chunk: last_chunk,
                    metadata,
                };
                debug!(title = ?update.stream_title(), "Metadata update");
                deliver(&mut self.sinks.metadata, update, &self.cancel, "metadata").await
            }
            Frame::Heartbeat => {
                trace!("Empty metadata block");
                true
            }
            Frame::MetadataRejected(error) => {
                warn!(%error, "Dropping malformed metadata block");
                true
            }
        }
    }
}

/// Send `event` if the category is subscribed, waiting for queue capacity.
///
/// A dropped receiver unsubscribes the category. Returns false only when the
/// session was cancelled during the wait.
async fn deliver<T>(
    sink: &mut Option<mpsc::Sender<T>>,
    event: T,
    cancel: &CancellationToken,
    category: &'static str,
) -> bool {
    let Some(sender) = sink.as_ref() else {
        return true;
    };

    let sent = tokio::select! {
        biased;
        _ = cancel.cancelled() => return false,
        result = sender.send(event) => result.is_ok(),
    };

    if !sent {
        debug!(category, "Receiver dropped, no longer delivering");
        *sink = None;
    }
    true
}
