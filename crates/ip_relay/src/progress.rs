//! Upload progress reporting.
//!
//! `ProgressStream` adapts an `AsyncRead` into the chunk stream a request
//! body wants, invoking a callback with the cumulative byte count as each
//! chunk leaves the reader. The final invocation therefore reports the
//! total size read.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio::io::{AsyncRead, ReadBuf};

/// Called with the total number of bytes read so far.
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

const CHUNK: usize = 64 * 1024;

pub struct ProgressStream<R> {
    reader: R,
    progress: Option<ProgressFn>,
    bytes_read: u64,
    buf: Box<[u8]>,
}

impl<R> ProgressStream<R> {
    pub fn new(reader: R, progress: Option<ProgressFn>) -> Self {
        Self {
            reader,
            progress,
            bytes_read: 0,
            buf: vec![0u8; CHUNK].into_boxed_slice(),
        }
    }
}

impl<R: AsyncRead + Unpin> Stream for ProgressStream<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let mut read_buf = ReadBuf::new(&mut this.buf);
        match Pin::new(&mut this.reader).poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Ready(Ok(())) => {
                let filled = read_buf.filled();
                if filled.is_empty() {
                    return Poll::Ready(None);
                }
                this.bytes_read += filled.len() as u64;
                if let Some(report) = &this.progress {
                    report(this.bytes_read);
                }
                Poll::Ready(Some(Ok(Bytes::copy_from_slice(filled))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[tokio::test]
    async fn reports_cumulative_totals_per_chunk() {
        let data = vec![7u8; 150_000];
        let seen = Arc::new(Mutex::new(Vec::new()));
        let report = {
            let seen = Arc::clone(&seen);
            Arc::new(move |total| seen.lock().unwrap().push(total)) as ProgressFn
        };

        let mut stream = ProgressStream::new(Cursor::new(data.clone()), Some(report));
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }

        assert_eq!(collected, data);
        assert_eq!(*seen.lock().unwrap(), vec![65_536u64, 131_072, 150_000]);
    }

    #[tokio::test]
    async fn empty_reader_yields_nothing() {
        let mut stream = ProgressStream::new(Cursor::new(Vec::new()), None);
        assert!(stream.next().await.is_none());
    }
}
