//! Exact-length GRAY8 frame framing over async byte streams.
//!
//! Frames carry no header and no delimiter: the stream is a plain
//! concatenation of `width * height` byte buffers. Alignment therefore
//! depends entirely on every read and write moving exactly one frame.

use facefilter_models::{Frame, Geometry};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Result of a successful frame read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A full frame was read into the buffer.
    Frame,
    /// The stream ended cleanly on a frame boundary.
    EndOfStream,
}

/// Reads whole frames from a byte stream.
pub struct FrameReader<R> {
    inner: R,
    geometry: Geometry,
    frames_read: u64,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(inner: R, geometry: Geometry) -> Self {
        Self {
            inner,
            geometry,
            frames_read: 0,
        }
    }

    /// Fill `frame` with the next frame of the stream.
    ///
    /// Blocks until `width * height` bytes arrived or the stream ended. An end
    /// of stream before the first byte is [`ReadOutcome::EndOfStream`]; an end
    /// after some but not all bytes is [`MediaError::ShortRead`]. The buffer
    /// contents are unspecified after an error.
    pub async fn read_frame(&mut self, frame: &mut Frame) -> MediaResult<ReadOutcome> {
        if frame.geometry() != self.geometry {
            return Err(MediaError::GeometryMismatch {
                expected: self.geometry.to_string(),
                actual: frame.geometry().to_string(),
            });
        }

        let buf = frame.as_bytes_mut();
        let expected = buf.len();
        let mut received = 0;

        while received < expected {
            match self.inner.read(&mut buf[received..]).await {
                Ok(0) => break,
                Ok(n) => received += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MediaError::Io(e)),
            }
        }

        if received == 0 {
            debug!(frames = self.frames_read, "Input stream reached end of stream");
            return Ok(ReadOutcome::EndOfStream);
        }

        if received < expected {
            return Err(MediaError::ShortRead {
                frame: self.frames_read + 1,
                expected,
                received,
            });
        }

        self.frames_read += 1;
        Ok(ReadOutcome::Frame)
    }

    /// Number of complete frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writes whole frames to a byte stream, flushing after each one.
pub struct FrameWriter<W> {
    inner: W,
    frames_written: u64,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            frames_written: 0,
        }
    }

    /// Write all bytes of `frame` and flush before returning, so at most one
    /// frame is ever in flight toward the consumer.
    pub async fn write_frame(&mut self, frame: &Frame) -> MediaResult<()> {
        let frame_no = self.frames_written + 1;

        self.inner
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::WriteZero => MediaError::ShortWrite {
                    frame: frame_no,
                    expected: frame.len(),
                },
                _ => MediaError::Io(e),
            })?;
        self.inner.flush().await?;

        self.frames_written = frame_no;
        Ok(())
    }

    /// Flush any buffered bytes.
    pub async fn flush(&mut self) -> MediaResult<()> {
        self.inner.flush().await?;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio_test::io::Builder;

    fn geometry() -> Geometry {
        Geometry::new(4, 2).unwrap()
    }

    #[tokio::test]
    async fn test_reads_frames_split_across_chunks() {
        let mock = Builder::new()
            .read(&[1, 2, 3])
            .read(&[4, 5, 6, 7, 8, 9, 10])
            .read(&[11, 12, 13, 14, 15, 16])
            .build();
        let mut reader = FrameReader::new(mock, geometry());
        let mut frame = Frame::new(geometry());

        assert_eq!(reader.read_frame(&mut frame).await.unwrap(), ReadOutcome::Frame);
        assert_eq!(frame.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);

        assert_eq!(reader.read_frame(&mut frame).await.unwrap(), ReadOutcome::Frame);
        assert_eq!(frame.as_bytes(), &[9, 10, 11, 12, 13, 14, 15, 16]);

        assert_eq!(
            reader.read_frame(&mut frame).await.unwrap(),
            ReadOutcome::EndOfStream
        );
        assert_eq!(reader.frames_read(), 2);
    }

    #[tokio::test]
    async fn test_empty_stream_is_end_of_stream() {
        let mut reader = FrameReader::new(Builder::new().build(), geometry());
        let mut frame = Frame::new(geometry());
        assert_eq!(
            reader.read_frame(&mut frame).await.unwrap(),
            ReadOutcome::EndOfStream
        );
    }

    #[tokio::test]
    async fn test_partial_frame_is_short_read() {
        let mock = Builder::new().read(&[0; 8]).read(&[0; 3]).build();
        let mut reader = FrameReader::new(mock, geometry());
        let mut frame = Frame::new(geometry());

        assert_eq!(reader.read_frame(&mut frame).await.unwrap(), ReadOutcome::Frame);
        match reader.read_frame(&mut frame).await {
            Err(MediaError::ShortRead {
                frame,
                expected,
                received,
            }) => {
                assert_eq!(frame, 2);
                assert_eq!(expected, 8);
                assert_eq!(received, 3);
            }
            other => panic!("expected short read, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_error_is_propagated() {
        let mock = Builder::new()
            .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let mut reader = FrameReader::new(mock, geometry());
        let mut frame = Frame::new(geometry());
        let err = reader.read_frame(&mut frame).await.unwrap_err();
        assert!(matches!(err, MediaError::Io(_)));
    }

    #[tokio::test]
    async fn test_rejects_foreign_geometry() {
        let mut reader = FrameReader::new(Builder::new().build(), geometry());
        let mut frame = Frame::new(Geometry::new(2, 2).unwrap());
        let err = reader.read_frame(&mut frame).await.unwrap_err();
        assert!(matches!(err, MediaError::GeometryMismatch { .. }));
    }

    #[tokio::test]
    async fn test_writes_exact_frame() {
        let frame = Frame::from_vec(geometry(), vec![9; 8]).unwrap();
        let mock = Builder::new().write(&[9; 8]).write(&[9; 8]).build();
        let mut writer = FrameWriter::new(mock);

        writer.write_frame(&frame).await.unwrap();
        writer.write_frame(&frame).await.unwrap();
        assert_eq!(writer.frames_written(), 2);
    }

    struct ClosedSink;

    impl AsyncWrite for ClosedSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Ok(0))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_zero_write_is_short_write() {
        let frame = Frame::new(geometry());
        let mut writer = FrameWriter::new(ClosedSink);
        let err = writer.write_frame(&frame).await.unwrap_err();
        assert!(matches!(
            err,
            MediaError::ShortWrite {
                frame: 1,
                expected: 8
            }
        ));
        assert!(err.is_framing());
        assert_eq!(writer.frames_written(), 0);
    }
}
