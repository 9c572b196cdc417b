//! Byte-stream splitting across engine-requested volumes.

use std::io::{self, Seek, SeekFrom, Write};

use crate::engine::{OutStream, VolumeCallback};
use crate::{Error, Result};

/// A writer that spreads one archive byte stream over successive volumes.
///
/// Volume 0 is the stream passed to [`new`](Self::new). Each volume is
/// filled to exactly the size the [`VolumeCallback`] reports for its index;
/// the next volume is then requested from the callback in increasing index
/// order.
///
/// Seeking is limited to what a container writer needs for its start
/// header: anywhere within the bytes already written to volume 0, and back
/// to the current end. A rewrite never continues into volume 1, so volume 0
/// must be at least as large as the rewritten header.
///
/// # Example
///
/// ```rust,ignore
/// use sevenz_update::volume::VolumeSpanWriter;
///
/// let mut writer = VolumeSpanWriter::new(first_volume, &mut callback)?;
/// writer.write_all(&archive_bytes)?;
/// let sizes = writer.finish()?;
/// ```
pub struct VolumeSpanWriter<S> {
    source: S,
    first: Box<dyn OutStream>,
    /// Bytes appended to volume 0.
    first_written: u64,
    /// Volume currently being appended to, when past volume 0.
    current: Option<Box<dyn OutStream>>,
    /// Index of the volume being appended to.
    index: u32,
    current_written: u64,
    current_limit: u64,
    total_written: u64,
    completed_sizes: Vec<u64>,
    /// Position inside volume 0 while rewriting already-written bytes.
    rewrite_position: Option<u64>,
}

impl<S: VolumeCallback> VolumeSpanWriter<S> {
    /// Creates a span writer whose volume 0 is `first`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotApplicable`] if the callback reports no volume
    /// size, or [`Error::InvalidVolumeSize`] for a zero size.
    pub fn new(first: Box<dyn OutStream>, mut source: S) -> Result<Self> {
        let limit = source
            .volume_size(0)
            .ok_or(Error::NotApplicable("volume size"))?;
        if limit == 0 {
            return Err(Error::InvalidVolumeSize);
        }
        Ok(Self {
            source,
            first,
            first_written: 0,
            current: None,
            index: 0,
            current_written: 0,
            current_limit: limit,
            total_written: 0,
            completed_sizes: Vec::new(),
            rewrite_position: None,
        })
    }

    /// Returns the index of the volume being appended to.
    pub fn current_index(&self) -> u32 {
        self.index
    }

    /// Returns the number of volumes opened so far.
    pub fn volume_count(&self) -> u32 {
        self.index + 1
    }

    /// Returns the total number of bytes appended.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Flushes every open volume and returns the size of each volume.
    pub fn finish(mut self) -> io::Result<Vec<u64>> {
        self.first.flush()?;
        if let Some(current) = self.current.as_mut() {
            current.flush()?;
        }
        self.completed_sizes.push(self.current_written);
        Ok(self.completed_sizes)
    }

    fn open_next_volume(&mut self) -> io::Result<()> {
        let next = self.index + 1;
        let limit = self.source.volume_size(next).unwrap_or(self.current_limit);
        if limit == 0 {
            return Err(io::Error::other(Error::InvalidVolumeSize));
        }
        let stream = self.source.volume_stream(next).map_err(io::Error::other)?;

        match self.current.replace(stream) {
            Some(mut previous) => previous.flush()?,
            None => {
                self.first.flush()?;
                self.first_written = self.current_written;
            }
        }
        self.completed_sizes.push(self.current_written);
        log::debug!("volume {} opened with limit {} bytes", next, limit);

        self.index = next;
        self.current_written = 0;
        self.current_limit = limit;
        Ok(())
    }

    fn append_target(&mut self) -> &mut dyn OutStream {
        match self.current.as_mut() {
            Some(current) => current.as_mut(),
            None => self.first.as_mut(),
        }
    }

    /// Bytes already present in volume 0.
    fn first_len(&self) -> u64 {
        if self.index == 0 {
            self.current_written
        } else {
            self.first_written
        }
    }
}

impl<S: VolumeCallback> Write for VolumeSpanWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if let Some(position) = self.rewrite_position {
            let available = self.first_len() - position;
            if available == 0 {
                if self.index == 0 {
                    // Reached the append position again.
                    self.rewrite_position = None;
                    return self.write(buf);
                }
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "cannot extend the first volume after later volumes were opened",
                ));
            }
            let len = buf.len().min(available as usize);
            let n = self.first.write(&buf[..len])?;
            self.rewrite_position = Some(position + n as u64);
            return Ok(n);
        }

        if self.current_written >= self.current_limit {
            self.open_next_volume()?;
        }

        let remaining = self.current_limit - self.current_written;
        let len = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = self.append_target().write(&buf[..len])?;

        self.current_written += n as u64;
        self.total_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        if let Some(current) = self.current.as_mut() {
            current.flush()?;
        }
        Ok(())
    }
}

impl<S: VolumeCallback> Seek for VolumeSpanWriter<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Start(p) if p == self.total_written => {
                self.return_to_end()?;
                Ok(p)
            }
            SeekFrom::Start(p) if p < self.first_len() => {
                self.first.seek(SeekFrom::Start(p))?;
                self.rewrite_position = Some(p);
                Ok(p)
            }
            SeekFrom::Current(0) => Ok(self.rewrite_position.unwrap_or(self.total_written)),
            SeekFrom::End(0) => {
                self.return_to_end()?;
                Ok(self.total_written)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "volume writer only seeks within the first volume or to the end",
            )),
        }
    }
}

impl<S: VolumeCallback> VolumeSpanWriter<S> {
    fn return_to_end(&mut self) -> io::Result<()> {
        if self.rewrite_position.take().is_some() {
            let end = self.first_len();
            self.first.seek(SeekFrom::Start(end))?;
        }
        Ok(())
    }
}

impl<S> std::fmt::Debug for VolumeSpanWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeSpanWriter")
            .field("index", &self.index)
            .field("current_written", &self.current_written)
            .field("current_limit", &self.current_limit)
            .field("total_written", &self.total_written)
            .field("rewrite_position", &self.rewrite_position)
            .finish_non_exhaustive()
    }
}

/// Recovers a crate error carried through an [`io::Error`] by the span writer.
pub(crate) fn unwrap_carried_error(error: io::Error) -> std::result::Result<Error, io::Error> {
    if error.get_ref().is_some_and(|inner| inner.is::<Error>()) {
        if let Some(Ok(inner)) = error.into_inner().map(|inner| inner.downcast::<Error>()) {
            return Ok(*inner);
        }
        return Err(io::Error::other("volume error lost"));
    }
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    /// A growable in-memory volume shared with the test.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Cursor<Vec<u8>>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for SharedBuf {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.0.borrow_mut().seek(pos)
        }
    }

    impl SharedBuf {
        fn bytes(&self) -> Vec<u8> {
            self.0.borrow().get_ref().clone()
        }
    }

    struct MemoryVolumes {
        sizes: Vec<u64>,
        volumes: Vec<SharedBuf>,
        fail_at: Option<u32>,
    }

    impl MemoryVolumes {
        fn new(sizes: Vec<u64>) -> Self {
            Self {
                sizes,
                volumes: Vec::new(),
                fail_at: None,
            }
        }
    }

    impl VolumeCallback for &mut MemoryVolumes {
        fn volume_size(&mut self, index: u32) -> Option<u64> {
            let last = self.sizes.len().checked_sub(1)?;
            Some(self.sizes[(index as usize).min(last)])
        }

        fn volume_stream(&mut self, index: u32) -> Result<Box<dyn OutStream>> {
            if self.fail_at == Some(index) {
                return Err(Error::create_output(
                    format!("vol{}", index),
                    io::Error::new(io::ErrorKind::AlreadyExists, "exists"),
                ));
            }
            assert_eq!(index as usize, self.volumes.len() + 1);
            let buf = SharedBuf::default();
            self.volumes.push(buf.clone());
            Ok(Box::new(buf))
        }
    }

    fn first_volume() -> (SharedBuf, Box<dyn OutStream>) {
        let buf = SharedBuf::default();
        (buf.clone(), Box::new(buf))
    }

    #[test]
    fn test_single_volume() {
        let mut volumes = MemoryVolumes::new(vec![1024]);
        let (first, stream) = first_volume();
        let mut writer = VolumeSpanWriter::new(stream, &mut volumes).unwrap();
        writer.write_all(&[7u8; 100]).unwrap();
        let sizes = writer.finish().unwrap();

        assert_eq!(sizes, vec![100]);
        assert_eq!(first.bytes().len(), 100);
        assert!(volumes.volumes.is_empty());
    }

    #[test]
    fn test_exact_volume_sizes() {
        let mut volumes = MemoryVolumes::new(vec![100]);
        let (first, stream) = first_volume();
        let mut writer = VolumeSpanWriter::new(stream, &mut volumes).unwrap();
        let data: Vec<u8> = (0..250u32).map(|i| i as u8).collect();
        writer.write_all(&data).unwrap();
        assert_eq!(writer.volume_count(), 3);
        let sizes = writer.finish().unwrap();

        assert_eq!(sizes, vec![100, 100, 50]);
        let mut joined = first.bytes();
        for volume in &volumes.volumes {
            joined.extend(volume.bytes());
        }
        assert_eq!(joined, data);
    }

    #[test]
    fn test_per_index_sizes_last_repeats() {
        let mut volumes = MemoryVolumes::new(vec![10, 30]);
        let (_first, stream) = first_volume();
        let mut writer = VolumeSpanWriter::new(stream, &mut volumes).unwrap();
        writer.write_all(&[1u8; 95]).unwrap();
        let sizes = writer.finish().unwrap();
        assert_eq!(sizes, vec![10, 30, 30, 25]);
    }

    #[test]
    fn test_exact_fill_does_not_open_empty_volume() {
        let mut volumes = MemoryVolumes::new(vec![50]);
        let (_first, stream) = first_volume();
        let mut writer = VolumeSpanWriter::new(stream, &mut volumes).unwrap();
        writer.write_all(&[0u8; 100]).unwrap();
        let sizes = writer.finish().unwrap();
        assert_eq!(sizes, vec![50, 50]);
        assert_eq!(volumes.volumes.len(), 1);
    }

    #[test]
    fn test_rewrite_start_of_first_volume() {
        let mut volumes = MemoryVolumes::new(vec![64]);
        let (first, stream) = first_volume();
        let mut writer = VolumeSpanWriter::new(stream, &mut volumes).unwrap();
        writer.write_all(&[0u8; 32]).unwrap();
        writer.write_all(&[1u8; 100]).unwrap();
        assert_eq!(writer.stream_position().unwrap(), 132);

        writer.seek(SeekFrom::Start(0)).unwrap();
        writer.write_all(&[9u8; 32]).unwrap();
        assert_eq!(writer.stream_position().unwrap(), 32);
        let sizes = writer.finish().unwrap();

        assert_eq!(sizes, vec![64, 64, 4]);
        let bytes = first.bytes();
        assert_eq!(&bytes[..32], &[9u8; 32]);
        assert_eq!(&bytes[32..], &[1u8; 32]);
    }

    #[test]
    fn test_rewrite_then_append_in_first_volume() {
        let mut volumes = MemoryVolumes::new(vec![1000]);
        let (first, stream) = first_volume();
        let mut writer = VolumeSpanWriter::new(stream, &mut volumes).unwrap();
        writer.write_all(b"....tail").unwrap();
        writer.seek(SeekFrom::Start(0)).unwrap();
        writer.write_all(b"head").unwrap();
        writer.seek(SeekFrom::End(0)).unwrap();
        writer.write_all(b"!").unwrap();
        writer.finish().unwrap();
        assert_eq!(first.bytes(), b"headtail!");
    }

    #[test]
    fn test_rewrite_cannot_extend_first_volume_later() {
        let mut volumes = MemoryVolumes::new(vec![4]);
        let (_first, stream) = first_volume();
        let mut writer = VolumeSpanWriter::new(stream, &mut volumes).unwrap();
        writer.write_all(&[0u8; 10]).unwrap();
        writer.seek(SeekFrom::Start(2)).unwrap();
        let err = writer.write_all(&[1u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn test_unsupported_seek() {
        let mut volumes = MemoryVolumes::new(vec![4]);
        let (_first, stream) = first_volume();
        let mut writer = VolumeSpanWriter::new(stream, &mut volumes).unwrap();
        writer.write_all(&[0u8; 10]).unwrap();
        assert!(writer.seek(SeekFrom::Start(6)).is_err());
        assert!(writer.seek(SeekFrom::Current(-1)).is_err());
    }

    #[test]
    fn test_volume_error_is_carried() {
        let mut volumes = MemoryVolumes::new(vec![4]);
        volumes.fail_at = Some(2);
        let (_first, stream) = first_volume();
        let mut writer = VolumeSpanWriter::new(stream, &mut volumes).unwrap();
        let err = writer.write_all(&[0u8; 10]).unwrap_err();
        let carried = unwrap_carried_error(err).unwrap();
        assert!(matches!(carried, Error::CreateOutput { .. }));
    }

    #[test]
    fn test_plain_io_error_not_carried() {
        let err = io::Error::other("disk full");
        assert!(unwrap_carried_error(err).is_err());
    }

    #[test]
    fn test_without_volume_size() {
        let mut volumes = MemoryVolumes::new(vec![]);
        let (_first, stream) = first_volume();
        let err = VolumeSpanWriter::new(stream, &mut volumes).unwrap_err();
        assert!(matches!(err, Error::NotApplicable(_)));
    }
}
