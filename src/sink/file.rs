use super::PacketSink;
use crate::av::{OutputProps, Packet};
use crate::{Result, VdkError};
use async_trait::async_trait;
use log::debug;
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Writes output units to files named from a template.
///
/// `$num$` in the template is replaced by the file number and `$ext$` by
/// the extension declared at configuration. A unit opening a file creates
/// the next one, a unit closing a file flushes it. Seek units overwrite the
/// current file at their byte offset.
pub struct FileSink {
    template: String,
    ext: String,
    next_number: u32,
    current: Option<File>,
    paths: Vec<PathBuf>,
}

impl FileSink {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ext: "bin".to_string(),
            next_number: 1,
            current: None,
            paths: Vec::new(),
        }
    }

    pub fn with_start_number(mut self, number: u32) -> Self {
        self.next_number = number;
        self
    }

    /// Every file created so far, in order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn path_for(&self, number: u32) -> PathBuf {
        PathBuf::from(
            self.template
                .replace("$num$", &number.to_string())
                .replace("$ext$", &self.ext),
        )
    }

    async fn open_next(&mut self) -> Result<()> {
        self.close().await?;
        let path = self.path_for(self.next_number);
        self.next_number += 1;
        debug!("Opening output file {}", path.display());
        self.current = Some(File::create(&path).await?);
        self.paths.push(path);
        Ok(())
    }

    /// Reopens the last file without truncating it, for late header rewrites.
    async fn reopen_last(&mut self) -> Result<()> {
        let path = self
            .paths
            .last()
            .ok_or_else(|| VdkError::InvalidData("seek unit before any file was opened".into()))?;
        self.current = Some(OpenOptions::new().write(true).open(path).await?);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.current.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PacketSink for FileSink {
    async fn configure(&mut self, props: &OutputProps) -> Result<()> {
        self.ext = props.file_ext.clone();
        Ok(())
    }

    async fn write_unit(&mut self, unit: &Packet) -> Result<()> {
        let seek = match (unit.seek, unit.byte_offset) {
            (true, Some(offset)) => Some(offset),
            _ => None,
        };
        if seek.is_some() && self.current.is_none() {
            self.reopen_last().await?;
        } else if unit.framing.start || self.current.is_none() {
            self.open_next().await?;
        }

        let file = self
            .current
            .as_mut()
            .ok_or_else(|| VdkError::InvalidData("no open output file".into()))?;
        match seek {
            Some(offset) => {
                file.flush().await?;
                file.seek(SeekFrom::Start(offset)).await?;
                file.write_all(&unit.data).await?;
                file.flush().await?;
                file.seek(SeekFrom::End(0)).await?;
            }
            None => file.write_all(&unit.data).await?,
        }

        if unit.framing.end {
            self.close().await?;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::av::Framing;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn unit(data: &[u8], start: bool, end: bool) -> Packet {
        let mut pck = Packet::new(data.to_vec());
        pck.framing = Framing { start, end };
        pck
    }

    #[tokio::test]
    async fn test_numbered_files() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("img_$num$.$ext$");
        let mut sink = FileSink::new(template.to_string_lossy());
        sink.configure(&OutputProps {
            stream_type: crate::av::StreamType::File,
            codec_id: crate::av::CodecId::RawVideo,
            file_ext: "bmp".into(),
            mime: "image/bmp".into(),
            numbered_files: true,
        })
        .await
        .unwrap();

        sink.write_unit(&unit(b"one", true, true)).await.unwrap();
        sink.write_unit(&unit(b"two", true, true)).await.unwrap();
        sink.finish().await.unwrap();

        assert_eq!(sink.paths().len(), 2);
        assert_eq!(std::fs::read(dir.path().join("img_1.bmp")).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join("img_2.bmp")).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_seek_unit_rewrites_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audio.wav");
        let mut sink = FileSink::new(path.to_string_lossy());

        sink.write_unit(&unit(&[0u8; 4], true, false)).await.unwrap();
        sink.write_unit(&unit(b"data", false, false)).await.unwrap();
        let mut header = unit(b"RIFF", false, true);
        header.seek = true;
        header.byte_offset = Some(0);
        sink.write_unit(&header).await.unwrap();
        sink.finish().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"RIFFdata");
        assert_eq!(sink.paths().len(), 1);
    }
}
