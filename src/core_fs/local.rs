// Host filesystem backend
use crate::core_fs::{FileReader, FileStat, FileSystem, FileWriter};
use async_trait::async_trait;
use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn to_stat(metadata: &Metadata) -> FileStat {
    use std::os::unix::fs::MetadataExt;

    FileStat {
        size: metadata.len(),
        mode: metadata.mode(),
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        is_dir: metadata.is_dir(),
        uid: metadata.uid(),
        gid: metadata.gid(),
    }
}

#[cfg(not(unix))]
fn to_stat(metadata: &Metadata) -> FileStat {
    let mode = match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    };

    FileStat {
        size: metadata.len(),
        mode,
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        is_dir: metadata.is_dir(),
        uid: 0,
        gid: 0,
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = fs::metadata(path).await?;
        Ok(to_stat(&metadata))
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut entries = fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn open_read(&self, path: &Path) -> io::Result<FileReader> {
        let file = fs::File::open(path).await?;
        Ok(Box::new(file))
    }

    async fn create_write(&self, path: &Path, mode: u32) -> io::Result<FileWriter> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(mode);
        #[cfg(not(unix))]
        let _ = mode;
        let file = options.open(path).await?;
        Ok(Box::new(file))
    }

    async fn unlink(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }

    async fn mkdir(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        builder.mode(mode);
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(path).await
    }

    async fn rmdir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to).await
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path).await
    }
}
