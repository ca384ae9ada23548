use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Where generated PDFs live. The database only keeps the filename.
#[async_trait]
pub trait PdfStorage: Send + Sync {
    async fn save(&self, filename: &str, pdf: &[u8]) -> io::Result<()>;

    /// `Ok(None)` when no file with that name exists.
    async fn load(&self, filename: &str) -> io::Result<Option<Vec<u8>>>;

    async fn remove(&self, filename: &str) -> io::Result<()>;
}

/// PDFs stored as plain files in one directory.
pub struct LocalPdfStorage {
    root: PathBuf,
}

impl LocalPdfStorage {
    /// Creates the directory when it does not exist yet.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, filename: &str) -> io::Result<PathBuf> {
        let safe = sanitize_filename::sanitize(filename);
        if safe.is_empty() || safe != filename {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing unsafe PDF filename '{}'", filename),
            ));
        }
        Ok(self.root.join(safe))
    }
}

#[async_trait]
impl PdfStorage for LocalPdfStorage {
    async fn save(&self, filename: &str, pdf: &[u8]) -> io::Result<()> {
        let path = self.path_for(filename)?;
        tokio::fs::write(&path, pdf).await?;
        log::debug!("Stored PDF {} ({} bytes)", path.display(), pdf.len());
        Ok(())
    }

    async fn load(&self, filename: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn remove(&self, filename: &str) -> io::Result<()> {
        let path = self.path_for(filename)?;
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
