use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ExtractError;
use crate::provisioner::Unpack;
use crate::reporter::{Reporter, TracingReporter};

/// Unpacks release archives into a directory.
pub struct Extractor {
    reporter: Arc<dyn Reporter>,
}

impl Extractor {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Extract every entry of `archive` under `destination`.
    ///
    /// Failures are reported and then returned. Entries written before the
    /// failure stay on disk.
    pub async fn extract(&self, archive: &Path, destination: &Path) -> Result<(), ExtractError> {
        let archive_path = archive.to_path_buf();
        let dest_dir = destination.to_path_buf();

        let result = tokio::task::spawn_blocking(move || extract_archive(&archive_path, &dest_dir))
            .await
            .map_err(ExtractError::from)
            .and_then(|r| r);

        match result {
            Ok(skipped) => {
                for name in skipped {
                    self.reporter
                        .warn(&format!("Skipping zip entry with unsafe path: {name}"));
                }
                Ok(())
            }
            Err(e) => {
                self.reporter.error(
                    &format!(
                        "There was an error extracting the zip at {}",
                        archive.display()
                    ),
                    &e,
                );
                Err(e)
            }
        }
    }
}

impl Unpack for Extractor {
    async fn unpack(&self, archive: &Path, destination: &Path) -> Result<(), ExtractError> {
        self.extract(archive, destination).await
    }
}

/// Extract `archive` into `destination` with the default reporter.
pub async fn unzip_file(archive: &Path, destination: &Path) -> Result<(), ExtractError> {
    Extractor::new(Arc::new(TracingReporter))
        .extract(archive, destination)
        .await
}

/// Archive formats the extractor can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    TarGz,
    TarXz,
    TarBz2,
    Tar,
}

/// Enough of the header to see the `ustar` marker of a plain tar.
const SNIFF_LEN: u64 = 262;

impl ArchiveKind {
    /// Identify the format from the leading bytes of the file.
    fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if header.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else if header.starts_with(b"BZh") {
            Some(Self::TarBz2)
        } else if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Some(Self::TarXz)
        } else if header.get(257..262) == Some(b"ustar".as_slice()) {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Fall back to the file name when the contents are not recognised.
    fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar.xz") {
            Some(Self::TarXz)
        } else if name.ends_with(".tar.bz2") {
            Some(Self::TarBz2)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

/// Detect the archive format and unpack it into `dest_dir`.
///
/// Returns the names of zip entries skipped for escaping `dest_dir`.
fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractError> {
    // Open first so a missing archive fails before any directory is created.
    let mut file = fs::File::open(archive_path)?;

    let mut header = Vec::with_capacity(SNIFF_LEN as usize);
    file.by_ref().take(SNIFF_LEN).read_to_end(&mut header)?;
    file.seek(SeekFrom::Start(0))?;

    let kind = ArchiveKind::sniff(&header)
        .or_else(|| {
            archive_path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(ArchiveKind::from_name)
        })
        .ok_or_else(|| ExtractError::UnsupportedFormat {
            file: archive_path.display().to_string(),
        })?;

    fs::create_dir_all(dest_dir)?;

    match kind {
        ArchiveKind::Zip => extract_zip(file, dest_dir),
        ArchiveKind::TarGz => unpack_tar(flate2::read::GzDecoder::new(file), dest_dir),
        ArchiveKind::TarXz => unpack_tar(xz2::read::XzDecoder::new(file), dest_dir),
        ArchiveKind::TarBz2 => unpack_tar(bzip2::read::BzDecoder::new(file), dest_dir),
        ArchiveKind::Tar => unpack_tar(file, dest_dir),
    }
}

fn unpack_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<Vec<String>, ExtractError> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.unpack(dest_dir)?;
    Ok(Vec::new())
}

fn extract_zip(file: fs::File, dest_dir: &Path) -> Result<Vec<String>, ExtractError> {
    let mut archive = zip::ZipArchive::new(file)?;
    let mut skipped = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let outpath: PathBuf = match entry.enclosed_name() {
            Some(path) => dest_dir.join(path),
            None => {
                skipped.push(entry.name().to_string());
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&outpath)?;
            io::copy(&mut entry, &mut outfile)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(skipped)
}
