//! the smallest possible stand-in for a real archiver: frames one or more
//! files as a flat sequence of `(name, size, bytes)` entries. deliberately
//! isolated from `portal-core` — swapping this for a real tar/zip-style
//! archiver later shouldn't touch the protocol layer at all.

use portal_core::PortalError;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// one entry's header: a name length, the UTF-8 name, then an 8-byte size.
async fn write_entry_header<W: AsyncWrite + Unpin>(
    out: &mut W,
    name: &str,
    size: u64,
) -> Result<(), PortalError> {
    let name_bytes = name.as_bytes();
    out.write_u16(name_bytes.len() as u16).await.map_err(PortalError::Io)?;
    out.write_all(name_bytes).await.map_err(PortalError::Io)?;
    out.write_u64(size).await.map_err(PortalError::Io)?;
    Ok(())
}

/// stream every path in `paths` into `out` as framed entries. directories
/// are not supported in this minimal stand-in.
pub async fn pack<W: AsyncWrite + Unpin>(
    paths: &[PathBuf],
    out: &mut W,
) -> Result<(), PortalError> {
    for path in paths {
        let metadata = tokio::fs::metadata(path).await.map_err(PortalError::Io)?;
        if !metadata.is_file() {
            return Err(PortalError::TransportFailure(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        write_entry_header(out, &name, metadata.len()).await?;

        let mut file = File::open(path).await.map_err(PortalError::Io)?;
        tokio::io::copy(&mut file, out).await.map_err(PortalError::Io)?;
    }
    Ok(())
}

/// total size, in bytes, of the packed stream `pack` would produce for
/// `paths` — header overhead plus file contents, used to pick a chunk size.
pub async fn packed_size(paths: &[PathBuf]) -> Result<u64, PortalError> {
    let mut total = 0u64;
    for path in paths {
        let metadata = tokio::fs::metadata(path).await.map_err(PortalError::Io)?;
        let name_len = path
            .file_name()
            .map(|n| n.to_string_lossy().len())
            .unwrap_or(0);
        total += 2 + name_len as u64 + 8 + metadata.len();
    }
    Ok(total)
}

/// read one `(name, bytes)` entry back out of a packed stream, writing the
/// contents to `dest_dir`. returns `None` once the stream is exhausted.
pub async fn unpack_one<R: AsyncRead + Unpin>(
    input: &mut R,
    dest_dir: &Path,
) -> Result<Option<PathBuf>, PortalError> {
    let name_len = match input.read_u16().await {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(PortalError::Io(e)),
    };

    let mut name_bytes = vec![0u8; name_len as usize];
    input.read_exact(&mut name_bytes).await.map_err(PortalError::Io)?;
    let name = String::from_utf8_lossy(&name_bytes).to_string();

    let size = input.read_u64().await.map_err(PortalError::Io)?;

    tokio::fs::create_dir_all(dest_dir).await.map_err(PortalError::Io)?;
    let dest = unique_path(dest_dir, &name);

    let mut file = File::create(&dest).await.map_err(PortalError::Io)?;
    let mut remaining = size;
    let mut buf = [0u8; 8192];
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        input.read_exact(&mut buf[..want]).await.map_err(PortalError::Io)?;
        file.write_all(&buf[..want]).await.map_err(PortalError::Io)?;
        remaining -= want as u64;
    }
    file.flush().await.map_err(PortalError::Io)?;

    Ok(Some(dest))
}

/// pick a destination path that doesn't collide with an existing file,
/// appending " (1)", " (2)", ... before the extension as needed.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = Path::new(name).file_stem().unwrap_or_default().to_string_lossy().to_string();
    let ext = Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    for i in 1u32.. {
        let candidate = dir.join(format!("{stem} ({i}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn packs_and_unpacks_a_single_file() {
        let dir = tempdir();
        let src = dir.join("greeting.txt");
        tokio::fs::write(&src, b"hello portal").await.unwrap();

        let mut buf = Vec::new();
        pack(&[src.clone()], &mut buf).await.unwrap();

        let dest_dir = dir.join("out");
        let mut cursor = Cursor::new(buf);
        let written = unpack_one(&mut cursor, &dest_dir).await.unwrap().unwrap();
        assert_eq!(tokio::fs::read(&written).await.unwrap(), b"hello portal");
        assert!(unpack_one(&mut cursor, &dest_dir).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_path_avoids_clobbering_existing_files() {
        let dir = tempdir();
        tokio::fs::write(dir.join("a.txt"), b"first").await.unwrap();
        let picked = unique_path(&dir, "a.txt");
        assert_eq!(picked, dir.join("a (1).txt"));
    }

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("portal-archive-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
