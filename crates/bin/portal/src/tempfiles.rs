//! cleanup for the scratch files a transfer creates while archiving (send
//! side) or while the file is still in flight (receive side). swept on
//! startup in case a previous run was killed mid-transfer, per spec.md §6's
//! "Temporary files" note. the naming convention itself lives in
//! `portal_core::config::temp_prefix` so the CLI layer and anything else
//! that needs to recognize portal's scratch files agree on one source.

use portal_core::config::temp_prefix;
use portal_core::pake::Role;
use std::path::PathBuf;

/// a fresh, unique scratch path under the system temp directory.
pub fn new_scratch_path(role: Role) -> PathBuf {
    std::env::temp_dir().join(format!("{}{}", temp_prefix(role), std::process::id()))
}

/// remove any leftover scratch files for `role` in the system temp
/// directory. best-effort: a file that vanished or can't be removed is
/// logged and skipped, never fatal to startup.
pub async fn sweep(role: Role) {
    let prefix = temp_prefix(role);
    let dir = std::env::temp_dir();
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(%e, "could not scan temp directory for stale scratch files");
            return;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(prefix) {
            continue;
        }
        if let Err(e) = tokio::fs::remove_file(entry.path()).await {
            tracing::warn!(path = %entry.path().display(), %e, "failed to remove stale scratch file");
        } else {
            tracing::info!(path = %entry.path().display(), "removed stale scratch file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_paths_are_namespaced_by_role() {
        let send = new_scratch_path(Role::Initiator);
        let recv = new_scratch_path(Role::Responder);
        assert!(send.to_string_lossy().contains(temp_prefix(Role::Initiator)));
        assert!(recv.to_string_lossy().contains(temp_prefix(Role::Responder)));
    }

    #[tokio::test]
    async fn sweep_removes_only_matching_prefix() {
        let dir = std::env::temp_dir();
        let keep = dir.join(format!("not-portal-{}", std::process::id()));
        let drop = dir.join(format!("{}test-{}", temp_prefix(Role::Initiator), std::process::id()));
        tokio::fs::write(&keep, b"keep").await.unwrap();
        tokio::fs::write(&drop, b"drop").await.unwrap();

        sweep(Role::Initiator).await;

        assert!(keep.exists());
        assert!(!drop.exists());
        tokio::fs::remove_file(&keep).await.unwrap();
    }
}
