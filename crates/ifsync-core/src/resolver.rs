// # Resolver File Editor
//
// Maintains this engine's managed section inside a shared resolver
// configuration file (typically /etc/resolv.conf).
//
// ## Ownership model
//
// The file is shared with other writers. This editor claims exactly one
// contiguous section, delimited by markers carrying the owner identity:
//
// ```text
// #++SECTION: ifsync
// nameserver 192.168.1.1
// nameserver 8.8.8.8
// #--SECTION: ifsync
// ```
//
// Every byte outside the marker pair, including other owners' sections, is
// preserved exactly. A rewrite removes the old section (if present) and
// appends the fresh one at the end of the file.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;

/// Editor for one owner's managed section of a shared resolver file
#[derive(Debug, Clone)]
pub struct ResolverFile {
    path: PathBuf,
    start_marker: Vec<u8>,
    end_marker: Vec<u8>,
}

impl ResolverFile {
    /// Create an editor for `path`, claiming the section owned by `owner`
    pub fn new(path: impl Into<PathBuf>, owner: &str) -> Self {
        Self {
            path: path.into(),
            start_marker: format!("#++SECTION: {}\n", owner).into_bytes(),
            end_marker: format!("#--SECTION: {}\n", owner).into_bytes(),
        }
    }

    /// The file this editor operates on
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with an initial section if it does not exist yet
    ///
    /// Startup helper: hosts that boot with no resolver file get one holding
    /// the statically configured servers. An existing file is left alone.
    pub async fn ensure_exists(&self, servers: &[IpAddr]) -> Result<(), Error> {
        if fs::try_exists(&self.path).await? {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        tracing::info!("Creating resolver file {}", self.path.display());
        self.rewrite(servers).await
    }

    /// Replace the managed section with `servers`
    ///
    /// The caller supplies the final, de-duplicated list; one
    /// `nameserver <address>` line is written per entry, in order.
    ///
    /// # Errors
    ///
    /// `Error::Io` when the file cannot be read or rewritten. Callers treat
    /// this as non-fatal: address configuration takes priority over resolver
    /// updates.
    pub async fn rewrite(&self, servers: &[IpAddr]) -> Result<(), Error> {
        let mut content = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        if let Some(start) = find(&content, &self.start_marker) {
            // A missing end marker means a truncated previous write; claim
            // through end of file so the section heals on this rewrite.
            let end = match find_from(&content, &self.end_marker, start + self.start_marker.len())
            {
                Some(pos) => pos + self.end_marker.len(),
                None => content.len(),
            };
            content.drain(start..end);
        }

        content.extend_from_slice(&self.start_marker);
        for server in servers {
            content.extend_from_slice(format!("nameserver {}\n", server).as_bytes());
        }
        content.extend_from_slice(&self.end_marker);

        let mut file = fs::File::create(&self.path).await?;
        file.write_all(&content).await?;
        file.sync_all().await?;

        tracing::debug!(
            "Resolver section rewritten with {} servers in {}",
            servers.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn servers(addrs: &[&str]) -> Vec<IpAddr> {
        addrs.iter().map(|a| a.parse().unwrap()).collect()
    }

    #[tokio::test]
    async fn rewrite_creates_missing_file() {
        let dir = tempdir().unwrap();
        let file = ResolverFile::new(dir.path().join("resolv.conf"), "ifsync");

        file.rewrite(&servers(&["8.8.8.8"])).await.unwrap();

        let content = fs::read_to_string(file.path()).await.unwrap();
        assert_eq!(
            content,
            "#++SECTION: ifsync\nnameserver 8.8.8.8\n#--SECTION: ifsync\n"
        );
    }

    #[tokio::test]
    async fn bytes_outside_the_section_survive_rewrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resolv.conf");
        let prelude = "# hand-written defaults\nnameserver 127.0.0.53\n";
        fs::write(&path, prelude).await.unwrap();

        let file = ResolverFile::new(&path, "ifsync");
        file.rewrite(&servers(&["8.8.8.8"])).await.unwrap();

        let before = fs::read_to_string(&path).await.unwrap();
        assert!(before.starts_with(prelude));

        file.rewrite(&servers(&["1.1.1.1", "8.8.8.8"])).await.unwrap();

        let after = fs::read_to_string(&path).await.unwrap();
        assert!(after.starts_with(prelude));
        assert_eq!(
            &after[prelude.len()..],
            "#++SECTION: ifsync\nnameserver 1.1.1.1\nnameserver 8.8.8.8\n#--SECTION: ifsync\n"
        );
    }

    #[tokio::test]
    async fn other_owners_sections_are_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resolv.conf");
        let other = "#++SECTION: vpn\nnameserver 10.8.0.1\n#--SECTION: vpn\n";
        fs::write(&path, other).await.unwrap();

        let file = ResolverFile::new(&path, "ifsync");
        file.rewrite(&servers(&["8.8.8.8"])).await.unwrap();
        file.rewrite(&servers(&["9.9.9.9"])).await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.starts_with(other));
        assert_eq!(content.matches("#++SECTION: ifsync\n").count(), 1);
        assert!(content.contains("nameserver 9.9.9.9\n"));
        assert!(!content.contains("nameserver 8.8.8.8\n"));
    }

    #[tokio::test]
    async fn trailing_content_shifts_left_when_section_shrinks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resolv.conf");

        let file = ResolverFile::new(&path, "ifsync");
        file.rewrite(&servers(&["1.1.1.1", "8.8.8.8", "9.9.9.9"]))
            .await
            .unwrap();

        // another writer appends after our section
        let trailer = "#++SECTION: vpn\nnameserver 10.8.0.1\n#--SECTION: vpn\n";
        let mut content = fs::read(&path).await.unwrap();
        content.extend_from_slice(trailer.as_bytes());
        fs::write(&path, &content).await.unwrap();

        file.rewrite(&servers(&["1.1.1.1"])).await.unwrap();

        let after = fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            after,
            format!(
                "{}#++SECTION: ifsync\nnameserver 1.1.1.1\n#--SECTION: ifsync\n",
                trailer
            )
        );
    }

    #[tokio::test]
    async fn missing_end_marker_claims_through_end_of_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resolv.conf");
        fs::write(
            &path,
            "nameserver 127.0.0.53\n#++SECTION: ifsync\nnameserver 8.8.8.8\n",
        )
        .await
        .unwrap();

        let file = ResolverFile::new(&path, "ifsync");
        file.rewrite(&servers(&["1.1.1.1"])).await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            content,
            "nameserver 127.0.0.53\n#++SECTION: ifsync\nnameserver 1.1.1.1\n#--SECTION: ifsync\n"
        );
    }

    #[tokio::test]
    async fn empty_server_list_writes_empty_section() {
        let dir = tempdir().unwrap();
        let file = ResolverFile::new(dir.path().join("resolv.conf"), "ifsync");

        file.rewrite(&[]).await.unwrap();

        let content = fs::read_to_string(file.path()).await.unwrap();
        assert_eq!(content, "#++SECTION: ifsync\n#--SECTION: ifsync\n");
    }

    #[tokio::test]
    async fn ensure_exists_leaves_existing_file_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resolv.conf");
        fs::write(&path, "nameserver 127.0.0.53\n").await.unwrap();

        let file = ResolverFile::new(&path, "ifsync");
        file.ensure_exists(&servers(&["8.8.8.8"])).await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "nameserver 127.0.0.53\n");
    }

    #[tokio::test]
    async fn ensure_exists_creates_file_and_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("etc").join("resolv.conf");

        let file = ResolverFile::new(&path, "ifsync");
        file.ensure_exists(&servers(&["8.8.8.8"])).await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("nameserver 8.8.8.8\n"));
    }
}
