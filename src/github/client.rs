// src/github/client.rs
// =============================================================================
// Talks to the GitHub REST API.
//
// GitHubClient implements the three RepoHost operations:
// - find_release:   GET /repos/{owner}/{repo}/releases/latest
//                   GET /repos/{owner}/{repo}/releases/tags/{tag}
// - download_asset: GET <browser_download_url>, streamed to a file
// - fetch_source:   GET /repos/{owner}/{repo}/tarball/{ref}, then unpacked
//
// A non-success status on the release lookup is NOT an error: it just means
// "no release here" (no releases yet, or unknown tag). Everything else that
// goes wrong on the wire is a Download error.
//
// Rust concepts:
// - async/await: Every request is awaited; nothing runs in parallel
// - Streaming: Asset bodies are written chunk by chunk, never held whole
// - Traits: GitHubClient is one implementation of RepoHost
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;  // write_all/flush on tokio::fs::File
use tracing::{debug, info};

use super::{Release, ReleaseAsset, RepoHost, RepositoryRef, SourceTree};
use crate::error::{FetchError, FetchResult};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

// Source tarballs larger than this are refused (100 MiB)
const MAX_SOURCE_DOWNLOAD: u64 = 100 * 1024 * 1024;

// GitHub rejects API requests without a User-Agent
const USER_AGENT: &str = concat!("module-fetch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(120),
        }
    }
}

// Holds the reqwest Client (which pools connections) and the API base URL
pub struct GitHubClient {
    client: Client,
    api_url: String,
}

impl GitHubClient {
    // Builds one HTTP client for the whole run
    pub fn new(config: ClientConfig) -> FetchResult<Self> {
        // The token, if any, rides along on every request
        let mut headers = HeaderMap::new();
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| FetchError::download(&config.api_url, e))?;
            // Keeps the token out of Debug output
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        // Asset URLs redirect to a CDN, so redirects must be followed
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::download(&config.api_url, e))?;

        Ok(GitHubClient {
            client,
            // Stored without a trailing slash so format! can add one
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    // releases/latest, or releases/tags/{tag} for an explicit version
    fn release_url(&self, repo: &RepositoryRef, tag: Option<&str>) -> String {
        match tag {
            Some(tag) => format!(
                "{}/repos/{}/{}/releases/tags/{}",
                self.api_url, repo.owner, repo.name, tag
            ),
            None => format!(
                "{}/repos/{}/{}/releases/latest",
                self.api_url, repo.owner, repo.name
            ),
        }
    }

    // Snapshot of the repo at `git_ref`; HEAD is the default branch
    fn tarball_url(&self, repo: &RepositoryRef, git_ref: Option<&str>) -> String {
        format!(
            "{}/repos/{}/{}/tarball/{}",
            self.api_url,
            repo.owner,
            repo.name,
            git_ref.unwrap_or("HEAD")
        )
    }

    // Sends a GET; only transport failures are errors here, the status is
    // left for the caller to judge
    async fn get(&self, url: &str, accept: &'static str) -> FetchResult<Response> {
        self.client
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| FetchError::download(url, e))
    }
}

impl RepoHost for GitHubClient {
    async fn find_release(
        &self,
        repo: &RepositoryRef,
        tag: Option<&str>,
    ) -> FetchResult<Option<Release>> {
        let url = self.release_url(repo, tag);
        debug!("Querying release: {}", url);

        let response = self.get(&url, "application/vnd.github+json").await?;
        // 404 = no releases yet, or no such tag
        if !response.status().is_success() {
            debug!("No release at {} (HTTP {})", url, response.status());
            return Ok(None);
        }

        // A 200 with a body we can't read is a real failure
        let release = response
            .json::<Release>()
            .await
            .map_err(|e| FetchError::download(&url, e))?;
        debug!(
            "Release {} has {} asset(s)",
            release.tag_name,
            release.assets.len()
        );
        Ok(Some(release))
    }

    async fn download_asset(
        &self,
        asset: &ReleaseAsset,
        output_dir: &Path,
    ) -> FetchResult<PathBuf> {
        let url = asset.download_url.as_str();
        // Only the last path component of the asset name is used, so a name
        // like "../x.jar" can't escape output_dir
        let file_name = Path::new(&asset.file_name)
            .file_name()
            .ok_or_else(|| FetchError::download(url, "asset has no usable file name"))?;
        let destination = output_dir.join(file_name);

        info!("Downloading {} -> {}", url, destination.display());
        let response = self.get(url, "application/octet-stream").await?;
        // Check the status before creating the file: an error page must not
        // end up on disk
        let response = ensure_success(url, response)?;

        if let Err(err) = stream_to_file(url, response, &destination).await {
            // Don't leave a truncated artifact behind
            let _ = tokio::fs::remove_file(&destination).await;
            return Err(err);
        }

        Ok(destination)
    }

    async fn fetch_source(
        &self,
        repo: &RepositoryRef,
        git_ref: Option<&str>,
    ) -> FetchResult<SourceTree> {
        let url = self.tarball_url(repo, git_ref);
        info!("Fetching source tarball: {}", url);

        let response = self.get(&url, "application/vnd.github+json").await?;
        let response = ensure_success(&url, response)?;
        // The tarball is kept in memory, so its size is capped
        let bytes = read_with_limit(&url, response, MAX_SOURCE_DOWNLOAD).await?;
        debug!("Downloaded {} bytes of source", bytes.len());

        SourceTree::from_tarball(&bytes)
    }
}

// Turns a non-2xx response into a Download error
fn ensure_success(url: &str, response: Response) -> FetchResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::download(url, format!("HTTP {}", status)))
    }
}

// Copies the response body into `destination` as it arrives
async fn stream_to_file(url: &str, mut response: Response, destination: &Path) -> FetchResult<()> {
    let mut file = tokio::fs::File::create(destination)
        .await
        .map_err(|e| FetchError::io(format!("failed to create {}", destination.display()), e))?;

    // chunk() yields None once the body is complete; a connection that drops
    // early (fewer bytes than Content-Length) is an Err here
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::download(url, e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(format!("failed to write {}", destination.display()), e))?;
    }

    file.flush()
        .await
        .map_err(|e| FetchError::io(format!("failed to write {}", destination.display()), e))
}

// Reads a whole body into memory, giving up past `max_size` bytes
async fn read_with_limit(url: &str, mut response: Response, max_size: u64) -> FetchResult<Vec<u8>> {
    // Refuse early when the server tells us the size up front
    if let Some(len) = response.content_length() {
        if len > max_size {
            return Err(FetchError::download(
                url,
                format!("archive is {} bytes, limit is {}", len, max_size),
            ));
        }
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::download(url, e))?
    {
        bytes.extend_from_slice(&chunk);
        // Content-Length can be missing, so check as we go too
        if bytes.len() as u64 > max_size {
            return Err(FetchError::download(
                url,
                format!("archive exceeds limit of {} bytes", max_size),
            ));
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn client() -> GitHubClient {
        GitHubClient::new(ClientConfig {
            api_url: "https://ghe.example.com/api/v3/".to_string(),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    fn widgets() -> RepositoryRef {
        RepositoryRef::parse("https://github.com/acme/widgets").unwrap()
    }

    // Answers the first connection on a loopback port with `response`,
    // byte for byte, then hangs up. Returns the server's base URL.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            // Read up to the end of the request headers (GETs have no body)
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            stream.write_all(response.as_bytes()).unwrap();
            // Dropping the stream closes the connection
        });

        format!("http://{}", addr)
    }

    // Same settings as GitHubClient::new, minus any HTTP_PROXY from the
    // environment so requests reach the loopback server
    fn local_client(base_url: &str) -> GitHubClient {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .no_proxy()
            .build()
            .unwrap();
        GitHubClient {
            client,
            api_url: base_url.to_string(),
        }
    }

    fn jar_asset(base_url: &str) -> ReleaseAsset {
        ReleaseAsset {
            file_name: "core-1.0.jar".to_string(),
            download_url: format!("{}/acme/widgets/releases/download/v1.0/core-1.0.jar", base_url),
        }
    }

    #[test]
    fn test_release_urls() {
        let client = client();
        assert_eq!(
            client.release_url(&widgets(), None),
            "https://ghe.example.com/api/v3/repos/acme/widgets/releases/latest"
        );
        assert_eq!(
            client.release_url(&widgets(), Some("v1.2.0")),
            "https://ghe.example.com/api/v3/repos/acme/widgets/releases/tags/v1.2.0"
        );
    }

    #[test]
    fn test_tarball_url_defaults_to_head() {
        let client = client();
        assert_eq!(
            client.tarball_url(&widgets(), None),
            "https://ghe.example.com/api/v3/repos/acme/widgets/tarball/HEAD"
        );
        assert_eq!(
            client.tarball_url(&widgets(), Some("main")),
            "https://ghe.example.com/api/v3/repos/acme/widgets/tarball/main"
        );
    }

    #[test]
    fn test_client_accepts_token() {
        let config = ClientConfig {
            token: Some("ghp_example".to_string()),
            ..ClientConfig::default()
        };
        assert!(GitHubClient::new(config).is_ok());
    }

    #[tokio::test]
    async fn test_missing_release_is_none() {
        let base = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );

        let release = local_client(&base)
            .find_release(&widgets(), None)
            .await
            .unwrap();
        assert!(release.is_none());
    }

    #[tokio::test]
    async fn test_release_is_decoded() {
        let base = serve_once(concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Type: application/json\r\n",
            "Content-Length: 107\r\n",
            "Connection: close\r\n\r\n",
            r#"{"tag_name":"v1.0","assets":[{"name":"core-1.0.jar","browser_download_url":"https://x.test/core-1.0.jar"}]}"#,
        ));

        let release = local_client(&base)
            .find_release(&widgets(), Some("v1.0"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(release.tag_name, "v1.0");
        assert_eq!(release.assets[0].file_name, "core-1.0.jar");
    }

    #[tokio::test]
    async fn test_asset_download_writes_file() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 7\r\nConnection: close\r\n\r\njarjar!",
        );
        let out = tempfile::tempdir().unwrap();

        let path = local_client(&base)
            .download_asset(&jar_asset(&base), out.path())
            .await
            .unwrap();
        assert_eq!(path, out.path().join("core-1.0.jar"));
        assert_eq!(std::fs::read(&path).unwrap(), b"jarjar!");
    }

    #[tokio::test]
    async fn test_asset_server_error_leaves_no_file() {
        let base = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let out = tempfile::tempdir().unwrap();

        let err = local_client(&base)
            .download_asset(&jar_asset(&base), out.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Download { .. }));
        assert!(!out.path().join("core-1.0.jar").exists());
    }

    #[tokio::test]
    async fn test_truncated_asset_is_removed() {
        // Promises 100 bytes, sends 7, then closes
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial",
        );
        let out = tempfile::tempdir().unwrap();

        let err = local_client(&base)
            .download_asset(&jar_asset(&base), out.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Download { .. }));
        assert!(!out.path().join("core-1.0.jar").exists());
    }
}
