//! Fiddle sources and their materialisation on disk
//!
//! A fiddle can come from a local folder, a GitHub gist or a GitHub
//! repository. Whatever the source, it ends up as a directory under the
//! runner's `fiddles` cache, which is what Electron is pointed at.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use url::Url;
use walkdir::WalkDir;
use zip::ZipArchive;

const GIST_API: &str = "https://api.github.com";
const DEFAULT_BRANCH: &str = "main";

/// Directories never copied out of a folder fiddle
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

/// Where a fiddle comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiddleSource {
    Folder(PathBuf),
    Gist(String),
    Repo { url: Url, branch: String },
}

fn is_gist_id(s: &str) -> bool {
    s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// `git@github.com:owner/repo.git` to its https form
fn ssh_to_https(s: &str) -> Option<String> {
    let rest = s.strip_prefix("git@")?;
    let (host, path) = rest.split_once(':')?;
    Some(format!("https://{}/{}", host, path))
}

impl FiddleSource {
    /// Classify user input: an existing path, a gist id or URL, or a repository URL.
    /// A `#branch` suffix on a repository URL selects the branch.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            anyhow::bail!("Fiddle source is empty");
        }

        let path = Path::new(input);
        if path.exists() {
            return Ok(Self::Folder(path.to_path_buf()));
        }

        if is_gist_id(input) {
            return Ok(Self::Gist(input.to_lowercase()));
        }

        let candidate = ssh_to_https(input).unwrap_or_else(|| input.to_string());
        if let Ok(mut url) = Url::parse(&candidate) {
            if url.scheme() == "https" {
                if url.host_str() == Some("gist.github.com") {
                    let id = url
                        .path_segments()
                        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                        .map(|s| s.trim_end_matches(".git").to_string())
                        .filter(|id| is_gist_id(id))
                        .with_context(|| format!("No gist id in {}", input))?;
                    return Ok(Self::Gist(id.to_lowercase()));
                }

                let branch = url
                    .fragment()
                    .filter(|f| !f.is_empty())
                    .unwrap_or(DEFAULT_BRANCH)
                    .to_string();
                url.set_fragment(None);
                return Ok(Self::Repo { url, branch });
            }
        }

        anyhow::bail!(
            "'{}' is not an existing folder, a gist, or an https repository URL",
            input
        )
    }
}

impl fmt::Display for FiddleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiddleSource::Folder(path) => write!(f, "folder {}", path.display()),
            FiddleSource::Gist(id) => write!(f, "gist {}", id),
            FiddleSource::Repo { url, branch } => write!(f, "{} ({})", url, branch),
        }
    }
}

/// A fiddle materialised on disk
#[derive(Debug, Clone)]
pub struct Fiddle {
    pub source: FiddleSource,
    pub dir: PathBuf,
    /// Files relative to `dir`
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    files: BTreeMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains('\\')
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Start from an empty directory
fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clear {}", dir.display()))?;
    }
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

/// Copy a folder fiddle, skipping dependency and VCS directories
fn copy_folder(src: &Path, dest: &Path) -> Result<Vec<String>> {
    reset_dir(dest)?;
    let mut files = Vec::new();

    let walker = WalkDir::new(src).into_iter().filter_entry(|entry| {
        !(entry.file_type().is_dir()
            && entry.depth() > 0
            && SKIPPED_DIRS.iter().any(|d| entry.file_name() == *d))
    });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to read {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .context("Walked outside the fiddle folder")?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }

    files.sort();
    Ok(files)
}

/// Extract a repository archive, dropping the `<repo>-<branch>/` top-level directory
fn extract_archive(bytes: &[u8], dest: &Path) -> Result<Vec<String>> {
    reset_dir(dest)?;
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("Failed to read repository archive")?;
    let mut files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let Some(enclosed) = file.enclosed_name() else {
            continue;
        };
        let relative: PathBuf = enclosed.components().skip(1).collect();
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        std::fs::write(&target, &contents)
            .with_context(|| format!("Failed to write file: {}", target.display()))?;
        files.push(relative.to_string_lossy().replace('\\', "/"));
    }

    files.sort();
    Ok(files)
}

/// A fiddle needs an entry point Electron can start
fn ensure_runnable(dir: &Path) -> Result<()> {
    if dir.join("main.js").is_file() || dir.join("package.json").is_file() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} does not look like a fiddle (no main.js or package.json)",
            dir.display()
        )
    }
}

/// Fiddle factory - resolves sources into directories under the fiddles cache
pub struct FiddleFactory {
    fiddles_dir: PathBuf,
    client: reqwest::Client,
    api_base: String,
}

impl FiddleFactory {
    pub fn new(fiddles_dir: PathBuf, user_agent: &str) -> Self {
        Self {
            fiddles_dir,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_base: GIST_API.to_string(),
        }
    }

    /// Fetch gists from another GitHub API host, such as GitHub Enterprise
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Materialise `source` and check that it can be run
    pub async fn resolve(&self, source: &FiddleSource) -> Result<Fiddle> {
        let (dir, files) = match source {
            FiddleSource::Folder(path) => self.from_folder(path).await?,
            FiddleSource::Gist(id) => self.from_gist(id).await?,
            FiddleSource::Repo { url, branch } => self.from_repo(url, branch).await?,
        };
        ensure_runnable(&dir)?;
        debug!(%source, dir = %dir.display(), ?files, "resolved fiddle");

        Ok(Fiddle {
            source: source.clone(),
            dir,
            files,
        })
    }

    async fn from_folder(&self, path: &Path) -> Result<(PathBuf, Vec<String>)> {
        let src = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        if !src.is_dir() {
            anyhow::bail!("{} is not a directory", src.display());
        }
        let name = src
            .file_name()
            .map(|n| sanitize(&n.to_string_lossy()))
            .unwrap_or_else(|| "root".to_string());
        let dest = self.fiddles_dir.join(format!("folder-{}", name));

        let files = copy_folder(&src, &dest)?;
        Ok((dest, files))
    }

    async fn from_gist(&self, id: &str) -> Result<(PathBuf, Vec<String>)> {
        let url = format!("{}/gists/{}", self.api_base.trim_end_matches('/'), id);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .with_context(|| format!("Failed to fetch gist {}", id))?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch gist {} from {}: HTTP {}", id, url, response.status());
        }
        let gist: GistResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse gist {}", id))?;

        let dest = self.fiddles_dir.join(format!("gist-{}", id));
        reset_dir(&dest)?;

        let mut files = Vec::new();
        for (name, file) in gist.files {
            if !is_plain_file_name(&name) {
                debug!(%name, "skipping gist file with unsafe name");
                continue;
            }
            let content = match (file.content, file.truncated, file.raw_url) {
                (Some(content), false, _) => content,
                (_, _, Some(raw_url)) => self.fetch_text(&raw_url).await?,
                (Some(content), true, None) => content,
                (None, _, None) => continue,
            };
            let target = dest.join(&name);
            std::fs::write(&target, content)
                .with_context(|| format!("Failed to write file: {}", target.display()))?;
            files.push(name);
        }

        Ok((dest, files))
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch {}: HTTP {}", url, response.status());
        }
        Ok(response.text().await?)
    }

    async fn from_repo(&self, url: &Url, branch: &str) -> Result<(PathBuf, Vec<String>)> {
        let (owner, repo) = github_repo(url)?;
        let archive_url = format!(
            "https://codeload.github.com/{}/{}/zip/refs/heads/{}",
            owner, repo, branch
        );

        let response = self
            .client
            .get(&archive_url)
            .send()
            .await
            .with_context(|| format!("Failed to download {}", archive_url))?;
        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to download {}/{} branch '{}': HTTP {}",
                owner,
                repo,
                branch,
                response.status()
            );
        }
        let bytes = response.bytes().await?;

        let dest = self
            .fiddles_dir
            .join(format!("repo-{}-{}-{}", sanitize(&owner), sanitize(&repo), sanitize(branch)));
        let files = extract_archive(&bytes, &dest)?;
        Ok((dest, files))
    }
}

/// Owner and repository name of a github.com URL
fn github_repo(url: &Url) -> Result<(String, String)> {
    if url.host_str() != Some("github.com") {
        anyhow::bail!("Only GitHub repositories can be downloaded, got {}", url);
    }
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    match segments.as_slice() {
        [owner, repo, ..] => Ok((
            owner.to_string(),
            repo.trim_end_matches(".git").to_string(),
        )),
        _ => anyhow::bail!("Repository URL needs an owner and a name: {}", url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const GIST_ID: &str = "8c5fc0c6a5153d49b5a4a56d3ed9da8f";

    #[test]
    fn test_parse_existing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let source = FiddleSource::parse(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(source, FiddleSource::Folder(dir.path().to_path_buf()));
    }

    #[test]
    fn test_parse_gist_id_and_url() {
        assert_eq!(
            FiddleSource::parse(GIST_ID).unwrap(),
            FiddleSource::Gist(GIST_ID.to_string())
        );
        assert_eq!(
            FiddleSource::parse(&format!("https://gist.github.com/octocat/{}", GIST_ID)).unwrap(),
            FiddleSource::Gist(GIST_ID.to_string())
        );
        assert!(FiddleSource::parse("https://gist.github.com/octocat").is_err());
    }

    #[test]
    fn test_parse_repository_urls() {
        let quick_start = "https://github.com/electron/electron-quick-start";
        let source = FiddleSource::parse(quick_start).unwrap();
        assert!(matches!(
            source,
            FiddleSource::Repo { ref url, ref branch }
                if url.as_str() == quick_start && branch == "main"
        ));

        let source = FiddleSource::parse(&format!("{}.git#legacy", quick_start)).unwrap();
        assert!(matches!(source, FiddleSource::Repo { ref branch, .. } if branch == "legacy"));

        let source = FiddleSource::parse("git@github.com:electron/fiddle-sample.git").unwrap();
        assert!(matches!(
            source,
            FiddleSource::Repo { ref url, .. }
                if url.as_str() == "https://github.com/electron/fiddle-sample.git"
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(FiddleSource::parse("").is_err());
        assert!(FiddleSource::parse("definitely/not/here").is_err());
        assert!(FiddleSource::parse("http://github.com/electron/x").is_err());
    }

    #[test]
    fn test_github_repo_parts() {
        let url = Url::parse("https://github.com/electron/fiddle-sample.git").unwrap();
        assert_eq!(
            github_repo(&url).unwrap(),
            ("electron".to_string(), "fiddle-sample".to_string())
        );
        let url = Url::parse("https://gitlab.com/electron/fiddle-sample").unwrap();
        assert!(github_repo(&url).is_err());
    }

    #[tokio::test]
    async fn test_folder_fiddle_is_copied_without_node_modules() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("main.js"), "// main").unwrap();
        std::fs::write(src.path().join("index.html"), "<p>hi</p>").unwrap();
        std::fs::create_dir_all(src.path().join("node_modules/electron")).unwrap();
        std::fs::write(src.path().join("node_modules/electron/index.js"), "").unwrap();
        std::fs::create_dir_all(src.path().join("lib")).unwrap();
        std::fs::write(src.path().join("lib/util.js"), "").unwrap();

        let cache = tempfile::tempdir().unwrap();
        let factory = FiddleFactory::new(cache.path().to_path_buf(), "test");
        let fiddle = factory
            .resolve(&FiddleSource::Folder(src.path().to_path_buf()))
            .await
            .unwrap();

        assert!(fiddle.dir.starts_with(cache.path()));
        assert_eq!(fiddle.files, vec!["index.html", "lib/util.js", "main.js"]);
        assert!(!fiddle.dir.join("node_modules").exists());
    }

    #[tokio::test]
    async fn test_folder_without_entry_point_is_rejected() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("README.md"), "nothing to run").unwrap();

        let cache = tempfile::tempdir().unwrap();
        let factory = FiddleFactory::new(cache.path().to_path_buf(), "test");
        let err = factory
            .resolve(&FiddleSource::Folder(src.path().to_path_buf()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not look like a fiddle"));
    }

    #[test]
    fn test_archive_top_level_directory_is_stripped() {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            zip.add_directory("fiddle-sample-main/", options).unwrap();
            zip.start_file("fiddle-sample-main/main.js", options).unwrap();
            zip.write_all(b"// main").unwrap();
            zip.start_file("fiddle-sample-main/src/preload.js", options).unwrap();
            zip.write_all(b"// preload").unwrap();
            zip.finish().unwrap();
        }

        let dest = tempfile::tempdir().unwrap();
        let target = dest.path().join("repo");
        let files = extract_archive(&buffer, &target).unwrap();

        assert_eq!(files, vec!["main.js", "src/preload.js"]);
        assert_eq!(std::fs::read_to_string(target.join("main.js")).unwrap(), "// main");
    }

    #[test]
    fn test_gist_payload_shape() {
        let payload = r#"{
            "id": "8c5fc0c6a5153d49b5a4a56d3ed9da8f",
            "files": {
                "main.js": {"filename": "main.js", "content": "// main", "truncated": false},
                "index.html": {"filename": "index.html", "raw_url": "https://gist.githubusercontent.com/raw/index.html", "truncated": true}
            }
        }"#;
        let gist: GistResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(gist.files.len(), 2);
        assert_eq!(gist.files["main.js"].content.as_deref(), Some("// main"));
        assert!(gist.files["index.html"].truncated);
    }

    type Route = (String, &'static str, String);

    /// Answer each connection with the canned response for its request path
    fn serve(listener: tokio::net::TcpListener, routes: Vec<Route>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&request);
                let path = head.split_whitespace().nth(1).unwrap_or("").to_string();
                let (status, content_type, body) =
                    match routes.iter().find(|(route, _, _)| *route == path) {
                        Some((_, content_type, body)) => ("200 OK", *content_type, body.clone()),
                        None => ("404 Not Found", "text/plain", String::new()),
                    };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    content_type,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
    }

    #[tokio::test]
    async fn test_gist_fiddle_is_fetched_from_api() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let gist = serde_json::json!({
            "id": GIST_ID,
            "files": {
                "main.js": {"content": "// main", "truncated": false},
                "index.html": {"raw_url": format!("{}/raw/index.html", base), "truncated": true},
                "../evil.js": {"content": "// escaped", "truncated": false}
            }
        });
        serve(
            listener,
            vec![
                (format!("/gists/{}", GIST_ID), "application/json", gist.to_string()),
                ("/raw/index.html".to_string(), "text/html", "<p>hi</p>".to_string()),
            ],
        );

        let cache = tempfile::tempdir().unwrap();
        let factory = FiddleFactory::new(cache.path().to_path_buf(), "test").with_api_base(&base);
        let fiddle = factory
            .resolve(&FiddleSource::Gist(GIST_ID.to_string()))
            .await
            .unwrap();

        assert_eq!(fiddle.dir, cache.path().join(format!("gist-{}", GIST_ID)));
        assert_eq!(fiddle.files, vec!["index.html", "main.js"]);
        assert_eq!(std::fs::read_to_string(fiddle.dir.join("main.js")).unwrap(), "// main");
        assert_eq!(
            std::fs::read_to_string(fiddle.dir.join("index.html")).unwrap(),
            "<p>hi</p>"
        );
        assert!(!cache.path().join("evil.js").exists());
    }

    #[tokio::test]
    async fn test_missing_gist_reports_status() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        serve(listener, Vec::new());

        let cache = tempfile::tempdir().unwrap();
        let factory = FiddleFactory::new(cache.path().to_path_buf(), "test").with_api_base(base);
        let err = factory
            .resolve(&FiddleSource::Gist(GIST_ID.to_string()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"), "{}", err);
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("main.js"));
        assert!(!is_plain_file_name("../main.js"));
        assert!(!is_plain_file_name("dir/main.js"));
        assert!(!is_plain_file_name(".."));
    }
}
