//! Content Store Fetcher
//! Downloads raw site files once and keeps them in a local cache directory.

use super::loader::LoaderError;
use reqwest::blocking::Response;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What [`ensure_cached`] did to make the file available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file was already present; no request was made.
    Cached,
    /// The file was downloaded and stored.
    Downloaded { bytes: u64 },
}

/// Expand a URL template, substituting `{id}` with the file id.
pub fn source_url(template: &str, file_id: &str) -> String {
    template.replace("{id}", file_id)
}

/// Make sure `dest` exists locally, downloading it from `url` if it does not.
///
/// This is a plain existence check: a present file is never refreshed. The
/// body is streamed into `<dest>.part` and renamed into place once complete.
pub fn ensure_cached(
    url: &str,
    dest: &Path,
    timeout: Duration,
) -> Result<FetchOutcome, LoaderError> {
    if dest.exists() {
        log::debug!("Using cached file {}", dest.display());
        return Ok(FetchOutcome::Cached);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| unavailable(url, format!("cannot create cache dir: {e}")))?;
    }

    log::info!("Downloading {} -> {}", url, dest.display());

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| unavailable(url, e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| unavailable(url, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(url, format!("HTTP {status}")));
    }

    // An HTML body means the store served an interstitial page instead of the file.
    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if is_html {
        return Err(unavailable(url, "content store returned an HTML page".to_string()));
    }

    let partial = partial_path(dest);
    let discard = |reason: String| {
        let _ = fs::remove_file(&partial);
        unavailable(url, reason)
    };

    let bytes = stream_to(&mut response, &partial).map_err(discard)?;
    fs::rename(&partial, dest).map_err(|e| discard(e.to_string()))?;

    Ok(FetchOutcome::Downloaded { bytes })
}

fn stream_to(response: &mut Response, path: &Path) -> Result<u64, String> {
    let mut file = File::create(path).map_err(|e| e.to_string())?;
    let bytes = response.copy_to(&mut file).map_err(|e| e.to_string())?;
    file.sync_all().map_err(|e| e.to_string())?;
    Ok(bytes)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

fn unavailable(url: &str, reason: String) -> LoaderError {
    LoaderError::DataUnavailable {
        location: url.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answer a single request with `body`, then close. Returns the URL.
    fn serve_once(content_type: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        );

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 4096];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(reply.as_bytes());
                let _ = stream.flush();
            }
        });

        format!("http://{addr}/uc?id=site")
    }

    #[test]
    fn expands_file_id() {
        assert_eq!(
            source_url("https://example.org/uc?id={id}", "abc"),
            "https://example.org/uc?id=abc"
        );
    }

    #[test]
    fn existing_file_is_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("benin-malanville.csv");
        fs::write(&dest, "Timestamp\n").unwrap();

        // The URL is unreachable; a cache hit must not touch it.
        let outcome =
            ensure_cached("http://127.0.0.1:9/never", &dest, Duration::from_millis(200)).unwrap();
        assert_eq!(outcome, FetchOutcome::Cached);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "Timestamp\n");
    }

    #[test]
    fn downloads_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache").join("togo.csv");
        let body = "Timestamp,GHI\n2021-08-09 00:01,-1.2\n";
        let url = serve_once("text/csv", body);

        let outcome = ensure_cached(&url, &dest, Duration::from_secs(5)).unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Downloaded {
                bytes: body.len() as u64
            }
        );
        assert_eq!(fs::read_to_string(&dest).unwrap(), body);
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn html_page_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("benin.csv");
        let url = serve_once("text/html; charset=utf-8", "<html>Virus scan warning</html>");

        let err = ensure_cached(&url, &dest, Duration::from_secs(5)).unwrap_err();

        assert!(matches!(err, LoaderError::DataUnavailable { .. }));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn failed_download_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache").join("togo.csv");

        let err =
            ensure_cached("http://127.0.0.1:9/togo", &dest, Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, LoaderError::DataUnavailable { .. }));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn partial_path_appends_suffix() {
        let p = partial_path(Path::new("/tmp/x/togo.csv"));
        assert_eq!(p, PathBuf::from("/tmp/x/togo.csv.part"));
    }
}
