//! CSV dataset loading from local files or remote URLs.

use crate::error::DashError;
use crate::models::{Dataset, ReadWarning, Row, Variant};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for reading a CSV document.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Timeout for remote downloads.
    pub timeout_seconds: u64,
    /// Whether to show a spinner while loading.
    pub show_progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            timeout_seconds: 30,
            show_progress: false,
        }
    }
}

impl From<&crate::config::SourceConfig> for LoadOptions {
    fn from(config: &crate::config::SourceConfig) -> Self {
        Self {
            delimiter: u8::try_from(config.delimiter).unwrap_or(b','),
            timeout_seconds: config.timeout_seconds,
            show_progress: false,
        }
    }
}

/// A loaded dataset plus the records the reader had to skip.
#[derive(Debug)]
pub struct LoadOutput {
    pub dataset: Dataset,
    pub warnings: Vec<ReadWarning>,
}

/// Returns true if `source` should be fetched over HTTP.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load a dataset from a path or an `http(s)://` URL.
pub async fn load_source(source: &str, options: &LoadOptions) -> Result<LoadOutput, DashError> {
    let spinner = start_spinner(options, source);

    let result = if is_remote(source) {
        load_url(source, options).await
    } else {
        load_path(Path::new(source), options)
    };

    if let Some(pb) = spinner {
        match &result {
            Ok(output) => pb.finish_with_message(format!("Loaded {} rows", output.dataset.len())),
            Err(_) => pb.abandon_with_message("Load failed"),
        }
    }

    result
}

/// Load a dataset from a local CSV file.
pub fn load_path(path: &Path, options: &LoadOptions) -> Result<LoadOutput, DashError> {
    info!("Reading CSV file: {}", path.display());
    let file = std::fs::File::open(path)?;
    parse_reader(
        std::io::BufReader::new(file),
        &path.display().to_string(),
        options,
    )
}

/// Fetch a CSV document over HTTP and parse it.
pub async fn load_url(url: &str, options: &LoadOptions) -> Result<LoadOutput, DashError> {
    info!("Fetching CSV from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(options.timeout_seconds))
        .build()?;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DashError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    debug!("Downloaded {} bytes", body.len());
    parse_reader(body.as_bytes(), url, options)
}

/// Core parsing logic. Accepts any `Read` source, useful for tests.
pub fn parse_reader<R: Read>(
    reader: R,
    source: &str,
    options: &LoadOptions,
) -> Result<LoadOutput, DashError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(DashError::EmptyFile);
    }

    let mut rows = Vec::new();
    let mut warnings = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        match result {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(idx + 2);

                // Fields beyond the header width are ignored; missing trailing
                // fields are simply absent from the row.
                let row = Row::from_pairs(
                    line,
                    headers
                        .iter()
                        .zip(record.iter())
                        .map(|(h, v)| (h.as_str(), v)),
                );
                rows.push(row);
            }
            Err(err) => {
                let line = err
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(idx + 2);
                warn!("Skipping unreadable record on line {}: {}", line, err);
                warnings.push(ReadWarning {
                    line,
                    message: err.to_string(),
                });
            }
        }
    }

    info!(
        "Parsed {} rows ({} skipped) from {}",
        rows.len(),
        warnings.len(),
        source
    );

    Ok(LoadOutput {
        dataset: Dataset::new(source, headers, rows),
        warnings,
    })
}

/// Check that every column the variant needs is present.
pub fn validate_columns(dataset: &Dataset, variant: Variant) -> Result<(), DashError> {
    let missing: Vec<String> = variant
        .required_columns()
        .iter()
        .filter(|c| !dataset.has_column(c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashError::MissingColumns(missing))
    }
}

fn start_spinner(options: &LoadOptions, source: &str) -> Option<ProgressBar> {
    if !options.show_progress {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Loading {}", source));
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const AGENT_CSV: &str = "\
AgentID,TeamID,CallDate,CallSentiment,RudeBehaviour
A1,T1,2024-06-01,0.8,false
A2,T1,2024-06-02,0.6,true
";

    /// Serve a single HTTP response on a local port and return its URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/kpi.csv", addr)
    }

    #[test]
    fn test_parse_reader_basic() {
        let output = parse_reader(AGENT_CSV.as_bytes(), "inline", &LoadOptions::default()).unwrap();

        assert_eq!(output.dataset.len(), 2);
        assert_eq!(output.dataset.headers[0], "AgentID");
        assert!(output.warnings.is_empty());

        let first = &output.dataset.rows[0];
        assert_eq!(first.line, 2);
        assert_eq!(first.get("TeamID"), Some("T1"));
        assert_eq!(first.get("CallSentiment"), Some("0.8"));
        assert_eq!(output.dataset.rows[1].line, 3);
    }

    #[test]
    fn test_parse_reader_short_and_long_rows() {
        let csv = "Year,Calls_Handled,Average_Handling_Time\n2023,10\n2024,15,6.0,extra\n";
        let output = parse_reader(csv.as_bytes(), "inline", &LoadOptions::default()).unwrap();

        assert_eq!(output.dataset.len(), 2);
        assert_eq!(output.dataset.rows[0].get("Average_Handling_Time"), None);
        assert_eq!(output.dataset.rows[1].get("Average_Handling_Time"), Some("6.0"));
        assert_eq!(output.dataset.rows[1].fields.len(), 3);
    }

    #[test]
    fn test_parse_reader_trims_headers_and_skips_blank_lines() {
        let csv = " Year , Calls_Handled \n2023,10\n\n2024,20\n";
        let output = parse_reader(csv.as_bytes(), "inline", &LoadOptions::default()).unwrap();

        assert!(output.dataset.has_column("Year"));
        assert!(output.dataset.has_column("Calls_Handled"));
        assert_eq!(output.dataset.len(), 2);
    }

    #[test]
    fn test_parse_reader_custom_delimiter() {
        let csv = "Year;Calls_Handled\n2023;10\n";
        let options = LoadOptions {
            delimiter: b';',
            ..LoadOptions::default()
        };
        let output = parse_reader(csv.as_bytes(), "inline", &options).unwrap();
        assert_eq!(output.dataset.rows[0].get("Calls_Handled"), Some("10"));
    }

    #[test]
    fn test_parse_reader_skips_malformed_record() {
        let csv: &[u8] = b"AgentID,TeamID\nA1,T1\nA\xff2,T1\nA3,T2\n";
        let output = parse_reader(csv, "inline", &LoadOptions::default()).unwrap();

        assert_eq!(output.dataset.len(), 2);
        assert_eq!(output.dataset.rows[0].get("AgentID"), Some("A1"));
        assert_eq!(output.dataset.rows[1].get("AgentID"), Some("A3"));
        assert_eq!(output.dataset.rows[1].line, 4);

        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].line, 3);
    }

    #[test]
    fn test_parse_reader_empty_input() {
        let result = parse_reader("".as_bytes(), "inline", &LoadOptions::default());
        assert!(matches!(result, Err(DashError::EmptyFile)));
    }

    #[test]
    fn test_load_path_from_tempfile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(AGENT_CSV.as_bytes()).unwrap();

        let output = load_path(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(output.dataset.len(), 2);
        assert_eq!(output.dataset.source, file.path().display().to_string());
    }

    #[test]
    fn test_load_path_missing_file() {
        let result = load_path(Path::new("/definitely/not/here.csv"), &LoadOptions::default());
        assert!(matches!(result, Err(DashError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_source_dispatches_to_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(AGENT_CSV.as_bytes()).unwrap();

        let source = file.path().display().to_string();
        let output = load_source(&source, &LoadOptions::default()).await.unwrap();
        assert_eq!(output.dataset.len(), 2);
    }

    #[tokio::test]
    async fn test_load_url() {
        let url = serve_once("200 OK", AGENT_CSV).await;
        assert!(is_remote(&url));

        let output = load_source(&url, &LoadOptions::default()).await.unwrap();
        assert_eq!(output.dataset.len(), 2);
        assert_eq!(output.dataset.source, url);
        assert_eq!(output.dataset.rows[1].get("AgentID"), Some("A2"));
    }

    #[tokio::test]
    async fn test_load_url_error_status() {
        let url = serve_once("404 Not Found", "missing").await;

        match load_url(&url, &LoadOptions::default()).await {
            Err(DashError::HttpStatus { url: failed, status }) => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_load_fixtures() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");

        let yearly = load_path(&dir.join("yearly_kpi.csv"), &LoadOptions::default()).unwrap();
        assert_eq!(yearly.dataset.len(), 10);
        assert_eq!(yearly.dataset.detect_variant(), Some(Variant::Yearly));
        assert!(validate_columns(&yearly.dataset, Variant::Yearly).is_ok());

        let agent = load_path(&dir.join("agent_calls_kpi.csv"), &LoadOptions::default()).unwrap();
        assert_eq!(agent.dataset.len(), 40);
        assert_eq!(agent.dataset.detect_variant(), Some(Variant::Agent));
        assert!(agent.warnings.is_empty());
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/kpi.csv"));
        assert!(is_remote("http://localhost/kpi.csv"));
        assert!(!is_remote("fixtures/agent_calls_kpi.csv"));
    }

    #[test]
    fn test_validate_columns() {
        let output = parse_reader(AGENT_CSV.as_bytes(), "inline", &LoadOptions::default()).unwrap();
        assert!(validate_columns(&output.dataset, Variant::Agent).is_ok());

        match validate_columns(&output.dataset, Variant::Yearly) {
            Err(DashError::MissingColumns(missing)) => {
                assert_eq!(
                    missing,
                    vec!["Year", "Calls_Handled", "Average_Handling_Time"]
                );
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }
}
