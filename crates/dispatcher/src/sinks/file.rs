//! FileSink - appends one record per message to a dated file

use chrono::{DateTime, SecondsFormat, Utc};
use contracts::{ContractError, InboundProtocol, OutputSink, Route, DATE_PLACEHOLDER};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

/// Timestamp substituted for `${DATE}` in file patterns
pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S%.3f";

/// Route details written into every record
#[derive(Debug, Clone)]
pub struct RecordContext {
    pub route_name: String,
    pub port: u16,
    pub protocol: InboundProtocol,
}

impl RecordContext {
    pub fn from_route(route: &Route) -> Self {
        Self {
            route_name: route.name.clone(),
            port: route.port,
            protocol: route.protocol,
        }
    }
}

/// Sink that appends records to files on disk
pub struct FileSink {
    name: String,
    pattern: String,
    context: RecordContext,
    // Serialises appends from concurrent workers of the same route
    append_lock: Mutex<()>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, context: RecordContext) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            context,
            append_lock: Mutex::new(()),
        }
    }

    /// Destination for a record written at `now`
    ///
    /// Only the first `${DATE}` is substituted.
    pub fn resolve_path(&self, now: DateTime<Utc>) -> PathBuf {
        let stamp = now.format(FILE_DATE_FORMAT).to_string();
        PathBuf::from(self.pattern.replacen(DATE_PLACEHOLDER, &stamp, 1))
    }

    /// One record line: timestamp, route, port, protocol, quoted payload
    pub fn format_record(&self, now: DateTime<Utc>, payload: &[u8]) -> String {
        let text = String::from_utf8_lossy(payload);
        let quoted = serde_json::Value::String(text.into_owned()).to_string();
        format!(
            "{} route={} port={} protocol={} payload={}\n",
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.context.route_name,
            self.context.port,
            self.context.protocol,
            quoted
        )
    }

    async fn append_record(&self, path: &Path, record: &str) -> std::io::Result<()> {
        let _guard = self.append_lock.lock().await;
        let mut file = open_append(path).await?;
        file.write_all(record.as_bytes()).await?;
        file.flush().await
    }
}

/// Open `path` for appending, creating the file and its directory if needed
pub async fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    OpenOptions::new().create(true).append(true).open(path).await
}

impl OutputSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_deliver",
        skip(self, payload),
        fields(sink = %self.name, bytes = payload.len())
    )]
    async fn deliver(&self, payload: &[u8]) -> Result<(), ContractError> {
        let now = Utc::now();
        let path = self.resolve_path(now);
        let record = self.format_record(now, payload);

        self.append_record(&path, &record).await.map_err(|e| {
            error!(sink = %self.name, path = %path.display(), error = %e, "Append failed");
            ContractError::sink_write(&self.name, e.to_string())
        })?;

        debug!(sink = %self.name, path = %path.display(), "Appended");
        Ok(())
    }
}
