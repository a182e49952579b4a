use anyhow::{bail, Context, Result};
use indexq_core::Config;
use indexq_daemon::{Client, Method};

use crate::output;
use crate::OutputFormat;

/// Send one request to the running service and print the response
pub async fn run(config: &Config, method: Method, params: &[(&str, &str)], format: OutputFormat) -> Result<()> {
    let addr = config.listen_addr();
    let mut client = Client::connect(&addr)
        .await
        .with_context(|| format!("Failed to reach indexq at {} (is `indexq serve` running?)", addr))?;

    let response = client
        .call(method, params)
        .await
        .with_context(|| format!("{} request failed", method.as_str()))?;

    print!("{}", output::render(&response, format));

    if let Some(error) = response.error_message() {
        bail!("{}", error);
    }
    Ok(())
}

/// Names outside `known`; the service ignores these
fn unknown_names<'a>(names: &'a [String], known: &[&str]) -> Vec<&'a str> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty() && !known.contains(name))
        .collect()
}

/// Warn about role or option names the service will ignore
pub fn warn_unknown(kind: &str, names: &[String], known: &[&str]) {
    for name in unknown_names(names, known) {
        tracing::warn!("Unknown {} '{}' will be ignored (expected one of: {})", kind, name, known.join(", "));
    }
}

/// `symbol_occurrences` with the line checked up front
pub async fn symbols(config: &Config, file: &str, line: i64, format: OutputFormat) -> Result<()> {
    if line < 1 {
        bail!("lineNumber must be a positive integer");
    }

    let line = line.to_string();
    run(
        config,
        Method::SymbolOccurrences,
        &[("filePath", file), ("lineNumber", line.as_str())],
        format,
    )
    .await
}
