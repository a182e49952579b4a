use indexq_daemon::{Response, ResultVariant};

use crate::OutputFormat;

/// Render a response for the terminal
pub fn render(response: &Response, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string());
            json.push('\n');
            json
        }
        OutputFormat::Text => render_text(&response.result),
    }
}

fn render_text(result: &ResultVariant) -> String {
    let mut output = String::new();

    match result {
        ResultVariant::Status(status) => {
            if status.available {
                output.push_str("Index available\n");
            } else {
                output.push_str("Index unavailable\n");
            }
        }
        ResultVariant::Symbols(symbols) => {
            output.push_str(&format!("# {} symbols at {}\n\n", symbols.symbols.len(), symbols.location));
            for symbol in &symbols.symbols {
                output.push_str(&format!("{} ({})\n  {}\n", symbol.name, symbol.kind, symbol.usr));
            }
        }
        ResultVariant::Occurrences(list) => {
            output.push_str(&format!(
                "# {} occurrences of {} [{}]\n\n",
                list.occurrences.len(),
                list.usr,
                list.roles.join(",")
            ));
            for occurrence in &list.occurrences {
                output.push_str(&format!("{}  {}  {}\n", occurrence.location, occurrence.role, occurrence.name));
            }
        }
        ResultVariant::PatternSearch(search) => {
            output.push_str(&format!("# {} matches for '{}'\n\n", search.occurrences.len(), search.pattern));
            for occurrence in &search.occurrences {
                output.push_str(&format!("{}  {}\n  {}\n", occurrence.location, occurrence.name, occurrence.usr));
            }
        }
    }

    output
}
