use crate::status::{StatusRecord, StatusView};

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Autoscan</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
"#;

const TAIL: &str = "</body>\n</html>\n";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn status_div(record: &StatusRecord) -> String {
    let view = StatusView::render(record);
    format!(
        "<div id=\"status-div\" class=\"{}\">{}</div>\n",
        view.class_list(),
        escape(&view.text)
    )
}

pub fn root(record: &StatusRecord) -> String {
    let disabled = if record.is_idle() { "" } else { " disabled=\"disabled\"" };
    format!(
        "{HEAD}<h1>Autoscan</h1>
<form method=\"post\" action=\"/scan\">
<button type=\"submit\" class=\"scan-button\" name=\"single\" value=\"1\"{disabled}>Single sided</button>
<button type=\"submit\" class=\"scan-button\" name=\"double\" value=\"1\"{disabled}>Double sided</button>
</form>
{}<script src=\"/static/root.js\"></script>
<script src=\"/static/status.js\"></script>
{TAIL}",
        status_div(record)
    )
}

pub fn status(record: &StatusRecord) -> String {
    let last_fail = record
        .last_failure()
        .map(escape)
        .unwrap_or_else(|| "none".to_string());
    format!(
        "{HEAD}<h1>Scan status</h1>
<dl>
<dt>State</dt><dd>{}</dd>
<dt>Last failure</dt><dd>{last_fail}</dd>
</dl>
{}<p><a href=\"/\">Back</a></p>
<script src=\"/static/status.js\"></script>
{TAIL}",
        escape(&record.state),
        status_div(record)
    )
}

pub fn scan_error(message: &str) -> String {
    format!(
        "{HEAD}<h1>Scan not started</h1>
<p class=\"msg fail\">{}</p>
<p><a href=\"/\">Back</a></p>
{TAIL}",
        escape(message)
    )
}
