//! Report rendering for non-spatial outputs.

use crate::result::Statistic;

/// A non-spatial output handed to a [`ReportRenderer`].
#[derive(Debug, Clone, Copy)]
pub enum ReportValue<'a> {
    Scalar(f64),
    Statistic(&'a Statistic),
    Text(&'a str),
}

/// Renders one output as a report fragment.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, title: &str, value: &ReportValue<'_>) -> String;
}

/// Format a number with at most six decimals, trailing zeros trimmed.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML fragments: the process title as a heading, then the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReportRenderer;

impl ReportRenderer for HtmlReportRenderer {
    fn render(&self, title: &str, value: &ReportValue<'_>) -> String {
        let mut html = format!("<h1>{}</h1>\n", escape_html(title));
        match value {
            ReportValue::Scalar(v) => {
                html.push_str(&format!("<h2>{}</h2>\n", format_number(*v)));
            }
            ReportValue::Statistic(stat) => {
                html.push_str(&format!("<h2>{}</h2>\n<table>\n", escape_html(&stat.title)));
                for (label, cell) in &stat.rows {
                    html.push_str(&format!(
                        "<tr><td>{}</td><td>{}</td></tr>\n",
                        escape_html(label),
                        escape_html(&cell.to_string())
                    ));
                }
                html.push_str("</table>\n");
            }
            ReportValue::Text(text) => {
                html.push_str(&format!("<pre>{}</pre>\n", escape_html(text)));
            }
        }
        html
    }
}

/// Plain text fragments for terminals.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportRenderer;

impl ReportRenderer for TextReportRenderer {
    fn render(&self, title: &str, value: &ReportValue<'_>) -> String {
        let mut text = format!("{}\n", title);
        match value {
            ReportValue::Scalar(v) => text.push_str(&format!("  {}\n", format_number(*v))),
            ReportValue::Statistic(stat) => {
                text.push_str(&format!("  {}\n", stat.title));
                let width = stat.rows.keys().map(|k| k.len()).max().unwrap_or(0);
                for (label, cell) in &stat.rows {
                    text.push_str(&format!("  {:<width$}  {}\n", label, cell, width = width));
                }
            }
            ReportValue::Text(s) => {
                for line in s.lines() {
                    text.push_str(&format!("  {}\n", line));
                }
            }
        }
        text
    }
}
