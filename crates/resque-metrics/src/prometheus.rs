//! Prometheus text exposition format.
//!
//! Renders scrape samples into the text format (version 0.0.4) for
//! scraping by a Prometheus server or compatible agent.

use std::fmt::Write;

use crate::sample::Sample;

/// Content type of the rendered body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render samples into Prometheus text format.
///
/// Samples of the same family are grouped under one `# HELP` / `# TYPE`
/// header; families appear in the order their first sample was emitted.
pub fn render_prometheus(samples: &[Sample]) -> String {
    let mut families: Vec<(&'static str, Vec<&Sample>)> = Vec::new();
    for s in samples {
        match families.iter_mut().find(|(name, _)| *name == s.name()) {
            Some((_, members)) => members.push(s),
            None => families.push((s.name(), vec![s])),
        }
    }

    let mut out = String::new();
    for (_, members) in families {
        let desc = members[0].desc;
        let fq_name = desc.fq_name();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "# HELP {fq_name} {}", escape_help(desc.help));
        let _ = writeln!(out, "# TYPE {fq_name} {}", desc.kind.as_str());
        for s in members {
            out.push_str(&fq_name);
            if !s.labels.is_empty() {
                out.push('{');
                for (i, (name, value)) in s.labels.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{name}=\"{}\"", escape_label_value(value));
                }
                out.push('}');
            }
            out.push(' ');
            out.push_str(&format_value(s.value));
            out.push('\n');
        }
    }

    out
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
