//! Process Trail: an ordered, replayable log of processing steps.
//!
//! Each step names a message template (provided by configuration), fills
//! it with named arguments and records whether the step failed. Lines are
//! never reordered or filtered.

use hashbrown::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Outcome of a processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::Error => write!(f, "ERROR"),
        }
    }
}

/// One expanded trail line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLine {
    pub message: String,
    pub status: Status,
}

/// Named arguments for a message template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateArgs {
    pairs: Vec<(String, String)>,
}

impl TemplateArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named argument.
    pub fn arg(mut self, name: &str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((name.to_string(), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Expand `{name}` placeholders from `args`.
///
/// `{{` and `}}` produce literal braces. Placeholders without a matching
/// argument are kept verbatim so a misconfigured template still shows
/// what it expected.
pub fn expand_template(template: &str, args: &TemplateArgs) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '{' => match template[i + 1..].find('}') {
                Some(len) => {
                    let key = &template[i + 1..i + 1 + len];
                    match args.get(key) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&template[i..i + len + 2]),
                    }
                    // skip the key and the closing brace
                    for _ in 0..key.chars().count() + 1 {
                        chars.next();
                    }
                }
                None => out.push('{'),
            },
            _ => out.push(ch),
        }
    }

    out
}

/// Ordered log of processing steps for one feature type.
#[derive(Debug, Clone, Default)]
pub struct ProcessTrail {
    templates: Arc<HashMap<String, String>>,
    lines: Vec<ProcessLine>,
}

impl ProcessTrail {
    pub fn new(templates: Arc<HashMap<String, String>>) -> Self {
        Self { templates, lines: Vec::new() }
    }

    /// Template registered under `name`, or the not-found placeholder.
    pub fn template(&self, name: &str) -> String {
        match self.templates.get(name) {
            Some(t) => t.clone(),
            None => format!("Message for [{name}] not found!"),
        }
    }

    /// Expand the named template and append it with OK/ERROR status.
    pub fn log_step(&mut self, template_name: &str, failed: bool, args: &TemplateArgs) -> &ProcessLine {
        let message = expand_template(&self.template(template_name), args);
        let status = if failed { Status::Error } else { Status::Ok };
        tracing::debug!(step = template_name, %status, "{message}");

        self.lines.push(ProcessLine { message, status });
        &self.lines[self.lines.len() - 1]
    }

    pub fn lines(&self) -> &[ProcessLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True if any recorded step failed.
    pub fn has_failures(&self) -> bool {
        self.lines.iter().any(|l| l.status == Status::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates(pairs: &[(&str, &str)]) -> Arc<HashMap<String, String>> {
        Arc::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn expands_named_args() {
        let args = TemplateArgs::new().arg("map_name", "rivers").arg("count", 3);
        assert_eq!(
            expand_template("Map [{map_name}] has {count} cells", &args),
            "Map [rivers] has 3 cells"
        );
    }

    #[test]
    fn unknown_placeholder_is_kept() {
        let args = TemplateArgs::new();
        assert_eq!(expand_template("Check [{map_name}]", &args), "Check [{map_name}]");
    }

    #[test]
    fn escaped_braces() {
        let args = TemplateArgs::new().arg("x", 1);
        assert_eq!(expand_template("{{x}} = {x}", &args), "{x} = 1");
        assert_eq!(expand_template("open { only", &args), "open { only");
    }

    #[test]
    fn non_ascii_templates() {
        let args = TemplateArgs::new().arg("name", "Río");
        assert_eq!(expand_template("Cuenca ñ [{name}] ok", &args), "Cuenca ñ [Río] ok");
    }

    #[test]
    fn arg_replaces_existing_value() {
        let args = TemplateArgs::new().arg("a", 1).arg("a", 2);
        assert_eq!(args.get("a"), Some("2"));
    }

    #[test]
    fn log_step_appends_in_call_order() {
        let mut trail = ProcessTrail::new(templates(&[("import", "Import [{map}]")]));
        trail.log_step("import", false, &TemplateArgs::new().arg("map", "a"));
        trail.log_step("import", true, &TemplateArgs::new().arg("map", "b"));
        trail.log_step("missing_step", false, &TemplateArgs::new());

        let lines = trail.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], ProcessLine { message: "Import [a]".into(), status: Status::Ok });
        assert_eq!(lines[1].status, Status::Error);
        assert_eq!(lines[2].message, "Message for [missing_step] not found!");
        assert!(trail.has_failures());
    }
}
