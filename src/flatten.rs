use crate::exception::{ExceptionInfo, EXCLUDED_FIELDS, MAX_CHAIN_DEPTH};
use serde_json::Value;
use std::fmt::Write;

/// Marker line that introduces a nested exception.
pub const INNER_MARKER: &str = "InnerException: ";

/// Indent added per level of nesting.
pub const INDENT_STEP: &str = "\t";

/// Render an exception chain as a deterministic multi-line trace.
///
/// Every line starts with a line break followed by `indent`. Per level the
/// order is: type, message, auxiliary fields (in the order the exception
/// declares them, minus [`EXCLUDED_FIELDS`]), source, stack trace,
/// non-null data entries, then the inner exception one tab deeper behind
/// an `InnerException:` marker.
///
/// ```
/// use lumberjack::exception::LoggedError;
/// use lumberjack::flatten::flatten;
///
/// let err = LoggedError::new("TimeoutError", "took too long");
/// let trace = flatten(&err, "");
/// assert!(trace.starts_with("\nException:TimeoutError\nMessage:took too long"));
/// ```
pub fn flatten(exception: &dyn ExceptionInfo, indent: &str) -> String {
    let mut out = String::new();
    flatten_into(&mut out, exception, indent, 0);
    out
}

fn flatten_into(out: &mut String, exception: &dyn ExceptionInfo, indent: &str, depth: usize) {
    // Writing into a String cannot fail.
    let _ = write!(out, "\n{}Exception:{}", indent, exception.type_name());
    let _ = write!(out, "\n{}Message:{}", indent, exception.message());

    for (name, value) in exception.extra_fields() {
        if EXCLUDED_FIELDS.contains(&name.as_str()) {
            continue;
        }
        let _ = write!(out, "\n{}{} : {}", indent, name, value.render());
    }

    let _ = write!(out, "\n{}Source:{}", indent, exception.source().unwrap_or_default());
    let _ = write!(out, "\n{}StackTrace:{}", indent, exception.stack_trace().unwrap_or_default());

    for (key, value) in exception.data() {
        if value.is_null() {
            continue;
        }
        let _ = write!(out, "\n{}DATA-{}:{}", indent, key, render_value(value));
    }

    if let Some(inner) = exception.inner() {
        if depth >= MAX_CHAIN_DEPTH {
            tracing::warn!(max_depth = MAX_CHAIN_DEPTH, "exception chain truncated while flattening");
            let _ = write!(
                out,
                "\n{}{}[chain truncated after {} levels]",
                indent, INNER_MARKER, MAX_CHAIN_DEPTH
            );
            return;
        }
        let _ = write!(out, "\n{}{}", indent, INNER_MARKER);
        let deeper = format!("{}{}", indent, INDENT_STEP);
        flatten_into(out, inner, &deeper, depth + 1);
    }
}

/// Strings render bare; other JSON values use their compact JSON text.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::{FieldValue, LoggedError};

    #[test]
    fn golden_output_for_two_level_chain() {
        let err = LoggedError::new("SqlException", "wrapper")
            .with_field("Number", "1205")
            .with_field("Errors", vec!["first".to_string(), "second".to_string()])
            .with_field("Server", FieldValue::Unavailable)
            .with_source("Orders.Db")
            .with_stack_trace("at Orders.Insert()")
            .with_data("Procedure", "Orders.Insert")
            .with_data("Missing", Value::Null)
            .with_data("Attempt", 3)
            .with_inner(LoggedError::new("IoError", "connection reset"));

        let expected = "\nException:SqlException\
\nMessage:wrapper\
\nNumber : 1205\
\nErrors : first|second\
\nServer : \
\nSource:Orders.Db\
\nStackTrace:at Orders.Insert()\
\nDATA-Procedure:Orders.Insert\
\nDATA-Attempt:3\
\nInnerException: \
\n\tException:IoError\
\n\tMessage:connection reset\
\n\tSource:\
\n\tStackTrace:";

        assert_eq!(flatten(&err, ""), expected);
    }

    #[test]
    fn marker_count_and_indent_track_depth() {
        for depth in 0..6 {
            let err = (0..depth).fold(LoggedError::new("Leaf", "leaf"), |inner, i| {
                LoggedError::new(format!("E{}", i), "wrap").with_inner(inner)
            });
            let trace = flatten(&err, "");
            assert_eq!(trace.matches(INNER_MARKER).count(), depth);

            let indents: Vec<usize> = trace
                .lines()
                .filter_map(|line| line.trim_start_matches('\t').strip_prefix("Exception:").map(|_| line))
                .map(|line| line.chars().take_while(|c| *c == '\t').count())
                .collect();
            assert_eq!(indents, (0..=depth).collect::<Vec<_>>());
        }
    }

    #[test]
    fn excluded_field_names_are_not_printed() {
        let err = LoggedError::new("E", "m")
            .with_field("HelpLink", "http://help")
            .with_field("TargetSite", "Void Run()")
            .with_field("Message", "again")
            .with_field("StackTrace", "dup")
            .with_field("Number", "7");

        assert_eq!(
            flatten(&err, ""),
            "\nException:E\nMessage:m\nNumber : 7\nSource:\nStackTrace:"
        );
    }

    #[test]
    fn caller_indent_prefixes_every_line() {
        let trace = flatten(&LoggedError::new("E", "m"), ">>");
        assert!(trace.lines().skip(1).all(|line| line.starts_with(">>")));
    }

    #[test]
    fn overly_deep_chain_is_truncated() {
        let err = (0..MAX_CHAIN_DEPTH + 5).fold(LoggedError::new("Leaf", "leaf"), |inner, _| {
            LoggedError::new("Wrap", "wrap").with_inner(inner)
        });
        let trace = flatten(&err, "");
        assert_eq!(trace.matches(INNER_MARKER).count(), MAX_CHAIN_DEPTH + 1);
        assert!(trace.contains("[chain truncated after 32 levels]"));
        assert!(!trace.contains("Exception:Leaf"));
    }
}
