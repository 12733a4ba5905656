//! Human-readable output formatting

use crate::outline::{ClassOutline, FileOutline, FunctionOutline, NamespaceOutline, ValueOutline};
use crate::token::{Token, TokenList};

/// Format outlines for human consumption
pub fn format_outlines(outlines: &[FileOutline]) -> String {
    let mut output = String::new();

    if outlines.is_empty() {
        output.push_str("No PHP files found\n");
        return output;
    }

    for (i, file) in outlines.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        if let Some(path) = &file.path {
            output.push_str(&format!("{}\n", path.display()));
        }
        for namespace in &file.namespaces {
            format_namespace(&mut output, namespace);
        }
    }

    output
}

fn format_namespace(output: &mut String, ns: &NamespaceOutline) {
    let name = if ns.name.is_empty() { "(global)" } else { ns.name.as_str() };
    output.push_str(&format!("namespace {}\n", name));

    for import in &ns.imports {
        let last = import.name.rsplit('\\').next().unwrap_or_default();
        let kind = match import.kind {
            crate::extract::ImportKind::Class => String::new(),
            other => format!("{} ", other),
        };
        if last == import.alias.as_str() {
            output.push_str(&format!("  use {}{}\n", kind, import.name));
        } else {
            output.push_str(&format!(
                "  use {}{} as {}\n",
                kind, import.name, import.alias
            ));
        }
    }
    for constant in &ns.constants {
        format_value(output, "  const ", constant);
    }
    for function in &ns.functions {
        format_function(output, "  ", function);
    }
    for class in &ns.classes {
        format_class(output, class);
    }
}

fn format_class(output: &mut String, class: &ClassOutline) {
    output.push_str(&format!("  {} {}", class.kind, class.name));
    if !class.extends.is_empty() {
        output.push_str(&format!(" extends {}", class.extends.join(", ")));
    }
    if !class.implements.is_empty() {
        output.push_str(&format!(" implements {}", class.implements.join(", ")));
    }
    output.push_str(&format!("  (line {})\n", class.line));

    for constant in &class.constants {
        format_value(output, "    const ", constant);
    }
    for property in &class.properties {
        format_value(output, "    $", property);
    }
    for method in &class.methods {
        format_function(output, "    ", method);
    }
}

fn format_value(output: &mut String, prefix: &str, value: &ValueOutline) {
    match value.value.as_deref() {
        Some(text) if !text.is_empty() => {
            output.push_str(&format!("{}{} = {}\n", prefix, value.name, preview(text)));
        }
        _ => {
            output.push_str(&format!("{}{}\n", prefix, value.name));
        }
    }
}

fn format_function(output: &mut String, indent: &str, function: &FunctionOutline) {
    let suffix = if function.has_body { "" } else { ";" };
    output.push_str(&format!(
        "{}function {}(){}  (line {})\n",
        indent, function.name, suffix, function.line
    ));
}

/// First line of a value, truncated
fn preview(text: &str) -> String {
    let first = text.lines().next().unwrap_or_default();
    let more = text.lines().nth(1).is_some();
    if first.chars().count() > 60 {
        let cut: String = first.chars().take(57).collect();
        format!("{}...", cut)
    } else if more {
        format!("{} ...", first)
    } else {
        first.to_string()
    }
}

/// One line per token: index, kind, line, text and links
pub fn format_tokens(tokens: &TokenList) -> String {
    let mut output = String::new();
    for token in tokens {
        output.push_str(&format!(
            "{:>5}  {:<26} {:>4}  {:<24} {}\n",
            token.index,
            token.kind.as_str(),
            token.line,
            format!("{:?}", token.text.as_str()),
            links(token)
        ));
    }
    output
}

fn links(token: &Token) -> String {
    let mut parts = Vec::new();
    let mut push = |label: &str, link: Option<usize>| {
        if let Some(i) = link {
            parts.push(format!("{}={}", label, i));
        }
    };
    push("prev_code", token.prev_code);
    push("next_code", token.next_code);
    push("parent", token.parent);
    push("opened_by", token.opened_by);
    push("closed_by", token.closed_by);
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::graph::TokenGraphBuilder;
    use crate::outline::outline_source;

    #[test]
    fn test_format_outline() {
        let source = "<?php namespace App;\nuse Lib\\Base, Lib\\Other as O;\nclass A extends Base { const X = [1,\n2]; public $p; function f(); }";
        let outline = outline_source(source, &Config::default()).unwrap();
        let text = format_outlines(&[outline]);
        assert_eq!(
            text,
            "namespace App\n  use Lib\\Base\n  use Lib\\Other as O\n  class A extends Lib\\Base  (line 3)\n    const X = [1, ...\n    $p\n    function f();  (line 4)\n"
        );
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_outlines(&[]), "No PHP files found\n");
    }

    #[test]
    fn test_format_tokens() {
        let list = TokenGraphBuilder::default().build("<?php f();").unwrap();
        let text = format_tokens(&list);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), list.len());
        assert!(lines[2].contains("open_paren"));
        assert!(lines[2].contains("closed_by=3"));
        assert!(lines[3].contains("opened_by=2"));
    }
}
