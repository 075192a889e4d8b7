//! Plain-text formatting of response items for quiet mode.

use serde_json::Value;

use crate::items::{ContentPart, ResponseItem};

/// Render one item as the line(s) quiet mode prints.
pub fn format_response_item(item: &ResponseItem) -> String {
    match item {
        ResponseItem::Message(message) => {
            let text = message
                .content
                .iter()
                .map(content_part_text)
                .collect::<Vec<_>>()
                .join("");
            format!("{}: {text}", message.role)
        }
        ResponseItem::FunctionCall(call) => {
            let command = parse_command_arguments(&call.arguments)
                .map(|argv| format_command_for_display(&argv))
                .unwrap_or_else(|| call.name.clone());
            format!("$ {command}")
        }
        ResponseItem::FunctionCallOutput(output) => {
            let (text, metadata) = output.parsed();
            match metadata {
                Some(meta) => format!(
                    "command.stdout (code: {}, duration: {}s)\n{text}",
                    meta.exit_code, meta.duration_seconds
                ),
                None => format!("command.stdout\n{text}"),
            }
        }
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| format!("{other:?}")),
    }
}

/// Text shown for one content part.
pub fn content_part_text(part: &ContentPart) -> String {
    match part {
        ContentPart::InputText { text } | ContentPart::OutputText { text } => text.clone(),
        ContentPart::InputImage { .. } => "<Image>".to_string(),
        ContentPart::InputFile { filename } => filename.clone(),
        ContentPart::Refusal { refusal } => refusal.clone(),
        ContentPart::Other(raw) => raw.to_string(),
    }
}

/// Extract the argv from `{"cmd": [...]}` or `{"command": [...]}`.
pub fn parse_command_arguments(arguments: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(arguments).ok()?;
    let argv = value.get("cmd").or_else(|| value.get("command"))?;
    argv.as_array()?
        .iter()
        .map(|arg| arg.as_str().map(str::to_string))
        .collect()
}

/// Human-readable command line.
///
/// `bash -lc <script>` is shown as the script itself; anything else is
/// shell-quoted word by word.
pub fn format_command_for_display(argv: &[String]) -> String {
    if let [shell, flag, script] = argv {
        if (shell == "bash" || shell == "sh") && flag == "-lc" {
            return script.clone();
        }
    }
    argv.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,@%+".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> ResponseItem {
        serde_json::from_value(value).expect("item")
    }

    #[test]
    fn message_joins_parts_with_placeholders() {
        let formatted = format_response_item(&item(json!({
            "type": "message",
            "role": "user",
            "content": [
                {"type": "input_text", "text": "see "},
                {"type": "input_image", "image_url": "data:image/png;base64,AA"},
                {"type": "input_file", "filename": " notes.txt"}
            ]
        })));
        assert_eq!(formatted, "user: see <Image> notes.txt");
    }

    #[test]
    fn refusal_renders_its_text() {
        let formatted = format_response_item(&item(json!({
            "type": "message",
            "role": "assistant",
            "content": [{"type": "refusal", "refusal": "I can't help with that."}]
        })));
        assert_eq!(formatted, "assistant: I can't help with that.");
    }

    #[test]
    fn function_call_shows_quoted_command() {
        let formatted = format_response_item(&item(json!({
            "type": "function_call",
            "call_id": "c1",
            "name": "shell",
            "arguments": "{\"cmd\": [\"grep\", \"-r\", \"hello world\", \".\"]}"
        })));
        assert_eq!(formatted, "$ grep -r 'hello world' .");
    }

    #[test]
    fn function_call_unwraps_bash_lc_scripts() {
        let formatted = format_response_item(&item(json!({
            "type": "function_call",
            "call_id": "c1",
            "name": "shell",
            "arguments": "{\"command\": [\"bash\", \"-lc\", \"ls | wc -l\"]}"
        })));
        assert_eq!(formatted, "$ ls | wc -l");
    }

    #[test]
    fn function_call_without_command_falls_back_to_name() {
        let formatted = format_response_item(&item(json!({
            "type": "function_call",
            "call_id": "c1",
            "name": "apply_patch",
            "arguments": "not json"
        })));
        assert_eq!(formatted, "$ apply_patch");
    }

    #[test]
    fn function_call_output_includes_metadata_when_present() {
        let with_meta = format_response_item(&item(json!({
            "type": "function_call_output",
            "call_id": "c1",
            "output": "{\"output\":\"a\\nb\",\"metadata\":{\"exit_code\":1,\"duration_seconds\":0.5}}"
        })));
        assert_eq!(with_meta, "command.stdout (code: 1, duration: 0.5s)\na\nb");

        let without = format_response_item(&item(json!({
            "type": "function_call_output",
            "call_id": "c1",
            "output": "raw text"
        })));
        assert_eq!(without, "command.stdout\nraw text");
    }

    #[test]
    fn other_items_dump_raw_json() {
        let formatted = format_response_item(&item(json!({"type": "web_search", "q": "x"})));
        let reparsed: Value = serde_json::from_str(&formatted).expect("json");
        assert_eq!(reparsed, json!({"type": "web_search", "q": "x"}));
    }

    #[test]
    fn quoting_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("src/main.rs"), "src/main.rs");
    }
}
