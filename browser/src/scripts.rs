//! JavaScript evaluated inside the viewer page.

/// Overlays that swallow clicks on the present control.
const OVERLAY_SELECTOR: &str = r#"[role="dialog"], [class*="overlay"], [class*="modal"]"#;

/// Find the present control in the page or any same-origin iframe, remove
/// overlays in that document, scroll the control into view and click it.
/// Evaluates to `true` when a control was clicked.
pub fn click_present(selector: &str) -> String {
    format!(
        r#"(() => {{
    const selector = {selector};
    const overlays = {overlays};
    const docs = [document];
    for (const frame of document.querySelectorAll('iframe')) {{
        try {{
            if (frame.contentDocument) docs.push(frame.contentDocument);
        }} catch (e) {{}}
    }}
    for (const doc of docs) {{
        const button = doc.querySelector(selector);
        if (!button) continue;
        doc.querySelectorAll(overlays).forEach(o => o.remove());
        button.scrollIntoView({{ behavior: 'instant', block: 'center' }});
        button.click();
        return true;
    }}
    return false;
}})()"#,
        selector = js_string(selector),
        overlays = js_string(OVERLAY_SELECTOR),
    )
}

/// Evaluates to a JSON array of the `src` of every iframe with one.
pub const IFRAME_SOURCES: &str = r#"JSON.stringify(
    Array.from(document.querySelectorAll('iframe'))
        .map(f => f.src)
        .filter(s => s && s.startsWith('http'))
)"#;

/// Evaluates to `true` when the viewer looks like it is presenting.
pub const IS_PRESENTING: &str = r#"(() => {
    if (location.href.toLowerCase().includes('view=present')) return true;
    if (document.fullscreenElement || document.webkitFullscreenElement
        || document.mozFullScreenElement || document.msFullscreenElement) return true;
    const el = document.querySelector('[class*="presentationMode"]');
    return !!el && el.offsetParent !== null;
})()"#;

pub const READY_STATE: &str = "document.readyState";

/// Synthetic right-arrow key press, used when the protocol-level key event
/// fails.
pub const ARROW_RIGHT_FALLBACK: &str = r#"(() => {
    const event = new KeyboardEvent('keydown', {
        key: 'ArrowRight',
        code: 'ArrowRight',
        keyCode: 39,
        which: 39,
        bubbles: true
    });
    document.dispatchEvent(event);
    return true;
})()"#;

/// Quote `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    // JSON strings are valid JS string literals.
    serde_json::Value::String(value.to_string()).to_string()
}

/// Parse the result of [`IFRAME_SOURCES`].
pub fn parse_iframe_sources(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_str())
        .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_quoted_as_js_string() {
        let script = click_present(r#"[aria-label="Present"]"#);
        assert!(script.contains(r#"const selector = "[aria-label=\"Present\"]";"#));
        assert!(script.starts_with("(() => {"));
        assert!(script.trim_end().ends_with("})()"));
    }

    #[test]
    fn hostile_selector_cannot_break_out() {
        let script = click_present("\"; alert(1); \"");
        assert!(script.contains(r#"const selector = "\"; alert(1); \"";"#));
    }

    #[test]
    fn iframe_sources_parse_json_string() {
        let value = serde_json::Value::String(r#"["https://a.example/x","https://b.example/y"]"#.into());
        assert_eq!(
            parse_iframe_sources(Some(&value)),
            vec!["https://a.example/x", "https://b.example/y"]
        );
    }

    #[test]
    fn iframe_sources_tolerate_missing_or_bad_values() {
        assert!(parse_iframe_sources(None).is_empty());
        assert!(parse_iframe_sources(Some(&serde_json::Value::Bool(true))).is_empty());
        let bad = serde_json::Value::String("not json".into());
        assert!(parse_iframe_sources(Some(&bad)).is_empty());
    }
}
