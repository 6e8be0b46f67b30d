//! HTML rendering for operator notifications.
//!
//! Rendering is pure: the caller supplies the display timestamp so output is
//! deterministic and testable without a clock.

use contact_relay_core::ContactDraft;

/// Subject line for a notification about `draft`.
pub fn subject(draft: &ContactDraft) -> String {
    format!("New Contact Form Submission from {}", draft.name)
}

/// Renders the notification body. Submitted values are HTML-escaped.
pub fn render_html(draft: &ContactDraft, submitted_at: &str) -> String {
    let name = escape_html(&draft.name);
    let email = escape_html(&draft.email);
    let message = escape_html(&draft.message);
    let submitted_at = escape_html(submitted_at);

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <style>
      body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
      .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
      .header {{ background: #2563eb; color: white; padding: 20px; text-align: center; border-radius: 8px 8px 0 0; }}
      .content {{ background: #f8fafc; padding: 30px; border-radius: 0 0 8px 8px; }}
      .field {{ margin-bottom: 20px; }}
      .label {{ font-weight: bold; color: #2563eb; }}
      .value {{ margin-top: 5px; padding: 10px; background: white; border-radius: 4px; border-left: 4px solid #2563eb; white-space: pre-wrap; }}
    </style>
  </head>
  <body>
    <div class="container">
      <div class="header">
        <h1>New Portfolio Contact Form Submission</h1>
        <p>From: {name}</p>
      </div>
      <div class="content">
        <div class="field">
          <div class="label">Name:</div>
          <div class="value">{name}</div>
        </div>
        <div class="field">
          <div class="label">Email:</div>
          <div class="value">{email}</div>
        </div>
        <div class="field">
          <div class="label">Message:</div>
          <div class="value">{message}</div>
        </div>
        <div class="field">
          <div class="label">Submitted At:</div>
          <div class="value">{submitted_at}</div>
        </div>
      </div>
    </div>
  </body>
</html>
"#
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
