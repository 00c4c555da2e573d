use minijinja::{context, Environment};

use crate::digest::Bullet;

pub const EMPTY_DIGEST_TEXT: &str = "No unread messages today.";

// The .html name turns on HTML auto-escaping for every interpolated value.
// minijinja escapes `/` as well (`&#x2f;`) and writes `'` as `&#x27;`, so
// "Wed/Thu" comes out as `Wed&#x2f;Thu`. Browsers and mail clients render
// both the same as the bare characters.
const TEMPLATE_NAME: &str = "digest.html";

const DIGEST_TEMPLATE: &str = r#"<div style="font-family: -apple-system, Segoe UI, Roboto, sans-serif;">
  <h2>{{ subject }}</h2>
  {% if bullets %}<ol>{% for b in bullets %}<li><b>{{ b.title }}</b><br>{{ b.detail }}</li>{% endfor %}</ol>{% else %}<p>No unread messages today.</p>{% endif %}
  <p style="color:#777;">Generated automatically by your AI Email Summarizer.</p>
</div>
"#;

/// Render the digest as a self-contained HTML fragment for email bodies
pub fn render_html(subject: &str, bullets: &[Bullet]) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, DIGEST_TEMPLATE)?;

    env.get_template(TEMPLATE_NAME)?
        .render(context! { subject => subject, bullets => bullets })
}
