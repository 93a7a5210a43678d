//! HTML for the handful of pages this app serves.
//!
//! Small enough that a template engine would be overhead; each page is a
//! render function returning the full document. User-supplied text goes
//! through [`escape_html`] before interpolation.

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Confide</title>
</head>
<body>
<nav><a href="/">Home</a> <a href="/secrets">Secrets</a> <a href="/submit">Submit</a> <a href="/logout">Log out</a></nav>
{body}
</body>
</html>
"#
    )
}

pub fn home() -> String {
    layout(
        "Home",
        r#"<h1>Confide</h1>
<p>Share a secret. Nobody will know it was you.</p>
<p><a href="/register">Register</a> or <a href="/login">Login</a></p>"#,
    )
}

pub fn login() -> String {
    layout(
        "Login",
        r#"<h1>Login</h1>
<form action="/login" method="post">
<label>Username <input type="text" name="username" autofocus></label>
<label>Password <input type="password" name="password"></label>
<button type="submit">Login</button>
</form>
<p><a href="/auth/google">Sign in with Google</a></p>"#,
    )
}

pub fn register() -> String {
    layout(
        "Register",
        r#"<h1>Register</h1>
<form action="/register" method="post">
<label>Username <input type="text" name="username" autofocus></label>
<label>Password <input type="password" name="password"></label>
<button type="submit">Register</button>
</form>
<p><a href="/auth/google">Sign up with Google</a></p>"#,
    )
}

pub fn submit() -> String {
    layout(
        "Submit",
        r#"<h1>Share a secret</h1>
<form action="/submit" method="post">
<label>Your secret <input type="text" name="secret" autofocus></label>
<button type="submit">Submit</button>
</form>"#,
    )
}

/// The shared listing: secret text only, one block per secret, nothing that
/// could link a secret back to its author.
pub fn secrets(secrets: &[String]) -> String {
    let mut body = String::from("<h1>What people are saying</h1>\n");
    for secret in secrets {
        body.push_str("<p class=\"secret\">");
        body.push_str(&escape_html(secret));
        body.push_str("</p>\n");
    }
    if secrets.is_empty() {
        body.push_str("<p>No secrets yet. Be the first.</p>\n");
    }
    layout("Secrets", &body)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_page_shows_every_secret() {
        let page = secrets(&["a".to_string(), "b".to_string()]);
        assert!(page.contains("<p class=\"secret\">a</p>"));
        assert!(page.contains("<p class=\"secret\">b</p>"));
    }

    #[test]
    fn secrets_page_escapes_markup() {
        let page = secrets(&["<script>alert(1)</script>".to_string()]);
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn empty_listing_has_a_placeholder() {
        let page = secrets(&[]);
        assert!(page.contains("No secrets yet"));
    }

    #[test]
    fn login_page_offers_google() {
        assert!(login().contains("/auth/google"));
    }

    #[test]
    fn escape_html_covers_the_meta_characters() {
        assert_eq!(escape_html(r#"&<>"'"#), "&amp;&lt;&gt;&quot;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
