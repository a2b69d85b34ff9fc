//! Server-rendered admin pages.
//!
//! Markup is deliberately small: the dashboard renders the rule table and
//! drives the JSON API with `fetch`; stats and email pages load their data
//! from the API on page load.

use crate::rules::{Rule, RuleSet};

/// Escape text for HTML element and attribute content.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, prefix: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} | hostsim</title>\n\
         <style>body{{font-family:sans-serif;max-width:960px;margin:2em auto}}\
         table{{border-collapse:collapse;width:100%}}td,th{{border:1px solid #ccc;padding:4px 8px;text-align:left}}\
         .error{{color:#b00}}</style>\n</head>\n<body>\n\
         <nav><a href=\"{prefix}\">Rules</a> | <a href=\"{prefix}/stats\">Stats</a> | \
         <a href=\"{prefix}/email\">Email</a> | <a href=\"{prefix}/logout\">Log out</a></nav>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
        prefix = prefix,
        body = body,
    )
}

/// Password form, optionally with an error notice.
pub fn login_page(prefix: &str, error: Option<&str>) -> String {
    let notice = error
        .map(|e| format!("<p class=\"error\">{}</p>\n", escape_html(e)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>Login | hostsim</title></head>\n\
         <body>\n<h1>hostsim control panel</h1>\n{notice}\
         <form method=\"post\" action=\"{prefix}/login\">\n\
         <label>Password <input type=\"password\" name=\"password\" autofocus required></label>\n\
         <button type=\"submit\">Log in</button>\n</form>\n</body>\n</html>\n"
    )
}

/// Rule table plus add and delete controls.
pub fn dashboard_page(prefix: &str, rules: &RuleSet) -> String {
    let mut rows = String::new();
    for (hostname, rule) in rules {
        let target = match rule {
            Rule::Redirect { target, .. } => escape_html(target),
            Rule::Status { .. } => String::new(),
        };
        let host = escape_html(hostname);
        rows.push_str(&format!(
            "<tr><td>{host}</td><td>{kind}</td><td>{code}</td><td>{target}</td>\
             <td><button data-host=\"{host}\" class=\"delete\">Delete</button></td></tr>\n",
            kind = rule.type_name(),
            code = rule.code(),
        ));
    }
    if rules.is_empty() {
        rows.push_str("<tr><td colspan=\"5\">No rules configured</td></tr>\n");
    }

    let body = format!(
        "<table>\n<tr><th>Hostname</th><th>Type</th><th>Code</th><th>Target</th><th></th></tr>\n{rows}</table>\n\
         <h2>Add or replace a rule</h2>\n\
         <form id=\"add\">\n\
         <input name=\"hostname\" placeholder=\"example.com\" required>\n\
         <select name=\"type\"><option value=\"status\">status</option><option value=\"redirect\">redirect</option></select>\n\
         <input name=\"code\" placeholder=\"503\" required>\n\
         <input name=\"target\" placeholder=\"https://target.example/\">\n\
         <button type=\"submit\">Save</button>\n</form>\n\
         <p><a href=\"{prefix}/api/logs/export?format=json\">Export JSON</a> | \
         <a href=\"{prefix}/api/logs/export?format=csv\">Export CSV</a> | \
         <button id=\"clear\">Clear logs</button></p>\n\
         <p id=\"msg\"></p>\n\
         <script>\n\
         const api = '{prefix}/api';\n\
         const show = async (r) => {{ document.getElementById('msg').textContent = await r.text(); if (r.ok) location.reload(); }};\n\
         document.getElementById('add').onsubmit = async (e) => {{\n\
           e.preventDefault();\n\
           const data = Object.fromEntries(new FormData(e.target));\n\
           show(await fetch(api + '/rules', {{method: 'POST', headers: {{'Content-Type': 'application/json'}}, body: JSON.stringify(data)}}));\n\
         }};\n\
         document.querySelectorAll('.delete').forEach(b => b.onclick = async () =>\n\
           show(await fetch(api + '/rules/' + encodeURIComponent(b.dataset.host), {{method: 'DELETE'}})));\n\
         document.getElementById('clear').onclick = async () =>\n\
           show(await fetch(api + '/logs/clear', {{method: 'DELETE'}}));\n\
         </script>"
    );
    layout("Hostname rules", prefix, &body)
}

/// Analytics view backed by `GET {prefix}/api/stats`.
pub fn stats_page(prefix: &str) -> String {
    let body = format!(
        "<pre id=\"stats\">Loading...</pre>\n\
         <script>\n\
         fetch('{prefix}/api/stats').then(r => r.json()).then(s => {{\n\
           document.getElementById('stats').textContent = JSON.stringify(s, null, 2);\n\
         }});\n\
         </script>"
    );
    layout("Analytics", prefix, &body)
}

/// Email report settings backed by `{prefix}/api/email`.
pub fn email_page(prefix: &str) -> String {
    let body = format!(
        "<form id=\"email\">\n\
         <label><input type=\"checkbox\" name=\"enabled\"> Enabled</label><br>\n\
         <label>Recipient <input name=\"recipient\" type=\"email\"></label><br>\n\
         <label>Sender name <input name=\"sender\"></label><br>\n\
         <label>Sender address <input name=\"senderEmail\" type=\"email\"></label><br>\n\
         <label>Resend API key <input name=\"apiKey\" type=\"password\"></label><br>\n\
         <button type=\"submit\">Save</button> <button type=\"button\" id=\"test\">Send report now</button>\n\
         </form>\n<p id=\"msg\"></p>\n\
         <script>\n\
         const api = '{prefix}/api/email';\n\
         const form = document.getElementById('email');\n\
         const show = async (r) => {{ document.getElementById('msg').textContent = await r.text(); }};\n\
         fetch(api).then(r => r.json()).then(c => {{\n\
           form.enabled.checked = c.enabled; form.recipient.value = c.recipient;\n\
           form.sender.value = c.sender; form.senderEmail.value = c.senderEmail; form.apiKey.value = c.resend.apiKey;\n\
         }});\n\
         form.onsubmit = async (e) => {{\n\
           e.preventDefault();\n\
           const data = {{enabled: form.enabled.checked, recipient: form.recipient.value,\n\
             sender: form.sender.value, senderEmail: form.senderEmail.value, resend: {{apiKey: form.apiKey.value}}}};\n\
           show(await fetch(api, {{method: 'POST', headers: {{'Content-Type': 'application/json'}}, body: JSON.stringify(data)}}));\n\
         }};\n\
         document.getElementById('test').onclick = async () => show(await fetch(api + '/test', {{method: 'POST'}}));\n\
         </script>"
    );
    layout("Email reports", prefix, &body)
}
