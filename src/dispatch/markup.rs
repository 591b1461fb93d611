//! Banners and notices placed around a rendered response.

use maud::{html, Markup, PreEscaped};

/// Full surface markup for a handled response.
pub struct SurfacePage<'a> {
    pub verification: Option<bool>,
    pub backend_error: Option<&'a str>,
    /// Server-supplied HTML shown above the rendering.
    pub result_html: Option<&'a str>,
    pub rendering: &'a str,
    pub notice: Option<Markup>,
}

impl SurfacePage<'_> {
    pub fn into_string(self) -> String {
        html! {
            @if let Some(verified) = self.verification {
                @if verified {
                    b.verified style="color:green" { "Verified" } br;
                } @else {
                    b.failed style="color:red" { "Failed" } br;
                }
            }
            @if let Some(error) = self.backend_error {
                b.error style="color:red" { "Error:" } " " (error) br;
            }
            @if let Some(prefix) = self.result_html {
                (PreEscaped(prefix)) br;
            }
            (PreEscaped(self.rendering))
            @if let Some(notice) = self.notice {
                (notice)
            }
        }
        .into_string()
    }
}

pub fn bootstrap_notice(bootstrap: &str) -> Markup {
    html! {
        b.notice style="color:green" { "Will start the dependency for you." } br;
        "Equivalent to running " code { (bootstrap) } "." br;
    }
}

pub fn refusal_notice(attempts: u32) -> Markup {
    html! {
        b.error style="color:red" {
            "Dependency still not running after " (attempts) " automatic start attempt(s); start it manually."
        }
        br;
    }
}

pub fn bootstrap_failure(reason: &str) -> Markup {
    html! {
        b.error style="color:red" { "Automatic start failed:" } " " (reason) br;
    }
}

pub fn malformed(raw: &str, reason: &str) -> String {
    html! {
        b.error style="color:red" { "Malformed response:" } " " (reason) br;
        pre.raw { (raw) }
    }
    .into_string()
}

pub fn transport_failure(reason: &str) -> String {
    html! {
        b.error style="color:red" { "Request failed:" } " " (reason) br;
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_order() {
        let page = SurfacePage {
            verification: Some(true),
            backend_error: Some("boom"),
            result_html: Some("<i>server</i>"),
            rendering: "<table></table>",
            notice: Some(bootstrap_notice("runFabcoind")),
        }
        .into_string();

        let verified = page.find("Verified").unwrap();
        let error = page.find("boom").unwrap();
        let server = page.find("<i>server</i>").unwrap();
        let table = page.find("<table>").unwrap();
        let notice = page.find("runFabcoind").unwrap();
        assert!(verified < error && error < server && server < table && table < notice);
    }

    #[test]
    fn test_error_text_escaped() {
        let page = SurfacePage {
            verification: None,
            backend_error: Some("<script>"),
            result_html: None,
            rendering: "",
            notice: None,
        }
        .into_string();
        assert!(page.contains("&lt;script&gt;"));
        assert!(malformed("<x", "eof").contains("&lt;x"));
    }
}
