use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::models::ExtensionRecord;

use super::messages;

/// Listing tab. Only these two values are ever rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Plugins,
    Themes,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Plugins, Tab::Themes];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Plugins => "plugins",
            Tab::Themes => "themes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Plugins => "Plugins",
            Tab::Themes => "Themes",
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            Tab::Plugins => messages::NO_PLUGINS,
            Tab::Themes => messages::NO_THEMES,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plugins" => Ok(Tab::Plugins),
            "themes" => Ok(Tab::Themes),
            other => Err(format!("Unknown tab '{}'", other)),
        }
    }
}

/// Escapes `& < > " '` for use in element content and attribute values.
pub fn escape_html(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 16);
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Tokens embedded into a rendered dashboard.
#[derive(Debug, Clone, Default)]
pub struct PageTokens {
    pub export: String,
    pub ajax: String,
    pub plugins_tab: String,
    pub themes_tab: String,
}

impl PageTokens {
    fn for_tab(&self, tab: Tab) -> &str {
        match tab {
            Tab::Plugins => &self.plugins_tab,
            Tab::Themes => &self.themes_tab,
        }
    }
}

pub struct DashboardPage<'a> {
    pub tab: Tab,
    pub plugins: &'a [ExtensionRecord],
    pub themes: &'a [ExtensionRecord],
    pub tokens: &'a PageTokens,
}

impl DashboardPage<'_> {
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn records(&self, tab: Tab) -> &[ExtensionRecord] {
        match tab {
            Tab::Plugins => self.plugins,
            Tab::Themes => self.themes,
        }
    }

    fn write_table(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let records = self.records(self.tab);

        writeln!(f, "<div class=\"sitesnap-table-container\">")?;
        writeln!(f, "<table class=\"sitesnap-table\">")?;
        writeln!(
            f,
            "<thead><tr><th scope=\"col\">Name</th><th scope=\"col\">Version</th>\
             <th scope=\"col\">Status</th><th scope=\"col\">Author</th>\
             <th scope=\"col\">Description</th></tr></thead>"
        )?;
        writeln!(f, "<tbody>")?;

        if records.is_empty() {
            writeln!(
                f,
                "<tr><td colspan=\"5\">{}</td></tr>",
                escape_html(self.tab.empty_message())
            )?;
        }

        for record in records {
            let status = record.status.as_str();
            writeln!(
                f,
                "<tr><td><strong>{}</strong></td><td>{}</td>\
                 <td><span class=\"sitesnap-status sitesnap-status-{}\">{}</span></td>\
                 <td>{}</td><td>{}</td></tr>",
                escape_html(&record.name),
                escape_html(&record.version),
                status,
                status,
                escape_html(&record.author),
                escape_html(&record.description),
            )?;
        }

        writeln!(f, "</tbody>")?;
        writeln!(f, "</table>")?;
        writeln!(f, "</div>")
    }
}

impl fmt::Display for DashboardPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html lang=\"en\">")?;
        writeln!(f, "<head><meta charset=\"utf-8\"><title>{}</title></head>", escape_html(messages::PAGE_TITLE))?;
        writeln!(f, "<body>")?;
        writeln!(f, "<div class=\"wrap\">")?;
        writeln!(f, "<h1>{}</h1>", escape_html(messages::PAGE_TITLE))?;
        writeln!(
            f,
            "<p class=\"description\">{}</p>",
            escape_html(messages::PAGE_DESCRIPTION)
        )?;

        writeln!(f, "<div class=\"sitesnap-export-section\">")?;
        writeln!(f, "<form method=\"post\" action=\"admin-post\">")?;
        writeln!(
            f,
            "<input type=\"hidden\" name=\"action\" value=\"sitesnap_export_csv\">"
        )?;
        writeln!(
            f,
            "<input type=\"hidden\" name=\"export_token\" value=\"{}\">",
            escape_html(&self.tokens.export)
        )?;
        writeln!(
            f,
            "<button type=\"submit\" class=\"button button-primary\" data-ajax-token=\"{}\">{}</button>",
            escape_html(&self.tokens.ajax),
            escape_html(messages::EXPORT_BUTTON)
        )?;
        writeln!(f, "</form>")?;
        writeln!(f, "</div>")?;

        writeln!(f, "<nav class=\"nav-tab-wrapper\">")?;
        for tab in Tab::ALL {
            let active = if tab == self.tab { " nav-tab-active" } else { "" };
            writeln!(
                f,
                "<a href=\"?tab={}&amp;tab_token={}\" class=\"nav-tab{}\">{} <span class=\"sitesnap-count\">({})</span></a>",
                tab.as_str(),
                escape_html(self.tokens.for_tab(tab)),
                active,
                tab.label(),
                self.records(tab).len()
            )?;
        }
        writeln!(f, "</nav>")?;

        writeln!(f, "<div class=\"sitesnap-content\">")?;
        self.write_table(f)?;
        writeln!(f, "</div>")?;

        writeln!(f, "</div>")?;
        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}
