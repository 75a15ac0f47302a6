use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::export::{create_pdf, pdf_data_uri};
use crate::export::pdf::FILE_NAME;
use crate::finder::planner::{MAX_DAYS, MIN_DAYS};
use crate::llm::Failure;
use crate::session::{Outcome, Phase, SessionContext};
use crate::strategy::{Strategy, MAX_WEIGHT};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }
label { display: block; margin-top: .8rem; }
input[type=text] { width: 100%; padding: .4rem; }
input[type=range] { width: 70%; vertical-align: middle; }
.warning { background: #fff4ce; border: 1px solid #e0b400; padding: .6rem; }
.failure { background: #fde7e9; border: 1px solid #c50f1f; padding: .6rem; }
.failure pre { white-space: pre-wrap; }
.busy { color: #555; font-style: italic; }
.results { border-top: 1px solid #ddd; margin-top: 1.5rem; }
"#;

/// Renders the whole page for one session. Consumes the pending warning.
pub fn render(session: &mut SessionContext) -> String {
    let warning = session.take_warning();
    let mut out = String::with_capacity(8 * 1024);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Teacher's Content Finder</title>\n<style>");
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n");
    out.push_str("<h1>Teacher's Content Finder</h1>\n");
    out.push_str(
        "<p>Find publicly available content tailored to your students' learning strategies.</p>\n",
    );

    if let Some(warning) = warning {
        out.push_str(&format!(
            "<div class=\"warning\" role=\"alert\">{}</div>\n",
            escape_html(&warning.to_string())
        ));
    }

    render_search_form(&mut out, session);

    if let Some(search) = session.search() {
        out.push_str("<section class=\"results\">\n<h2>Search Results:</h2>\n");
        render_outcome(&mut out, search);
        out.push_str("</section>\n");

        if search.is_ok() {
            render_plan_form(&mut out, session);
        }
    }

    if let Some(plan) = session.plan() {
        out.push_str("<section class=\"results\">\n<h2>Learning Plan:</h2>\n");
        render_outcome(&mut out, plan);
        out.push_str("</section>\n");
    }

    if let Some((search, plan)) = session.export_texts() {
        render_download(&mut out, search, plan);
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_search_form(out: &mut String, session: &SessionContext) {
    out.push_str(
        "<form method=\"post\" action=\"/search\" \
         onsubmit=\"this.querySelector('.busy').hidden=false\">\n",
    );
    out.push_str(&format!(
        "<label for=\"topic\">Enter the topic you want to teach:</label>\n\
         <input type=\"text\" id=\"topic\" name=\"topic\" value=\"{}\">\n",
        escape_html(session.topic())
    ));
    out.push_str("<p>Adjust the importance of each learning strategy:</p>\n");

    for (strategy, value) in session.weights().iter() {
        render_slider(out, strategy, value);
    }

    out.push_str("<p><button type=\"submit\">Find Content</button> ");
    out.push_str("<span class=\"busy\" hidden>Searching for content...</span></p>\n");
    out.push_str("</form>\n");
}

fn render_slider(out: &mut String, strategy: Strategy, value: u8) {
    out.push_str(&format!(
        "<label title=\"{help}\">{label}<br>\
         <input type=\"range\" name=\"{key}\" min=\"0\" max=\"{max}\" value=\"{value}\" \
         oninput=\"this.nextElementSibling.value=this.value\"> \
         <output>{value}</output></label>\n",
        help = escape_html(strategy.help()),
        label = escape_html(strategy.label()),
        key = strategy.key(),
        max = MAX_WEIGHT,
        value = value,
    ));
}

fn render_plan_form(out: &mut String, session: &SessionContext) {
    let busy_text = if session.phase() == Phase::PlanPending {
        ""
    } else {
        " hidden"
    };
    out.push_str(&format!(
        "<form method=\"post\" action=\"/plan\" \
         onsubmit=\"this.querySelector('.busy').hidden=false\">\n\
         <label for=\"days\">Number of days for the learning plan:</label>\n\
         <input type=\"number\" id=\"days\" name=\"days\" min=\"{MIN_DAYS}\" max=\"{MAX_DAYS}\" value=\"{days}\">\n\
         <p><button type=\"submit\">Create Plan</button> \
         <span class=\"busy\"{busy_text}>Creating learning plan...</span></p>\n\
         </form>\n",
        days = session.days().get(),
    ));
}

fn render_outcome(out: &mut String, outcome: &Outcome) {
    match outcome {
        Ok(text) => out.push_str(&render_markdown(text)),
        Err(failure) => render_failure(out, failure),
    }
}

fn render_failure(out: &mut String, failure: &Failure) {
    out.push_str(&format!(
        "<div class=\"failure\" role=\"alert\"><strong>{}</strong>\n<pre>{}</pre></div>\n",
        escape_html(&failure.kind.to_string()),
        escape_html(&failure.detail)
    ));
}

fn render_download(out: &mut String, search: &str, plan: &str) {
    match create_pdf(search, plan) {
        Ok(bytes) => out.push_str(&format!(
            "<p><a download=\"{FILE_NAME}\" href=\"{}\">Download PDF</a></p>\n",
            pdf_data_uri(&bytes)
        )),
        Err(e) => {
            tracing::error!("PDF export failed: {:#}", e);
            out.push_str("<div class=\"failure\">The PDF could not be generated.</div>\n");
        }
    }
}

/// Model output is markdown; raw HTML in it is shown as text and link or
/// image targets outside [`is_safe_url`] are replaced with `#`.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        tracing::warn!(url = %url, "Dropping unsafe link target from model output");
        CowStr::Borrowed("#")
    }
}

/// `http`, `https`, `mailto`, or relative.
pub fn is_safe_url(url: &str) -> bool {
    let url = url.trim_start();
    // A scheme ends at the first ':' that comes before any '/', '?' or '#'.
    match url.find([':', '/', '?', '#']) {
        Some(i) if url.as_bytes()[i] == b':' => {
            let scheme = url[..i].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
