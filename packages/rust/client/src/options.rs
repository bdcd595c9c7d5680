//! Department and term option lists scraped from the registrar's search forms.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use regfetch_shared::DepartmentOptions;

/// Placeholder values in department dropdowns that are not departments.
const NON_DEPARTMENT_VALUES: [&str; 2] = ["ALL", ""];

/// Every `<option>` of `<select name=…>` as (value, text, selected), in page order.
fn select_options(doc: &Html, select_name: &str) -> Vec<(String, String, bool)> {
    let selector = format!(r#"select[name="{select_name}"] option"#);
    let Ok(sel) = Selector::parse(&selector) else {
        return Vec::new();
    };

    doc.select(&sel)
        .map(|el| {
            let text = element_text(&el);
            let value = el
                .value()
                .attr("value")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| text.clone());
            let selected = el.value().attr("selected").is_some();
            (value, text, selected)
        })
        .collect()
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Department code → form value for a `<select name=…>` department list.
pub fn department_select(html: &str, select_name: &str) -> DepartmentOptions {
    let doc = Html::parse_document(html);

    select_options(&doc, select_name)
        .into_iter()
        .filter(|(value, _, _)| !NON_DEPARTMENT_VALUES.contains(&value.as_str()))
        .map(|(value, _, _)| (value.clone(), value))
        .collect()
}

/// The selected value of a `<select name=…>` (first option if none is marked),
/// falling back to an `<input name=…>` of the same name.
pub fn selected_value(html: &str, name: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let options = select_options(&doc, name);

    let picked = options
        .iter()
        .find(|(_, _, selected)| *selected)
        .or_else(|| options.first())
        .map(|(value, _, _)| value.clone());
    if picked.is_some() {
        return picked;
    }

    let sel = Selector::parse(&format!(r#"input[name="{name}"]"#)).ok()?;
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Department code → absolute page URL from the catalogue's A–Z index.
///
/// Index links read `Computer Science (COMPSCI)`; the code is the text of the
/// trailing parenthesis.
pub fn catalogue_index(html: &str, base: &Url) -> DepartmentOptions {
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("a[href]") else {
        return DepartmentOptions::new();
    };

    let mut departments = DepartmentOptions::new();
    for el in doc.select(&sel) {
        let Some(code) = department_code(&element_text(&el)) else {
            continue;
        };
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if let Ok(resolved) = base.join(href) {
            departments.entry(code).or_insert_with(|| resolved.to_string());
        }
    }
    departments
}

fn department_code(text: &str) -> Option<String> {
    let inner = text.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let code = inner[open + 1..].trim();
    (!code.is_empty()).then(|| code.to_string())
}
