use anyhow::Result;
use chromiumoxide::element::Element;
use scraper::{ElementRef, Html, Selector};

use crate::flow::{ResultContent, ResultTable, ResultTableData, ResultTableHead, TableStep};
use crate::util::absolutize;

/// Extract a table element into the structured table payload, serialized as
/// the step's content string.
pub async fn extract(
    element: &Element,
    step: &TableStep,
    origin: &str,
) -> Result<ResultContent> {
    let html = element.outer_html().await?.unwrap_or_default();
    let table = walk(&html, step, origin);
    let payload = serde_json::to_string(&table)?;
    Ok(ResultContent::new("table", &step.name, payload))
}

/// Walk a table fragment: the first row supplies headers (filtered by the
/// step's field list), every later row becomes a data row with its cells
/// classified as text, anchor, image, or row-number fallback.
pub fn walk(html: &str, step: &TableStep, origin: &str) -> ResultTable {
    let row_selector = Selector::parse("tr").expect("static selector");
    let cell_selector = Selector::parse("td, th").expect("static selector");
    let anchor_selector = Selector::parse("a").expect("static selector");
    let image_selector = Selector::parse("img").expect("static selector");

    let document = Html::parse_fragment(html);

    let mut column_names: Vec<String> = Vec::new();
    let mut header: Vec<ResultTableHead> = Vec::new();
    let mut data: Vec<Vec<ResultTableData>> = Vec::new();
    let mut column_count = 0;

    for (row_index, row) in document.select(&row_selector).enumerate() {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();

        if row_index == 0 {
            column_count = cells.len();
            for (cell_index, cell) in cells.iter().enumerate() {
                let content = normalize(&cell.text().collect::<String>());
                column_names.push(content.clone());
                if content.is_empty() || !keep(&step.fields, &content) {
                    continue;
                }
                header.push(ResultTableHead {
                    index: cell_index + 1,
                    length: content.len(),
                    content,
                });
            }
            continue;
        }

        let row_number = data.len() + 1;
        let mut row_data: Vec<ResultTableData> = Vec::new();

        for (cell_index, cell) in cells.iter().enumerate() {
            let column_name = column_names.get(cell_index).cloned().unwrap_or_default();
            if !keep(&step.fields, &column_name) {
                continue;
            }

            let (mut kind, mut name, mut content, hyperlink) =
                classify(cell, &anchor_selector, &image_selector, &column_name);

            if content.is_empty() {
                kind = "number".to_string();
                content = row_number.to_string();
            } else if hyperlink && !content.contains("http") {
                content = absolutize(origin, &content);
            }

            if name.is_empty() {
                name = column_name;
            }

            row_data.push(ResultTableData {
                kind,
                index: cell_index + 1,
                length: content.len(),
                name,
                content,
            });
        }

        data.push(row_data);
    }

    ResultTable {
        name: step.name.clone(),
        column: column_count,
        row: data.len(),
        header,
        data,
    }
}

/// Classify one data cell. Anchors swap text and target so the cell's name
/// is the link text and its content is the href; images carry `alt`/`src`.
fn classify(
    cell: &ElementRef,
    anchor_selector: &Selector,
    image_selector: &Selector,
    column_name: &str,
) -> (String, String, String, bool) {
    if let Some(anchor) = cell.select(anchor_selector).next() {
        let href = anchor.value().attr("href").unwrap_or_default().to_string();
        let text = normalize(&anchor.text().collect::<String>());
        let name = if text.is_empty() { href.clone() } else { text };
        return ("anchor".to_string(), name, href, true);
    }

    if let Some(image) = cell.select(image_selector).next() {
        let alt = image.value().attr("alt").unwrap_or_default().to_string();
        let src = image.value().attr("src").unwrap_or_default().to_string();
        return ("image".to_string(), alt, src, true);
    }

    (
        "text".to_string(),
        column_name.to_string(),
        normalize(&cell.text().collect::<String>()),
        false,
    )
}

fn keep(fields: &[String], column_name: &str) -> bool {
    fields.is_empty() || fields.iter().any(|field| field == column_name)
}

/// Collapse whitespace runs and newlines to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
