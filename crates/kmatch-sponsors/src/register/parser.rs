use super::{FetchError, RawTable};
use scraper::{ElementRef, Html, Selector};

struct TableSelectors {
    table: Selector,
    header: Selector,
    row: Selector,
    cell: Selector,
}

impl TableSelectors {
    fn new() -> Self {
        Self {
            table: parse_selector("table"),
            header: parse_selector("th"),
            row: parse_selector("tr"),
            cell: parse_selector("td"),
        }
    }
}

fn parse_selector(source: &'static str) -> Selector {
    match Selector::parse(source) {
        Ok(selector) => selector,
        Err(err) => unreachable!("static selector '{source}' is valid: {err:?}"),
    }
}

fn cell_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts the first `<table>` of the page: `th` cells form the header,
/// every `tr` with `td` cells forms a row.
pub fn parse_register_table(html: &str) -> Result<RawTable, FetchError> {
    let document = Html::parse_document(html);
    let selectors = TableSelectors::new();
    let table = document
        .select(&selectors.table)
        .next()
        .ok_or(FetchError::MissingTable)?;

    let headers: Vec<String> = table.select(&selectors.header).map(cell_text).collect();
    if headers.is_empty() {
        return Err(FetchError::MissingHeader);
    }

    let rows = table
        .select(&selectors.row)
        .map(|row| row.select(&selectors.cell).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    Ok(RawTable { headers, rows })
}
