use crate::coincap::model::Asset;
use crate::format::{
    format_changes, format_price, format_supply, Change, Currency, InvalidValue, Polarity,
    INVALID_MARKER,
};
use crate::view::filters::Filters;
use tracing::trace;

const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

#[derive(Clone, Debug, PartialEq)]
struct Cell {
    text: String,
    polarity: Option<Polarity>,
}

impl Cell {
    fn plain(text: String) -> Self {
        Self {
            text,
            polarity: None,
        }
    }

    fn change(change: Result<Change, InvalidValue>) -> Self {
        match change {
            Ok(change) => Self {
                text: change.to_string(),
                polarity: Some(change.polarity),
            },
            Err(e) => Self::plain(or_marker(Err(e))),
        }
    }

    fn width(&self) -> usize {
        self.text.chars().count()
    }
}

fn or_marker(value: Result<String, InvalidValue>) -> String {
    value.unwrap_or_else(|e| {
        trace!("Rendering '{}' as {}", e.raw(), INVALID_MARKER);
        INVALID_MARKER.to_string()
    })
}

/// Column headers in display order for the given toggles.
pub fn headers(filters: &Filters) -> Vec<&'static str> {
    let mut headers = vec!["Rank", "Name", "Symbol", "Price"];
    if filters.changes {
        headers.push("Changes in 24H");
    }
    if filters.market_cap {
        headers.push("Market Cap");
    }
    if filters.supply_normal {
        headers.push("Circulating Supply");
    }
    if filters.supply_percent {
        headers.push("Circulating Supply %");
    }
    if filters.volumes {
        headers.push("Volumes Traded in 24H");
    }
    headers
}

fn row(asset: &Asset, filters: &Filters, currency: &Currency) -> Vec<Cell> {
    let mut cells = vec![
        Cell::plain(format!("#{}", asset.rank)),
        Cell::plain(asset.name.clone()),
        Cell::plain(asset.symbol.clone()),
        Cell::plain(or_marker(format_price(&asset.price_usd, currency))),
    ];
    if filters.changes {
        cells.push(Cell::change(format_changes(&asset.change_percent24_hr)));
    }
    if filters.market_cap {
        cells.push(Cell::plain(or_marker(format_price(&asset.market_cap_usd, currency))));
    }
    if filters.supply_normal {
        cells.push(Cell::plain(or_marker(format_supply(
            &asset.supply,
            asset.max_supply.as_deref(),
            false,
        ))));
    }
    if filters.supply_percent {
        cells.push(Cell::plain(or_marker(format_supply(
            &asset.supply,
            asset.max_supply.as_deref(),
            true,
        ))));
    }
    if filters.volumes {
        cells.push(Cell::plain(or_marker(format_price(&asset.volume_usd24_hr, currency))));
    }
    cells
}

pub struct TableRenderer {
    pub color: bool,
}

impl TableRenderer {
    pub fn render(&self, assets: &[Asset], filters: &Filters, currency: &Currency) -> String {
        let headers: Vec<Cell> = headers(filters)
            .into_iter()
            .map(|h| Cell::plain(h.to_string()))
            .collect();
        let rows: Vec<Vec<Cell>> = assets
            .iter()
            .map(|asset| row(asset, filters, currency))
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(Cell::width).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }

        let mut out = String::new();
        self.push_line(&mut out, &headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(rule.join("-+-").as_str());
        out.push('\n');
        for row in &rows {
            self.push_line(&mut out, row, &widths);
        }
        out
    }

    fn push_line(&self, out: &mut String, cells: &[Cell], widths: &[usize]) {
        let rendered: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let padding = " ".repeat(width.saturating_sub(cell.width()));
                match (self.color, cell.polarity) {
                    (true, Some(Polarity::Positive)) => {
                        format!("{}{}{}{}", ANSI_GREEN, cell.text, ANSI_RESET, padding)
                    }
                    (true, Some(Polarity::Negative)) => {
                        format!("{}{}{}{}", ANSI_RED, cell.text, ANSI_RESET, padding)
                    }
                    _ => format!("{}{}", cell.text, padding),
                }
            })
            .collect();
        out.push_str(rendered.join(" | ").trim_end());
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(rank: u32, symbol: &str, price: &str, change: &str) -> Asset {
        Asset {
            rank,
            id: symbol.to_ascii_lowercase(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            explorer: None,
            price_usd: price.to_string(),
            market_cap_usd: "1000".to_string(),
            supply: "19000000".to_string(),
            max_supply: Some("21000000".to_string()),
            volume_usd24_hr: "".to_string(),
            change_percent24_hr: change.to_string(),
        }
    }

    #[test]
    fn test_headers_follow_filters() {
        assert_eq!(
            vec!["Rank", "Name", "Symbol", "Price", "Changes in 24H", "Market Cap", "Circulating Supply %"],
            headers(&Filters::default())
        );

        let filters = Filters {
            changes: false,
            market_cap: false,
            supply_percent: true,
            supply_normal: true,
            volumes: true,
        };
        assert_eq!(
            vec![
                "Rank",
                "Name",
                "Symbol",
                "Price",
                "Circulating Supply",
                "Circulating Supply %",
                "Volumes Traded in 24H"
            ],
            headers(&filters)
        );
    }

    #[test]
    fn test_render_plain() {
        let renderer = TableRenderer { color: false };
        let assets = vec![asset(1, "BTC", "64977.1234", "-1.2345")];
        let out = renderer.render(&assets, &Filters::default(), &Currency::usd());
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(3, lines.len());
        assert!(lines[0].starts_with("Rank | Name | Symbol | Price"));
        assert_eq!(
            "#1   | BTC  | BTC    | $64,977.12 | -1.23%         | $1,000     | 90.48%",
            lines[2]
        );
    }

    #[test]
    fn test_render_invalid_and_colored() {
        let renderer = TableRenderer { color: true };
        let filters = Filters {
            volumes: true,
            ..Filters::default()
        };
        let assets = vec![asset(2, "ETH", "oops", "2.5")];
        let out = renderer.render(&assets, &filters, &Currency::usd());
        let last = out.lines().last().unwrap();

        assert!(last.contains("| N/A"));
        assert!(last.contains("\x1b[32m2.5%\x1b[0m"));
        assert!(last.ends_with("N/A"));
    }

    #[test]
    fn test_invalid_change_is_uncolored_marker() {
        let cell = Cell::change(format_changes("1e100000000"));
        assert_eq!(Cell::plain(INVALID_MARKER.to_string()), cell);
        assert_eq!(INVALID_MARKER, or_marker(format_price("", &Currency::usd())));
    }
}
