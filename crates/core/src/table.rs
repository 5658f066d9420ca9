use crate::domain::market::PriceUpdate;
use crate::domain::recommendation::Recommendation;
use crate::metrics;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Symbol,
    Name,
    Sector,
    Price,
    Change,
    RefPrice,
    Volume,
    Open,
    Mvso,
    Probability,
    Drawdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Descending,
    Ascending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SortColumn::Probability,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    /// Clicking the active column flips direction; a new column always
    /// starts descending.
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column == column {
            self.direction = match self.direction {
                SortDirection::Descending => SortDirection::Ascending,
                SortDirection::Ascending => SortDirection::Descending,
            };
        } else {
            self.column = column;
            self.direction = SortDirection::Descending;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RowFilter {
    /// Minimum volume in millions of shares; 0 disables the filter.
    #[serde(default)]
    pub min_volume_millions: f64,
    /// Minimum open price; 0 disables the filter.
    #[serde(default)]
    pub min_open_price: f64,
}

impl RowFilter {
    pub fn retains(
        &self,
        row: &Recommendation,
        update: Option<&PriceUpdate>,
        today: bool,
    ) -> bool {
        if self.min_volume_millions > 0.0 {
            let volume = metrics::effective_volume(row, update, today).unwrap_or(0.0);
            if volume < self.min_volume_millions * 1_000_000.0 {
                return false;
            }
        }
        if self.min_open_price > 0.0 {
            let open = metrics::effective_open(row, update, today).unwrap_or(0.0);
            if open < self.min_open_price {
                return false;
            }
        }
        true
    }
}

enum SortKey<'a> {
    Text(Option<&'a str>),
    Number(Option<f64>),
}

/// The comparator must see the same live-vs-static values as the renderer,
/// so change and MVSO are recomputed here rather than read from the row.
fn sort_key<'a>(
    column: SortColumn,
    row: &'a Recommendation,
    update: Option<&'a PriceUpdate>,
    today: bool,
) -> SortKey<'a> {
    match column {
        SortColumn::Symbol => SortKey::Text(Some(&row.symbol)),
        SortColumn::Name => SortKey::Text(Some(&row.name)),
        SortColumn::Sector => SortKey::Text(metrics::effective_sector(row, update, today)),
        SortColumn::Price => SortKey::Number(Some(metrics::live_price(row, update, today))),
        SortColumn::Change => SortKey::Number(Some(metrics::change_pct(row, update, today))),
        SortColumn::RefPrice => SortKey::Number(metrics::reference_price(row, update, today)),
        SortColumn::Volume => SortKey::Number(metrics::effective_volume(row, update, today)),
        SortColumn::Open => SortKey::Number(metrics::effective_open(row, update, today)),
        SortColumn::Mvso => SortKey::Number(Some(metrics::mvso_pct(row, update, today))),
        SortColumn::Probability => SortKey::Number(row.probability),
        SortColumn::Drawdown => SortKey::Number(metrics::drawdown_pct(row, update, today)),
    }
}

fn apply_direction(ord: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// Missing values sort last regardless of direction; the direction only
/// reorders present values.
fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (SortKey::Text(a), SortKey::Text(b)) => match (a, b) {
            (Some(a), Some(b)) => apply_direction(a.cmp(b), direction),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        (SortKey::Number(a), SortKey::Number(b)) => match (a, b) {
            (Some(a), Some(b)) => {
                apply_direction(a.partial_cmp(b).unwrap_or(Ordering::Equal), direction)
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

/// Filter then stable-sort the day's rows. Ties keep their input order; no
/// secondary key is applied.
pub fn visible_rows(
    rows: &[Recommendation],
    prices: &BTreeMap<String, PriceUpdate>,
    today: bool,
    filter: RowFilter,
    sort: SortState,
) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = rows
        .iter()
        .filter(|row| filter.retains(row, prices.get(&row.symbol), today))
        .cloned()
        .collect();

    out.sort_by(|a, b| {
        let ka = sort_key(sort.column, a, prices.get(&a.symbol), today);
        let kb = sort_key(sort.column, b, prices.get(&b.symbol), today);
        compare_keys(&ka, &kb, sort.direction)
    });

    out
}

/// Symbols picked for chart launch. Set semantics; iteration order is the
/// set's, with no further guarantee.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: BTreeSet<String>,
}

impl Selection {
    pub fn toggle(&mut self, symbol: &str) {
        if !self.selected.remove(symbol) {
            self.selected.insert(symbol.to_string());
        }
    }

    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a Recommendation>) {
        self.selected = visible.into_iter().map(|r| r.symbol.clone()).collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.selected.contains(symbol)
    }

    /// "All selected" means the selection size equals the current visible
    /// row count, nothing stronger.
    pub fn all_selected(&self, visible_len: usize) -> bool {
        visible_len > 0 && self.selected.len() == visible_len
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn chart_launch_url(&self, base: &str) -> String {
        let joined: Vec<&str> = self.selected.iter().map(String::as_str).collect();
        format!("{}?symbols={}", base.trim_end_matches('/'), joined.join(","))
    }
}
