use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bank::bank_model::Sizing;
use crate::descriptor::ids::BankId;
use crate::descriptor::normalized_model::NormalizedPage;
use crate::descriptor::ordered::OrderedMap;
use crate::trace::trace::{CompileEvent, EventKind};

// ============================================================================
// Grid dimensions
// ============================================================================

/// Size of the grid one page's banks are arranged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub width: u32,
    pub height: u32,

    /// Column the first bank of every row starts at
    pub column_start: u32,
}

/// Grid settings, with a narrower variant for pages that have a sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    pub column_start: u32,
    pub sidebar_width: u32,
    pub sidebar_column_start: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 12,
            height: 8,
            column_start: 1,
            sidebar_width: 9,
            sidebar_column_start: 4,
        }
    }
}

impl GridConfig {
    pub fn dims(&self, has_sidebar: bool) -> GridDims {
        if has_sidebar {
            GridDims {
                width: self.sidebar_width,
                height: self.height,
                column_start: self.sidebar_column_start,
            }
        } else {
            GridDims {
                width: self.width,
                height: self.height,
                column_start: self.column_start,
            }
        }
    }
}

// ============================================================================
// Inputs and placements
// ============================================================================

/// What the allocator needs to know about one bank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankFootprint {
    pub sizing: Sizing,
    pub position: Option<[u32; 2]>,
}

impl BankFootprint {
    /// Footprint with explicit `width` / `height` overrides pinned into both
    /// `ideal` and `min`.
    pub fn new(
        sizing: Sizing,
        width: Option<u32>,
        height: Option<u32>,
        position: Option<[u32; 2]>,
    ) -> Self {
        let mut sizing = sizing;
        if let Some(h) = height {
            sizing.ideal[0] = h;
            sizing.min[0] = h;
        }
        if let Some(w) = width {
            sizing.ideal[1] = w;
            sizing.min[1] = w;
        }
        Self { sizing, position }
    }
}

/// Where one bank ended up on the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPlacement {
    pub bankid: BankId,
    pub row: u32,
    pub column: u32,
    pub width: u32,

    /// Columns the bank can still give up
    pub slack: u32,
    pub slack_frac: f64,

    /// `[row, column]` the renderer places the bank at: the declared
    /// position if there is one, otherwise the initial even-share cell
    pub position: [u32; 2],

    pub ideal: [u32; 2],
    pub min: [u32; 2],
}

impl GridPlacement {
    fn new(bankid: &BankId, footprint: &BankFootprint, row: u32, column: u32) -> Self {
        let ideal = footprint.sizing.ideal;
        let min = footprint.sizing.min;
        let slack = ideal[1].saturating_sub(min[1]);
        Self {
            bankid: bankid.clone(),
            row,
            column,
            width: ideal[1],
            slack,
            slack_frac: slack_fraction(slack, min[1]),
            position: footprint.position.unwrap_or([row, column]),
            ideal,
            min,
        }
    }

    fn shrink(&mut self) {
        self.width -= 1;
        self.slack -= 1;
        self.slack_frac = slack_fraction(self.slack, self.min[1]);
    }
}

fn slack_fraction(slack: u32, min_width: u32) -> f64 {
    slack as f64 / min_width.max(1) as f64
}

// ============================================================================
// Allocation
// ============================================================================

/// Place every bank of `layout` on the grid.
///
/// Without a layout, banks stack one per row in declaration order. Each row
/// gets an even share of the grid height and each bank an even share of its
/// row's width as its starting column. Rows are then shrunk to fit (see
/// [`appease`]) and columns recomputed so banks stay contiguous. Empty rows
/// keep their share of the height but place nothing.
///
/// Returns the placement matrix and the placements in row-major order.
pub fn arrange(
    banks: &OrderedMap<BankId, BankFootprint>,
    layout: &[Vec<BankId>],
    dims: &GridDims,
) -> (Vec<Vec<GridPlacement>>, Vec<GridPlacement>) {
    let stacked: Vec<Vec<BankId>>;
    let layout = if layout.is_empty() {
        stacked = banks.keys().map(|id| vec![id.clone()]).collect();
        &stacked[..]
    } else {
        layout
    };
    if layout.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let row_step = dims.height / layout.len() as u32;
    let mut matrix = Vec::with_capacity(layout.len());
    let mut ordered = Vec::new();

    for (y_idx, ids) in layout.iter().enumerate() {
        let entries: Vec<(&BankId, &BankFootprint)> = ids
            .iter()
            .filter_map(|id| banks.get(id).map(|fp| (id, fp)))
            .collect();
        if entries.is_empty() {
            matrix.push(Vec::new());
            continue;
        }

        let row = y_idx as u32 * row_step;
        let col_step = dims.width / entries.len() as u32;
        let mut placed: Vec<GridPlacement> = entries
            .iter()
            .enumerate()
            .map(|(x_idx, (id, fp))| {
                GridPlacement::new(id, fp, row, x_idx as u32 * col_step + dims.column_start)
            })
            .collect();

        if !appease(&mut placed, dims.width) {
            warn!(
                "row {} overflows the grid: {} > {}",
                y_idx,
                row_width(&placed),
                dims.width
            );
        }
        for i in 1..placed.len() {
            placed[i].column = placed[i - 1].column.saturating_add(placed[i - 1].width);
        }

        debug!(
            "row {}: {}",
            y_idx,
            placed
                .iter()
                .map(|p| format!("{}@{}+{}", p.bankid, p.column, p.width))
                .collect::<Vec<_>>()
                .join(", ")
        );
        ordered.extend(placed.iter().cloned());
        matrix.push(placed);
    }

    (matrix, ordered)
}

/// Shrink the banks of one row until it fits `grid_width`, one column at a
/// time, always taking from the bank with the largest slack fraction (the
/// first one on ties). Returns whether the row fits; a row whose slack runs
/// out first is left overflowing.
pub fn appease(row: &mut [GridPlacement], grid_width: u32) -> bool {
    let mut excess = row_width(row).saturating_sub(grid_width);
    while excess > 0 {
        let mut pick: Option<usize> = None;
        for (i, p) in row.iter().enumerate() {
            if p.slack == 0 {
                continue;
            }
            if pick.is_none_or(|j| p.slack_frac > row[j].slack_frac) {
                pick = Some(i);
            }
        }
        match pick {
            Some(i) => {
                row[i].shrink();
                excess -= 1;
            }
            None => return false,
        }
    }
    true
}

/// Saturates at `u32::MAX` for oversized width overrides.
pub fn row_width(row: &[GridPlacement]) -> u32 {
    row.iter().fold(0u32, |acc, p| acc.saturating_add(p.width))
}

pub fn row_slack(row: &[GridPlacement]) -> u32 {
    row.iter().fold(0u32, |acc, p| acc.saturating_add(p.slack))
}

// ============================================================================
// Per-page entry point
// ============================================================================

/// A page's grid: placement matrix plus placements in row-major order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PageGrid {
    pub layout: Vec<Vec<GridPlacement>>,
    pub banks: Vec<GridPlacement>,
}

impl PageGrid {
    pub fn placement(&self, bankid: &BankId) -> Option<&GridPlacement> {
        self.banks.iter().find(|p| p.bankid == *bankid)
    }
}

/// Arrange one page, picking the sidebar dims when the page has a sidebar.
/// Rows left overflowing are reported as `RowOverflow` events.
pub fn apply_grid(
    page: &NormalizedPage,
    footprints: &OrderedMap<BankId, BankFootprint>,
    config: &GridConfig,
) -> (PageGrid, Vec<CompileEvent>) {
    let dims = config.dims(page.has_sidebar());
    let layout: Vec<Vec<BankId>> = page
        .layout
        .iter()
        .map(|row| row.iter().map(|slot| slot.bankid.clone()).collect())
        .collect();

    let (matrix, ordered) = arrange(footprints, &layout, &dims);

    let events = matrix
        .iter()
        .enumerate()
        .filter(|(_, row)| row_width(row) > dims.width)
        .map(|(idx, row)| {
            CompileEvent::now(EventKind::RowOverflow, format!("{}[{}]", page.pageid, idx))
                .with_detail(format!("width {} > {}", row_width(row), dims.width))
        })
        .collect();

    (
        PageGrid {
            layout: matrix,
            banks: ordered,
        },
        events,
    )
}
