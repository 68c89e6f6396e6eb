use iocraft::prelude::*;

use crate::color::{Color as AppColor, ColorDepth};
use crate::theme::ResolvedTheme;
use crate::types::Bug;
use crate::util;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// One column of the bug table.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    /// Share of the width left over once fixed columns are placed.
    pub width_pct: f32,
    /// Exact width in cells; takes precedence over `width_pct`.
    pub fixed_width: Option<u16>,
    pub align: TextAlign,
}

pub const BUG_COLUMNS: [Column; 6] = [
    Column {
        header: "#",
        width_pct: 0.0,
        fixed_width: Some(6),
        align: TextAlign::Right,
    },
    Column {
        header: "Title",
        width_pct: 0.46,
        fixed_width: None,
        align: TextAlign::Left,
    },
    Column {
        header: "Priority",
        width_pct: 0.14,
        fixed_width: None,
        align: TextAlign::Left,
    },
    Column {
        header: "Status",
        width_pct: 0.14,
        fixed_width: None,
        align: TextAlign::Left,
    },
    Column {
        header: "Assignee",
        width_pct: 0.18,
        fixed_width: None,
        align: TextAlign::Left,
    },
    Column {
        header: "Created",
        width_pct: 0.08,
        fixed_width: None,
        align: TextAlign::Right,
    },
];

/// A single cell value to display.
#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub color: Option<AppColor>,
    pub bold: bool,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: false,
        }
    }

    pub fn colored(text: impl Into<String>, color: AppColor) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
            bold: false,
        }
    }
}

/// Cells of one bug, in `BUG_COLUMNS` order.
pub fn bug_cells(bug: &Bug, theme: &ResolvedTheme, date_format: &str) -> Vec<Cell> {
    vec![
        Cell::colored(bug.id.to_string(), theme.text_secondary),
        Cell {
            text: util::first_line(&bug.title).to_owned(),
            color: Some(theme.text_primary),
            bold: true,
        },
        Cell::colored(bug.priority_label(), theme.text_warning),
        Cell::colored(bug.status_label(), theme.text_success),
        if bug.assignee.is_some() {
            Cell::colored(bug.assignee_name(), theme.text_actor)
        } else {
            Cell::colored("-", theme.text_faint)
        },
        bug.created_at.as_ref().map_or_else(
            || Cell::plain(""),
            |at| Cell::colored(util::format_date(at, date_format), theme.text_faint),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Pre-rendered table data (all owned)
// ---------------------------------------------------------------------------

/// Table contents resolved to terminal colors and widths, ready to move into
/// `element!`.
pub struct RenderedTable {
    pub header_cells: Vec<HeaderCell>,
    pub body_rows: Vec<RenderedRow>,
    pub total_width: u32,
    pub header_fg: Color,
    pub border_fg: Color,
    pub empty_fg: Color,
    pub empty_message: Option<String>,
}

pub struct HeaderCell {
    pub text: String,
    pub width: u32,
    pub align: TextAlign,
}

pub struct RenderedRow {
    pub key: usize,
    pub bg: Option<Color>,
    pub cells: Vec<RenderedCell>,
}

pub struct RenderedCell {
    pub text: String,
    pub fg: Color,
    pub weight: Weight,
    pub width: u32,
    pub align: TextAlign,
}

pub struct TableBuildConfig<'a> {
    pub columns: &'a [Column],
    /// One `Vec<Cell>` per row, in column order.
    pub rows: &'a [Vec<Cell>],
    pub cursor: usize,
    pub scroll_offset: usize,
    pub visible_rows: usize,
    pub total_width: u16,
    pub depth: ColorDepth,
    pub theme: &'a ResolvedTheme,
    /// Shown instead of the body when `rows` is empty.
    pub empty_message: Option<&'a str>,
}

impl RenderedTable {
    pub fn build(cfg: &TableBuildConfig<'_>) -> Self {
        let depth = cfg.depth;
        let theme = cfg.theme;
        let widths = compute_column_widths(cfg.columns, cfg.total_width);
        let selected_bg = theme.bg_selected.to_crossterm_color(depth);

        let header_cells = cfg
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| HeaderCell {
                text: col.header.to_owned(),
                width: u32::from(w),
                align: col.align,
            })
            .collect();

        let end = (cfg.scroll_offset + cfg.visible_rows).min(cfg.rows.len());
        let window = cfg.rows.get(cfg.scroll_offset..end).unwrap_or_default();

        let body_rows = window
            .iter()
            .enumerate()
            .map(|(i, cells)| {
                let index = cfg.scroll_offset + i;
                let cells = cfg
                    .columns
                    .iter()
                    .zip(&widths)
                    .enumerate()
                    .map(|(ci, (col, &w))| {
                        let cell = cells.get(ci);
                        RenderedCell {
                            // One cell of padding between columns.
                            text: util::truncate_to_width(
                                cell.map_or("", |c| c.text.as_str()),
                                usize::from(w.saturating_sub(1)),
                            ),
                            fg: cell
                                .and_then(|c| c.color)
                                .map_or(Color::Reset, |c| c.to_crossterm_color(depth)),
                            weight: if cell.is_some_and(|c| c.bold) {
                                Weight::Bold
                            } else {
                                Weight::Normal
                            },
                            width: u32::from(w),
                            align: col.align,
                        }
                    })
                    .collect();
                RenderedRow {
                    key: index,
                    bg: (index == cfg.cursor).then_some(selected_bg),
                    cells,
                }
            })
            .collect();

        Self {
            header_cells,
            body_rows,
            total_width: u32::from(cfg.total_width),
            header_fg: theme.text_secondary.to_crossterm_color(depth),
            border_fg: theme.border_faint.to_crossterm_color(depth),
            empty_fg: theme.text_faint.to_crossterm_color(depth),
            empty_message: if cfg.rows.is_empty() {
                cfg.empty_message.map(str::to_owned)
            } else {
                None
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ScrollableTable component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct ScrollableTableProps {
    pub table: Option<RenderedTable>,
}

#[component]
pub fn ScrollableTable(props: &mut ScrollableTableProps) -> impl Into<AnyElement<'static>> {
    let Some(table) = props.table.take() else {
        return element! { View }.into_any();
    };

    element! {
        View(flex_direction: FlexDirection::Column, width: table.total_width) {
            View(
                border_style: BorderStyle::Single,
                border_edges: Edges::Bottom,
                border_color: table.border_fg,
            ) {
                #(table.header_cells.into_iter().enumerate().map(|(i, hc)| {
                    element! {
                        View(key: i, width: hc.width) {
                            Text(
                                content: hc.text,
                                weight: Weight::Bold,
                                color: table.header_fg,
                                wrap: TextWrap::NoWrap,
                                align: hc.align,
                            )
                        }
                    }
                }))
            }

            #(table.empty_message.into_iter().map(|msg| {
                element! {
                    View(padding_top: 1, padding_left: 2) {
                        Text(content: msg, color: table.empty_fg)
                    }
                }
            }))
            #(table.body_rows.into_iter().map(|row| {
                element! {
                    View(key: row.key, background_color: row.bg) {
                        #(row.cells.into_iter().enumerate().map(|(ci, cell)| {
                            element! {
                                View(key: ci, width: cell.width) {
                                    Text(
                                        content: cell.text,
                                        color: cell.fg,
                                        weight: cell.weight,
                                        wrap: TextWrap::NoWrap,
                                        align: cell.align,
                                    )
                                }
                            }
                        }))
                    }
                }
            }))
        }
    }
    .into_any()
}

// ---------------------------------------------------------------------------
// Column width computation
// ---------------------------------------------------------------------------

fn compute_column_widths(columns: &[Column], total: u16) -> Vec<u16> {
    let fixed: u16 = columns.iter().filter_map(|c| c.fixed_width).sum();
    let remaining = total.saturating_sub(fixed);
    let pct_sum: f32 = columns
        .iter()
        .filter(|c| c.fixed_width.is_none())
        .map(|c| c.width_pct)
        .sum();

    columns
        .iter()
        .map(|c| match c.fixed_width {
            Some(w) => w,
            None if pct_sum > 0.0 => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let w = (f32::from(remaining) * c.width_pct / pct_sum).floor() as u16;
                w.max(1)
            }
            None => 1,
        })
        .collect()
}
