use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::theme::ResolvedTheme;
use crate::types::Bug;
use crate::util;

// ---------------------------------------------------------------------------
// Bug detail pane
// ---------------------------------------------------------------------------

pub struct DetailField {
    pub label: &'static str,
    pub value: String,
    pub fg: Color,
}

pub struct RenderedDetail {
    pub heading: String,
    pub fields: Vec<DetailField>,
    pub description: Vec<String>,
    pub hint: String,
    pub width: u32,
    pub heading_fg: Color,
    pub label_fg: Color,
    pub text_fg: Color,
    pub faint_fg: Color,
    pub border_fg: Color,
}

impl RenderedDetail {
    pub fn build(
        bug: &Bug,
        date_format: &str,
        width: u16,
        theme: &ResolvedTheme,
        depth: ColorDepth,
    ) -> Self {
        let fg = |c: crate::color::Color| c.to_crossterm_color(depth);
        let created = match (&bug.created_at, bug.creator_name()) {
            (Some(at), Some(who)) => format!("{} by {who}", util::format_date(at, date_format)),
            (Some(at), None) => util::format_date(at, date_format),
            (None, Some(who)) => format!("by {who}"),
            (None, None) => "-".to_owned(),
        };
        let fields = vec![
            DetailField {
                label: "Priority",
                value: bug.priority_label().to_owned(),
                fg: fg(theme.text_warning),
            },
            DetailField {
                label: "Status",
                value: bug.status_label().to_owned(),
                fg: fg(theme.text_success),
            },
            DetailField {
                label: "Assignee",
                value: bug.assignee_name(),
                fg: fg(theme.text_actor),
            },
            DetailField {
                label: "Created",
                value: created,
                fg: fg(theme.text_secondary),
            },
        ];

        let description = if bug.description.trim().is_empty() {
            vec!["No description provided.".to_owned()]
        } else {
            bug.description.lines().map(str::to_owned).collect()
        };

        Self {
            heading: format!("#{} {}", bug.id, bug.title),
            fields,
            description,
            hint: "e edit  \u{2022}  Esc close".to_owned(),
            width: u32::from(width),
            heading_fg: fg(theme.text_primary),
            label_fg: fg(theme.text_secondary),
            text_fg: fg(theme.text_primary),
            faint_fg: fg(theme.text_faint),
            border_fg: fg(theme.border_primary),
        }
    }
}

#[derive(Default, Props)]
pub struct BugDetailProps {
    pub detail: Option<RenderedDetail>,
}

#[component]
pub fn BugDetail(props: &mut BugDetailProps) -> impl Into<AnyElement<'static>> {
    let Some(d) = props.detail.take() else {
        return element! { View }.into_any();
    };

    element! {
        View(
            width: d.width,
            flex_direction: FlexDirection::Column,
            border_style: BorderStyle::Single,
            border_edges: Edges::Left,
            border_color: d.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            Text(content: d.heading, color: d.heading_fg, weight: Weight::Bold)
            View(flex_direction: FlexDirection::Column, padding_top: 1, padding_bottom: 1) {
                #(d.fields.into_iter().map(|f| element! {
                    View(key: f.label, flex_direction: FlexDirection::Row) {
                        Text(content: format!("{:<10}", f.label), color: d.label_fg, wrap: TextWrap::NoWrap)
                        Text(content: f.value, color: f.fg, wrap: TextWrap::NoWrap)
                    }
                }))
            }
            View(flex_direction: FlexDirection::Column, flex_grow: 1.0) {
                #(d.description.into_iter().enumerate().map(|(i, line)| element! {
                    Text(key: i, content: line, color: d.text_fg)
                }))
            }
            Text(content: d.hint, color: d.faint_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}
