use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::components::text_input::{FieldBuildConfig, FieldKind, RenderedTextInput, TextInput};
use crate::theme::ResolvedTheme;
use crate::types::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};
use crate::workflow::BugListController;

// ---------------------------------------------------------------------------
// Field focus
// ---------------------------------------------------------------------------

/// Which form field receives key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorField {
    #[default]
    Title,
    Description,
    Priority,
    Status,
    Assignee,
}

impl EditorField {
    pub const ALL: [EditorField; 5] = [
        EditorField::Title,
        EditorField::Description,
        EditorField::Priority,
        EditorField::Status,
        EditorField::Assignee,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Priority => "Priority",
            Self::Status => "Status",
            Self::Assignee => "Assignee",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&f| f == self).unwrap_or(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        let idx = self.index();
        Self::ALL[if idx == 0 { Self::ALL.len() - 1 } else { idx - 1 }]
    }
}

// ---------------------------------------------------------------------------
// Pre-rendered editor
// ---------------------------------------------------------------------------

pub struct RenderedEditor {
    pub heading: String,
    pub fields: Vec<RenderedTextInput>,
    pub status_text: Option<String>,
    pub status_fg: Color,
    pub hint: String,
    pub width: u32,
    pub heading_fg: Color,
    pub faint_fg: Color,
    pub border_fg: Color,
}

pub struct EditorBuildConfig<'a> {
    pub controller: &'a BugListController,
    pub focus: EditorField,
    /// Index into the current assignee suggestions.
    pub suggestion: usize,
    pub max_suggestions: usize,
    pub width: u16,
    pub theme: &'a ResolvedTheme,
    pub depth: ColorDepth,
}

impl RenderedEditor {
    /// `None` when the controller is not editing.
    pub fn build(cfg: &EditorBuildConfig<'_>) -> Option<Self> {
        let ctl = cfg.controller;
        let session = ctl.edit_session()?;
        let draft = session.draft();
        let theme = cfg.theme;
        let depth = cfg.depth;
        let value_width = usize::from(cfg.width.saturating_sub(18));

        let loading = |kind| {
            if ctl.is_loading(kind) {
                " (loading\u{2026})"
            } else {
                ""
            }
        };
        let priority = format!(
            "{}{}",
            draft.priority_label(ctl.priorities()),
            loading(crate::types::ReferenceKind::Priorities)
        );
        let status = format!(
            "{}{}",
            draft.status_label(ctl.statuses()),
            loading(crate::types::ReferenceKind::Statuses)
        );
        let assignee = &draft.assignee().display_name;

        let mut fields = Vec::with_capacity(EditorField::ALL.len());
        for field in EditorField::ALL {
            let (value, kind, hint) = match field {
                EditorField::Title => (
                    draft.title(),
                    FieldKind::Text,
                    Some(count_hint(draft.title(), TITLE_MAX_CHARS)),
                ),
                EditorField::Description => (
                    draft.description(),
                    FieldKind::Text,
                    Some(count_hint(draft.description(), DESCRIPTION_MAX_CHARS)),
                ),
                EditorField::Priority => (priority.as_str(), FieldKind::Picker, None),
                EditorField::Status => (status.as_str(), FieldKind::Picker, None),
                EditorField::Assignee => (
                    assignee.as_str(),
                    FieldKind::Text,
                    draft.assignee().is_linked().then(|| "linked".to_owned()),
                ),
            };
            let focused = field == cfg.focus;
            let mut input = RenderedTextInput::build(&FieldBuildConfig {
                label: field.label(),
                value,
                kind,
                focused,
                hint,
                width: value_width,
                theme,
                depth,
            });
            if field == EditorField::Assignee && focused {
                let names: Vec<String> = ctl
                    .suggestions(cfg.max_suggestions)
                    .iter()
                    .map(|c| c.user.full_name())
                    .collect();
                input = input.with_suggestions(&names, cfg.suggestion, theme, depth);
            }
            fields.push(input);
        }

        let (status_text, status_color) = if session.is_saving() {
            (Some("Saving\u{2026}".to_owned()), theme.text_warning)
        } else if let Some(err) = session.error() {
            (Some(err.to_owned()), theme.text_error)
        } else {
            (None, theme.text_faint)
        };

        Some(Self {
            heading: session
                .origin()
                .map_or_else(|| "New bug".to_owned(), |id| format!("Edit bug #{id}")),
            fields,
            status_text,
            status_fg: status_color.to_crossterm_color(depth),
            hint: "Tab next  \u{2022}  \u{2190}/\u{2192} choose  \u{2022}  Ctrl-S save  \u{2022}  Esc cancel"
                .to_owned(),
            width: u32::from(cfg.width),
            heading_fg: theme.text_primary.to_crossterm_color(depth),
            faint_fg: theme.text_faint.to_crossterm_color(depth),
            border_fg: theme.border_primary.to_crossterm_color(depth),
        })
    }
}

fn count_hint(text: &str, max: usize) -> String {
    format!("{}/{max}", text.chars().count())
}

#[derive(Default, Props)]
pub struct BugEditorProps {
    pub editor: Option<RenderedEditor>,
}

#[component]
pub fn BugEditor(props: &mut BugEditorProps) -> impl Into<AnyElement<'static>> {
    let Some(ed) = props.editor.take() else {
        return element! { View }.into_any();
    };

    element! {
        View(
            width: ed.width,
            flex_direction: FlexDirection::Column,
            border_style: BorderStyle::Single,
            border_edges: Edges::Left,
            border_color: ed.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            Text(content: ed.heading, color: ed.heading_fg, weight: Weight::Bold)
            View(flex_direction: FlexDirection::Column, padding_top: 1, flex_grow: 1.0) {
                #(ed.fields.into_iter().enumerate().map(|(i, input)| element! {
                    View(key: i, padding_bottom: 1) {
                        TextInput(input: Some(input))
                    }
                }))
            }
            #(ed.status_text.map(|text| element! {
                Text(content: text, color: ed.status_fg)
            }))
            Text(content: ed.hint, color: ed.faint_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_wraps_both_ways() {
        assert_eq!(EditorField::Assignee.next(), EditorField::Title);
        assert_eq!(EditorField::Title.prev(), EditorField::Assignee);
        assert_eq!(EditorField::Priority.next(), EditorField::Status);
    }

    #[test]
    fn nothing_to_render_outside_editing() {
        let controller = BugListController::new();
        let theme = crate::views::default_theme();
        let rendered = RenderedEditor::build(&EditorBuildConfig {
            controller: &controller,
            focus: EditorField::Title,
            suggestion: 0,
            max_suggestions: 8,
            width: 60,
            theme: &theme,
            depth: ColorDepth::TrueColor,
        });
        assert!(rendered.is_none());
    }

    #[test]
    fn new_bug_form_lists_every_field() {
        let mut controller = BugListController::new();
        controller.begin_create().unwrap();
        let theme = crate::views::default_theme();
        let ed = RenderedEditor::build(&EditorBuildConfig {
            controller: &controller,
            focus: EditorField::Priority,
            suggestion: 0,
            max_suggestions: 8,
            width: 60,
            theme: &theme,
            depth: ColorDepth::TrueColor,
        })
        .unwrap();
        assert_eq!(ed.heading, "New bug");
        assert_eq!(ed.fields.len(), 5);
        assert!(ed.fields[2].focused);
        assert!(ed.fields[2].text.contains("loading"));
        assert!(ed.status_text.is_none());
    }
}
