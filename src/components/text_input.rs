use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::theme::ResolvedTheme;
use crate::util;

// ---------------------------------------------------------------------------
// Pre-rendered form field
// ---------------------------------------------------------------------------

/// One labelled field of the editor form.
pub struct RenderedTextInput {
    pub label: String,
    pub text: String,
    pub hint: Option<String>,
    pub focused: bool,
    pub label_fg: Color,
    pub text_fg: Color,
    pub hint_fg: Color,
    pub suggestions: Vec<RenderedSuggestion>,
}

pub struct RenderedSuggestion {
    pub text: String,
    pub fg: Color,
}

/// How a field shows its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text; a block cursor follows the text while focused.
    Text,
    /// A value cycled with the arrow keys.
    Picker,
}

pub struct FieldBuildConfig<'a> {
    pub label: &'a str,
    pub value: &'a str,
    pub kind: FieldKind,
    pub focused: bool,
    /// Dim text after the value, e.g. a character count.
    pub hint: Option<String>,
    /// Text columns available for the value.
    pub width: usize,
    pub theme: &'a ResolvedTheme,
    pub depth: ColorDepth,
}

impl RenderedTextInput {
    pub fn build(cfg: &FieldBuildConfig<'_>) -> Self {
        let theme = cfg.theme;
        let depth = cfg.depth;
        let shown = match (cfg.kind, cfg.focused) {
            (FieldKind::Text, true) => {
                // Keep the end of long text visible next to the cursor.
                let tail = tail_to_width(cfg.value, cfg.width.saturating_sub(1));
                format!("{tail}\u{2588}")
            }
            (FieldKind::Text, false) => {
                util::truncate_to_width(util::first_line(cfg.value), cfg.width)
            }
            (FieldKind::Picker, true) => format!("\u{2039} {} \u{203a}", cfg.value),
            (FieldKind::Picker, false) => cfg.value.to_owned(),
        };
        let label_fg = if cfg.focused {
            theme.text_primary
        } else {
            theme.text_secondary
        };
        Self {
            label: cfg.label.to_owned(),
            text: shown,
            hint: cfg.hint.clone(),
            focused: cfg.focused,
            label_fg: label_fg.to_crossterm_color(depth),
            text_fg: theme.text_primary.to_crossterm_color(depth),
            hint_fg: theme.text_faint.to_crossterm_color(depth),
            suggestions: Vec::new(),
        }
    }

    /// Attach a suggestion list below the field; `selected` is highlighted.
    pub fn with_suggestions(
        mut self,
        items: &[String],
        selected: usize,
        theme: &ResolvedTheme,
        depth: ColorDepth,
    ) -> Self {
        self.suggestions = items
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let is_selected = i == selected;
                RenderedSuggestion {
                    text: format!("{}{text}", if is_selected { "> " } else { "  " }),
                    fg: if is_selected {
                        theme.text_actor.to_crossterm_color(depth)
                    } else {
                        theme.text_secondary.to_crossterm_color(depth)
                    },
                }
            })
            .collect();
        self
    }
}

// Last `width` columns of the last line of `text`.
fn tail_to_width(text: &str, width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let line = text.rsplit('\n').next().unwrap_or_default();
    let mut used = 0;
    let mut start = line.len();
    for (i, c) in line.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = i;
    }
    line[start..].to_owned()
}

// ---------------------------------------------------------------------------
// TextInput component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct TextInputProps {
    pub input: Option<RenderedTextInput>,
}

#[component]
pub fn TextInput(props: &mut TextInputProps) -> impl Into<AnyElement<'static>> {
    let Some(input) = props.input.take() else {
        return element! { View }.into_any();
    };

    let marker = if input.focused { "\u{25b8} " } else { "  " };

    element! {
        View(flex_direction: FlexDirection::Column) {
            View(flex_direction: FlexDirection::Row) {
                Text(
                    content: format!("{marker}{:<12}", input.label),
                    color: input.label_fg,
                    weight: if input.focused { Weight::Bold } else { Weight::Normal },
                    wrap: TextWrap::NoWrap,
                )
                Text(content: input.text, color: input.text_fg, wrap: TextWrap::NoWrap)
                #(input.hint.map(|hint| element! {
                    Text(content: format!("  {hint}"), color: input.hint_fg, wrap: TextWrap::NoWrap)
                }))
            }
            #(input.suggestions.into_iter().enumerate().map(|(i, s)| {
                element! {
                    View(key: i, padding_left: 16) {
                        Text(content: s.text, color: s.fg, wrap: TextWrap::NoWrap)
                    }
                }
            }))
        }
    }
    .into_any()
}
