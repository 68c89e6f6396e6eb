use std::time::SystemTime;

use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::theme::ResolvedTheme;
use crate::util;

// ---------------------------------------------------------------------------
// Footer component: status bar
// ---------------------------------------------------------------------------

pub struct RenderedFooter {
    pub user_text: String,
    pub count_text: String,
    pub updated_text: String,
    pub help_hint: String,
    pub text_fg: Color,
    pub actor_fg: Color,
    pub border_fg: Color,
}

impl RenderedFooter {
    pub fn build(
        user_name: Option<&str>,
        bug_count: usize,
        loaded_at: Option<SystemTime>,
        help_hint: &str,
        theme: &ResolvedTheme,
        depth: ColorDepth,
    ) -> Self {
        Self {
            user_text: user_name.map_or_else(|| "not signed in".to_owned(), str::to_owned),
            count_text: format_count(bug_count),
            updated_text: format_updated_ago(loaded_at),
            help_hint: help_hint.to_owned(),
            text_fg: theme.text_faint.to_crossterm_color(depth),
            actor_fg: theme.text_actor.to_crossterm_color(depth),
            border_fg: theme.border_faint.to_crossterm_color(depth),
        }
    }
}

fn format_count(n: usize) -> String {
    if n == 1 {
        "1 bug".to_owned()
    } else {
        format!("{n} bugs")
    }
}

/// `"Updated ~Xs ago"`, or empty before the first load.
pub fn format_updated_ago(loaded_at: Option<SystemTime>) -> String {
    loaded_at.map_or_else(String::new, |t| format!("Updated {}", util::format_age(t)))
}

#[derive(Default, Props)]
pub struct FooterProps {
    pub footer: Option<RenderedFooter>,
}

#[component]
pub fn Footer(props: &mut FooterProps) -> impl Into<AnyElement<'static>> {
    let Some(f) = props.footer.take() else {
        return element! { View }.into_any();
    };

    let sep = "  \u{2022}  ";
    let mut contents = vec![
        MixedTextContent::new(&f.count_text).color(f.text_fg),
    ];
    if !f.updated_text.is_empty() {
        contents.push(MixedTextContent::new(sep).color(f.text_fg));
        contents.push(MixedTextContent::new(&f.updated_text).color(f.text_fg));
    }

    element! {
        View(
            border_style: BorderStyle::Single,
            border_edges: Edges::Top,
            border_color: f.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            Text(content: f.user_text.clone(), color: f.actor_fg, wrap: TextWrap::NoWrap)
            Text(content: " \u{2502} ", color: f.text_fg, wrap: TextWrap::NoWrap)
            View(flex_grow: 1.0) {
                MixedText(contents, wrap: TextWrap::NoWrap)
            }
            Text(content: " \u{2502} ", color: f.text_fg, wrap: TextWrap::NoWrap)
            Text(content: f.help_hint.clone(), color: f.text_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}
