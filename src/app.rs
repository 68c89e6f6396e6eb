use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::config::types::AppConfig;
use crate::engine::EngineHandle;
use crate::theme::ResolvedTheme;
use crate::views::bugs::BugsView;

// ---------------------------------------------------------------------------
// Root App component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct AppProps<'a> {
    pub config: Option<&'a AppConfig>,
    pub engine: Option<&'a EngineHandle>,
    pub theme: Option<&'a ResolvedTheme>,
    pub color_depth: ColorDepth,
}

#[component]
pub fn App<'a>(props: &AppProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let (width, height) = hooks.use_terminal_size();
    let mut system = hooks.use_context_mut::<SystemContext>();
    let should_exit = hooks.use_state(|| false);

    if should_exit.get() {
        system.exit();
    }

    let config = props.config;
    let preview_width_pct = config.map_or(0.45, |c| c.defaults.preview_width);
    let date_format = config.map(|c| c.defaults.date_format.as_str());
    let max_suggestions = config.map_or(8, |c| c.editor.max_suggestions);

    element! {
        View(width: u32::from(width), height: u32::from(height), flex_direction: FlexDirection::Column) {
            BugsView(
                engine: props.engine,
                theme: props.theme,
                color_depth: props.color_depth,
                width,
                height,
                preview_width_pct,
                date_format,
                max_suggestions,
                should_exit,
            )
        }
    }
}
