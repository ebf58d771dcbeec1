//! Static lookup tables populated at startup and read-only afterwards.

pub mod events;
pub mod themes;

pub use events::{
    ControlScheme, END_FADE_PARAM, END_SECTION_PARAM, EventRegistry, LOOP_INDEX_PARAM,
    loop_index_for_name,
};
pub use themes::{ResolvedTheme, ThemeEntry, ThemeRegistry};
