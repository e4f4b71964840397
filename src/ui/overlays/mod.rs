mod help;

pub use help::draw_help_overlay;
