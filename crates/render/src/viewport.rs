/// A browser window size the page is exercised at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub label: &'static str,
}

/// The viewports every page is swept through, in order.
///
/// Responsive stylesheets apply different rules at different breakpoints, so
/// measuring at a single width would report rules used only at other widths
/// as unused. Navigation happens at the first entry.
pub const VIEWPORTS: [Viewport; 3] = [
    Viewport {
        width: 1920,
        height: 1080,
        label: "Desktop (1920x1080)",
    },
    Viewport {
        width: 768,
        height: 1024,
        label: "Tablet (768x1024)",
    },
    Viewport {
        width: 375,
        height: 667,
        label: "Mobile (375x667)",
    },
];

impl Viewport {
    pub fn labels() -> Vec<String> {
        VIEWPORTS.iter().map(|v| v.label.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_follow_sweep_order() {
        assert_eq!(Viewport::labels(), ["Desktop (1920x1080)", "Tablet (768x1024)", "Mobile (375x667)"]);
    }
}
