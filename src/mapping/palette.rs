/// Colours handed out to generated categories, in order.
pub const CATEGORY_PALETTE: [&str; 12] = [
    "#E63946", "#1D3557", "#2A9D8F", "#F4A261", "#6A4C93", "#8AC926",
    "#FF595E", "#1982C4", "#FFCA3A", "#6D597A", "#264653", "#B5838D",
];

/// Fill used for seats without a category.
pub const UNASSIGNED_COLOR: &str = "#D9D9D9";

/// Palette colour for the `index`-th generated category, wrapping around.
pub fn color_for_index(index: usize) -> &'static str {
    CATEGORY_PALETTE[index % CATEGORY_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        assert_eq!(color_for_index(0), CATEGORY_PALETTE[0]);
        assert_eq!(color_for_index(11), CATEGORY_PALETTE[11]);
        assert_eq!(color_for_index(12), CATEGORY_PALETTE[0]);
        assert_eq!(color_for_index(25), CATEGORY_PALETTE[1]);
    }
}
