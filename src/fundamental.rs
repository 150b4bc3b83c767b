//! Built-in C++ type keywords. They have no tagfile entry, so they always
//! link to the cppreference page on fundamental types.

/// The cppreference page describing the fundamental types.
pub const FUNDAMENTAL_TYPES_URL: &str = "https://en.cppreference.com/w/cpp/language/types";

/// Every keyword treated as a fundamental type, with its section anchor on
/// the fundamental types page. An empty anchor links to the page itself.
const KEYWORD_ANCHORS: &[(&str, &str)] = &[
    ("bool", "Boolean_type"),
    ("char", "Character_types"),
    ("char16_t", "Character_types"),
    ("char32_t", "Character_types"),
    ("char8_t", "Character_types"),
    ("double", "Floating-point_types"),
    ("false", ""),
    ("float", "Floating-point_types"),
    ("int", "Integral_types"),
    ("long", "Integral_types"),
    ("long double", "Floating-point_types"),
    ("short", "Integral_types"),
    ("signed", "Integral_types"),
    ("true", ""),
    ("unsigned", "Integral_types"),
    ("void", ""),
    ("wchar_t", "Character_types"),
];

/// Link target for a fundamental type keyword, or `None` for anything else.
pub fn fundamental_type_target(symbol: &str) -> Option<String> {
    let (_, anchor) = KEYWORD_ANCHORS.iter().find(|(keyword, _)| return *keyword == symbol)?;
    if anchor.is_empty() {
        return Some(FUNDAMENTAL_TYPES_URL.to_string());
    }
    return Some(format!("{FUNDAMENTAL_TYPES_URL}#{anchor}"));
}
