mod common;

use common::render;
use intramark::{Environment, ReferenceMap};

fn to_html(input: &str) -> String {
    render(&Environment::commonmark().parse(input, &ReferenceMap::new()))
}

// CommonMark emphasis and strong emphasis

#[test]
fn simple_emphasis() {
    assert_eq!(to_html("*foo bar*"), "<em>foo bar</em>");
    assert_eq!(to_html("_foo bar_"), "<em>foo bar</em>");
}

#[test]
fn simple_strong() {
    assert_eq!(to_html("**foo bar**"), "<strong>foo bar</strong>");
    assert_eq!(to_html("__foo bar__"), "<strong>foo bar</strong>");
}

#[test]
fn opening_star_followed_by_whitespace_is_literal() {
    assert_eq!(to_html("a * foo bar*"), "a * foo bar*");
}

#[test]
fn intraword_star_works() {
    assert_eq!(to_html("foo*bar*"), "foo<em>bar</em>");
}

#[test]
fn intraword_underscore_is_literal() {
    assert_eq!(to_html("foo_bar_"), "foo_bar_");
    assert_eq!(to_html("_foo_bar"), "_foo_bar");
    assert_eq!(to_html("foo_bar_baz"), "foo_bar_baz");
}

#[test]
fn mismatched_delimiters_do_not_pair() {
    assert_eq!(to_html("*foo_"), "*foo_");
    assert_eq!(to_html("_foo*"), "_foo*");
}

#[test]
fn nested_emphasis_in_strong() {
    assert_eq!(
        to_html("**outer *inner* outer**"),
        "<strong>outer <em>inner</em> outer</strong>"
    );
}

#[test]
fn triple_stars_nest() {
    assert_eq!(to_html("***foo***"), "<em><strong>foo</strong></em>");
}

#[test]
fn rule_of_three_canonical() {
    // The motivating case for the multiple-of-three restriction.
    assert_eq!(
        to_html("*foo**bar**baz*"),
        "<em>foo<strong>bar</strong>baz</em>"
    );
}

#[test]
fn rule_of_three_blocks_inner_pairing() {
    // The 1+2 pairings are forbidden (sum divisible by three), so the
    // outer ** runs pair across the stray single star.
    assert_eq!(to_html("**foo*bar**baz*"), "<strong>foo*bar</strong>baz*");
    assert_eq!(to_html("**foo*bar**"), "<strong>foo*bar</strong>");
}

#[test]
fn rule_of_three_allows_both_multiples() {
    // Both runs are multiples of three, so pairing is legal again.
    assert_eq!(
        to_html("foo***bar***baz"),
        "foo<em><strong>bar</strong></em>baz"
    );
}

#[test]
fn smallest_leftmost_pair_wins() {
    assert_eq!(to_html("*foo *bar baz*"), "*foo <em>bar baz</em>");
}

#[test]
fn emphasis_cannot_cross_code_span() {
    assert_eq!(to_html("*foo `bar*`"), "*foo <code>bar*</code>");
}

#[test]
fn escaped_star_never_opens() {
    assert_eq!(to_html("\\*not emphasis*"), "*not emphasis*");
}

#[test]
fn long_run_pairs_repeatedly() {
    assert_eq!(
        to_html("*****foo*****"),
        "<em><strong><strong>foo</strong></strong></em>"
    );
}

#[test]
fn unmatched_closer_stays_literal() {
    assert_eq!(to_html("foo* bar"), "foo* bar");
}

#[test]
fn emphasis_with_punctuation_boundaries() {
    assert_eq!(to_html("*(foo)*"), "<em>(foo)</em>");
}

#[test]
fn underscore_closing_after_punctuation() {
    assert_eq!(to_html("_(bar)_."), "<em>(bar)</em>.");
}
