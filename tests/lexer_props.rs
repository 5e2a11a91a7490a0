//! Property tests for the source scanners: comment/heredoc stripping keeps
//! line numbers stable, quotes protect `#`, and call matching is balanced.

mod util;

use pg_analyze::core::calls::CallScanner;
use pg_analyze::core::lexer::{clean, strip_comments, strip_heredocs};
use pg_analyze::infra::NewlineIndex;
use proptest::prelude::*;

/// Fragments that stress the lexer: quotes, comments, heredoc introducers
/// and terminators, escapes, CRLF and non-ASCII text.
fn fragment() -> impl Strategy<Value = &'static str>
{
    prop::sample::select(vec![
        "#", "'", "\"", "\\", "\n", "\r\n", " ", "x", "$a", "=", ";", "<<EOT;", "<<'END';",
        "<<\"PGML\";", "EOT", "END", "PGML", "ANS(", ")", "(", "BEGIN_PGML", "END_PGML", "[_]",
        "{", "}", "caf\u{e9}",
    ])
}

fn source() -> impl Strategy<Value = String>
{
    prop::collection::vec(fragment(), 0..80).prop_map(|parts| parts.concat())
}

fn newlines(s: &str) -> usize
{
    s.matches('\n').count()
}

proptest! {
    #[test]
    fn strip_comments_preserves_line_count(text in source()) {
        prop_assert_eq!(newlines(&strip_comments(&text)), newlines(&text));
    }

    #[test]
    fn strip_heredocs_preserves_line_count(text in source()) {
        prop_assert_eq!(newlines(&strip_heredocs(&text)), newlines(&text));
    }

    #[test]
    fn clean_preserves_line_count(text in source()) {
        prop_assert_eq!(newlines(&clean(&text)), newlines(&text));
    }

    #[test]
    fn hash_inside_quotes_survives(word in "[a-z ]{0,16}", single in any::<bool>()) {
        let q = if single { '\'' } else { '"' };
        let text = format!("$x = {q}{word}#{word}{q};\n");
        prop_assert_eq!(strip_comments(&text), text);
    }

    #[test]
    fn hash_outside_quotes_is_removed(tail in "[a-z '\"#]{0,16}") {
        let text = format!("$x = 1; #{tail}\nANS(1);\n");
        prop_assert_eq!(strip_comments(&text), "$x = 1; \nANS(1);\n");
    }

    #[test]
    fn quoted_parens_do_not_close_calls(inner in "[a-z()]{0,16}") {
        let text = format!("ANS(f(\"{inner}\"), (1));\n");
        let index = NewlineIndex::build(&text);
        let calls = CallScanner::default().iter_calls(&text, &["ANS"], &index);

        prop_assert_eq!(calls.len(), 1);
        let expected = format!("f(\"{inner}\"), (1)");
        prop_assert_eq!(calls[0].arg_text, expected.as_str());
    }

    #[test]
    fn analysis_never_panics(text in source()) {
        let rec = util::analyze(&text);
        let last_line = newlines(&text) + 1;
        prop_assert!(rec.widgets.iter().all(|w| w.line >= 1 && w.line <= last_line));
        prop_assert!(rec.evaluators.iter().all(|e| e.line >= 1 && e.line <= last_line));
        prop_assert!((0.0..=0.95).contains(&rec.confidence));
    }
}

#[test]
fn unterminated_call_yields_nothing()
{
    let text = "ANS(num_cmp(1, (2);\n";
    let index = NewlineIndex::build(text);
    let calls = CallScanner::default().iter_calls(text, &["ANS"], &index);
    assert!(calls.is_empty());
}
