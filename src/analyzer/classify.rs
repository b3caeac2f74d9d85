use crate::ast::{is_allow_listed_call, is_allow_listed_path};
use crate::keywords;
use crate::lexer::{Tok, Token};

/// How an identifier token is treated by analysis and highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenClass {
    /// A reserved word. Excluded from the validity map.
    Keyword,
    /// Part of an allow-listed function or constant sequence. Excluded from the validity map.
    Operator,
    /// A property name after `.` or a record key. Never looked up.
    Member,
    /// A reference that must resolve against the bindings.
    Variable,
}

/// Classifies every identifier token; non-identifier tokens map to `None`.
///
/// Grammar keywords are always `Keyword`: a program that parsed can only hold
/// them in keyword position. `reserved` governs the literal tokens and the
/// built-in namespace names.
pub(crate) fn classify_tokens(tokens: &[Token], reserved: bool) -> Vec<Option<TokenClass>> {
    let mut classes: Vec<Option<TokenClass>> = vec![None; tokens.len()];
    let tok_at = |i: usize| tokens.get(i).map(|t| &t.tok);

    for (i, token) in tokens.iter().enumerate() {
        let Some(word) = token.ident() else {
            continue;
        };
        if classes[i].is_some() {
            // Already claimed as the tail of an operator sequence.
            continue;
        }
        let after_dot = i > 0 && tok_at(i - 1) == Some(&Tok::Dot);
        let sequence = is_namespaced_sequence(tokens, i);

        let class = if keywords::is_syntax_keyword(word) || (reserved && keywords::is_reserved(word))
        {
            TokenClass::Keyword
        } else if sequence {
            TokenClass::Operator
        } else if !after_dot && is_allow_listed_call(word) && tok_at(i + 1) == Some(&Tok::LParen) {
            TokenClass::Operator
        } else if after_dot || is_record_key(tokens, i) {
            TokenClass::Member
        } else {
            TokenClass::Variable
        };

        // The member of `Math.max` belongs to the sequence even when the namespace is a keyword.
        if sequence {
            classes[i + 2] = Some(TokenClass::Operator);
        }
        classes[i] = Some(class);
    }
    classes
}

/// Whether tokens `i..i+3` form an allow-listed `namespace.member` sequence.
fn is_namespaced_sequence(tokens: &[Token], i: usize) -> bool {
    let starts_chain = i == 0 || tokens[i - 1].tok != Tok::Dot;
    match (tokens.get(i), tokens.get(i + 1), tokens.get(i + 2)) {
        (Some(namespace), Some(dot), Some(member)) if starts_chain && dot.tok == Tok::Dot => {
            match (namespace.ident(), member.ident()) {
                (Some(namespace), Some(member)) => is_allow_listed_path(namespace, member),
                _ => false,
            }
        }
        _ => false,
    }
}

/// `{ key: value }` and `{ a: 1, key: value }`.
fn is_record_key(tokens: &[Token], i: usize) -> bool {
    let opens_field = i > 0 && matches!(tokens[i - 1].tok, Tok::LBrace | Tok::Comma);
    opens_field && tokens.get(i + 1).map(|t| &t.tok) == Some(&Tok::Colon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn classes(source: &str, reserved: bool) -> Vec<(String, TokenClass)> {
        let tokens = tokenize(source);
        classify_tokens(&tokens, reserved)
            .into_iter()
            .zip(&tokens)
            .filter_map(|(class, token)| Some((token.ident()?.to_string(), class?)))
            .collect()
    }

    #[test]
    fn namespaced_math_is_one_sequence() {
        assert_eq!(
            classes("Math.max(salary, Math.PI)", true),
            vec![
                ("Math".into(), TokenClass::Keyword),
                ("max".into(), TokenClass::Operator),
                ("salary".into(), TokenClass::Variable),
                ("Math".into(), TokenClass::Keyword),
                ("PI".into(), TokenClass::Operator),
            ]
        );
    }

    #[test]
    fn namespace_is_an_operator_when_keywords_are_not_reserved() {
        assert_eq!(
            classes("Math.floor(x)", false),
            vec![
                ("Math".into(), TokenClass::Operator),
                ("floor".into(), TokenClass::Operator),
                ("x".into(), TokenClass::Variable),
            ]
        );
    }

    #[test]
    fn bare_function_needs_a_call() {
        assert_eq!(
            classes("round(x) + round", true),
            vec![
                ("round".into(), TokenClass::Operator),
                ("x".into(), TokenClass::Variable),
                ("round".into(), TokenClass::Variable),
            ]
        );
    }

    #[test]
    fn members_and_record_keys_are_not_references() {
        assert_eq!(
            classes("{ total: employee.salary, bonus }", true),
            vec![
                ("total".into(), TokenClass::Member),
                ("employee".into(), TokenClass::Variable),
                ("salary".into(), TokenClass::Member),
                ("bonus".into(), TokenClass::Variable),
            ]
        );
        assert_eq!(
            classes("flag ? a : b", true)
                .into_iter()
                .map(|(_, c)| c)
                .collect::<Vec<_>>(),
            vec![TokenClass::Variable; 3]
        );
    }

    #[test]
    fn literals_follow_the_reserved_flag() {
        assert_eq!(classes("true", true), vec![("true".into(), TokenClass::Keyword)]);
        assert_eq!(classes("true", false), vec![("true".into(), TokenClass::Variable)]);
        assert_eq!(classes("return", false), vec![("return".into(), TokenClass::Keyword)]);
    }
}
